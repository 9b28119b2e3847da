// Unit tests for the DealMatch ranking engine

use dealmatch_algo::core::{
    filters::{filter_listings, matches_free_text},
    location::locations_match,
    scoring::HeuristicScorer,
};
use dealmatch_algo::models::{
    Business, EmployeeBucket, FilterCriteria, InvestorPreferences, ScoringWeights,
};

fn business(id: &str, price: i64, revenue: i64, industry: &str, location: &str) -> Business {
    Business {
        id: id.to_string(),
        name: format!("Business {}", id),
        description: "Profitable owner-operated company".to_string(),
        location: location.to_string(),
        industry: industry.to_string(),
        asking_price: price,
        annual_revenue: revenue,
        cash_flow: 200_000,
        ebitda: 180_000,
        employees: 10,
        year_established: Some(2010),
    }
}

fn preferences() -> InvestorPreferences {
    InvestorPreferences {
        user_id: "investor_1".to_string(),
        capital_min: 400_000,
        capital_max: 600_000,
        target_income: 150_000,
        risk_tolerance: "medium".to_string(),
        involvement: "hands-on".to_string(),
        location: "Austin, TX".to_string(),
        industries: vec!["Technology".to_string()],
        business_size: "6-15".to_string(),
        payback_period_years: 5,
    }
}

#[test]
fn test_location_houston_abbreviation() {
    assert!(locations_match("Houston, TX", "Houston, Texas"));
}

#[test]
fn test_location_different_cities() {
    assert!(!locations_match("Austin, TX", "Houston, TX"));
}

#[test]
fn test_location_state_substring() {
    assert!(locations_match("Denver, CO", "CO"));
}

#[test]
fn test_location_abbrev_both_directions() {
    assert!(locations_match("Portland, Oregon", "Portland, OR"));
    assert!(locations_match("Portland, OR", "Portland, Oregon"));
}

#[test]
fn test_worked_example_scores_82() {
    let scorer = HeuristicScorer::default();
    let breakdown = scorer.breakdown(
        &business("b1", 500_000, 1_200_000, "Technology", "Austin, TX"),
        &preferences(),
    );

    assert_eq!(breakdown.score, 82);
    assert_eq!(breakdown.factors.price_match, 90);
    assert_eq!(breakdown.factors.industry_fit, 85);
    assert_eq!(breakdown.factors.financial_health, 80);
    assert_eq!(breakdown.factors.location_score, 80);
}

#[test]
fn test_score_bounded_for_extreme_inputs() {
    let scorer = HeuristicScorer::default();

    let worst = scorer.breakdown(
        &business("b1", 50_000_000, 1, "Mining", "Fairbanks, AK"),
        &preferences(),
    );
    let best = scorer.breakdown(
        &business("b2", 500_000, 10_000_000, "Technology", "Austin, TX"),
        &preferences(),
    );

    assert!(worst.score <= 100);
    assert!(best.score <= 100);
    assert!(best.score > worst.score);
}

#[test]
fn test_scorer_deterministic_across_calls() {
    let scorer = HeuristicScorer::default();
    let b = business("b1", 450_000, 900_000, "Retail", "Dallas, TX");
    let p = preferences();

    let first = scorer.breakdown(&b, &p);
    for _ in 0..10 {
        let again = scorer.breakdown(&b, &p);
        assert_eq!(first.score, again.score);
        assert_eq!(first.factors, again.factors);
    }
}

#[test]
fn test_custom_weights_shift_composite() {
    let price_heavy = HeuristicScorer::new(ScoringWeights {
        price: 1.0,
        industry: 0.0,
        financial: 0.0,
        location: 0.0,
        risk: 0.0,
        involvement: 0.0,
    });

    let in_range = price_heavy.breakdown(
        &business("b1", 500_000, 1_200_000, "Technology", "Austin, TX"),
        &preferences(),
    );
    let out_of_range = price_heavy.breakdown(
        &business("b2", 5_000_000, 1_200_000, "Technology", "Austin, TX"),
        &preferences(),
    );

    assert_eq!(in_range.score, 90);
    assert_eq!(out_of_range.score, 20);
}

#[test]
fn test_reasoning_names_driving_factors() {
    let scorer = HeuristicScorer::default();
    let breakdown = scorer.breakdown(
        &business("b1", 500_000, 1_200_000, "Technology", "Austin, TX"),
        &preferences(),
    );

    assert!(breakdown.reasoning.contains("within"));
    assert!(breakdown.reasoning.contains("preferred industry"));
}

#[test]
fn test_filter_price_and_location_combined() {
    let catalog = vec![
        business("1", 500_000, 1_000_000, "Technology", "Austin, TX"),
        business("2", 2_000_000, 4_000_000, "Technology", "Austin, TX"),
        business("3", 500_000, 1_000_000, "Technology", "Portland, OR"),
    ];

    let criteria = FilterCriteria {
        price_max: Some(1_000_000),
        location: Some("austin".to_string()),
        ..Default::default()
    };

    let result = filter_listings(catalog, &criteria);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "1");
}

#[test]
fn test_filter_employee_bucket_open_ended() {
    let mut big = business("1", 500_000, 1_000_000, "Manufacturing", "Austin, TX");
    big.employees = 300;

    let criteria = FilterCriteria {
        employees: Some(EmployeeBucket::Large),
        ..Default::default()
    };

    let result = filter_listings(vec![big], &criteria);
    assert_eq!(result.len(), 1);
}

#[test]
fn test_free_text_or_semantics() {
    let b = business("1", 500_000, 1_000_000, "Food & Beverage", "Boise, ID");

    // Hits industry only
    assert!(matches_free_text(&b, "beverage"));
    // Hits location only
    assert!(matches_free_text(&b, "boise"));
    // Hits nothing
    assert!(!matches_free_text(&b, "aerospace"));
}

#[test]
fn test_absent_criteria_mean_no_constraint() {
    let catalog = vec![
        business("1", 1, 1, "A", "X, WY"),
        business("2", i64::MAX, i64::MAX, "B", "Y, WY"),
    ];

    assert_eq!(filter_listings(catalog, &FilterCriteria::default()).len(), 2);
}
