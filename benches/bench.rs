// Criterion benchmarks for DealMatch Algo

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dealmatch_algo::core::{filter_listings, locations_match, HeuristicScorer};
use dealmatch_algo::models::{Business, EmployeeBucket, FilterCriteria, InvestorPreferences};

const INDUSTRIES: &[&str] = &[
    "Technology",
    "Manufacturing",
    "Retail",
    "Healthcare",
    "Logistics",
];

const CITIES: &[&str] = &[
    "Austin, TX",
    "Houston, TX",
    "Denver, CO",
    "Portland, OR",
    "Nashville, TN",
];

fn create_listing(id: usize) -> Business {
    Business {
        id: id.to_string(),
        name: format!("Business {}", id),
        description: "Established operation with recurring revenue".to_string(),
        location: CITIES[id % CITIES.len()].to_string(),
        industry: INDUSTRIES[id % INDUSTRIES.len()].to_string(),
        asking_price: 250_000 + (id as i64 % 20) * 50_000,
        annual_revenue: 400_000 + (id as i64 % 10) * 100_000,
        cash_flow: 120_000,
        ebitda: 100_000,
        employees: 2 + (id as u32 % 60),
        year_established: Some(2000 + (id as i32 % 20)),
    }
}

fn create_preferences() -> InvestorPreferences {
    InvestorPreferences {
        user_id: "current_user".to_string(),
        capital_min: 400_000,
        capital_max: 900_000,
        target_income: 150_000,
        risk_tolerance: "medium".to_string(),
        involvement: "hands-on".to_string(),
        location: "Austin, TX".to_string(),
        industries: vec!["Technology".to_string(), "Healthcare".to_string()],
        business_size: "6-15".to_string(),
        payback_period_years: 5,
    }
}

fn bench_location_match(c: &mut Criterion) {
    c.bench_function("locations_match", |b| {
        b.iter(|| {
            locations_match(
                black_box("Houston, TX"),
                black_box("Houston, Texas"),
            )
        });
    });
}

fn bench_heuristic_scoring(c: &mut Criterion) {
    let scorer = HeuristicScorer::default();
    let preferences = create_preferences();
    let business = create_listing(42);

    c.bench_function("heuristic_breakdown", |b| {
        b.iter(|| scorer.breakdown(black_box(&business), black_box(&preferences)));
    });
}

fn bench_batch_scoring(c: &mut Criterion) {
    let scorer = HeuristicScorer::default();
    let preferences = create_preferences();

    let mut group = c.benchmark_group("scoring");

    for listing_count in [10, 50, 100, 500, 1000].iter() {
        let listings: Vec<Business> = (0..*listing_count).map(create_listing).collect();

        group.bench_with_input(
            BenchmarkId::new("score_batch", listing_count),
            listing_count,
            |b, _| {
                b.iter(|| {
                    let mut scores: Vec<_> = listings
                        .iter()
                        .map(|l| scorer.breakdown(black_box(l), black_box(&preferences)))
                        .collect();
                    scores.sort_by(|a, b| b.score.cmp(&a.score));
                    black_box(scores)
                });
            },
        );
    }

    group.finish();
}

fn bench_filtering_pipeline(c: &mut Criterion) {
    let listings: Vec<Business> = (0..100).map(create_listing).collect();
    let criteria = FilterCriteria {
        price_min: Some(300_000),
        price_max: Some(1_000_000),
        revenue_min: Some(500_000),
        revenue_max: None,
        location: Some("TX".to_string()),
        industries: Some(vec!["Technology".to_string(), "Retail".to_string()]),
        employees: Some(EmployeeBucket::Small),
        query: Some("recurring".to_string()),
    };

    c.bench_function("filtering_pipeline_100_listings", |b| {
        b.iter(|| filter_listings(black_box(listings.clone()), black_box(&criteria)));
    });
}

criterion_group!(
    benches,
    bench_location_match,
    bench_heuristic_scoring,
    bench_batch_scoring,
    bench_filtering_pipeline
);

criterion_main!(benches);
