use crate::models::{Business, FilterCriteria};

/// Apply every present criterion to a single listing
///
/// Criteria are independent predicates ANDed together; an absent criterion
/// places no constraint on its dimension. Predicate order never changes the
/// result set, only how early a listing is rejected.
#[inline]
pub fn matches_criteria(business: &Business, criteria: &FilterCriteria) -> bool {
    if let Some(min) = criteria.price_min {
        if business.asking_price < min {
            return false;
        }
    }
    if let Some(max) = criteria.price_max {
        if business.asking_price > max {
            return false;
        }
    }

    if let Some(min) = criteria.revenue_min {
        if business.annual_revenue < min {
            return false;
        }
    }
    if let Some(max) = criteria.revenue_max {
        if business.annual_revenue > max {
            return false;
        }
    }

    if let Some(location) = &criteria.location {
        if !contains_ignore_case(&business.location, location) {
            return false;
        }
    }

    if let Some(industries) = &criteria.industries {
        if !industries.is_empty()
            && !industries
                .iter()
                .any(|i| i.eq_ignore_ascii_case(&business.industry))
        {
            return false;
        }
    }

    if let Some(bucket) = criteria.employees {
        if !bucket.contains(business.employees) {
            return false;
        }
    }

    if let Some(query) = &criteria.query {
        if !matches_free_text(business, query) {
            return false;
        }
    }

    true
}

/// Free-text match: OR across name, description, industry and location
#[inline]
pub fn matches_free_text(business: &Business, query: &str) -> bool {
    contains_ignore_case(&business.name, query)
        || contains_ignore_case(&business.description, query)
        || contains_ignore_case(&business.industry, query)
        || contains_ignore_case(&business.location, query)
}

#[inline]
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Filter a catalog slice down to the listings satisfying the criteria
pub fn filter_listings(catalog: Vec<Business>, criteria: &FilterCriteria) -> Vec<Business> {
    catalog
        .into_iter()
        .filter(|business| matches_criteria(business, criteria))
        .collect()
}
