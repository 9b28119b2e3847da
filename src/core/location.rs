/// Two-letter postal abbreviation to full state name, lowercase
const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("al", "alabama"),
    ("ak", "alaska"),
    ("az", "arizona"),
    ("ar", "arkansas"),
    ("ca", "california"),
    ("co", "colorado"),
    ("ct", "connecticut"),
    ("de", "delaware"),
    ("dc", "district of columbia"),
    ("fl", "florida"),
    ("ga", "georgia"),
    ("hi", "hawaii"),
    ("id", "idaho"),
    ("il", "illinois"),
    ("in", "indiana"),
    ("ia", "iowa"),
    ("ks", "kansas"),
    ("ky", "kentucky"),
    ("la", "louisiana"),
    ("me", "maine"),
    ("md", "maryland"),
    ("ma", "massachusetts"),
    ("mi", "michigan"),
    ("mn", "minnesota"),
    ("ms", "mississippi"),
    ("mo", "missouri"),
    ("mt", "montana"),
    ("ne", "nebraska"),
    ("nv", "nevada"),
    ("nh", "new hampshire"),
    ("nj", "new jersey"),
    ("nm", "new mexico"),
    ("ny", "new york"),
    ("nc", "north carolina"),
    ("nd", "north dakota"),
    ("oh", "ohio"),
    ("ok", "oklahoma"),
    ("or", "oregon"),
    ("pa", "pennsylvania"),
    ("ri", "rhode island"),
    ("sc", "south carolina"),
    ("sd", "south dakota"),
    ("tn", "tennessee"),
    ("tx", "texas"),
    ("ut", "utah"),
    ("vt", "vermont"),
    ("va", "virginia"),
    ("wa", "washington"),
    ("wv", "west virginia"),
    ("wi", "wisconsin"),
    ("wy", "wyoming"),
];

/// Check whether a listing's location satisfies a preferred location
///
/// Both inputs are free-form "City, State" strings. Matching is
/// case-insensitive: direct substring containment in either direction
/// counts, otherwise both strings are split on the first comma and
/// compared city-to-city and state-to-state, with two-letter postal
/// abbreviations treated as equivalent to full state names.
pub fn locations_match(business_location: &str, preferred_location: &str) -> bool {
    let business = business_location.trim().to_lowercase();
    let preferred = preferred_location.trim().to_lowercase();

    if business.is_empty() || preferred.is_empty() {
        return false;
    }

    // Direct containment either way, e.g. "Denver, CO" vs "CO"
    if business.contains(&preferred) || preferred.contains(&business) {
        return true;
    }

    let (business_city, business_state) = split_city_state(&business);
    let (preferred_city, preferred_state) = split_city_state(&preferred);

    if business_city != preferred_city {
        return false;
    }

    states_equivalent(business_state, preferred_state)
}

/// Split "City, State" on the first comma; no comma means no state part
#[inline]
fn split_city_state(location: &str) -> (&str, &str) {
    match location.split_once(',') {
        Some((city, state)) => (city.trim(), state.trim()),
        None => (location.trim(), ""),
    }
}

/// Compare two lowercase state strings, resolving postal abbreviations
#[inline]
fn states_equivalent(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    expand_state(a) == expand_state(b)
}

/// Map a postal abbreviation to its full name; pass anything else through
#[inline]
fn expand_state(state: &str) -> &str {
    STATE_ABBREVIATIONS
        .iter()
        .find(|(abbrev, _)| *abbrev == state)
        .map_or(state, |(_, full)| *full)
}
