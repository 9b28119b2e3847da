use serde::{Deserialize, Serialize};

/// Business-for-sale listing supplied by the catalog collaborator
///
/// Treated as read-only input by the ranking engine; the catalog owns
/// the record lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form "City, State" string
    pub location: String,
    pub industry: String,
    #[serde(rename = "askingPrice")]
    pub asking_price: i64,
    #[serde(rename = "annualRevenue")]
    pub annual_revenue: i64,
    #[serde(rename = "cashFlow", default)]
    pub cash_flow: i64,
    #[serde(default)]
    pub ebitda: i64,
    #[serde(default)]
    pub employees: u32,
    #[serde(rename = "yearEstablished", default)]
    pub year_established: Option<i32>,
}

impl Business {
    /// Asking price as a multiple of annual revenue, guarding division by zero
    pub fn revenue_multiple(&self) -> f64 {
        self.asking_price as f64 / self.annual_revenue.max(1) as f64
    }
}

/// Sentinel value for "no location preference"
pub const ANY_LOCATION: &str = "any";

/// An investor's acquisition preferences, one record per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorPreferences {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "capitalMin")]
    pub capital_min: i64,
    #[serde(rename = "capitalMax")]
    pub capital_max: i64,
    #[serde(rename = "targetIncome", default)]
    pub target_income: i64,
    #[serde(rename = "riskTolerance")]
    pub risk_tolerance: String,
    pub involvement: String,
    /// Preferred location, or the "any" sentinel
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(rename = "businessSize", default)]
    pub business_size: String,
    #[serde(rename = "paybackPeriodYears", default)]
    pub payback_period_years: u16,
}

fn default_location() -> String {
    ANY_LOCATION.to_string()
}

impl InvestorPreferences {
    /// True when the investor has no location constraint
    pub fn any_location(&self) -> bool {
        self.location.is_empty() || self.location.eq_ignore_ascii_case(ANY_LOCATION)
    }

    /// Inclusive capital range check on an asking price
    pub fn capital_range_contains(&self, asking_price: i64) -> bool {
        asking_price >= self.capital_min && asking_price <= self.capital_max
    }

    pub fn wants_industry(&self, industry: &str) -> bool {
        self.industries.iter().any(|i| i.eq_ignore_ascii_case(industry))
    }
}

/// The six named compatibility sub-scores, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorMap {
    #[serde(rename = "priceMatch")]
    pub price_match: u8,
    #[serde(rename = "industryFit")]
    pub industry_fit: u8,
    #[serde(rename = "riskAlignment")]
    pub risk_alignment: u8,
    #[serde(rename = "involvementFit")]
    pub involvement_fit: u8,
    #[serde(rename = "locationScore")]
    pub location_score: u8,
    #[serde(rename = "financialHealth")]
    pub financial_health: u8,
}

/// Result of scoring a single (business, preferences) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub reasoning: String,
    pub factors: FactorMap,
}

/// Persisted compatibility score, unique per (user, business) pair
///
/// The listing's location is denormalized onto the row so cached result
/// sets can be location-filtered without refetching the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessScore {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "businessId")]
    pub business_id: String,
    #[serde(rename = "businessLocation", default)]
    pub business_location: String,
    pub score: u8,
    pub reasoning: String,
    pub factors: FactorMap,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl BusinessScore {
    pub fn from_breakdown(user_id: &str, business: &Business, breakdown: ScoreBreakdown) -> Self {
        Self {
            user_id: user_id.to_string(),
            business_id: business.id.clone(),
            business_location: business.location.clone(),
            score: breakdown.score,
            reasoning: breakdown.reasoning,
            factors: breakdown.factors,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Employee headcount buckets used by the search pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeBucket {
    #[serde(rename = "1-5")]
    Tiny,
    #[serde(rename = "6-15")]
    Small,
    #[serde(rename = "16-50")]
    Medium,
    #[serde(rename = "50+")]
    Large,
}

impl EmployeeBucket {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "1-5" => Some(Self::Tiny),
            "6-15" => Some(Self::Small),
            "16-50" => Some(Self::Medium),
            "50+" => Some(Self::Large),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Tiny => "1-5",
            Self::Small => "6-15",
            Self::Medium => "16-50",
            Self::Large => "50+",
        }
    }

    /// Inclusive headcount bounds; the top bucket is open-ended
    pub fn bounds(&self) -> (u32, Option<u32>) {
        match self {
            Self::Tiny => (1, Some(5)),
            Self::Small => (6, Some(15)),
            Self::Medium => (16, Some(50)),
            Self::Large => (50, None),
        }
    }

    pub fn contains(&self, employees: u32) -> bool {
        let (lo, hi) = self.bounds();
        employees >= lo && hi.map_or(true, |h| employees <= h)
    }
}

/// Multi-criteria listing filter; every present criterion must hold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(rename = "priceMin", default)]
    pub price_min: Option<i64>,
    #[serde(rename = "priceMax", default)]
    pub price_max: Option<i64>,
    #[serde(rename = "revenueMin", default)]
    pub revenue_min: Option<i64>,
    #[serde(rename = "revenueMax", default)]
    pub revenue_max: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub employees: Option<EmployeeBucket>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Weights applied to the heuristic factor map
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub price: f64,
    pub industry: f64,
    pub financial: f64,
    pub location: f64,
    pub risk: f64,
    pub involvement: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 0.30,
            industry: 0.25,
            financial: 0.20,
            location: 0.15,
            risk: 0.05,
            involvement: 0.05,
        }
    }
}
