//! Pure filter/search/reveal derivation over the in-memory catalog.
//!
//! `apply` has no side effects and is cheap enough (one linear pass over a
//! few hundred records) to recompute on every request.

use std::str::FromStr;

use crate::models::Country;

/// Fixed region vocabulary offered by the filter UI. "All" disables the
/// region predicate; the rest are matched exactly, case-sensitive.
pub const REGIONS: [&str; 6] = ["All", "Africa", "Americas", "Asia", "Europe", "Oceania"];

/// How many more entries each "Load More" click reveals.
pub const REVEAL_STEP: usize = 10;

const SMALL_LIMIT: u64 = 10_000_000;
const LARGE_LIMIT: u64 = 50_000_000;

/// Population size classes. The medium band is inclusive on both ends, so
/// exactly 10,000,000 is medium (not small) and exactly 50,000,000 is
/// medium (not large).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PopulationBucket {
    #[default]
    All,
    Small,
    Medium,
    Large,
}

impl PopulationBucket {
    pub fn matches(self, population: u64) -> bool {
        match self {
            Self::All => true,
            Self::Small => population < SMALL_LIMIT,
            Self::Medium => (SMALL_LIMIT..=LARGE_LIMIT).contains(&population),
            Self::Large => population > LARGE_LIMIT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for PopulationBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown population bucket: {other}")),
        }
    }
}

/// User-entered filter state, as decoded from the list page's query string.
#[derive(Debug, Clone)]
pub struct FilterState {
    /// Case-insensitive substring match against the common name.
    pub query: String,
    /// "All" or an exact region name.
    pub region: String,
    pub bucket: PopulationBucket,
    /// Number of matches currently revealed; grows by `REVEAL_STEP`.
    pub reveal: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            region: "All".to_string(),
            bucket: PopulationBucket::All,
            reveal: REVEAL_STEP,
        }
    }
}

pub struct FilterOutcome<'a> {
    /// First `reveal` entries of the filtered sequence, original order.
    pub displayed: Vec<&'a Country>,
    /// Total number of matches before the reveal cut.
    pub matched: usize,
}

/// Derives the visible subset. All predicates are conjunctive and the
/// catalog order is preserved.
pub fn apply<'a>(countries: &'a [Country], filter: &FilterState) -> FilterOutcome<'a> {
    let needle = filter.query.to_lowercase();

    let mut displayed: Vec<&Country> = countries
        .iter()
        .filter(|country| {
            country.name.common.to_lowercase().contains(&needle)
                && (filter.region == "All" || country.region == filter.region)
                && filter.bucket.matches(country.population)
        })
        .collect();

    let matched = displayed.len();
    displayed.truncate(filter.reveal);
    FilterOutcome { displayed, matched }
}
