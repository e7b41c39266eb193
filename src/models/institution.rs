use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// All education types served by the unified institution record, from
/// childcare (0-4 years) through research universities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionType {
    Childcare,
    Primary,
    Secondary,
    /// Vocational education (MBO).
    Mbo,
    /// Universities of applied sciences (HBO).
    Hbo,
    University,
}

impl InstitutionType {
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Childcare,
            Self::Primary,
            Self::Secondary,
            Self::Mbo,
            Self::Hbo,
            Self::University,
        ]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Childcare => "childcare",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Mbo => "mbo",
            Self::Hbo => "hbo",
            Self::University => "university",
        }
    }
}

impl fmt::Display for InstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstitutionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "childcare" => Ok(Self::Childcare),
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "mbo" => Ok(Self::Mbo),
            "hbo" => Ok(Self::Hbo),
            "university" => Ok(Self::University),
            other => Err(format!("unknown institution type '{other}'")),
        }
    }
}

/// An education institution record as supplied by the institution store.
///
/// Read-only input: the search core never mutates these. The `details` map
/// carries type-specific data (LRK numbers for childcare, BRIN codes and
/// CITO scores for schools, program lists for MBO/HBO/universities) and is
/// passed through verbatim, never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub id: i64,

    pub institution_type: InstitutionType,

    pub name: String,

    pub city: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub postal_code: Option<String>,

    /// Absent for records the ingestion pipeline could not geocode.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// Quality rating on a 0-10 scale (Inspectorate / GGD).
    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub is_bilingual: bool,

    #[serde(default)]
    pub is_international: bool,

    #[serde(default)]
    pub offers_english: bool,

    /// Opaque type-specific detail map, stored and served verbatim.
    #[serde(default)]
    pub details: serde_json::Value,

    #[serde(default)]
    pub description: Option<String>,
}

/// Accessibility and support flags for an institution, kept separate from
/// the institution record (the store maintains them per id).
///
/// Special-needs search composes these with OR on purpose: parents looking
/// for support want every school that offers any of the requested kinds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportProfile {
    pub dyslexia: bool,
    pub adhd: bool,
    pub autism: bool,
    pub gifted: bool,
    pub wheelchair_accessible: bool,
    pub speech_therapy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn institution_type_round_trips_through_str() {
        for ty in InstitutionType::all() {
            assert_eq!(ty.as_str().parse::<InstitutionType>(), Ok(ty));
        }
    }

    #[test]
    fn institution_type_rejects_unknown() {
        assert!("gymnasium".parse::<InstitutionType>().is_err());
    }

    #[test]
    fn institution_deserializes_with_minimal_fields() {
        let json = serde_json::json!({
            "id": 1,
            "institution_type": "primary",
            "name": "De Regenboog",
            "city": "Utrecht"
        });
        let inst: Institution = serde_json::from_value(json).unwrap();
        assert!(inst.coordinates.is_none());
        assert!(inst.details.is_null());
        assert!(!inst.is_bilingual);
    }
}
