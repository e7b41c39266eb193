//! Multi-predicate filtering over institution collections.
//!
//! Regular filters compose with AND. Special-needs search is the one
//! documented exception: its support predicates compose with OR, so a
//! school matches when it offers *any* of the requested kinds of support.

use serde::{Deserialize, Serialize};

use crate::models::{Institution, InstitutionType, SupportProfile};

/// Optional predicates, AND-composed. An empty set matches everything.
/// Evaluation order never changes the result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub institution_type: Option<InstitutionType>,

    /// Case-insensitive substring match on the city name.
    pub city: Option<String>,

    /// Case-insensitive substring match on the institution name.
    pub name: Option<String>,

    pub min_rating: Option<f64>,

    pub bilingual: Option<bool>,

    pub international: Option<bool>,

    pub offers_english: Option<bool>,
}

impl Filters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.institution_type.is_none()
            && self.city.is_none()
            && self.name.is_none()
            && self.min_rating.is_none()
            && self.bilingual.is_none()
            && self.international.is_none()
            && self.offers_english.is_none()
    }

    #[must_use]
    pub fn matches(&self, institution: &Institution) -> bool {
        if let Some(ty) = self.institution_type
            && institution.institution_type != ty
        {
            return false;
        }

        if let Some(city) = &self.city
            && !contains_ci(&institution.city, city)
        {
            return false;
        }

        if let Some(name) = &self.name
            && !contains_ci(&institution.name, name)
        {
            return false;
        }

        if let Some(min_rating) = self.min_rating {
            // Unrated institutions never satisfy a rating floor.
            match institution.rating {
                Some(rating) if rating >= min_rating => {}
                _ => return false,
            }
        }

        if let Some(bilingual) = self.bilingual
            && institution.is_bilingual != bilingual
        {
            return false;
        }

        if let Some(international) = self.international
            && institution.is_international != international
        {
            return false;
        }

        if let Some(offers_english) = self.offers_english
            && institution.offers_english != offers_english
        {
            return false;
        }

        true
    }

    pub fn apply(&self, institutions: impl IntoIterator<Item = Institution>) -> Vec<Institution> {
        institutions
            .into_iter()
            .filter(|i| self.matches(i))
            .collect()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// The kinds of support a special-needs search can request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportNeeds {
    pub dyslexia: bool,
    pub adhd: bool,
    pub autism: bool,
    pub gifted: bool,
    pub wheelchair_accessible: bool,
    pub speech_therapy: bool,
}

impl SupportNeeds {
    #[must_use]
    pub const fn any_requested(&self) -> bool {
        self.dyslexia
            || self.adhd
            || self.autism
            || self.gifted
            || self.wheelchair_accessible
            || self.speech_therapy
    }

    /// OR across the requested flags. This asymmetry with the AND filters
    /// above is deliberate: accessibility search maximizes recall.
    #[must_use]
    pub const fn matches(&self, profile: &SupportProfile) -> bool {
        (self.dyslexia && profile.dyslexia)
            || (self.adhd && profile.adhd)
            || (self.autism && profile.autism)
            || (self.gifted && profile.gifted)
            || (self.wheelchair_accessible && profile.wheelchair_accessible)
            || (self.speech_therapy && profile.speech_therapy)
    }
}
