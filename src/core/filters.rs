use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{CareType, Language, SearchProfile, ServiceFlags, UserKind};

/// Attribute constraints taken from the query string.
#[derive(Debug, Clone, Default)]
pub struct AttributeFilters {
    pub city: Option<String>,
    pub care_types: Vec<CareType>,
    pub services: ServiceFlags,
    pub tarif_max: Option<f64>,
    pub diploma: Option<String>,
}

/// Whether a profile may appear in search results for the given viewer.
///
/// Test accounts never show up. `visibility.global` gates everyone; the
/// per-kind flag additionally gates logged-in viewers of that kind.
#[inline]
pub fn visible_to<P: SearchProfile>(profile: &P, viewer_kind: Option<UserKind>) -> bool {
    if profile.is_test() || !profile.visibility().global {
        return false;
    }

    match viewer_kind {
        None => true,
        Some(UserKind::Famille) => profile.visibility().family,
        Some(UserKind::Prestataire) => profile.visibility().prestataire,
    }
}

/// Whether a profile clears the premium gate at `now`.
#[inline]
pub fn passes_plan_gate<P: SearchProfile>(
    profile: &P,
    allow_basic_plan: bool,
    now: DateTime<Utc>,
) -> bool {
    allow_basic_plan || profile.is_premium_at(now)
}

/// Whether a profile satisfies every requested attribute constraint.
pub fn matches_attributes<P: SearchProfile>(profile: &P, filters: &AttributeFilters) -> bool {
    if let Some(city) = &filters.city {
        match profile.city() {
            Some(profile_city) if profile_city.eq_ignore_ascii_case(city) => {}
            _ => return false,
        }
    }

    // Any overlap with the requested care types is enough
    if !filters.care_types.is_empty()
        && !filters
            .care_types
            .iter()
            .any(|t| profile.care_types().contains(t))
    {
        return false;
    }

    if !satisfies_services(profile.services(), filters.services) {
        return false;
    }

    if let Some(tarif_max) = filters.tarif_max {
        match profile.tarif() {
            Some(tarif) if tarif <= tarif_max => {}
            _ => return false,
        }
    }

    if let Some(diploma) = &filters.diploma {
        match profile.diploma() {
            Some(profile_diploma) if profile_diploma.eq_ignore_ascii_case(diploma) => {}
            _ => return false,
        }
    }

    true
}

/// Every flag requested must be set on the profile.
#[inline]
fn satisfies_services(offered: ServiceFlags, requested: ServiceFlags) -> bool {
    (!requested.animaux || offered.animaux)
        && (!requested.cuisine || offered.cuisine)
        && (!requested.devoirs || offered.devoirs)
        && (!requested.menage || offered.menage)
        && (!requested.non_fumeur || offered.non_fumeur)
        && (!requested.permis || offered.permis)
        && (!requested.psc1 || offered.psc1)
}

/// Language filter with OR semantics: one shared language is enough.
#[inline]
pub fn speaks_any(spoken: &[Language], requested: &[Language]) -> bool {
    requested.iter().any(|l| spoken.contains(l))
}

/// Birthday range filter (both bounds inclusive, either optional).
#[inline]
pub fn birthday_in_range(
    birthday: Option<NaiveDate>,
    after: Option<NaiveDate>,
    before: Option<NaiveDate>,
) -> bool {
    if after.is_none() && before.is_none() {
        return true;
    }

    let Some(birthday) = birthday else {
        return false;
    };

    after.map_or(true, |a| birthday >= a) && before.map_or(true, |b| birthday <= b)
}
