use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{
    distance::{calculate_bounding_box, is_close_enough, is_within_bounding_box},
    filters::{matches_attributes, passes_plan_gate, speaks_any, visible_to, AttributeFilters},
};
use crate::models::{Famille, Geolocation, Language, Prestataire, SearchProfile, UserKind};

/// Search-layer tuning knobs, loaded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    /// Let basic-plan profiles appear in search results.
    pub allow_basic_plan: bool,
    /// Radius applied when filtering by a geocoded postal code.
    pub postal_code_distance_km: f64,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            allow_basic_plan: false,
            postal_code_distance_km: 20.0,
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Result ordering requested through `order_by`.
///
/// `geolocation` is accepted for compatibility with older clients and maps
/// to storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    RatingDesc,
    UpdatedAt,
    UpdatedAtDesc,
    Storage,
}

impl OrderBy {
    pub fn parse(value: &str) -> Option<OrderBy> {
        match value {
            "-rating" => Some(OrderBy::RatingDesc),
            "updated_at" => Some(OrderBy::UpdatedAt),
            "-updated_at" => Some(OrderBy::UpdatedAtDesc),
            "geolocation" => Some(OrderBy::Storage),
            _ => None,
        }
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        OrderBy::Storage
    }
}

/// Resolved distance constraint: an origin point and a radius.
///
/// Built by the handler from either a geocoded postal code or the viewer's
/// own geolocation; absent when neither applies (including when geocoding
/// the postal code failed).
#[derive(Debug, Clone, Copy)]
pub struct DistanceFilter {
    pub origin: Geolocation,
    pub radius_km: f64,
}

/// Constraints shared by both search kinds.
#[derive(Debug, Clone, Default)]
pub struct ProfileQuery {
    pub viewer_kind: Option<UserKind>,
    pub attributes: AttributeFilters,
    pub distance: Option<DistanceFilter>,
    pub order_by: OrderBy,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Famille search: adds the children-count filter.
#[derive(Debug, Clone, Default)]
pub struct FamilleQuery {
    pub base: ProfileQuery,
    pub nb_enfants: Option<usize>,
}

/// Prestataire search: adds language and birthday filters.
#[derive(Debug, Clone, Default)]
pub struct PrestataireQuery {
    pub base: ProfileQuery,
    pub languages: Vec<Language>,
    pub birthday_after: Option<NaiveDate>,
    pub birthday_before: Option<NaiveDate>,
}

/// Result of a search: one page plus the pre-pagination total.
#[derive(Debug)]
pub struct SearchOutcome<T> {
    pub results: Vec<T>,
    pub total: usize,
}

/// Search orchestrator - runs the staged filter chain over candidates.
///
/// # Pipeline stages
/// 1. Visibility (viewer-kind flags, test accounts)
/// 2. Plan gate (premium unless basic plans are allowed)
/// 3. Attribute constraints from the query string
/// 4. Kind-specific filters (children count / languages / birthday)
/// 5. Distance (bounding-box pre-filter, then exact great-circle check)
/// 6. Ordering and pagination
#[derive(Debug, Clone)]
pub struct SearchEngine {
    settings: SearchSettings,
}

impl SearchEngine {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run the famille search pipeline.
    pub fn search_familles(
        &self,
        query: &FamilleQuery,
        candidates: Vec<Famille>,
    ) -> SearchOutcome<Famille> {
        self.search_familles_at(query, candidates, Utc::now())
    }

    /// Like `search_familles`, with an explicit clock.
    pub fn search_familles_at(
        &self,
        query: &FamilleQuery,
        candidates: Vec<Famille>,
        now: DateTime<Utc>,
    ) -> SearchOutcome<Famille> {
        let mut kept: Vec<Famille> = candidates
            .into_iter()
            .filter(|p| self.passes_common_stages(p, &query.base, now))
            .filter(|p| match query.nb_enfants {
                Some(n) => p.enfants.len() == n,
                None => true,
            })
            .filter(|p| passes_distance(p, query.base.distance))
            .collect();

        self.finish(&mut kept, &query.base)
    }

    /// Run the prestataire search pipeline.
    pub fn search_prestataires(
        &self,
        query: &PrestataireQuery,
        candidates: Vec<Prestataire>,
    ) -> SearchOutcome<Prestataire> {
        self.search_prestataires_at(query, candidates, Utc::now())
    }

    /// Like `search_prestataires`, with an explicit clock.
    pub fn search_prestataires_at(
        &self,
        query: &PrestataireQuery,
        candidates: Vec<Prestataire>,
        now: DateTime<Utc>,
    ) -> SearchOutcome<Prestataire> {
        let mut kept: Vec<Prestataire> = candidates
            .into_iter()
            .filter(|p| self.passes_common_stages(p, &query.base, now))
            .filter(|p| query.languages.is_empty() || speaks_any(&p.languages, &query.languages))
            .filter(|p| {
                crate::core::filters::birthday_in_range(
                    p.birthday,
                    query.birthday_after,
                    query.birthday_before,
                )
            })
            .filter(|p| passes_distance(p, query.base.distance))
            .collect();

        self.finish(&mut kept, &query.base)
    }

    #[inline]
    fn passes_common_stages<P: SearchProfile>(
        &self,
        profile: &P,
        base: &ProfileQuery,
        now: DateTime<Utc>,
    ) -> bool {
        visible_to(profile, base.viewer_kind)
            && passes_plan_gate(profile, self.settings.allow_basic_plan, now)
            && matches_attributes(profile, &base.attributes)
    }

    fn finish<P: SearchProfile>(
        &self,
        kept: &mut Vec<P>,
        base: &ProfileQuery,
    ) -> SearchOutcome<P>
    where
        P: Clone,
    {
        apply_ordering(kept, base.order_by);

        let total = kept.len();
        let limit = base
            .limit
            .unwrap_or(self.settings.default_limit)
            .min(self.settings.max_limit);

        let results: Vec<P> = kept
            .iter()
            .skip(base.offset)
            .take(limit)
            .cloned()
            .collect();

        SearchOutcome { results, total }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

/// Distance stage: profiles without a geolocation always pass, the rest
/// must fall within the radius. The bounding box screens out the obvious
/// misses before the exact check.
#[inline]
fn passes_distance<P: SearchProfile>(profile: &P, filter: Option<DistanceFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };

    let Some(geoloc) = profile.geolocation() else {
        return true;
    };

    let bbox = calculate_bounding_box(filter.origin.lat, filter.origin.lon, filter.radius_km);
    if !is_within_bounding_box(geoloc.lat, geoloc.lon, &bbox) {
        return false;
    }

    is_close_enough(&filter.origin, &geoloc, filter.radius_km)
}

fn apply_ordering<P: SearchProfile>(profiles: &mut [P], order_by: OrderBy) {
    match order_by {
        OrderBy::RatingDesc => {
            profiles.sort_by(|a, b| {
                b.total_rating()
                    .partial_cmp(&a.total_rating())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        OrderBy::UpdatedAt => profiles.sort_by_key(|p| p.updated_at()),
        OrderBy::UpdatedAtDesc => {
            profiles.sort_by_key(|p| std::cmp::Reverse(p.updated_at()));
        }
        OrderBy::Storage => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Plan, ServiceFlags, Visibility};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn prestataire(id: i32, lat: f64, lon: f64) -> Prestataire {
        Prestataire {
            id,
            first_name: format!("Presta {}", id),
            name: "Test".to_string(),
            email: format!("presta{}@example.org", id),
            tel: None,
            tel_visible: false,
            street: None,
            city: Some("Paris".to_string()),
            postal_code: Some("75011".to_string()),
            country: "France".to_string(),
            description: None,
            birthday: None,
            nationality: None,
            tarif: Some(10.0),
            diploma: None,
            languages: vec![Language::English],
            care_types: vec![],
            services: ServiceFlags::default(),
            plan: Plan::Premium,
            plan_expires_at: None,
            visibility: Visibility::default(),
            is_test: false,
            geolocation: Some(Geolocation { lat, lon }),
            total_rating: 0.0,
            plannings: vec![],
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[test]
    fn test_premium_gate_filters_basic_profiles() {
        let engine = SearchEngine::default();
        let mut basic = prestataire(1, 48.85, 2.35);
        basic.plan = Plan::Basic;

        let candidates = vec![basic, prestataire(2, 48.85, 2.35)];
        let outcome =
            engine.search_prestataires_at(&PrestataireQuery::default(), candidates, fixed_now());

        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].id, 2);
    }

    #[test]
    fn test_distance_keeps_ungeolocated_profiles() {
        let engine = SearchEngine::default();
        let mut unlocated = prestataire(1, 0.0, 0.0);
        unlocated.geolocation = None;
        let near = prestataire(2, 48.86, 2.35);
        let far = prestataire(3, 45.76, 4.83); // Lyon

        let query = PrestataireQuery {
            base: ProfileQuery {
                distance: Some(DistanceFilter {
                    origin: Geolocation { lat: 48.8566, lon: 2.3522 },
                    radius_km: 20.0,
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome =
            engine.search_prestataires_at(&query, vec![unlocated, near, far], fixed_now());

        let ids: Vec<i32> = outcome.results.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_language_filter_or_semantics() {
        let engine = SearchEngine::default();
        let mut spanish = prestataire(1, 48.85, 2.35);
        spanish.languages = vec![Language::Spanish];
        let mut german = prestataire(2, 48.85, 2.35);
        german.languages = vec![Language::German];

        let query = PrestataireQuery {
            languages: vec![Language::Spanish, Language::English],
            ..Default::default()
        };

        let outcome = engine.search_prestataires_at(&query, vec![spanish, german], fixed_now());

        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].id, 1);
    }

    #[test]
    fn test_rating_ordering_and_pagination() {
        let engine = SearchEngine::default();
        let mut candidates = Vec::new();
        for i in 0..5 {
            let mut p = prestataire(i, 48.85, 2.35);
            p.total_rating = i as f64;
            candidates.push(p);
        }

        let query = PrestataireQuery {
            base: ProfileQuery {
                order_by: OrderBy::RatingDesc,
                limit: Some(2),
                offset: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome = engine.search_prestataires_at(&query, candidates, fixed_now());

        assert_eq!(outcome.total, 5);
        let ids: Vec<i32> = outcome.results.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_limit_is_capped() {
        let engine = SearchEngine::default();
        let candidates: Vec<Prestataire> = (0..150).map(|i| prestataire(i, 48.85, 2.35)).collect();

        let query = PrestataireQuery {
            base: ProfileQuery {
                limit: Some(500),
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome = engine.search_prestataires_at(&query, candidates, fixed_now());

        assert_eq!(outcome.total, 150);
        assert_eq!(outcome.results.len(), 100);
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("-rating"), Some(OrderBy::RatingDesc));
        assert_eq!(OrderBy::parse("updated_at"), Some(OrderBy::UpdatedAt));
        assert_eq!(OrderBy::parse("-updated_at"), Some(OrderBy::UpdatedAtDesc));
        assert_eq!(OrderBy::parse("geolocation"), Some(OrderBy::Storage));
        assert_eq!(OrderBy::parse("tarif"), None);
    }
}
