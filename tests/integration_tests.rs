// Integration tests for the famille-search engine

use chrono::{DateTime, TimeZone, Utc};
use famille_search::core::{
    DistanceFilter, FamilleQuery, OrderBy, PrestataireQuery, ProfileQuery, SearchEngine,
    SearchSettings,
};
use famille_search::models::{
    Enfant, Famille, FamilleView, FieldAccess, Geolocation, Language, Plan, Prestataire,
    ServiceFlags, Visibility,
};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn create_prestataire(id: i32, lat: f64, lon: f64) -> Prestataire {
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

fn create_famille(id: i32, nb_enfants: usize) -> Famille {
    let enfants = (0..nb_enfants)
        .map(|i| Enfant {
            id: id * 10 + i as i32,
            name: format!("Enfant {}", i),
            birthday: None,
            school: None,
        })
        .collect();

    Famille {
        id,
        first_name: format!("Famille {}", id),
        name: "Test".to_string(),
        email: format!("famille{}@example.org", id),
        tel: Some("0601020304".to_string()),
        tel_visible: true,
        street: None,
        city: Some("Paris".to_string()),
        postal_code: Some("75011".to_string()),
        country: "France".to_string(),
        description: Some("Recherche garde".to_string()),
        tarif: Some(10.0),
        diploma: None,
        languages: vec![],
        care_types: vec![],
        services: ServiceFlags::default(),
        plan: Plan::Premium,
        plan_expires_at: None,
        visibility: Visibility::default(),
        is_test: false,
        geolocation: Some(Geolocation { lat: 48.8566, lon: 2.3522 }),
        total_rating: 0.0,
        enfants,
        plannings: vec![],
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

#[test]
fn test_integration_end_to_end_prestataire_search() {
    let engine = SearchEngine::default();

    let mut basic = create_prestataire(1, 48.86, 2.35);
    basic.plan = Plan::Basic;

    let mut hidden = create_prestataire(2, 48.86, 2.35);
    hidden.visibility.global = false;

    let mut german_only = create_prestataire(3, 48.86, 2.35);
    german_only.languages = vec![Language::German];

    let far_away = create_prestataire(4, 45.76, 4.83); // Lyon

    let mut good_close = create_prestataire(5, 48.86, 2.35);
    good_close.total_rating = 3.0;

    let mut good_better_rated = create_prestataire(6, 48.87, 2.36);
    good_better_rated.total_rating = 4.5;

    let query = PrestataireQuery {
        base: ProfileQuery {
            distance: Some(DistanceFilter {
                origin: Geolocation { lat: 48.8566, lon: 2.3522 },
                radius_km: 20.0,
            }),
            order_by: OrderBy::RatingDesc,
            ..Default::default()
        },
        languages: vec![Language::English],
        ..Default::default()
    };

    let candidates = vec![basic, hidden, german_only, far_away, good_close, good_better_rated];
    let outcome = engine.search_prestataires_at(&query, candidates, fixed_now());

    // Only the two premium, visible, anglophone, nearby profiles survive
    assert_eq!(outcome.total, 2);
    let ids: Vec<i32> = outcome.results.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![6, 5], "Results should be sorted by rating, best first");
}

#[test]
fn test_geocoding_failure_leaves_results_unfiltered() {
    // When the postal code cannot be geocoded, the handler passes no
    // distance filter at all; every distance is then acceptable.
    let engine = SearchEngine::default();

    let candidates = vec![
        create_prestataire(1, 48.86, 2.35),  // Paris
        create_prestataire(2, 45.76, 4.83),  // Lyon
        create_prestataire(3, 43.30, 5.37),  // Marseille
    ];

    let query = PrestataireQuery::default();
    let outcome = engine.search_prestataires_at(&query, candidates, fixed_now());

    assert_eq!(outcome.total, 3, "No distance filter means no distance exclusion");
}

#[test]
fn test_ungeolocated_profiles_survive_distance_filtering() {
    let engine = SearchEngine::default();

    let mut unlocated = create_prestataire(1, 0.0, 0.0);
    unlocated.geolocation = None;

    let candidates = vec![unlocated, create_prestataire(2, 45.76, 4.83)];

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

    let outcome = engine.search_prestataires_at(&query, candidates, fixed_now());

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.results[0].id, 1, "Profile without geolocation must not be excluded");
}

#[test]
fn test_famille_children_count_filter() {
    let engine = SearchEngine::default();

    let candidates = vec![
        create_famille(1, 1),
        create_famille(2, 2),
        create_famille(3, 2),
        create_famille(4, 3),
    ];

    let query = FamilleQuery {
        nb_enfants: Some(2),
        ..Default::default()
    };

    let outcome = engine.search_familles_at(&query, candidates, fixed_now());

    assert_eq!(outcome.total, 2);
    for famille in &outcome.results {
        assert_eq!(famille.enfants.len(), 2);
    }
}

#[test]
fn test_postal_code_radius_narrower_than_user_distance() {
    // The postal-code radius (20km) applies instead of any user distance:
    // Versailles (~18km) stays in, Fontainebleau (~55km) drops out.
    let engine = SearchEngine::new(SearchSettings::default());

    let versailles = create_prestataire(1, 48.8049, 2.1204);
    let fontainebleau = create_prestataire(2, 48.4047, 2.7016);

    let query = PrestataireQuery {
        base: ProfileQuery {
            distance: Some(DistanceFilter {
                origin: Geolocation { lat: 48.8566, lon: 2.3522 },
                radius_km: engine.settings().postal_code_distance_km,
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    let outcome = engine.search_prestataires_at(&query, vec![versailles, fontainebleau], fixed_now());

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.results[0].id, 1);
}

#[test]
fn test_basic_plans_allowed_when_configured() {
    let engine = SearchEngine::new(SearchSettings {
        allow_basic_plan: true,
        ..Default::default()
    });

    let mut basic = create_prestataire(1, 48.86, 2.35);
    basic.plan = Plan::Basic;

    let outcome = engine.search_prestataires_at(
        &PrestataireQuery::default(),
        vec![basic],
        fixed_now(),
    );

    assert_eq!(outcome.total, 1);
}

#[test]
fn test_pagination_reports_full_total() {
    let engine = SearchEngine::default();
    let candidates: Vec<Famille> = (1..=30).map(|i| create_famille(i, 1)).collect();

    let query = FamilleQuery {
        base: ProfileQuery {
            limit: Some(10),
            offset: 25,
            ..Default::default()
        },
        ..Default::default()
    };

    let outcome = engine.search_familles_at(&query, candidates, fixed_now());

    assert_eq!(outcome.total, 30);
    assert_eq!(outcome.results.len(), 5, "Last page should hold the remainder");
}

#[test]
fn test_famille_view_trimming_levels() {
    let famille = create_famille(1, 2);

    let anonymous = FamilleView::render(&famille, FieldAccess::Anonymous);
    assert!(anonymous.id.is_none());
    assert!(anonymous.email.is_none());
    assert!(anonymous.enfants.is_none());
    assert_eq!(anonymous.first_name, "Famille 1");

    let basic = FamilleView::render(&famille, FieldAccess::Basic);
    assert_eq!(basic.id, Some(1));
    assert_eq!(basic.nb_enfants, Some(2));
    assert!(basic.email.is_none());
    assert!(basic.tel.is_none());

    let premium = FamilleView::render(&famille, FieldAccess::Premium);
    assert_eq!(premium.email.as_deref(), Some("famille1@example.org"));
    assert_eq!(premium.tel.as_deref(), Some("0601020304"));
}

#[test]
fn test_updated_at_ordering() {
    let engine = SearchEngine::default();

    let mut older = create_famille(1, 0);
    older.updated_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut newer = create_famille(2, 0);
    newer.updated_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    let query = FamilleQuery {
        base: ProfileQuery {
            order_by: OrderBy::UpdatedAtDesc,
            ..Default::default()
        },
        ..Default::default()
    };

    let outcome = engine.search_familles_at(&query, vec![older, newer], fixed_now());

    let ids: Vec<i32> = outcome.results.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![2, 1]);
}
