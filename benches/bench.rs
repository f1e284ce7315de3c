// Criterion benchmarks for famille-search

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use famille_search::core::{
    calculate_bounding_box, great_circle_distance, DistanceFilter, OrderBy, PrestataireQuery,
    ProfileQuery, SearchEngine,
};
use famille_search::models::{
    Geolocation, Language, Plan, Prestataire, ServiceFlags, Visibility,
};

fn create_candidate(id: i32, lat: f64, lon: f64) -> Prestataire {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Prestataire {
        id,
        first_name: format!("Presta {}", id),
        name: "Bench".to_string(),
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
        tarif: Some(8.0 + (id % 10) as f64),
        diploma: None,
        languages: if id % 2 == 0 {
            vec![Language::English]
        } else {
            vec![Language::Spanish]
        },
        care_types: vec![],
        services: ServiceFlags::default(),
        plan: if id % 5 == 0 { Plan::Basic } else { Plan::Premium },
        plan_expires_at: None,
        visibility: Visibility::default(),
        is_test: false,
        geolocation: Some(Geolocation { lat, lon }),
        total_rating: (id % 6) as f64,
        plannings: vec![],
        created_at: now,
        updated_at: now,
    }
}

fn create_query() -> PrestataireQuery {
    PrestataireQuery {
        base: ProfileQuery {
            distance: Some(DistanceFilter {
                origin: Geolocation { lat: 48.8566, lon: 2.3522 },
                radius_km: 50.0,
            }),
            order_by: OrderBy::RatingDesc,
            ..Default::default()
        },
        languages: vec![Language::English],
        ..Default::default()
    }
}

fn bench_great_circle_distance(c: &mut Criterion) {
    c.bench_function("great_circle_distance", |b| {
        b.iter(|| {
            great_circle_distance(
                black_box(48.8566),
                black_box(2.3522),
                black_box(48.86),
                black_box(2.35),
            )
        });
    });
}

fn bench_bounding_box(c: &mut Criterion) {
    c.bench_function("bounding_box_calculation", |b| {
        b.iter(|| {
            calculate_bounding_box(
                black_box(48.8566),
                black_box(2.3522),
                black_box(20.0),
            )
        });
    });
}

fn bench_search_pipeline(c: &mut Criterion) {
    let engine = SearchEngine::default();
    let query = create_query();

    let mut group = c.benchmark_group("search");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<Prestataire> = (0..*candidate_count)
            .map(|i| {
                let lat_offset = (i as f64 * 0.001) % 0.5;
                let lon_offset = (i as f64 * 0.001) % 0.5;
                create_candidate(i, 48.8566 + lat_offset, 2.3522 + lon_offset)
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("search_prestataires", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    engine.search_prestataires(
                        black_box(&query),
                        black_box(candidates.clone()),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_great_circle_distance,
    bench_bounding_box,
    bench_search_pipeline
);

criterion_main!(benches);
