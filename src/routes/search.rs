use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{DistanceFilter, FamilleQuery, OrderBy, PrestataireQuery, ProfileQuery, SearchEngine};
use crate::models::{
    ErrorResponse, FamilleView, FieldAccess, Geolocation, HealthResponse, PrestataireView,
    SearchParams, SearchProfile, SearchResponse, UserKind,
};
use crate::services::{CacheKey, CacheManager, GeocoderClient, PostgresClient, PostgresError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub geocoder: Arc<GeocoderClient>,
    pub engine: SearchEngine,
}

/// Configure search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/prestataires", web::get().to(search_prestataires))
        .route("/familles", web::get().to(search_familles));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// The viewer behind a search request, when one is identified.
struct ViewerContext {
    geolocation: Option<Geolocation>,
    premium: bool,
}

/// Search prestataires endpoint
///
/// GET /api/v1/prestataires?language=0,2&distance=10&viewerId=...&viewerKind=famille
async fn search_prestataires(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    let params = params.into_inner();
    if let Err(errors) = params.validate() {
        return validation_failed(errors);
    }

    let (viewer_kind, order_by) = match parse_common(&params) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let viewer = match load_viewer(&state, viewer_kind, params.viewer_id).await {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    let distance = resolve_distance_filter(&state, &params, viewer.as_ref()).await;

    let candidates = match state.postgres.list_prestataires().await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to fetch prestataires: {}", e);
            return internal_error("Failed to fetch prestataires", e);
        }
    };

    let query = PrestataireQuery {
        base: ProfileQuery {
            viewer_kind,
            attributes: params.attribute_filters(),
            distance,
            order_by,
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
        },
        languages: params.requested_languages(),
        birthday_after: params.birthday_after,
        birthday_before: params.birthday_before,
    };

    let outcome = state.engine.search_prestataires(&query, candidates);

    tracing::info!(
        "Prestataire search returned {} of {} candidates",
        outcome.results.len(),
        outcome.total
    );

    HttpResponse::Ok().json(SearchResponse {
        results: outcome
            .results
            .iter()
            .map(PrestataireView::render)
            .collect::<Vec<_>>(),
        total: outcome.total,
        limit: effective_limit(&state.engine, params.limit),
        offset: query.base.offset,
    })
}

/// Search familles endpoint
///
/// GET /api/v1/familles?nb_enfants=2&postal_code=75011&viewerId=...&viewerKind=prestataire
async fn search_familles(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    let params = params.into_inner();
    if let Err(errors) = params.validate() {
        return validation_failed(errors);
    }

    let (viewer_kind, order_by) = match parse_common(&params) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let viewer = match load_viewer(&state, viewer_kind, params.viewer_id).await {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    let access = match &viewer {
        None => FieldAccess::Anonymous,
        Some(viewer) if viewer.premium => FieldAccess::Premium,
        Some(_) => FieldAccess::Basic,
    };

    let distance = resolve_distance_filter(&state, &params, viewer.as_ref()).await;

    let candidates = match state.postgres.list_familles().await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to fetch familles: {}", e);
            return internal_error("Failed to fetch familles", e);
        }
    };

    let query = FamilleQuery {
        base: ProfileQuery {
            viewer_kind,
            attributes: params.attribute_filters(),
            distance,
            order_by,
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
        },
        nb_enfants: params.nb_enfants,
    };

    let outcome = state.engine.search_familles(&query, candidates);

    tracing::info!(
        "Famille search returned {} of {} candidates",
        outcome.results.len(),
        outcome.total
    );

    HttpResponse::Ok().json(SearchResponse {
        results: outcome
            .results
            .iter()
            .map(|famille| FamilleView::render(famille, access))
            .collect::<Vec<_>>(),
        total: outcome.total,
        limit: effective_limit(&state.engine, params.limit),
        offset: query.base.offset,
    })
}

fn parse_common(params: &SearchParams) -> Result<(Option<UserKind>, OrderBy), HttpResponse> {
    let viewer_kind = match params.viewer_kind.as_deref() {
        Some(raw) => match UserKind::from_str(raw) {
            Some(kind) => Some(kind),
            None => {
                return Err(HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Invalid viewer kind".to_string(),
                    message: "viewerKind must be famille or prestataire".to_string(),
                    status_code: 400,
                }));
            }
        },
        None => None,
    };

    let order_by = match params.order_by.as_deref() {
        Some(raw) => match OrderBy::parse(raw) {
            Some(order_by) => order_by,
            None => {
                return Err(HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Invalid ordering".to_string(),
                    message: format!("No ordering named {}", raw),
                    status_code: 400,
                }));
            }
        },
        None => OrderBy::default(),
    };

    Ok((viewer_kind, order_by))
}

/// Load the viewer's own profile for distance origin and field access.
///
/// An unknown viewer id degrades to anonymous rather than failing the
/// search.
async fn load_viewer(
    state: &web::Data<AppState>,
    viewer_kind: Option<UserKind>,
    viewer_id: Option<i32>,
) -> Result<Option<ViewerContext>, HttpResponse> {
    let (Some(kind), Some(id)) = (viewer_kind, viewer_id) else {
        return Ok(None);
    };

    let context = match kind {
        UserKind::Famille => state.postgres.get_famille(id).await.map(|famille| ViewerContext {
            geolocation: famille.geolocation,
            premium: famille.is_premium(),
        }),
        UserKind::Prestataire => {
            state
                .postgres
                .get_prestataire(id)
                .await
                .map(|prestataire| ViewerContext {
                    geolocation: prestataire.geolocation,
                    premium: prestataire.is_premium(),
                })
        }
    };

    match context {
        Ok(context) => Ok(Some(context)),
        Err(PostgresError::NotFound(what)) => {
            tracing::warn!("Unknown viewer {}, treating as anonymous", what);
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Failed to load viewer profile: {}", e);
            Err(internal_error("Failed to load viewer profile", e))
        }
    }
}

/// Resolve the distance constraint for this request.
///
/// A postal code takes precedence: it is geocoded (through the cache) and
/// combined with the configured postal-code radius. If geocoding fails the
/// constraint is silently dropped and the search runs unfiltered. Without
/// a postal code, the `distance` parameter applies around the viewer's own
/// geolocation, when there is one.
async fn resolve_distance_filter(
    state: &web::Data<AppState>,
    params: &SearchParams,
    viewer: Option<&ViewerContext>,
) -> Option<DistanceFilter> {
    if let Some(postal_code) = params.postal_code.as_deref() {
        return match geocode_postal_cached(state, postal_code).await {
            Ok(origin) => Some(DistanceFilter {
                origin,
                radius_km: state.engine.settings().postal_code_distance_km,
            }),
            Err(e) => {
                tracing::warn!("Failed to geocode postal code {}: {}", postal_code, e);
                None
            }
        };
    }

    let radius_km = params.distance?;
    let origin = viewer.and_then(|v| v.geolocation)?;

    Some(DistanceFilter { origin, radius_km })
}

async fn geocode_postal_cached(
    state: &web::Data<AppState>,
    postal_code: &str,
) -> Result<Geolocation, crate::services::GeocoderError> {
    let key = CacheKey::geocode_postal(postal_code);

    match state.cache.get::<Geolocation>(&key).await {
        Ok(Some(geoloc)) => return Ok(geoloc),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache lookup failed for {}: {}", key, e),
    }

    let geoloc = state.geocoder.geocode_postal_code(postal_code).await?;

    if let Err(e) = state.cache.set(&key, &geoloc).await {
        tracing::warn!("Failed to cache geocode result for {}: {}", postal_code, e);
    }

    Ok(geoloc)
}

fn effective_limit(engine: &SearchEngine, requested: Option<usize>) -> usize {
    requested
        .unwrap_or(engine.settings().default_limit)
        .min(engine.settings().max_limit)
}

pub(crate) fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: {:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

pub(crate) fn internal_error<E: std::fmt::Display>(error: &str, e: E) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}
