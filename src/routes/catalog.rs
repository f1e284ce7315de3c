use actix_web::{web, HttpResponse, Responder};

use crate::models::{Schedule, UserKind, Weekday};
use crate::routes::search::{internal_error, AppState};
use crate::services::CacheKey;

/// Configure catalog and relation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/weekdays", web::get().to(list_weekdays))
        .route("/schedules", web::get().to(list_schedules))
        .route("/familles/{id}/plannings", web::get().to(famille_plannings))
        .route("/familles/{id}/enfants", web::get().to(famille_enfants))
        .route(
            "/prestataires/{id}/plannings",
            web::get().to(prestataire_plannings),
        )
        .route(
            "/prestataires/{id}/references",
            web::get().to(prestataire_references),
        );
}

/// Weekday catalog endpoint
///
/// GET /api/v1/weekdays
async fn list_weekdays(state: web::Data<AppState>) -> impl Responder {
    let key = CacheKey::catalog("weekdays");
    if let Ok(Some(weekdays)) = state.cache.get::<Vec<Weekday>>(&key).await {
        return HttpResponse::Ok().json(weekdays);
    }

    match state.postgres.list_weekdays().await {
        Ok(weekdays) => {
            if let Err(e) = state.cache.set(&key, &weekdays).await {
                tracing::warn!("Failed to cache weekdays: {}", e);
            }
            HttpResponse::Ok().json(weekdays)
        }
        Err(e) => {
            tracing::error!("Failed to fetch weekdays: {}", e);
            internal_error("Failed to fetch weekdays", e)
        }
    }
}

/// Schedule catalog endpoint
///
/// GET /api/v1/schedules
async fn list_schedules(state: web::Data<AppState>) -> impl Responder {
    let key = CacheKey::catalog("schedules");
    if let Ok(Some(schedules)) = state.cache.get::<Vec<Schedule>>(&key).await {
        return HttpResponse::Ok().json(schedules);
    }

    match state.postgres.list_schedules().await {
        Ok(schedules) => {
            if let Err(e) = state.cache.set(&key, &schedules).await {
                tracing::warn!("Failed to cache schedules: {}", e);
            }
            HttpResponse::Ok().json(schedules)
        }
        Err(e) => {
            tracing::error!("Failed to fetch schedules: {}", e);
            internal_error("Failed to fetch schedules", e)
        }
    }
}

/// GET /api/v1/familles/{id}/plannings
async fn famille_plannings(state: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    plannings_for(state, UserKind::Famille, path.into_inner()).await
}

/// GET /api/v1/prestataires/{id}/plannings
async fn prestataire_plannings(state: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    plannings_for(state, UserKind::Prestataire, path.into_inner()).await
}

async fn plannings_for(state: web::Data<AppState>, kind: UserKind, id: i32) -> HttpResponse {
    match state.postgres.plannings_for(kind, id).await {
        Ok(plannings) => HttpResponse::Ok().json(plannings),
        Err(e) => {
            tracing::error!("Failed to fetch plannings for {} {}: {}", kind.as_str(), id, e);
            internal_error("Failed to fetch plannings", e)
        }
    }
}

/// GET /api/v1/familles/{id}/enfants
async fn famille_enfants(state: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    let id = path.into_inner();
    match state.postgres.enfants_for_famille(id).await {
        Ok(enfants) => HttpResponse::Ok().json(enfants),
        Err(e) => {
            tracing::error!("Failed to fetch enfants for famille {}: {}", id, e);
            internal_error("Failed to fetch enfants", e)
        }
    }
}

/// GET /api/v1/prestataires/{id}/references
async fn prestataire_references(state: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    let id = path.into_inner();
    match state.postgres.references_for_prestataire(id).await {
        Ok(references) => HttpResponse::Ok().json(references),
        Err(e) => {
            tracing::error!("Failed to fetch references for prestataire {}: {}", id, e);
            internal_error("Failed to fetch references", e)
        }
    }
}
