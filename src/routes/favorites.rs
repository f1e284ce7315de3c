use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AddFavoriteRequest, AddFavoriteResponse, ErrorResponse, FavoriteOwnerParams,
    RemoveFavoriteRequest, RemoveFavoriteResponse, UserKind,
};
use crate::routes::search::{internal_error, validation_failed, AppState};

/// Configure favorite routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/favorites", web::get().to(list_favorites))
        .route("/favorites", web::post().to(add_favorite))
        .route("/favorites", web::delete().to(remove_favorite));
}

fn parse_kind(raw: &str, field: &str) -> Result<UserKind, HttpResponse> {
    UserKind::from_str(raw).ok_or_else(|| {
        HttpResponse::BadRequest().json(ErrorResponse {
            error: format!("Invalid {}", field),
            message: format!("{} must be famille or prestataire", field),
            status_code: 400,
        })
    })
}

/// List favorites endpoint
///
/// GET /api/v1/favorites?ownerKind=famille&ownerId=1
async fn list_favorites(
    state: web::Data<AppState>,
    params: web::Query<FavoriteOwnerParams>,
) -> impl Responder {
    let owner_kind = match parse_kind(&params.owner_kind, "ownerKind") {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state.postgres.favorites_for(owner_kind, params.owner_id).await {
        Ok(favorites) => HttpResponse::Ok().json(favorites),
        Err(e) => {
            tracing::error!(
                "Failed to fetch favorites for {} {}: {}",
                owner_kind.as_str(),
                params.owner_id,
                e
            );
            internal_error("Failed to fetch favorites", e)
        }
    }
}

/// Add favorite endpoint
///
/// POST /api/v1/favorites
///
/// Request body:
/// ```json
/// {
///   "ownerKind": "famille",
///   "ownerId": 1,
///   "objectKind": "prestataire",
///   "objectId": 12
/// }
/// ```
async fn add_favorite(
    state: web::Data<AppState>,
    req: web::Json<AddFavoriteRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let owner_kind = match parse_kind(&req.owner_kind, "ownerKind") {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let object_kind = match parse_kind(&req.object_kind, "objectKind") {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state
        .postgres
        .add_favorite(owner_kind, req.owner_id, object_kind, req.object_id)
        .await
    {
        Ok(favorite) => {
            tracing::debug!(
                "Favorite added: {} {} -> {} {}",
                owner_kind.as_str(),
                req.owner_id,
                object_kind.as_str(),
                req.object_id
            );
            HttpResponse::Ok().json(AddFavoriteResponse {
                success: true,
                favorite,
            })
        }
        Err(e) => {
            tracing::error!("Failed to add favorite: {}", e);
            internal_error("Failed to add favorite", e)
        }
    }
}

/// Remove favorite endpoint
///
/// DELETE /api/v1/favorites
async fn remove_favorite(
    state: web::Data<AppState>,
    req: web::Json<RemoveFavoriteRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let owner_kind = match parse_kind(&req.owner_kind, "ownerKind") {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let object_kind = match parse_kind(&req.object_kind, "objectKind") {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state
        .postgres
        .remove_favorite(owner_kind, req.owner_id, object_kind, req.object_id)
        .await
    {
        Ok(removed) => HttpResponse::Ok().json(RemoveFavoriteResponse {
            success: true,
            removed,
        }),
        Err(e) => {
            tracing::error!("Failed to remove favorite: {}", e);
            internal_error("Failed to remove favorite", e)
        }
    }
}
