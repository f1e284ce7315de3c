// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use crate::core::care_type::CareType;
pub use domain::{
    BoundingBox, Enfant, Famille, Favorite, Geolocation, Language, PaymentStatus, Plan, Planning,
    Prestataire, Rating, Reference, Schedule, SearchProfile, ServiceFlags, SubscriptionNotice,
    UserKind, Visibility, Weekday,
};
pub use requests::{
    AddFavoriteRequest, FavoriteOwnerParams, RemoveFavoriteRequest, SearchParams,
    SubscriptionNoticeRequest,
};
pub use responses::{
    AddFavoriteResponse, ErrorResponse, FamilleView, FieldAccess, HealthResponse,
    PrestataireView, RemoveFavoriteResponse, SearchResponse, SubscriptionNoticeResponse,
};
