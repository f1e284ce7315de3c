//! Famille Search - search and matching backend for the Famille childcare
//! marketplace.
//!
//! This library implements the search-and-filtering layer connecting family
//! profiles and care providers: visibility rules, plan gating, language and
//! attribute filters, and distance filtering around a geocoded postal code
//! or the viewer's own location.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::{calculate_bounding_box, great_circle_distance, is_close_enough},
    SearchEngine, SearchSettings,
};
pub use models::{Famille, FamilleView, Prestataire, PrestataireView, SearchParams, SearchProfile};
