use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::care_type::CareType;
use crate::models::domain::{
    Enfant, Famille, Favorite, Language, Planning, Prestataire, ServiceFlags,
};

/// What a viewer is allowed to see of a famille profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    /// Not logged in: public teaser fields only.
    Anonymous,
    /// Logged in on a basic plan: contact details withheld.
    Basic,
    /// Premium subscriber: everything serializable.
    Premium,
}

/// Famille search result, trimmed according to the viewer's access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilleView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub first_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarif: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diploma: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<Language>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub care_types: Option<Vec<CareType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_enfants: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enfants: Option<Vec<Enfant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plannings: Option<Vec<Planning>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FamilleView {
    /// Serialize a famille for the given access level.
    ///
    /// Anonymous viewers get the public teaser only; basic viewers get
    /// everything except contact details; `tel` additionally honors the
    /// profile's own `tel_visible` switch.
    pub fn render(famille: &Famille, access: FieldAccess) -> FamilleView {
        let mut view = FamilleView {
            id: None,
            first_name: famille.first_name.clone(),
            name: famille.name.clone(),
            city: famille.city.clone(),
            country: famille.country.clone(),
            description: famille.description.clone(),
            email: None,
            tel: None,
            tarif: None,
            diploma: None,
            languages: None,
            care_types: None,
            services: None,
            rating: None,
            nb_enfants: None,
            enfants: None,
            plannings: None,
            updated_at: None,
        };

        if access == FieldAccess::Anonymous {
            return view;
        }

        view.id = Some(famille.id);
        view.tarif = famille.tarif;
        view.diploma = famille.diploma.clone();
        view.languages = Some(famille.languages.clone());
        view.care_types = Some(famille.care_types.clone());
        view.services = Some(famille.services);
        view.rating = Some(famille.total_rating);
        view.nb_enfants = Some(famille.enfants.len());
        view.enfants = Some(famille.enfants.clone());
        view.plannings = Some(famille.plannings.clone());
        view.updated_at = Some(famille.updated_at);

        if access == FieldAccess::Premium {
            view.email = Some(famille.email.clone());
            if famille.tel_visible {
                view.tel = famille.tel.clone();
            }
        }

        view
    }
}

/// Prestataire search result.
///
/// Street, tel and email are never exposed, whatever the viewer's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrestataireView {
    pub id: i32,
    pub first_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarif: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diploma: Option<String>,
    pub languages: Vec<Language>,
    pub care_types: Vec<CareType>,
    pub services: ServiceFlags,
    pub rating: f64,
    pub plannings: Vec<Planning>,
    pub updated_at: DateTime<Utc>,
}

impl PrestataireView {
    pub fn render(prestataire: &Prestataire) -> PrestataireView {
        PrestataireView {
            id: prestataire.id,
            first_name: prestataire.first_name.clone(),
            name: prestataire.name.clone(),
            city: prestataire.city.clone(),
            country: prestataire.country.clone(),
            description: prestataire.description.clone(),
            birthday: prestataire.birthday,
            nationality: prestataire.nationality.clone(),
            tarif: prestataire.tarif,
            diploma: prestataire.diploma.clone(),
            languages: prestataire.languages.clone(),
            care_types: prestataire.care_types.clone(),
            services: prestataire.services,
            rating: prestataire.total_rating,
            plannings: prestataire.plannings.clone(),
            updated_at: prestataire.updated_at,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub results: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Favorite creation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFavoriteResponse {
    pub success: bool,
    pub favorite: Favorite,
}

/// Favorite removal response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveFavoriteResponse {
    pub success: bool,
    pub removed: bool,
}

/// Subscription notice recording response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionNoticeResponse {
    pub success: bool,
    #[serde(rename = "noticeId")]
    pub notice_id: String,
    #[serde(rename = "planUpgraded")]
    pub plan_upgraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Geolocation, Plan, Visibility};
    use chrono::TimeZone;

    fn famille() -> Famille {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Famille {
            id: 7,
            first_name: "Anne".to_string(),
            name: "Durand".to_string(),
            email: "anne@example.org".to_string(),
            tel: Some("0601020304".to_string()),
            tel_visible: true,
            street: Some("3 rue des Lilas".to_string()),
            city: Some("Nantes".to_string()),
            postal_code: Some("44000".to_string()),
            country: "France".to_string(),
            description: Some("Deux enfants".to_string()),
            tarif: Some(10.0),
            diploma: None,
            languages: vec![],
            care_types: vec![],
            services: ServiceFlags::default(),
            plan: Plan::Premium,
            plan_expires_at: None,
            visibility: Visibility::default(),
            is_test: false,
            geolocation: Some(Geolocation { lat: 47.2184, lon: -1.5536 }),
            total_rating: 3.5,
            enfants: vec![],
            plannings: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_anonymous_view_is_teaser_only() {
        let view = FamilleView::render(&famille(), FieldAccess::Anonymous);

        assert_eq!(view.first_name, "Anne");
        assert_eq!(view.city.as_deref(), Some("Nantes"));
        assert!(view.id.is_none());
        assert!(view.email.is_none());
        assert!(view.tel.is_none());
        assert!(view.rating.is_none());
    }

    #[test]
    fn test_basic_view_hides_contact_details() {
        let view = FamilleView::render(&famille(), FieldAccess::Basic);

        assert_eq!(view.id, Some(7));
        assert_eq!(view.rating, Some(3.5));
        assert!(view.email.is_none());
        assert!(view.tel.is_none());
    }

    #[test]
    fn test_premium_view_sees_contact_details() {
        let view = FamilleView::render(&famille(), FieldAccess::Premium);

        assert_eq!(view.email.as_deref(), Some("anne@example.org"));
        assert_eq!(view.tel.as_deref(), Some("0601020304"));
    }

    #[test]
    fn test_premium_view_honors_tel_visible() {
        let mut profile = famille();
        profile.tel_visible = false;

        let view = FamilleView::render(&profile, FieldAccess::Premium);
        assert!(view.tel.is_none());
        assert!(view.email.is_some());
    }
}
