use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::care_type;
use crate::core::filters::AttributeFilters;
use crate::models::{CareType, Language, ServiceFlags};

/// Query-string parameters accepted by both search endpoints.
///
/// Famille search ignores `language` and the birthday bounds; prestataire
/// search ignores `nb_enfants`. Multi-valued fields (`language`,
/// `care_type`) arrive as comma-separated code lists.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchParams {
    #[serde(alias = "viewerId", default)]
    pub viewer_id: Option<i32>,
    #[serde(alias = "viewerKind", default)]
    pub viewer_kind: Option<String>,
    #[validate(range(min = 0.1, max = 1000.0))]
    #[serde(default)]
    pub distance: Option<f64>,
    #[validate(length(min = 2, max = 8))]
    #[serde(alias = "postalCode", default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(alias = "nbEnfants", default)]
    pub nb_enfants: Option<usize>,
    #[serde(alias = "careType", default)]
    pub care_type: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub diploma: Option<String>,
    #[serde(default)]
    pub animaux: Option<bool>,
    #[serde(default)]
    pub cuisine: Option<bool>,
    #[serde(default)]
    pub devoirs: Option<bool>,
    #[serde(default)]
    pub menage: Option<bool>,
    #[serde(alias = "nonFumeur", default)]
    pub non_fumeur: Option<bool>,
    #[serde(default)]
    pub permis: Option<bool>,
    #[serde(default)]
    pub psc1: Option<bool>,
    #[validate(range(min = 0.0))]
    #[serde(alias = "tarifMax", default)]
    pub tarif_max: Option<f64>,
    #[serde(alias = "birthdayAfter", default)]
    pub birthday_after: Option<NaiveDate>,
    #[serde(alias = "birthdayBefore", default)]
    pub birthday_before: Option<NaiveDate>,
    #[serde(alias = "orderBy", default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl SearchParams {
    /// Attribute constraints for the common pipeline stage.
    pub fn attribute_filters(&self) -> AttributeFilters {
        AttributeFilters {
            city: self.city.clone(),
            care_types: self.requested_care_types(),
            services: ServiceFlags {
                animaux: self.animaux.unwrap_or(false),
                cuisine: self.cuisine.unwrap_or(false),
                devoirs: self.devoirs.unwrap_or(false),
                menage: self.menage.unwrap_or(false),
                non_fumeur: self.non_fumeur.unwrap_or(false),
                permis: self.permis.unwrap_or(false),
                psc1: self.psc1.unwrap_or(false),
            },
            tarif_max: self.tarif_max,
            diploma: self.diploma.clone(),
        }
    }

    pub fn requested_languages(&self) -> Vec<Language> {
        self.language
            .as_deref()
            .map(Language::parse_codes)
            .unwrap_or_default()
    }

    pub fn requested_care_types(&self) -> Vec<CareType> {
        self.care_type
            .as_deref()
            .map(care_type::parse_codes)
            .unwrap_or_default()
    }
}

/// Owner identification for favorite listing/removal.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FavoriteOwnerParams {
    #[serde(alias = "ownerKind")]
    pub owner_kind: String,
    #[serde(alias = "ownerId")]
    pub owner_id: i32,
}

/// Request to bookmark a profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddFavoriteRequest {
    #[serde(alias = "owner_kind", rename = "ownerKind")]
    pub owner_kind: String,
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: i32,
    #[serde(alias = "object_kind", rename = "objectKind")]
    pub object_kind: String,
    #[serde(alias = "object_id", rename = "objectId")]
    pub object_id: i32,
}

/// Request to remove a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoveFavoriteRequest {
    #[serde(alias = "owner_kind", rename = "ownerKind")]
    pub owner_kind: String,
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: i32,
    #[serde(alias = "object_kind", rename = "objectKind")]
    pub object_kind: String,
    #[serde(alias = "object_id", rename = "objectId")]
    pub object_id: i32,
}

/// Subscription notification reported by the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubscriptionNoticeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "txn_id", rename = "txnId")]
    pub txn_id: String,
    #[serde(alias = "subscr_id", rename = "subscrId", default)]
    pub subscr_id: Option<String>,
    #[validate(email)]
    #[serde(alias = "payer_email", rename = "payerEmail")]
    pub payer_email: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(alias = "payment_status", rename = "paymentStatus")]
    pub payment_status: String,
    #[serde(alias = "next_payment_date", rename = "nextPaymentDate", default)]
    pub next_payment_date: Option<DateTime<Utc>>,
    #[serde(alias = "profile_kind", rename = "profileKind")]
    pub profile_kind: String,
    #[serde(alias = "profile_id", rename = "profileId")]
    pub profile_id: i32,
}

fn default_currency() -> String {
    "EUR".to_string()
}
