use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::care_type::CareType;

/// GPS position attached to a profile.
///
/// Profiles whose address failed to geocode carry no geolocation at all;
/// the `has_error` flag on the storage row never reaches the domain layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub lat: f64,
    pub lon: f64,
}

/// Subscription plan of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Premium => "premium",
        }
    }

    pub fn from_str(value: &str) -> Plan {
        match value {
            "premium" => Plan::Premium,
            _ => Plan::Basic,
        }
    }
}

/// The two profile kinds of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Famille,
    Prestataire,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Famille => "famille",
            UserKind::Prestataire => "prestataire",
        }
    }

    pub fn from_str(value: &str) -> Option<UserKind> {
        match value {
            "famille" => Some(UserKind::Famille),
            "prestataire" => Some(UserKind::Prestataire),
            _ => None,
        }
    }
}

/// Spoken languages, stored as comma-separated integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Italian,
    Spanish,
    German,
}

impl Language {
    pub fn code(&self) -> u8 {
        match self {
            Language::English => 0,
            Language::Italian => 1,
            Language::Spanish => 2,
            Language::German => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Language> {
        match code {
            0 => Some(Language::English),
            1 => Some(Language::Italian),
            2 => Some(Language::Spanish),
            3 => Some(Language::German),
            _ => None,
        }
    }

    /// Parse a comma-separated code field, skipping unknown tokens.
    pub fn parse_codes(field: &str) -> Vec<Language> {
        field
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter_map(|t| t.parse::<u8>().ok())
            .filter_map(Language::from_code)
            .collect()
    }

    pub fn encode_codes(languages: &[Language]) -> String {
        languages
            .iter()
            .map(|l| l.code().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Search visibility switches of a profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Visibility {
    pub global: bool,
    pub family: bool,
    pub prestataire: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            global: true,
            family: true,
            prestataire: true,
        }
    }
}

/// Household services a profile offers (prestataire) or expects (famille).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ServiceFlags {
    pub animaux: bool,
    pub cuisine: bool,
    pub devoirs: bool,
    pub menage: bool,
    pub non_fumeur: bool,
    pub permis: bool,
    pub psc1: bool,
}

/// A child of a famille.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enfant {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub school: Option<String>,
}

/// Catalog entry: a day of the week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weekday {
    pub id: i32,
    pub name: String,
}

/// Catalog entry: a block of the day (matin, midi, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i32,
    pub name: String,
}

/// An availability slot declared by a famille or a prestataire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planning {
    pub id: i32,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub frequency: Option<String>,
    pub weekdays: Vec<Weekday>,
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One rating left on a profile, four 0-5 components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub by: Option<String>,
    pub amability: u8,
    pub ponctuality: u8,
    pub reliability: u8,
    pub serious: u8,
}

impl Rating {
    /// Average of the four components.
    pub fn average(&self) -> f64 {
        (self.amability + self.ponctuality + self.reliability + self.serious) as f64 / 4.0
    }
}

/// A bookmarked profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i32,
    #[serde(rename = "ownerKind")]
    pub owner_kind: UserKind,
    #[serde(rename = "ownerId")]
    pub owner_id: i32,
    #[serde(rename = "objectKind")]
    pub object_kind: UserKind,
    #[serde(rename = "objectId")]
    pub object_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A past employment reference of a prestataire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "dateFrom", default)]
    pub date_from: Option<NaiveDate>,
    #[serde(rename = "dateTo", default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub garde: Option<String>,
    #[serde(default)]
    pub missions: Option<String>,
    pub current: bool,
    #[serde(rename = "referencedFamilleId", default)]
    pub referenced_famille_id: Option<i32>,
}

/// Outcome reported by the payment provider for a subscription cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Parse a provider-reported status, whatever its casing.
    pub fn parse(value: &str) -> Option<PaymentStatus> {
        match value.to_lowercase().as_str() {
            "completed" => Some(PaymentStatus::Completed),
            "pending" => Some(PaymentStatus::Pending),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Payment-subscription tracking record.
///
/// A trimmed-down notification row: enough to audit what the provider told
/// us and to move the target profile's plan, nothing gateway-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionNotice {
    pub id: uuid::Uuid,
    #[serde(rename = "txnId")]
    pub txn_id: String,
    #[serde(rename = "subscrId", default)]
    pub subscr_id: Option<String>,
    #[serde(rename = "payerEmail")]
    pub payer_email: String,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "nextPaymentDate", default)]
    pub next_payment_date: Option<DateTime<Utc>>,
    #[serde(rename = "profileKind")]
    pub profile_kind: UserKind,
    #[serde(rename = "profileId")]
    pub profile_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A family-side profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Famille {
    pub id: i32,
    #[serde(rename = "firstName")]
    pub first_name: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(rename = "telVisible", default)]
    pub tel_visible: bool,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "postalCode", default)]
    pub postal_code: Option<String>,
    pub country: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tarif: Option<f64>,
    #[serde(default)]
    pub diploma: Option<String>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(rename = "careTypes", default)]
    pub care_types: Vec<CareType>,
    #[serde(default)]
    pub services: ServiceFlags,
    pub plan: Plan,
    #[serde(rename = "planExpiresAt", default)]
    pub plan_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "isTest", default)]
    pub is_test: bool,
    #[serde(default)]
    pub geolocation: Option<Geolocation>,
    #[serde(rename = "totalRating", default)]
    pub total_rating: f64,
    #[serde(default)]
    pub enfants: Vec<Enfant>,
    #[serde(default)]
    pub plannings: Vec<Planning>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A care-provider profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prestataire {
    pub id: i32,
    #[serde(rename = "firstName")]
    pub first_name: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(rename = "telVisible", default)]
    pub tel_visible: bool,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "postalCode", default)]
    pub postal_code: Option<String>,
    pub country: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub tarif: Option<f64>,
    #[serde(default)]
    pub diploma: Option<String>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(rename = "careTypes", default)]
    pub care_types: Vec<CareType>,
    #[serde(default)]
    pub services: ServiceFlags,
    pub plan: Plan,
    #[serde(rename = "planExpiresAt", default)]
    pub plan_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "isTest", default)]
    pub is_test: bool,
    #[serde(default)]
    pub geolocation: Option<Geolocation>,
    #[serde(rename = "totalRating", default)]
    pub total_rating: f64,
    #[serde(default)]
    pub plannings: Vec<Planning>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Accessors the search pipeline needs from either profile kind.
pub trait SearchProfile {
    fn id(&self) -> i32;
    fn plan(&self) -> Plan;
    fn plan_expires_at(&self) -> Option<DateTime<Utc>>;
    fn visibility(&self) -> Visibility;
    fn is_test(&self) -> bool;
    fn geolocation(&self) -> Option<Geolocation>;
    fn city(&self) -> Option<&str>;
    fn care_types(&self) -> &[CareType];
    fn services(&self) -> ServiceFlags;
    fn tarif(&self) -> Option<f64>;
    fn diploma(&self) -> Option<&str>;
    fn total_rating(&self) -> f64;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Premium at `now`: premium plan and not expired.
    fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.plan() == Plan::Premium
            && self.plan_expires_at().map_or(true, |expires| expires > now)
    }

    fn is_premium(&self) -> bool {
        self.is_premium_at(Utc::now())
    }

    fn is_geolocated(&self) -> bool {
        self.geolocation().is_some()
    }
}

macro_rules! impl_search_profile {
    ($ty:ty) => {
        impl SearchProfile for $ty {
            fn id(&self) -> i32 {
                self.id
            }
            fn plan(&self) -> Plan {
                self.plan
            }
            fn plan_expires_at(&self) -> Option<DateTime<Utc>> {
                self.plan_expires_at
            }
            fn visibility(&self) -> Visibility {
                self.visibility
            }
            fn is_test(&self) -> bool {
                self.is_test
            }
            fn geolocation(&self) -> Option<Geolocation> {
                self.geolocation
            }
            fn city(&self) -> Option<&str> {
                self.city.as_deref()
            }
            fn care_types(&self) -> &[CareType] {
                &self.care_types
            }
            fn services(&self) -> ServiceFlags {
                self.services
            }
            fn tarif(&self) -> Option<f64> {
                self.tarif
            }
            fn diploma(&self) -> Option<&str> {
                self.diploma.as_deref()
            }
            fn total_rating(&self) -> f64 {
                self.total_rating
            }
            fn updated_at(&self) -> DateTime<Utc> {
                self.updated_at
            }
        }
    };
}

impl_search_profile!(Famille);
impl_search_profile!(Prestataire);

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::parse_codes("0,2"), vec![Language::English, Language::Spanish]);
        assert_eq!(Language::parse_codes("0, 9, de"), vec![Language::English]);
        assert_eq!(Language::encode_codes(&[Language::Italian, Language::German]), "1,3");
    }

    #[test]
    fn test_plan_round_trip() {
        assert_eq!(Plan::from_str("premium"), Plan::Premium);
        assert_eq!(Plan::from_str("basic"), Plan::Basic);
        // Unknown plans degrade to basic rather than failing the row
        assert_eq!(Plan::from_str("legacy"), Plan::Basic);
        assert_eq!(Plan::Premium.as_str(), "premium");
    }

    #[test]
    fn test_user_kind_parse() {
        assert_eq!(UserKind::from_str("famille"), Some(UserKind::Famille));
        assert_eq!(UserKind::from_str("prestataire"), Some(UserKind::Prestataire));
        assert_eq!(UserKind::from_str("admin"), None);
    }

    #[test]
    fn test_rating_average() {
        let rating = Rating {
            by: None,
            amability: 4,
            ponctuality: 2,
            reliability: 5,
            serious: 5,
        };
        assert_eq!(rating.average(), 4.0);
    }
}
