use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use thiserror::Error;

use crate::core::care_type::{self, convert_field_backward, convert_field_forward};
use crate::models::{
    Enfant, Famille, Favorite, Geolocation, Language, Plan, Planning, Prestataire, Reference,
    Schedule, SubscriptionNotice, UserKind, Visibility, Weekday,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Direction of the care-type value remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapDirection {
    /// Legacy labels ("plein") to storage codes ("0").
    Forward,
    /// Storage codes back to legacy labels.
    Backward,
}

const FAMILLE_COLUMNS: &str = r#"
    p.id, p.first_name, p.name, p.email, p.tel, p.tel_visible, p.street, p.city,
    p.postal_code, p.country, p.description, p.tarif, p.diploma, p.languages,
    p.care_types, p.animaux, p.cuisine, p.devoirs, p.menage, p.non_fumeur,
    p.permis, p.psc1, p.plan, p.plan_expires_at, p.visibility_global,
    p.visibility_family, p.visibility_prestataire, p.is_test,
    p.created_at, p.updated_at,
    g.lat AS geo_lat, g.lon AS geo_lon, g.has_error AS geo_has_error,
    COALESCE(r.avg_rating, 0.0)::float8 AS total_rating
"#;

const PRESTATAIRE_COLUMNS: &str = r#"
    p.id, p.first_name, p.name, p.email, p.tel, p.tel_visible, p.street, p.city,
    p.postal_code, p.country, p.description, p.birthday, p.nationality, p.tarif,
    p.diploma, p.languages, p.care_types, p.animaux, p.cuisine, p.devoirs,
    p.menage, p.non_fumeur, p.permis, p.psc1, p.plan, p.plan_expires_at,
    p.visibility_global, p.visibility_family, p.visibility_prestataire, p.is_test,
    p.created_at, p.updated_at,
    g.lat AS geo_lat, g.lon AS geo_lon, g.has_error AS geo_has_error,
    COALESCE(r.avg_rating, 0.0)::float8 AS total_rating
"#;

fn profile_query(table: &str, columns: &str, kind: UserKind, filter: &str) -> String {
    format!(
        r#"
        SELECT {columns}
        FROM {table} p
        LEFT JOIN geolocations g ON g.id = p.geolocation_id
        LEFT JOIN (
            SELECT profile_id,
                   AVG((amability + ponctuality + reliability + serious)::float8 / 4.0) AS avg_rating
            FROM ratings
            WHERE profile_kind = '{kind}'
            GROUP BY profile_id
        ) r ON r.profile_id = p.id
        {filter}
        ORDER BY p.id
        "#,
        columns = columns,
        table = table,
        kind = kind.as_str(),
        filter = filter,
    )
}

/// PostgreSQL client for profiles, plannings, favorites and subscription
/// tracking. Runs migrations on startup.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL with URL: {}", url);

        Self::new(url, max_connections.unwrap_or(10), min_connections.unwrap_or(1)).await
    }

    /// All famille profiles with relations and aggregate rating attached.
    pub async fn list_familles(&self) -> Result<Vec<Famille>, PostgresError> {
        let query = profile_query("familles", FAMILLE_COLUMNS, UserKind::Famille, "");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut enfants = self.load_enfants(None).await?;
        let mut plannings = self.load_plannings(UserKind::Famille, None).await?;

        let familles = rows
            .iter()
            .map(|row| {
                let mut famille = famille_from_row(row);
                famille.enfants = enfants.remove(&famille.id).unwrap_or_default();
                famille.plannings = plannings.remove(&famille.id).unwrap_or_default();
                famille
            })
            .collect();

        Ok(familles)
    }

    /// All prestataire profiles with plannings and aggregate rating attached.
    pub async fn list_prestataires(&self) -> Result<Vec<Prestataire>, PostgresError> {
        let query = profile_query("prestataires", PRESTATAIRE_COLUMNS, UserKind::Prestataire, "");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut plannings = self.load_plannings(UserKind::Prestataire, None).await?;

        let prestataires = rows
            .iter()
            .map(|row| {
                let mut prestataire = prestataire_from_row(row);
                prestataire.plannings = plannings.remove(&prestataire.id).unwrap_or_default();
                prestataire
            })
            .collect();

        Ok(prestataires)
    }

    /// A single famille, or `NotFound`.
    pub async fn get_famille(&self, id: i32) -> Result<Famille, PostgresError> {
        let query = profile_query("familles", FAMILLE_COLUMNS, UserKind::Famille, "WHERE p.id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("famille {}", id)))?;

        let mut famille = famille_from_row(&row);
        famille.enfants = self
            .load_enfants(Some(id))
            .await?
            .remove(&id)
            .unwrap_or_default();
        famille.plannings = self
            .load_plannings(UserKind::Famille, Some(id))
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(famille)
    }

    /// A single prestataire, or `NotFound`.
    pub async fn get_prestataire(&self, id: i32) -> Result<Prestataire, PostgresError> {
        let query = profile_query(
            "prestataires",
            PRESTATAIRE_COLUMNS,
            UserKind::Prestataire,
            "WHERE p.id = $1",
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("prestataire {}", id)))?;

        let mut prestataire = prestataire_from_row(&row);
        prestataire.plannings = self
            .load_plannings(UserKind::Prestataire, Some(id))
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(prestataire)
    }

    /// Children of famille profiles, grouped by famille id.
    async fn load_enfants(
        &self,
        famille_id: Option<i32>,
    ) -> Result<HashMap<i32, Vec<Enfant>>, PostgresError> {
        let query = match famille_id {
            Some(_) => {
                "SELECT id, famille_id, name, birthday, school FROM enfants WHERE famille_id = $1 ORDER BY id"
            }
            None => "SELECT id, famille_id, name, birthday, school FROM enfants ORDER BY id",
        };

        let mut q = sqlx::query(query);
        if let Some(id) = famille_id {
            q = q.bind(id);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i32, Vec<Enfant>> = HashMap::new();
        for row in rows {
            let famille_id: i32 = row.get("famille_id");
            grouped.entry(famille_id).or_default().push(Enfant {
                id: row.get("id"),
                name: row.get("name"),
                birthday: row.get("birthday"),
                school: row.get("school"),
            });
        }

        Ok(grouped)
    }

    /// Plannings of one owner kind, grouped by owner id, with their
    /// weekday and schedule sets stitched in.
    async fn load_plannings(
        &self,
        owner_kind: UserKind,
        owner_id: Option<i32>,
    ) -> Result<HashMap<i32, Vec<Planning>>, PostgresError> {
        let query = match owner_id {
            Some(_) => {
                "SELECT id, owner_id, start_date, frequency, comment FROM plannings \
                 WHERE owner_kind = $1 AND owner_id = $2 ORDER BY start_date, id"
            }
            None => {
                "SELECT id, owner_id, start_date, frequency, comment FROM plannings \
                 WHERE owner_kind = $1 ORDER BY start_date, id"
            }
        };

        let mut q = sqlx::query(query).bind(owner_kind.as_str());
        if let Some(id) = owner_id {
            q = q.bind(id);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let weekday_rows = sqlx::query(
            "SELECT pw.planning_id, w.id, w.name FROM planning_weekdays pw \
             JOIN weekdays w ON w.id = pw.weekday_id \
             JOIN plannings p ON p.id = pw.planning_id \
             WHERE p.owner_kind = $1 ORDER BY w.id",
        )
        .bind(owner_kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        let schedule_rows = sqlx::query(
            "SELECT ps.planning_id, s.id, s.name FROM planning_schedules ps \
             JOIN schedules s ON s.id = ps.schedule_id \
             JOIN plannings p ON p.id = ps.planning_id \
             WHERE p.owner_kind = $1 ORDER BY s.id",
        )
        .bind(owner_kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut weekdays: HashMap<i32, Vec<Weekday>> = HashMap::new();
        for row in weekday_rows {
            let planning_id: i32 = row.get("planning_id");
            weekdays.entry(planning_id).or_default().push(Weekday {
                id: row.get("id"),
                name: row.get("name"),
            });
        }

        let mut schedules: HashMap<i32, Vec<Schedule>> = HashMap::new();
        for row in schedule_rows {
            let planning_id: i32 = row.get("planning_id");
            schedules.entry(planning_id).or_default().push(Schedule {
                id: row.get("id"),
                name: row.get("name"),
            });
        }

        let mut grouped: HashMap<i32, Vec<Planning>> = HashMap::new();
        for row in rows {
            let planning_id: i32 = row.get("id");
            let owner: i32 = row.get("owner_id");
            grouped.entry(owner).or_default().push(Planning {
                id: planning_id,
                start_date: row.get("start_date"),
                frequency: row.get("frequency"),
                weekdays: weekdays.remove(&planning_id).unwrap_or_default(),
                schedules: schedules.remove(&planning_id).unwrap_or_default(),
                comment: row.get("comment"),
            });
        }

        Ok(grouped)
    }

    /// Weekday catalog.
    pub async fn list_weekdays(&self) -> Result<Vec<Weekday>, PostgresError> {
        let rows = sqlx::query("SELECT id, name FROM weekdays ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Weekday {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    /// Schedule catalog.
    pub async fn list_schedules(&self) -> Result<Vec<Schedule>, PostgresError> {
        let rows = sqlx::query("SELECT id, name FROM schedules ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Schedule {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    /// Children of one famille, in insertion order.
    pub async fn enfants_for_famille(&self, famille_id: i32) -> Result<Vec<Enfant>, PostgresError> {
        Ok(self
            .load_enfants(Some(famille_id))
            .await?
            .remove(&famille_id)
            .unwrap_or_default())
    }

    /// Plannings of one profile.
    pub async fn plannings_for(
        &self,
        owner_kind: UserKind,
        owner_id: i32,
    ) -> Result<Vec<Planning>, PostgresError> {
        Ok(self
            .load_plannings(owner_kind, Some(owner_id))
            .await?
            .remove(&owner_id)
            .unwrap_or_default())
    }

    /// Employment references of one prestataire.
    pub async fn references_for_prestataire(
        &self,
        prestataire_id: i32,
    ) -> Result<Vec<Reference>, PostgresError> {
        let rows = sqlx::query(
            "SELECT id, name, email, phone, date_from, date_to, garde, missions, \
             current, referenced_famille_id \
             FROM prestataire_references WHERE prestataire_id = $1 ORDER BY id",
        )
        .bind(prestataire_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Reference {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                phone: row.get("phone"),
                date_from: row.get("date_from"),
                date_to: row.get("date_to"),
                garde: row.get("garde"),
                missions: row.get("missions"),
                current: row.get("current"),
                referenced_famille_id: row.get("referenced_famille_id"),
            })
            .collect())
    }

    /// Bookmarks of one owner.
    pub async fn favorites_for(
        &self,
        owner_kind: UserKind,
        owner_id: i32,
    ) -> Result<Vec<Favorite>, PostgresError> {
        let rows = sqlx::query(
            "SELECT id, owner_kind, owner_id, object_kind, object_id, created_at \
             FROM favorites WHERE owner_kind = $1 AND owner_id = $2 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_kind.as_str())
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(favorite_from_row).collect()
    }

    /// Bookmark a profile.
    ///
    /// Uses INSERT ... ON CONFLICT so re-adding an existing favorite is a
    /// no-op that still returns the row.
    pub async fn add_favorite(
        &self,
        owner_kind: UserKind,
        owner_id: i32,
        object_kind: UserKind,
        object_id: i32,
    ) -> Result<Favorite, PostgresError> {
        let row = sqlx::query(
            r#"
            INSERT INTO favorites (owner_kind, owner_id, object_kind, object_id, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (owner_kind, owner_id, object_kind, object_id)
            DO UPDATE SET object_id = EXCLUDED.object_id
            RETURNING id, owner_kind, owner_id, object_kind, object_id, created_at
            "#,
        )
        .bind(owner_kind.as_str())
        .bind(owner_id)
        .bind(object_kind.as_str())
        .bind(object_id)
        .fetch_one(&self.pool)
        .await?;

        favorite_from_row(&row)
    }

    /// Remove a bookmark; returns whether a row was deleted.
    pub async fn remove_favorite(
        &self,
        owner_kind: UserKind,
        owner_id: i32,
        object_kind: UserKind,
        object_id: i32,
    ) -> Result<bool, PostgresError> {
        let result = sqlx::query(
            "DELETE FROM favorites \
             WHERE owner_kind = $1 AND owner_id = $2 AND object_kind = $3 AND object_id = $4",
        )
        .bind(owner_kind.as_str())
        .bind(owner_id)
        .bind(object_kind.as_str())
        .bind(object_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist a subscription notice for auditing.
    pub async fn record_subscription_notice(
        &self,
        notice: &SubscriptionNotice,
    ) -> Result<(), PostgresError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_notices
                (id, txn_id, subscr_id, payer_email, amount, currency, payment_status,
                 next_payment_date, profile_kind, profile_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(notice.id)
        .bind(&notice.txn_id)
        .bind(&notice.subscr_id)
        .bind(&notice.payer_email)
        .bind(notice.amount)
        .bind(&notice.currency)
        .bind(notice.payment_status.as_str())
        .bind(notice.next_payment_date)
        .bind(notice.profile_kind.as_str())
        .bind(notice.profile_id)
        .bind(notice.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            "Recorded subscription notice {} for {} {}",
            notice.txn_id,
            notice.profile_kind.as_str(),
            notice.profile_id
        );

        Ok(())
    }

    /// Move a profile to the premium plan; returns whether it existed.
    pub async fn upgrade_plan(
        &self,
        kind: UserKind,
        id: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool, PostgresError> {
        let query = format!(
            "UPDATE {} SET plan = 'premium', plan_expires_at = $1, updated_at = NOW() WHERE id = $2",
            profile_table(kind)
        );

        let result = sqlx::query(&query)
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// One-shot care-type value remap over both profile tables.
    ///
    /// Walks every row with a non-empty care_types field and rewrites it
    /// token-wise; returns the number of rows touched.
    pub async fn convert_care_types(
        &self,
        direction: RemapDirection,
    ) -> Result<u64, PostgresError> {
        let mut updated = 0u64;

        for table in ["familles", "prestataires"] {
            let select = format!(
                "SELECT id, care_types FROM {} WHERE care_types IS NOT NULL AND care_types <> ''",
                table
            );
            let rows = sqlx::query(&select).fetch_all(&self.pool).await?;

            let update = format!("UPDATE {} SET care_types = $1 WHERE id = $2", table);
            for row in rows {
                let id: i32 = row.get("id");
                let field: String = row.get("care_types");
                let converted = match direction {
                    RemapDirection::Forward => convert_field_forward(&field),
                    RemapDirection::Backward => convert_field_backward(&field),
                };

                sqlx::query(&update)
                    .bind(&converted)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                updated += 1;
            }

            tracing::info!("Converted care_types on {}", table);
        }

        Ok(updated)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn profile_table(kind: UserKind) -> &'static str {
    match kind {
        UserKind::Famille => "familles",
        UserKind::Prestataire => "prestataires",
    }
}

fn geolocation_from_row(row: &PgRow) -> Option<Geolocation> {
    let lat: Option<f64> = row.get("geo_lat");
    let lon: Option<f64> = row.get("geo_lon");
    let has_error: Option<bool> = row.get("geo_has_error");

    match (lat, lon) {
        (Some(lat), Some(lon)) if !has_error.unwrap_or(false) => Some(Geolocation { lat, lon }),
        _ => None,
    }
}

fn visibility_from_row(row: &PgRow) -> Visibility {
    Visibility {
        global: row.get("visibility_global"),
        family: row.get("visibility_family"),
        prestataire: row.get("visibility_prestataire"),
    }
}

fn services_from_row(row: &PgRow) -> crate::models::ServiceFlags {
    crate::models::ServiceFlags {
        animaux: row.get("animaux"),
        cuisine: row.get("cuisine"),
        devoirs: row.get("devoirs"),
        menage: row.get("menage"),
        non_fumeur: row.get("non_fumeur"),
        permis: row.get("permis"),
        psc1: row.get("psc1"),
    }
}

fn famille_from_row(row: &PgRow) -> Famille {
    let languages: Option<String> = row.get("languages");
    let care_types: Option<String> = row.get("care_types");
    let plan: String = row.get("plan");

    Famille {
        id: row.get("id"),
        first_name: row.get("first_name"),
        name: row.get("name"),
        email: row.get("email"),
        tel: row.get("tel"),
        tel_visible: row.get("tel_visible"),
        street: row.get("street"),
        city: row.get("city"),
        postal_code: row.get("postal_code"),
        country: row.get("country"),
        description: row.get("description"),
        tarif: row.get("tarif"),
        diploma: row.get("diploma"),
        languages: languages.as_deref().map(Language::parse_codes).unwrap_or_default(),
        care_types: care_types.as_deref().map(care_type::parse_codes).unwrap_or_default(),
        services: services_from_row(row),
        plan: Plan::from_str(&plan),
        plan_expires_at: row.get("plan_expires_at"),
        visibility: visibility_from_row(row),
        is_test: row.get("is_test"),
        geolocation: geolocation_from_row(row),
        total_rating: row.get("total_rating"),
        enfants: vec![],
        plannings: vec![],
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn prestataire_from_row(row: &PgRow) -> Prestataire {
    let languages: Option<String> = row.get("languages");
    let care_types: Option<String> = row.get("care_types");
    let plan: String = row.get("plan");

    Prestataire {
        id: row.get("id"),
        first_name: row.get("first_name"),
        name: row.get("name"),
        email: row.get("email"),
        tel: row.get("tel"),
        tel_visible: row.get("tel_visible"),
        street: row.get("street"),
        city: row.get("city"),
        postal_code: row.get("postal_code"),
        country: row.get("country"),
        description: row.get("description"),
        birthday: row.get("birthday"),
        nationality: row.get("nationality"),
        tarif: row.get("tarif"),
        diploma: row.get("diploma"),
        languages: languages.as_deref().map(Language::parse_codes).unwrap_or_default(),
        care_types: care_types.as_deref().map(care_type::parse_codes).unwrap_or_default(),
        services: services_from_row(row),
        plan: Plan::from_str(&plan),
        plan_expires_at: row.get("plan_expires_at"),
        visibility: visibility_from_row(row),
        is_test: row.get("is_test"),
        geolocation: geolocation_from_row(row),
        total_rating: row.get("total_rating"),
        plannings: vec![],
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn favorite_from_row(row: &PgRow) -> Result<Favorite, PostgresError> {
    let owner_kind: String = row.get("owner_kind");
    let object_kind: String = row.get("object_kind");

    Ok(Favorite {
        id: row.get("id"),
        owner_kind: UserKind::from_str(&owner_kind)
            .ok_or_else(|| PostgresError::InvalidInput(format!("owner kind {}", owner_kind)))?,
        owner_id: row.get("owner_id"),
        object_kind: UserKind::from_str(&object_kind)
            .ok_or_else(|| PostgresError::InvalidInput(format!("object kind {}", object_kind)))?,
        object_id: row.get("object_id"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_query_shape() {
        let query = profile_query("familles", FAMILLE_COLUMNS, UserKind::Famille, "WHERE p.id = $1");
        assert!(query.contains("FROM familles p"));
        assert!(query.contains("profile_kind = 'famille'"));
        assert!(query.contains("WHERE p.id = $1"));
    }

    #[test]
    fn test_profile_table() {
        assert_eq!(profile_table(UserKind::Famille), "familles");
        assert_eq!(profile_table(UserKind::Prestataire), "prestataires");
    }
}
