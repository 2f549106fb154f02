use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::types::{Role, WorkerPermissions};

/// Columns loaded for every `User`. Preference blobs are read by their own endpoints.
pub const USER_COLUMNS: &str = "id, email, password_hash, name, role, active, hourly_rate, phone, photo_url, \
     owner_id, worker_permissions, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub role: String,
    pub active: bool,
    pub hourly_rate: Option<Decimal>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub owner_id: Option<Uuid>,
    pub worker_permissions: Option<Json<WorkerPermissions>>,
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of a user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub hourly_rate: Option<Decimal>,
    pub phone: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub owner_id: Option<Uuid>,
    pub worker_permissions: Option<WorkerPermissions>,
    pub created_at: DateTime<Utc>,
}

/// Profile plus session extras returned by login, signup and `/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(rename = "assignedJobIDs")]
    pub assigned_job_ids: Vec<Uuid>,
    pub has_password: bool,
}

impl User {
    pub async fn account_view(&self, pool: &PgPool) -> Result<AccountView, sqlx::Error> {
        let assigned_job_ids = match self.role() {
            Role::Worker => Self::assigned_job_ids(pool, self.id).await?,
            Role::Owner => Vec::new(),
        };
        Ok(AccountView {
            profile: self.profile(),
            assigned_job_ids,
            has_password: self.password_hash.is_some(),
        })
    }

    /// Unknown role text is treated as the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Worker)
    }

    pub fn permissions(&self) -> WorkerPermissions {
        self.worker_permissions.as_ref().map(|p| p.0).unwrap_or_default()
    }

    pub fn profile(&self) -> UserProfile {
        let role = self.role();
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role,
            active: self.active,
            hourly_rate: self.hourly_rate,
            phone: self.phone.clone(),
            photo_url: self.photo_url.clone(),
            owner_id: self.owner_id,
            worker_permissions: (role == Role::Worker).then(|| self.permissions()),
            created_at: self.created_at,
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// A worker managed by `owner_id`.
    pub async fn find_worker(pool: &PgPool, owner_id: Uuid, worker_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND owner_id = $2 AND role = 'worker'"
        ))
        .bind(worker_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn set_password_hash(pool: &PgPool, id: Uuid, hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, reset_token_hash = NULL, reset_token_expires = NULL, \
             updated_at = NOW() WHERE id = $2",
        )
        .bind(hash)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Job ids a worker is explicitly assigned to.
    pub async fn assigned_job_ids(pool: &PgPool, worker_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT job_id FROM worker_job_assignments WHERE worker_id = $1")
            .bind(worker_id)
            .fetch_all(pool)
            .await
    }
}

/// Minimal email shape check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Lowercased, trimmed email as stored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(role: &str, perms: Option<WorkerPermissions>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "crew@example.com".into(),
            password_hash: None,
            name: "Crew".into(),
            role: role.into(),
            active: true,
            hourly_rate: Some(Decimal::new(2550, 2)),
            phone: None,
            photo_url: None,
            owner_id: None,
            worker_permissions: perms.map(Json),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unknown_role_falls_back_to_worker() {
        assert_eq!(sample("admin", None).role(), Role::Worker);
        assert_eq!(sample("owner", None).role(), Role::Owner);
    }

    #[test]
    fn null_permissions_use_defaults() {
        assert_eq!(sample("worker", None).permissions(), WorkerPermissions::default());
    }

    #[test]
    fn profile_hides_permissions_for_owners() {
        assert!(sample("owner", None).profile().worker_permissions.is_none());
        assert!(sample("worker", None).profile().worker_permissions.is_some());
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("owner@siteledger.ai"));
        assert!(!is_valid_email("owner@localhost"));
        assert!(!is_valid_email("@siteledger.ai"));
        assert!(!is_valid_email("a b@siteledger.ai"));
        assert_eq!(normalize_email("  Owner@SiteLedger.AI "), "owner@siteledger.ai");
    }
}
