//! Owner / worker authorization guards.
//!
//! Owners are always allowed. Workers are checked against the capability
//! flags on their user row, or against explicit job assignments.
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthUser;
use crate::database::models::Job;
use crate::error::ApiError;
use crate::types::{Permission, Role};

impl AuthUser {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Owner whose data this user operates on: themselves for owners, their
    /// employer for workers.
    pub fn scope_owner_id(&self) -> Uuid {
        match self.role {
            Role::Owner => self.id,
            Role::Worker => self.owner_id.unwrap_or(self.id),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_owner() || self.permissions.allows(permission)
    }

    pub fn require_owner(&self) -> Result<(), ApiError> {
        if self.is_owner() {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.id, "owner-only action attempted by worker");
            Err(ApiError::forbidden("Owner access required"))
        }
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.id, required = permission.key(), "permission denied");
            Err(ApiError::insufficient_permissions(permission.key()))
        }
    }
}

/// Route layer that rejects workers before the handler runs.
pub async fn require_owner_middleware(
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Response {
    match user.require_owner() {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Decision for a worker looking at a job, given what the database says.
pub fn job_access_decision(user: &AuthUser, job: &Job, assigned: bool) -> Result<(), ApiError> {
    match user.role {
        Role::Owner if job.owner_id == user.id => Ok(()),
        Role::Owner => Err(ApiError::forbidden("Access denied to this job")),
        Role::Worker => {
            let same_company = user.owner_id == Some(job.owner_id);
            if (same_company && user.permissions.can_view_all_jobs) || assigned {
                Ok(())
            } else {
                tracing::warn!(user_id = %user.id, job_id = %job.id, "job access denied");
                Err(ApiError::forbidden("Access denied to this job"))
            }
        }
    }
}

/// Load a job and check the caller may see it. 404 when the job is missing.
pub async fn require_job_access(pool: &PgPool, user: &AuthUser, job_id: Uuid) -> Result<Job, ApiError> {
    let job = Job::find_by_id(pool, job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let assigned = match user.role {
        Role::Owner => false,
        Role::Worker => Job::is_assigned(pool, job.id, user.id).await?,
    };

    job_access_decision(user, &job, assigned)?;
    Ok(job)
}
