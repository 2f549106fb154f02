pub mod auth;
pub mod permissions;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use permissions::{require_job_access, require_owner_middleware};
pub use response::{ApiPath, ApiQuery, ApiResult, Created, JsonBody};
