pub mod auth;
pub mod require;
pub mod response;

pub use auth::{optional_auth, require_auth, MaybePrincipal};
pub use require::{require_roles, require_staff};
pub use response::{ApiResponse, ApiResult};
