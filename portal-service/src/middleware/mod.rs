pub mod auth;
pub mod rate_limit;

pub use auth::{optional_auth, require_auth, require_superuser, CurrentUser};
pub use rate_limit::rate_limit;
