pub mod password;
pub mod path;
pub mod validation;

pub use password::{Password, PasswordHashString};
pub use path::sanitize_path;
pub use validation::ValidatedJson;
