pub mod branch;
pub mod department;
pub mod person;
pub mod post;
pub mod rate_limit;
pub mod role;
pub mod tier;
pub mod token_blacklist;
pub mod user;

pub use branch::Branch;
pub use department::{Department, DepartmentWithCount};
pub use person::{Person, PersonExportRow, PersonWithDepartment};
pub use post::Post;
pub use rate_limit::RateLimitRule;
pub use role::Role;
pub use tier::Tier;
pub use token_blacklist::BlacklistedToken;
pub use user::User;
