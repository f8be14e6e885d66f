pub mod auth;
pub mod branches;
pub mod departments;
pub mod persons;
pub mod posts;
pub mod roles;
pub mod superuser;
pub mod users;
