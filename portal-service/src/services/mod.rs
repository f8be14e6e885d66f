pub mod auth;
pub mod cache;
pub mod database;
pub mod jwt;
pub mod kv;
pub mod verification;

pub use auth::AuthService;
pub use cache::ResponseCache;
pub use database::Database;
pub use jwt::{Claims, JwtService, TokenKind, TokenPair};
pub use kv::{KeyValueStore, MemoryKv, RedisKv};
pub use verification::{HttpSmsSender, MockSmsSender, SmsSender, SmsVerifier};
