//! Authentication Module
//! Mission: Account lifecycle, signed tokens, revocation, and lockout

pub mod api;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod revocation;
pub mod service;
pub mod store;
pub mod throttle;

pub use api::AuthState;
pub use jwt::TokenCodec;
pub use middleware::{auth_middleware, optional_auth_middleware, AuthGate};
pub use revocation::RevocationStore;
pub use service::{AuthError, AuthService};
pub use store::{AccountRepository, MemoryAccountStore, SqliteAccountStore};
pub use throttle::LoginThrottle;
