//! Server configuration, loaded once at startup from the environment.

use std::env;

/// Runtime configuration.
///
/// The signing secret is process-wide and never rotated at runtime; the
/// token validity window and lockout threshold are fixed policy (7 days,
/// 5 failures) and live in `auth::jwt` / `auth::throttle`.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub db_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());
        let db_path = env::var("AUTH_DB_PATH").unwrap_or_else(|_| "marketplace_auth.db".to_string());

        Self {
            bind_addr,
            jwt_secret,
            db_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_env();
        assert!(!config.bind_addr.is_empty());
        assert!(!config.jwt_secret.is_empty());
        assert!(!config.db_path.is_empty());
    }
}
