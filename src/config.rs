use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::fmt;

use crate::core::constants::{DEFAULT_INVITE_CODE_ATTEMPTS, DEFAULT_MAX_BUDGET};
use crate::core::services::ServiceSettings;
use crate::core::session::Language;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub default_language: Language,
    pub default_max_budget: f64,
    pub invite_code_attempts: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("default_language", &self.default_language)
            .field("default_max_budget", &self.default_max_budget)
            .field("invite_code_attempts", &self.invite_code_attempts)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // override outside development
            default_language: env::var("DEFAULT_LANGUAGE")
                .ok()
                .and_then(|v| Language::parse(&v))
                .unwrap_or_default(),
            default_max_budget: env::var("DEFAULT_MAX_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|b: &f64| b.is_finite() && *b >= 0.0)
                .unwrap_or(DEFAULT_MAX_BUDGET),
            invite_code_attempts: env::var("INVITE_CODE_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_INVITE_CODE_ATTEMPTS),
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            default_max_budget: self.default_max_budget,
            invite_code_attempts: self.invite_code_attempts,
        }
    }
}

// Read by the binary only; the library takes explicit settings.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
