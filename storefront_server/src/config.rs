//! Server configuration.
//!
//! Every knob comes from the environment (a `.env` file is honoured via `dotenvy`):
//! * `SFG_HOST`, `SFG_PORT`: the bind address. Defaults to `127.0.0.1:8360`.
//! * `SFG_DATABASE_URL`: the sqlite connection string.
//! * `SFG_JWT_SECRET`: the HS256 signing secret for API access tokens. If unset, a random
//!   secret is generated at startup and all previously issued tokens stop working.
//! * `SFG_STRIPE_*`: provider credentials, see [`stripe_tools::StripeConfig`].

use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sfg_common::Secret;
use storefront_engine::db_url;
use stripe_tools::StripeConfig;

pub const DEFAULT_PORT: u16 = 8360;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub stripe_config: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            stripe_config: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = std::env::var("SFG_HOST").ok().unwrap_or_else(|| {
            error!("🪛️ SFG_HOST is not set. Using 127.0.0.1.");
            "127.0.0.1".into()
        });
        let port = std::env::var("SFG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for SFG_PORT. {e} Using the default, {DEFAULT_PORT}.");
                    DEFAULT_PORT
                })
            })
            .unwrap_or_else(|_| {
                error!("🪛️ SFG_PORT is not set. Using the default, {DEFAULT_PORT}.");
                DEFAULT_PORT
            });
        let database_url = db_url();
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!(
                "🪛️ SFG_JWT_SECRET is not set. A random secret has been generated for this run; every access \
                 token issued before the restart is now invalid."
            );
            AuthConfig::default()
        });
        let stripe_config = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, stripe_config }
    }
}

//--------------------------------------     AuthConfig     ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The HS256 signing secret for API bearer tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()) }
    }

    pub fn try_from_env() -> Option<Self> {
        std::env::var("SFG_JWT_SECRET").ok().map(|s| Self { jwt_secret: Secret::new(s) })
    }
}
