//! Runtime configuration, loaded once from the process environment at startup
//! into an immutable snapshot. No config-file crate is introduced; every
//! deployment knob here maps to a single environment variable.

use std::{env, net::IpAddr};

/// Immutable configuration snapshot built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub enable_auth: bool,
    pub allowed_ips: Vec<IpAddr>,
    pub max_body_bytes: usize,
    /// Parsed and logged at startup but not wired to any behavior yet.
    pub strict_webhook_auth: bool,
    pub run_migrations_on_startup: bool,
}

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .or_else(|_| env::var("ConnectionStrings__Database"))
            .map_err(|_| {
                anyhow::anyhow!("DATABASE_URL (or ConnectionStrings/Database) must be set")
            })?;

        let enable_auth = parse_bool_env("ENABLE_AUTH").unwrap_or(false);
        let strict_webhook_auth = parse_bool_env("STRICT_WEBHOOK_AUTH").unwrap_or(false);
        let run_migrations_on_startup =
            parse_bool_env("RUN_MIGRATIONS_ON_STARTUP").unwrap_or(false);

        let allowed_ips = env::var("ALLOWED_IPS")
            .ok()
            .map(|raw| parse_ip_list(&raw))
            .unwrap_or_default();

        let max_body_bytes = env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Ok(Self {
            database_url,
            enable_auth,
            allowed_ips,
            max_body_bytes,
            strict_webhook_auth,
            run_migrations_on_startup,
        })
    }

    /// Resolves the per-provider webhook secret: `SECRET_<PROVIDER>` env var
    /// first, then the `Authentication/ProviderSecrets/<provider>` config path
    /// (also read as a literal environment key, since no config-file layer
    /// backs this snapshot).
    pub fn provider_secret(&self, provider: &str) -> Option<String> {
        let env_key = format!("SECRET_{}", provider.to_uppercase());
        if let Ok(value) = env::var(&env_key) {
            if !value.is_empty() {
                return Some(value);
            }
        }

        let path_key = format!("Authentication/ProviderSecrets/{provider}");
        env::var(&path_key).ok().filter(|v| !v.is_empty())
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|raw| match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

fn parse_ip_list(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(value = s, "ignoring unparseable entry in ALLOWED_IPS");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ip_list() {
        let ips = parse_ip_list(" 10.0.0.1, 2001:db8::1 ,, not-an-ip");
        assert_eq!(ips.len(), 2);
    }

    #[test]
    fn parse_bool_env_accepts_common_spellings() {
        unsafe {
            env::set_var("FORWARDER_TEST_BOOL", "YES");
        }
        assert_eq!(parse_bool_env("FORWARDER_TEST_BOOL"), Some(true));
        unsafe {
            env::remove_var("FORWARDER_TEST_BOOL");
        }
    }
}
