//! HMAC-SHA256 webhook signature verification.
//!
//! When `ENABLE_AUTH` is off every call is treated as authenticated. When it's
//! on, a missing per-provider secret fails *open* (logged as a warning) rather
//! than rejecting real events — losing a provider callback is worse than
//! accepting one unverified, so operators get noticed, not blocked.

use std::net::IpAddr;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of an authentication attempt. Never panics, never returns `Err` —
/// the caller decides how to respond based on `authenticated`.
pub struct AuthOutcome {
    pub authenticated: bool,
    pub failure_reason: Option<String>,
}

impl AuthOutcome {
    fn ok() -> Self {
        Self { authenticated: true, failure_reason: None }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self { authenticated: false, failure_reason: Some(reason.into()) }
    }
}

pub struct Authenticator {
    enabled: bool,
}

impl Authenticator {
    pub fn new(config: &AppConfig) -> Self {
        Self { enabled: config.enable_auth }
    }

    pub fn authenticate(
        &self,
        config: &AppConfig,
        provider: &str,
        body: &[u8],
        signature: Option<&str>,
        source_address: Option<IpAddr>,
    ) -> AuthOutcome {
        if !self.enabled {
            tracing::debug!(provider, "authentication disabled; allowing request");
            return AuthOutcome::ok();
        }

        let secret = match config.provider_secret(provider) {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    provider,
                    "no webhook secret configured for provider; failing open"
                );
                return AuthOutcome::ok();
            }
        };

        let Some(signature) = signature else {
            return AuthOutcome::reject("Missing signature");
        };

        let provided = strip_signature_prefix(signature);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(body);
        let expected = hex::encode(mac.finalize().into_bytes());

        let matches = provided.len() == expected.len()
            && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()));

        if !matches {
            return AuthOutcome::reject("Invalid signature");
        }

        if !config.allowed_ips.is_empty() {
            if let Some(addr) = source_address {
                if !config.allowed_ips.contains(&addr) {
                    return AuthOutcome::reject("IP not allowed");
                }
            }
        }

        AuthOutcome::ok()
    }
}

/// Strips a leading `sha256=` prefix (case-insensitive) and surrounding
/// whitespace, matching the format GitHub/Alchemy-style providers send.
fn strip_signature_prefix(signature: &str) -> &str {
    let signature = signature.trim();
    if signature.len() >= 7 && signature.as_bytes()[..7].eq_ignore_ascii_case(b"sha256=") {
        signature[7..].trim()
    } else {
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enable_auth: bool) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".into(),
            enable_auth,
            allowed_ips: Vec::new(),
            max_body_bytes: 1024,
            strict_webhook_auth: false,
            run_migrations_on_startup: false,
        }
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn disabled_auth_always_passes() {
        let authenticator = Authenticator::new(&config(false));
        let outcome = authenticator.authenticate(&config(false), "alchemy", b"body", None, None);
        assert!(outcome.authenticated);
    }

    #[test]
    fn strips_sha256_prefix_case_insensitively() {
        assert_eq!(strip_signature_prefix("SHA256=abcd"), "abcd");
        assert_eq!(strip_signature_prefix(" sha256=abcd "), "abcd");
        assert_eq!(strip_signature_prefix("abcd"), "abcd");
    }

    #[test]
    fn missing_signature_fails_closed() {
        unsafe {
            std::env::set_var("SECRET_ALCHEMY", "topsecret");
        }
        let authenticator = Authenticator::new(&config(true));
        let outcome = authenticator.authenticate(&config(true), "alchemy", b"body", None, None);
        assert!(!outcome.authenticated);
        assert_eq!(outcome.failure_reason.as_deref(), Some("Missing signature"));
        unsafe {
            std::env::remove_var("SECRET_ALCHEMY");
        }
    }

    #[test]
    fn valid_signature_passes() {
        unsafe {
            std::env::set_var("SECRET_ALCHEMY", "topsecret");
        }
        let body = b"{\"type\":\"ping\"}";
        let sig = format!("sha256={}", sign("topsecret", body));
        let authenticator = Authenticator::new(&config(true));
        let outcome =
            authenticator.authenticate(&config(true), "alchemy", body, Some(&sig), None);
        assert!(outcome.authenticated);
        unsafe {
            std::env::remove_var("SECRET_ALCHEMY");
        }
    }

    #[test]
    fn invalid_signature_fails() {
        unsafe {
            std::env::set_var("SECRET_ALCHEMY", "topsecret");
        }
        let authenticator = Authenticator::new(&config(true));
        let outcome = authenticator.authenticate(
            &config(true),
            "alchemy",
            b"body",
            Some("sha256=deadbeef"),
            None,
        );
        assert!(!outcome.authenticated);
        assert_eq!(outcome.failure_reason.as_deref(), Some("Invalid signature"));
        unsafe {
            std::env::remove_var("SECRET_ALCHEMY");
        }
    }

    #[test]
    fn missing_secret_fails_open() {
        let authenticator = Authenticator::new(&config(true));
        let outcome = authenticator.authenticate(&config(true), "unknown-provider", b"body", None, None);
        assert!(outcome.authenticated);
    }

    #[test]
    fn allowlist_is_skipped_when_no_source_address_is_present() {
        unsafe {
            std::env::set_var("SECRET_ALCHEMY", "topsecret");
        }
        let body = b"{\"type\":\"ping\"}";
        let sig = format!("sha256={}", sign("topsecret", body));
        let mut cfg = config(true);
        cfg.allowed_ips = vec!["10.0.0.1".parse().unwrap()];
        let authenticator = Authenticator::new(&cfg);
        let outcome = authenticator.authenticate(&cfg, "alchemy", body, Some(&sig), None);
        assert!(outcome.authenticated);
        unsafe {
            std::env::remove_var("SECRET_ALCHEMY");
        }
    }

    #[test]
    fn allowlist_rejects_address_not_in_list() {
        unsafe {
            std::env::set_var("SECRET_ALCHEMY", "topsecret");
        }
        let body = b"{\"type\":\"ping\"}";
        let sig = format!("sha256={}", sign("topsecret", body));
        let mut cfg = config(true);
        cfg.allowed_ips = vec!["10.0.0.1".parse().unwrap()];
        let authenticator = Authenticator::new(&cfg);
        let outcome = authenticator.authenticate(
            &cfg,
            "alchemy",
            body,
            Some(&sig),
            Some("10.0.0.2".parse().unwrap()),
        );
        assert!(!outcome.authenticated);
        assert_eq!(outcome.failure_reason.as_deref(), Some("IP not allowed"));
        unsafe {
            std::env::remove_var("SECRET_ALCHEMY");
        }
    }
}
