//! Engine and host-layer settings.
//!
//! Defaults suit local development; `ServerConfig::from_env` lets a
//! deployment override them through `WAYMARK_*` variables.

use std::env;

/// How the router treats a literal segment that lands on a depth where a
/// wildcard child was registered first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// The first compatible child wins on insert and the first depth-first
    /// match wins on search. Absorptions are logged as warnings.
    #[default]
    FirstMatch,
    /// Registrations that would be absorbed fail with `RouteError::Conflict`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub max_connections: usize,
    pub max_body_bytes: usize,
    /// Budget for the request line plus all header lines.
    pub max_header_bytes: usize,
    /// Default `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub conflict_policy: ConflictPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: 256,
            max_body_bytes: 1024 * 1024,
            max_header_bytes: 8 * 1024,
            log_filter: "waymark=info".to_string(),
            conflict_policy: ConflictPolicy::FirstMatch,
        }
    }
}

impl ServerConfig {
    /// Reads `WAYMARK_MAX_CONNECTIONS`, `WAYMARK_MAX_BODY_BYTES`,
    /// `WAYMARK_MAX_HEADER_BYTES`, `WAYMARK_LOG` and `WAYMARK_STRICT_ROUTES`,
    /// falling back to the defaults for unset or
    /// unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_usize = |key: &str, fallback: usize| {
            lookup(key)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(fallback)
        };

        let conflict_policy = match lookup("WAYMARK_STRICT_ROUTES").as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("yes") => ConflictPolicy::Strict,
            _ => defaults.conflict_policy,
        };

        Self {
            max_connections: parse_usize("WAYMARK_MAX_CONNECTIONS", defaults.max_connections),
            max_body_bytes: parse_usize("WAYMARK_MAX_BODY_BYTES", defaults.max_body_bytes),
            max_header_bytes: parse_usize("WAYMARK_MAX_HEADER_BYTES", defaults.max_header_bytes),
            log_filter: lookup("WAYMARK_LOG").unwrap_or(defaults.log_filter),
            conflict_policy,
        }
    }
}
