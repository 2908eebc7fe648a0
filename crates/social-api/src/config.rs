//! Startup configuration read from `SOCIALDB_*` environment variables.

use social_engine::{BuildConfig, EdgePolicy};
use social_loader::LoaderConfig;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    pub loader: LoaderConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = setting(&lookup, "SOCIALDB_LISTEN")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8001)));
        let path = lookup("SOCIALDB_DATA").unwrap_or_else(|| "data/dataset.csv".to_string());
        let root = setting(&lookup, "SOCIALDB_ROOT")?.unwrap_or_default();
        let edge_policy = EdgePolicy {
            duplicate_edges: setting(&lookup, "SOCIALDB_DUPLICATE_EDGES")?.unwrap_or_default(),
            self_loops: setting(&lookup, "SOCIALDB_SELF_LOOPS")?.unwrap_or_default(),
            dangling_edges: setting(&lookup, "SOCIALDB_DANGLING_EDGES")?.unwrap_or_default(),
        };

        let build = BuildConfig::default()
            .with_root(root)
            .with_edge_policy(edge_policy);
        let loader = LoaderConfig::new(path)
            .with_build(build)
            .with_skip_malformed(setting(&lookup, "SOCIALDB_SKIP_MALFORMED")?.unwrap_or(false))
            .with_max_hops(setting(&lookup, "SOCIALDB_MAX_HOPS")?);
        Ok(Self { listen, loader })
    }
}

fn setting<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_engine::RootSelector;
    use social_engine::{DanglingEdges, DuplicateEdges};
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]).unwrap();
        assert_eq!(c.listen, "0.0.0.0:8001".parse::<SocketAddr>().unwrap());
        assert_eq!(c.loader.path.to_str(), Some("data/dataset.csv"));
        assert_eq!(c.loader.build.root, RootSelector::MaxInDegree);
        assert_eq!(c.loader.max_hops, None);
        assert!(!c.loader.skip_malformed);
        assert_eq!(c.loader.build.edge_policy, EdgePolicy::default());
    }

    #[test]
    fn reads_every_setting() {
        let c = config(&[
            ("SOCIALDB_LISTEN", "127.0.0.1:9000"),
            ("SOCIALDB_DATA", "/tmp/users.csv"),
            ("SOCIALDB_ROOT", "17"),
            ("SOCIALDB_MAX_HOPS", "6"),
            ("SOCIALDB_DUPLICATE_EDGES", "keep"),
            ("SOCIALDB_DANGLING_EDGES", "skip"),
            ("SOCIALDB_SKIP_MALFORMED", "true"),
        ])
        .unwrap();
        assert_eq!(c.listen.port(), 9000);
        assert_eq!(c.loader.build.root, RootSelector::Fixed(17));
        assert_eq!(c.loader.max_hops, Some(6));
        assert_eq!(c.loader.build.edge_policy.duplicate_edges, DuplicateEdges::Keep);
        assert_eq!(c.loader.build.edge_policy.dangling_edges, DanglingEdges::Skip);
        assert!(c.loader.skip_malformed);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[("SOCIALDB_MAX_HOPS", "many")]).unwrap_err();
        assert!(err.to_string().contains("SOCIALDB_MAX_HOPS"));
        let err = config(&[("SOCIALDB_SELF_LOOPS", "sometimes")]).unwrap_err();
        assert!(err.to_string().contains("SOCIALDB_SELF_LOOPS"));
    }
}
