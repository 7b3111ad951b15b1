use std::time::Duration;

/// Tunables for semantic retrieval and result windows.
///
/// Values are plain numbers so they can be read from the environment at startup
/// and handed to [`crate::matching::MatchEngineConfig`]; nothing reads the
/// environment after that.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Minimum similarity the index must report for a hit to count.
    pub similarity_threshold: f32,
    /// Maximum number of hits requested from the index.
    pub similarity_count: usize,
    /// Result window used when the caller does not pass a limit.
    pub result_limit: usize,
    /// Upper bound for each external call (embedding, similarity lookup).
    pub provider_timeout: Duration,
    /// Blend factor for similarity on top of the rule score. 0 = rules only.
    pub similarity_weight: f64,
    /// Broad threshold used when picking workers to notify about a new job.
    pub notify_threshold: f32,
    pub notify_count: usize,
}

pub const MAX_RESULT_LIMIT: usize = 200;

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.2,
            similarity_count: 50,
            result_limit: 50,
            provider_timeout: Duration::from_secs(30),
            similarity_weight: 0.0,
            notify_threshold: 0.1,
            notify_count: 10,
        }
    }
}

impl EngineSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            similarity_threshold: parse_env("LM_SIMILARITY_THRESHOLD")
                .filter(|v: &f32| v.is_finite())
                .unwrap_or(defaults.similarity_threshold),
            similarity_count: parse_env("LM_SIMILARITY_COUNT")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.similarity_count),
            result_limit: parse_env("LM_RESULT_LIMIT")
                .filter(|v: &usize| *v > 0)
                .map(|v| v.min(MAX_RESULT_LIMIT))
                .unwrap_or(defaults.result_limit),
            provider_timeout: parse_env("LM_PROVIDER_TIMEOUT_SECS")
                .filter(|v: &u64| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider_timeout),
            similarity_weight: parse_env("LM_SIMILARITY_WEIGHT")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.similarity_weight),
            notify_threshold: parse_env("LM_NOTIFY_THRESHOLD")
                .filter(|v: &f32| v.is_finite())
                .unwrap_or(defaults.notify_threshold),
            notify_count: parse_env("LM_NOTIFY_COUNT")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.notify_count),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
}
