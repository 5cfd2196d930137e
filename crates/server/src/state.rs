use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use corpmatch::{CorpmatchConfig, Pipeline};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, Instant)>>,

    /// Registry and matcher (shared across requests)
    pub pipeline: Arc<Pipeline>,
}

impl ServerState {
    /// Create state from `config`, opening the registry named by its
    /// pipeline config (in-memory when none is given).
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline_cfg = match &config.pipeline_config {
            Some(path) => CorpmatchConfig::from_file(path)
                .map_err(|err| ServerError::Config(format!("{path}: {err}")))?,
            None => CorpmatchConfig::default(),
        };
        let pipeline = Pipeline::from_config(&pipeline_cfg)?;
        Ok(Self::with_pipeline(config, Arc::new(pipeline)))
    }

    /// State over an already built pipeline.
    pub fn with_pipeline(config: ServerConfig, pipeline: Arc<Pipeline>) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            pipeline,
        }
    }

    /// Check if API key is valid. Writer keys are valid for reads too.
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key) || self.is_writer_key(key)
    }

    /// Check if API key may modify the registry
    pub fn is_writer_key(&self, key: &str) -> bool {
        self.config.writer_keys.contains(key)
    }

    /// Check rate limit for API key
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(limit: u32) -> ServerState {
        let mut config = ServerConfig::default();
        config.api_keys.insert("reader".into());
        config.writer_keys.insert("writer".into());
        config.rate_limit_per_minute = limit;
        ServerState::new(config).expect("state")
    }

    #[test]
    fn writer_keys_can_read() {
        let state = state(10);
        assert!(state.is_valid_api_key("reader"));
        assert!(state.is_valid_api_key("writer"));
        assert!(!state.is_valid_api_key("stranger"));
        assert!(state.is_writer_key("writer"));
        assert!(!state.is_writer_key("reader"));
    }

    #[test]
    fn rate_limit_is_per_key() {
        let state = state(2);
        assert!(state.check_rate_limit("reader"));
        assert!(state.check_rate_limit("reader"));
        assert!(!state.check_rate_limit("reader"));
        assert!(state.check_rate_limit("writer"));
    }

    #[test]
    fn missing_pipeline_config_file_is_a_config_error() {
        let config = ServerConfig {
            pipeline_config: Some("/nonexistent/corpmatch.yaml".into()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            ServerState::new(config),
            Err(ServerError::Config(_))
        ));
    }
}
