//! Configuration for campaign-service
use llm_client::LlmConfig;
use serde::Deserialize;

/// Main configuration struct, loaded from environment variables
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Application environment (development, staging, production)
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// HTTP bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of actix workers
    #[serde(default = "default_http_workers")]
    pub http_workers: usize,

    /// Comma-separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,

    /// Database connection URL
    pub database_url: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Apply embedded migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    // ============================================
    // LLM provider
    // ============================================
    #[serde(default)]
    pub llm_api_key: String,

    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,

    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,

    // ============================================
    // Retrieval
    // ============================================
    /// Minimum cosine similarity for a wiki document to be used as context
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Number of documents retrieved per question
    #[serde(default = "default_match_count")]
    pub match_count: i64,

    /// Characters of each document placed in the prompt
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars_per_doc: usize,

    // ============================================
    // Invitations
    // ============================================
    #[serde(default = "default_invitation_ttl_hours")]
    pub invitation_ttl_hours: i64,
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_http_workers() -> usize {
    4
}

fn default_cors_origins() -> String {
    "http://localhost:5173".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_chat_temperature() -> f32 {
    0.7
}

fn default_chat_max_tokens() -> u32 {
    1024
}

fn default_match_threshold() -> f64 {
    0.5
}

fn default_match_count() -> i64 {
    5
}

fn default_max_context_chars() -> usize {
    2000
}

/// One year
pub const MAX_INVITATION_TTL_HOURS: i64 = 24 * 365;

fn default_invitation_ttl_hours() -> i64 {
    168 // 7 days
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("database_url", &"[REDACTED]")
            .field("llm_api_key", &"[REDACTED]")
            .field("llm_base_url", &self.llm_base_url)
            .field("chat_model", &self.chat_model)
            .field("vision_model", &self.vision_model)
            .field("embedding_model", &self.embedding_model)
            .field("match_threshold", &self.match_threshold)
            .field("match_count", &self.match_count)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let config: Config = envy::from_env().map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Reject settings that are unsafe or meaningless
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.cors_allowed_origins.trim() == "*" {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(format!(
                "MATCH_THRESHOLD must be between 0 and 1, got {}",
                self.match_threshold
            ));
        }
        if self.match_count < 1 || self.match_count > 50 {
            return Err(format!(
                "MATCH_COUNT must be between 1 and 50, got {}",
                self.match_count
            ));
        }
        if !(1..=MAX_INVITATION_TTL_HOURS).contains(&self.invitation_ttl_hours) {
            return Err(format!(
                "INVITATION_TTL_HOURS must be between 1 and {}, got {}",
                MAX_INVITATION_TTL_HOURS, self.invitation_ttl_hours
            ));
        }
        Ok(())
    }

    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.llm_api_key.clone(),
            base_url: self.llm_base_url.clone(),
            chat_model: self.chat_model.clone(),
            vision_model: self.vision_model.clone(),
            embedding_model: self.embedding_model.clone(),
            timeout_secs: self.llm_timeout_secs,
            temperature: self.chat_temperature,
            max_tokens: self.chat_max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "DATABASE_URL",
        "APP_ENV",
        "PORT",
        "CORS_ALLOWED_ORIGINS",
        "MATCH_THRESHOLD",
        "MATCH_COUNT",
        "LLM_API_KEY",
        "INVITATION_TTL_HOURS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_database_url_is_set() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/campaign");

        let config = Config::from_env().expect("config");
        assert_eq!(config.port, 8080);
        assert_eq!(config.match_count, 5);
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.cors_origins(), vec!["http://localhost:5173"]);
        assert!(config.run_migrations);

        clear_env();
    }

    #[test]
    #[serial]
    fn missing_database_url_is_an_error() {
        clear_env();
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn wildcard_cors_rejected_in_production() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/campaign");
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("CORS_ALLOWED_ORIGINS"));

        clear_env();
    }

    #[test]
    #[serial]
    fn out_of_range_threshold_rejected() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/campaign");
        std::env::set_var("MATCH_THRESHOLD", "1.5");

        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn invitation_ttl_must_be_within_a_year() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/campaign");

        std::env::set_var("INVITATION_TTL_HOURS", "2500000000");
        let err = Config::from_env().unwrap_err();
        assert!(err.contains("INVITATION_TTL_HOURS"));

        std::env::set_var("INVITATION_TTL_HOURS", "0");
        assert!(Config::from_env().is_err());

        std::env::set_var("INVITATION_TTL_HOURS", "8760");
        assert_eq!(Config::from_env().expect("config").invitation_ttl_hours, 8760);

        clear_env();
    }

    #[test]
    #[serial]
    fn llm_config_carries_models_and_key() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/campaign");
        std::env::set_var("LLM_API_KEY", "sk-test");

        let llm = Config::from_env().expect("config").llm_config();
        assert!(llm.is_configured());
        assert_eq!(llm.chat_model, "gpt-4o-mini");
        assert_eq!(llm.vision_model, "gpt-4o");

        clear_env();
    }
}
