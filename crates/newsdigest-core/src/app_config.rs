use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which summarizer/classifier implementation the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NlpBackend {
    /// Offline lead-sentence summarizer and lexicon classifier.
    Lexicon,
    /// Remote model inference endpoint.
    Inference,
}

impl std::fmt::Display for NlpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NlpBackend::Lexicon => write!(f, "lexicon"),
            NlpBackend::Inference => write!(f, "inference"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub portal_base_url: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub articles_per_section: usize,
    pub ingest_max_retries: u32,
    pub ingest_retry_delay_secs: u64,
    pub ingest_interval_hours: u64,
    pub health_interval_hours: u64,
    pub maintenance_interval_hours: u64,
    pub ingest_on_startup: bool,
    pub job_error_backoff_secs: u64,
    pub nlp_backend: NlpBackend,
    pub inference_url: Option<String>,
    pub inference_api_key: Option<String>,
    pub summary_model: String,
    pub sentiment_model: String,
    pub summary_min_length: u32,
    pub summary_max_length: u32,
    pub dashboard_enabled: bool,
    pub api_keys: Vec<String>,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("portal_base_url", &self.portal_base_url)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("articles_per_section", &self.articles_per_section)
            .field("ingest_max_retries", &self.ingest_max_retries)
            .field("ingest_retry_delay_secs", &self.ingest_retry_delay_secs)
            .field("ingest_interval_hours", &self.ingest_interval_hours)
            .field("health_interval_hours", &self.health_interval_hours)
            .field(
                "maintenance_interval_hours",
                &self.maintenance_interval_hours,
            )
            .field("ingest_on_startup", &self.ingest_on_startup)
            .field("job_error_backoff_secs", &self.job_error_backoff_secs)
            .field("nlp_backend", &self.nlp_backend)
            .field("inference_url", &self.inference_url)
            .field(
                "inference_api_key",
                &self.inference_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("summary_model", &self.summary_model)
            .field("sentiment_model", &self.sentiment_model)
            .field("summary_min_length", &self.summary_min_length)
            .field("summary_max_length", &self.summary_max_length)
            .field("dashboard_enabled", &self.dashboard_enabled)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
