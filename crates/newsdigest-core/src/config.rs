use crate::app_config::{AppConfig, Environment, NlpBackend};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be driven by a plain
/// `HashMap` lookup in tests.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
#[allow(clippy::too_many_lines)]
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            n => Ok(n),
        }
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => {
                parse_flag(&raw).ok_or_else(|| invalid(var, format!("not a boolean: {raw}")))
            }
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("NEWSDIGEST_ENV", "development"));

    let bind_addr = parse_addr("NEWSDIGEST_BIND_ADDR", "0.0.0.0:9000")?;
    let log_level = or_default("NEWSDIGEST_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("NEWSDIGEST_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("NEWSDIGEST_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("NEWSDIGEST_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let portal_base_url = or_default("NEWSDIGEST_PORTAL_BASE_URL", "https://news.naver.com")
        .trim_end_matches('/')
        .to_string();
    let scraper_request_timeout_secs =
        parse_positive_u64("NEWSDIGEST_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("NEWSDIGEST_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let articles_per_section = or_default("NEWSDIGEST_ARTICLES_PER_SECTION", "10")
        .parse::<usize>()
        .map_err(|e| invalid("NEWSDIGEST_ARTICLES_PER_SECTION", e.to_string()))?;
    if articles_per_section == 0 {
        return Err(invalid(
            "NEWSDIGEST_ARTICLES_PER_SECTION",
            "must be greater than zero".to_string(),
        ));
    }

    let ingest_max_retries = parse_u32("NEWSDIGEST_INGEST_MAX_RETRIES", "3")?;
    let ingest_retry_delay_secs = parse_u64("NEWSDIGEST_INGEST_RETRY_DELAY_SECS", "300")?;
    let ingest_interval_hours = parse_positive_u64("NEWSDIGEST_INGEST_INTERVAL_HOURS", "6")?;
    let health_interval_hours = parse_positive_u64("NEWSDIGEST_HEALTH_INTERVAL_HOURS", "1")?;
    let maintenance_interval_hours =
        parse_positive_u64("NEWSDIGEST_MAINTENANCE_INTERVAL_HOURS", "24")?;
    let ingest_on_startup = parse_bool("NEWSDIGEST_INGEST_ON_STARTUP", true)?;
    let job_error_backoff_secs = parse_u64("NEWSDIGEST_JOB_ERROR_BACKOFF_SECS", "300")?;

    let nlp_backend = parse_nlp_backend(&or_default("NEWSDIGEST_NLP_BACKEND", "lexicon"))
        .ok_or_else(|| {
            invalid(
                "NEWSDIGEST_NLP_BACKEND",
                "expected `lexicon` or `inference`".to_string(),
            )
        })?;
    let inference_url = lookup("NEWSDIGEST_INFERENCE_URL")
        .ok()
        .map(|url| url.trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty());
    if nlp_backend == NlpBackend::Inference && inference_url.is_none() {
        return Err(ConfigError::MissingEnvVar(
            "NEWSDIGEST_INFERENCE_URL".to_string(),
        ));
    }
    let inference_api_key = lookup("NEWSDIGEST_INFERENCE_API_KEY")
        .ok()
        .filter(|key| !key.is_empty());
    let summary_model = or_default("NEWSDIGEST_SUMMARY_MODEL", "digit82/kobart-summarization");
    let sentiment_model = or_default("NEWSDIGEST_SENTIMENT_MODEL", "snunlp/KR-FinBERT");
    let summary_min_length = parse_u32("NEWSDIGEST_SUMMARY_MIN_LENGTH", "30")?;
    let summary_max_length = parse_u32("NEWSDIGEST_SUMMARY_MAX_LENGTH", "100")?;
    if summary_min_length > summary_max_length {
        return Err(invalid(
            "NEWSDIGEST_SUMMARY_MIN_LENGTH",
            format!("{summary_min_length} exceeds max length {summary_max_length}"),
        ));
    }

    let dashboard_enabled = parse_bool(
        "NEWSDIGEST_DASHBOARD_ENABLED",
        env == Environment::Development,
    )?;

    let api_keys: Vec<String> = lookup("NEWSDIGEST_API_KEYS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect();
    if env != Environment::Development && api_keys.is_empty() {
        return Err(ConfigError::MissingEnvVar("NEWSDIGEST_API_KEYS".to_string()));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        portal_base_url,
        scraper_request_timeout_secs,
        scraper_user_agent,
        articles_per_section,
        ingest_max_retries,
        ingest_retry_delay_secs,
        ingest_interval_hours,
        health_interval_hours,
        maintenance_interval_hours,
        ingest_on_startup,
        job_error_backoff_secs,
        nlp_backend,
        inference_url,
        inference_api_key,
        summary_model,
        sentiment_model,
        summary_min_length,
        summary_max_length,
        dashboard_enabled,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_nlp_backend(s: &str) -> Option<NlpBackend> {
    match s.trim().to_ascii_lowercase().as_str() {
        "lexicon" => Some(NlpBackend::Lexicon),
        "inference" => Some(NlpBackend::Inference),
        _ => None,
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("DATABASE_URL", "sqlite://newsdigest.db?mode=rwc");
        m
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment("development"), Environment::Development);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_fails_without_database_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DATABASE_URL"),
            "expected MissingEnvVar(DATABASE_URL), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_applies_defaults() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.db_max_connections, 5);
        assert_eq!(cfg.db_min_connections, 1);
        assert_eq!(cfg.db_acquire_timeout_secs, 10);
        assert_eq!(cfg.portal_base_url, "https://news.naver.com");
        assert_eq!(cfg.scraper_request_timeout_secs, 30);
        assert!(cfg.scraper_user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(cfg.articles_per_section, 10);
        assert_eq!(cfg.ingest_max_retries, 3);
        assert_eq!(cfg.ingest_retry_delay_secs, 300);
        assert_eq!(cfg.ingest_interval_hours, 6);
        assert_eq!(cfg.health_interval_hours, 1);
        assert_eq!(cfg.maintenance_interval_hours, 24);
        assert!(cfg.ingest_on_startup);
        assert_eq!(cfg.job_error_backoff_secs, 300);
        assert_eq!(cfg.nlp_backend, NlpBackend::Lexicon);
        assert!(cfg.inference_url.is_none());
        assert_eq!(cfg.summary_model, "digit82/kobart-summarization");
        assert_eq!(cfg.sentiment_model, "snunlp/KR-FinBERT");
        assert_eq!(cfg.summary_min_length, 30);
        assert_eq!(cfg.summary_max_length, 100);
        assert!(cfg.dashboard_enabled);
        assert!(cfg.api_keys.is_empty());
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDIGEST_BIND_ADDR"
            ),
            "expected InvalidEnvVar(NEWSDIGEST_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn inference_backend_requires_url() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_NLP_BACKEND", "inference");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::MissingEnvVar(ref v)) if v == "NEWSDIGEST_INFERENCE_URL"
            ),
            "expected MissingEnvVar(NEWSDIGEST_INFERENCE_URL), got: {result:?}"
        );
    }

    #[test]
    fn inference_backend_trims_trailing_slash() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_NLP_BACKEND", "Inference");
        map.insert("NEWSDIGEST_INFERENCE_URL", "http://localhost:8080/");
        map.insert("NEWSDIGEST_INFERENCE_API_KEY", "hf_secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.nlp_backend, NlpBackend::Inference);
        assert_eq!(cfg.inference_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cfg.inference_api_key.as_deref(), Some("hf_secret"));
    }

    #[test]
    fn unknown_nlp_backend_is_rejected() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_NLP_BACKEND", "gpt");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDIGEST_NLP_BACKEND"
            ),
            "got: {result:?}"
        );
    }

    #[test]
    fn production_requires_api_keys() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_ENV", "production");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "NEWSDIGEST_API_KEYS"),
            "got: {result:?}"
        );
    }

    #[test]
    fn production_disables_dashboard_by_default() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_ENV", "production");
        map.insert("NEWSDIGEST_API_KEYS", " key-one , ,key-two ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(!cfg.dashboard_enabled);
        assert_eq!(cfg.api_keys, vec!["key-one", "key-two"]);
    }

    #[test]
    fn dashboard_flag_overrides_environment_default() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_DASHBOARD_ENABLED", "false");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(!cfg.dashboard_enabled);
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_INGEST_ON_STARTUP", "sometimes");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDIGEST_INGEST_ON_STARTUP"
            ),
            "got: {result:?}"
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_INGEST_INTERVAL_HOURS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDIGEST_INGEST_INTERVAL_HOURS"
            ),
            "got: {result:?}"
        );
    }

    #[test]
    fn summary_bounds_must_be_ordered() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_SUMMARY_MIN_LENGTH", "150");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDIGEST_SUMMARY_MIN_LENGTH"
            ),
            "got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map = full_env();
        map.insert("NEWSDIGEST_INFERENCE_API_KEY", "hf_secret");
        map.insert("NEWSDIGEST_API_KEYS", "bearer-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("newsdigest.db"));
        assert!(!rendered.contains("hf_secret"));
        assert!(!rendered.contains("bearer-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
