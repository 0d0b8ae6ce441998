use crate::config::components::ForgeConfig;
use crate::config::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "schemaforge.yml";

/// Loads the service configuration.
///
/// Resolution order: built-in defaults, then `schemaforge.yml` (from
/// `config_path` when given, otherwise the working directory if present),
/// then environment variables. A `.env` file is loaded into the process
/// environment first.
pub fn load_config(config_path: Option<PathBuf>) -> Result<ForgeConfig, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let mut config = match config_path {
        Some(path) => read_config_file(&resolve_file(path))?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                read_config_file(default)?
            } else {
                ForgeConfig::default()
            }
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn resolve_file(path: PathBuf) -> PathBuf {
    if path.is_dir() {
        path.join(DEFAULT_CONFIG_FILE)
    } else {
        path
    }
}

pub fn read_config_file(path: &Path) -> Result<ForgeConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::incorrect_path(path));
    }
    tracing::info!(path = %path.display(), "loading configuration");
    let file = fs::File::open(path)?;
    let config: Option<ForgeConfig> = serde_yaml::from_reader(file)?;
    Ok(config.unwrap_or_default())
}

/// Overlays environment variables on top of `config`.
///
/// `lookup` abstracts `std::env::var` so callers can supply a fixed map.
pub fn apply_env_overrides<F>(config: &mut ForgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = text("SCHEMAFORGE_ADDR") {
        config.server.addr = addr;
    }

    let models = &mut config.models;
    if let Some(v) = text("OLLAMA_API_BASE") {
        models.ollama_api_base = v;
    }
    if let Some(v) = text("AKASH_API_BASE") {
        models.openai_api_base = v;
    }
    if let Some(v) = text("AKASH_API_KEY") {
        models.openai_api_key = Some(v);
    }
    if let Some(v) = text("SCHEMA_MODEL_NAME") {
        models.schema_model = v;
    }
    if let Some(v) = text("QUERY_MODEL_NAME") {
        models.query_model = v;
    }
    if let Some(v) = text("EXPLANATION_MODEL_NAME") {
        models.explanation_model = v;
    }
    if let Some(v) = text("DATA_MODEL_NAME") {
        models.data_model = v;
    }
    if let Some(v) = text("MAX_TOKENS") {
        models.max_tokens = parse_env("MAX_TOKENS", &v)?;
    }
    if let Some(v) = text("TEMPERATURE") {
        models.temperature = parse_env("TEMPERATURE", &v)?;
    }
    if let Some(v) = text("REQUEST_TIMEOUT") {
        models.request_timeout_secs = parse_env("REQUEST_TIMEOUT", &v)?;
    }

    Ok(())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_expectations() {
        let config = ForgeConfig::default();
        assert_eq!(config.server.addr, "0.0.0.0:5000");
        assert_eq!(config.models.max_tokens, 2048);
        assert_eq!(config.models.request_timeout_secs, 120);
        assert_eq!(config.models.explanation_model, "codellama:7b-instruct-q4_0");
        assert_eq!(config.conversation.max_history, 5);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = ForgeConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SCHEMA_MODEL_NAME", "llama3"),
                ("MAX_TOKENS", "512"),
                ("TEMPERATURE", "0.25"),
                ("AKASH_API_KEY", "secret"),
                ("QUERY_MODEL_NAME", "  "),
            ]),
        )
        .expect("overrides apply");

        assert_eq!(config.models.schema_model, "llama3");
        assert_eq!(config.models.max_tokens, 512);
        assert!((config.models.temperature - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.models.openai_api_key.as_deref(), Some("secret"));
        assert_eq!(config.models.query_model, "");
    }

    #[test]
    fn unparseable_numeric_env_is_an_error() {
        let mut config = ForgeConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("REQUEST_TIMEOUT", "soon")]))
            .expect_err("should reject");
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn reads_partial_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "server:\n  addr: 127.0.0.1:8080\nmodels:\n  query_model: sqlcoder\n"
        )
        .expect("write yaml");

        let config = read_config_file(file.path()).expect("parse config");
        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert_eq!(config.models.query_model, "sqlcoder");
        assert_eq!(config.models.max_tokens, 2048);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_config_file(Path::new("/definitely/not/here.yml")).expect_err("missing");
        assert!(matches!(err, ConfigError::IncorrectPath { .. }));
    }

    #[test]
    fn data_model_falls_back_to_schema_model() {
        let mut config = ForgeConfig::default();
        config.models.schema_model = "mistral".into();
        assert_eq!(config.models.data_model(), "mistral");
        config.models.data_model = "phi3".into();
        assert_eq!(config.models.data_model(), "phi3");
    }
}
