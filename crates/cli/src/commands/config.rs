use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use restock_core::config::{resolve_config_path, AppConfig};
use toml::Value;

use crate::commands::load_options;

struct ConfigSource {
    doc: Option<Value>,
    path: Option<PathBuf>,
}

impl ConfigSource {
    fn detect(explicit_path: Option<&Path>) -> Self {
        let path = resolve_config_path(explicit_path);
        let doc = path.as_deref().and_then(load_config_file_doc);
        Self { doc, path }
    }

    fn of(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

pub fn run(config_path: Option<&Path>) -> String {
    let config = match AppConfig::load(load_options(config_path)) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };
    let source = ConfigSource::detect(config_path);

    let llm = &config.llm;
    let base_url = match &llm.base_url {
        Some(base_url) => base_url.clone(),
        None => format!("{} (provider default)", llm.effective_base_url()),
    };
    let api_key = if llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    let entries: Vec<(&str, String, &[&str])> = vec![
        ("llm.provider", llm.provider.as_str().to_string(), &["RESTOCK_LLM_PROVIDER"]),
        ("llm.model", llm.model.clone(), &["RESTOCK_LLM_MODEL"]),
        ("llm.base_url", base_url, &["RESTOCK_LLM_BASE_URL"]),
        ("llm.api_key", api_key.to_string(), &["RESTOCK_LLM_API_KEY"]),
        ("llm.timeout_secs", llm.timeout_secs.to_string(), &["RESTOCK_LLM_TIMEOUT_SECS"]),
        ("llm.temperature", llm.temperature.to_string(), &["RESTOCK_LLM_TEMPERATURE"]),
        ("llm.max_tokens", llm.max_tokens.to_string(), &["RESTOCK_LLM_MAX_TOKENS"]),
        (
            "suggestion.reasoning_timeout_secs",
            config.suggestion.reasoning_timeout_secs.to_string(),
            &["RESTOCK_SUGGESTION_REASONING_TIMEOUT_SECS"],
        ),
        (
            "suggestion.horizon_days",
            config.suggestion.horizon_days.to_string(),
            &["RESTOCK_SUGGESTION_HORIZON_DAYS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["RESTOCK_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["RESTOCK_SERVER_PORT"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["RESTOCK_LOGGING_LEVEL", "RESTOCK_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["RESTOCK_LOGGING_FORMAT", "RESTOCK_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in entries {
        lines.push(render_line(key, &value, source.of(key, env_keys)));
    }
    lines.join("\n")
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn nested_key_lookup_walks_tables() {
        let doc: toml::Value = "[llm]\nmodel = \"mistral\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.api_key"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
