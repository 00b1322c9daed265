use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config file not found: {0}")]
    Missing(String),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    /// All retrieved passages are stuffed into a single prompt.
    Stuff,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub ollama: OllamaSettings,
    pub vector_store: VectorStoreSettings,
    #[serde(default)]
    pub rag: RagSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreSettings {
    pub db_path: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagSettings {
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
    #[serde(default = "default_chain_type")]
    pub chain_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_greetings")]
    pub greetings: Vec<String>,
    #[serde(default = "default_greeting_reply")]
    pub greeting_reply: String,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::Missing(path.display().to_string()));
        }

        let contents = fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.ollama.host.trim().is_empty() {
            return Err(SettingsError::Invalid("ollama.host must not be empty".into()));
        }
        if self.ollama.llm_model.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "ollama.llm_model must not be empty".into(),
            ));
        }
        if self.ollama.embedding_model.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "ollama.embedding_model must not be empty".into(),
            ));
        }
        if self.vector_store.db_path.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "vector_store.db_path must not be empty".into(),
            ));
        }
        if self.rag.retrieval_k == 0 {
            return Err(SettingsError::Invalid(
                "rag.retrieval_k must be at least 1".into(),
            ));
        }
        self.rag.chain_type()?;
        Ok(())
    }
}

impl RagSettings {
    pub fn chain_type(&self) -> Result<ChainType, SettingsError> {
        match self.chain_type.as_str() {
            "stuff" => Ok(ChainType::Stuff),
            other => Err(SettingsError::Invalid(format!(
                "unsupported rag.chain_type: {}",
                other
            ))),
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            llm_model: default_llm_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            retrieval_k: default_retrieval_k(),
            chain_type: default_chain_type(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            greetings: default_greetings(),
            greeting_reply: default_greeting_reply(),
        }
    }
}

fn default_app_name() -> String {
    "RAG Chat".to_string()
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_collection() -> String {
    "documents".to_string()
}

fn default_retrieval_k() -> usize {
    4
}

fn default_chain_type() -> String {
    "stuff".to_string()
}

fn default_greetings() -> Vec<String> {
    vec![
        "hi".to_string(),
        "hello".to_string(),
        "hey".to_string(),
        "မင်္ဂလာပါ".to_string(),
    ]
}

fn default_greeting_reply() -> String {
    "Hello! How can I assist you today?".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Settings {
        serde_yaml::from_str(yaml).expect("settings should parse")
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let settings = parse("vector_store:\n  db_path: data/rag.db\n");

        assert_eq!(settings.app_name, "RAG Chat");
        assert_eq!(settings.ollama.host, "http://localhost:11434");
        assert_eq!(settings.rag.retrieval_k, 4);
        assert_eq!(settings.rag.chain_type().unwrap(), ChainType::Stuff);
        assert!(settings.chat.greetings.contains(&"hello".to_string()));
        assert!(settings.chat.greetings.contains(&"မင်္ဂလာပါ".to_string()));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn full_config_overrides_defaults() {
        let settings = parse(
            "app_name: Campus Helpdesk\n\
             ollama:\n  host: http://10.0.0.5:11434\n  llm_model: mistral\n  embedding_model: mxbai-embed-large\n\
             vector_store:\n  db_path: /srv/rag/store.db\n  collection: handbook\n\
             rag:\n  retrieval_k: 6\n  chain_type: stuff\n\
             chat:\n  greetings: [yo]\n  greeting_reply: Hi there.\n",
        );

        assert_eq!(settings.app_name, "Campus Helpdesk");
        assert_eq!(settings.ollama.llm_model, "mistral");
        assert_eq!(settings.vector_store.collection, "handbook");
        assert_eq!(settings.rag.retrieval_k, 6);
        assert_eq!(settings.chat.greetings, vec!["yo".to_string()]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_retrieval_k_is_rejected() {
        let settings = parse("vector_store:\n  db_path: data/rag.db\nrag:\n  retrieval_k: 0\n");
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn unknown_chain_type_is_rejected() {
        let settings =
            parse("vector_store:\n  db_path: data/rag.db\nrag:\n  chain_type: map_reduce\n");
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/config.yml")).unwrap_err();
        assert!(matches!(err, SettingsError::Missing(_)));
    }
}
