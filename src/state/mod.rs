use std::path::PathBuf;
use std::sync::Arc;

use crate::chat::{ResponseAssembler, TranscriptStore};
use crate::core::config::{AppPaths, Settings};
use crate::llm::{LlmProvider, OllamaProvider};
use crate::rag::{AnswerChain, RetrievalChain, SqliteRagStore};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub transcripts: TranscriptStore,
    pub provider: Arc<dyn LlmProvider>,
    pub chain: Arc<dyn AnswerChain>,
    pub assembler: ResponseAssembler,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// Loads and validates the configuration, opens the vector store (fatal
    /// if the ingestion pipeline has not produced it yet) and wires the
    /// Ollama provider into the retrieval chain.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths.config_path())?;
        let chain_type = settings.rag.chain_type()?;

        let db_path = resolve_store_path(&paths, &settings.vector_store.db_path);
        let store = SqliteRagStore::open(&db_path)
            .await
            .map_err(|e| InitializationError::VectorStore(e.to_string()))?;

        let provider: Arc<dyn LlmProvider> =
            Arc::new(OllamaProvider::new(settings.ollama.host.clone()));

        let chain: Arc<dyn AnswerChain> = Arc::new(RetrievalChain::new(
            provider.clone(),
            Arc::new(store),
            settings.ollama.llm_model.clone(),
            settings.ollama.embedding_model.clone(),
            settings.rag.retrieval_k,
            chain_type,
        ));

        let assembler = ResponseAssembler::new(chain.clone(), &settings.chat);

        Ok(Arc::new(AppState {
            paths,
            settings,
            transcripts: TranscriptStore::new(),
            provider,
            chain,
            assembler,
        }))
    }

    /// State backed by injected fakes, for handler tests.
    #[cfg(test)]
    pub fn with_fakes(provider: Arc<dyn LlmProvider>, chain: Arc<dyn AnswerChain>) -> Arc<Self> {
        let temp = std::env::temp_dir();
        let paths = Arc::new(AppPaths {
            project_root: temp.clone(),
            user_data_dir: temp.clone(),
            log_dir: temp,
        });
        let settings: Settings = serde_yaml::from_str("vector_store:\n  db_path: unused.db\n")
            .expect("test settings should parse");
        let assembler = ResponseAssembler::new(chain.clone(), &settings.chat);

        Arc::new(AppState {
            paths,
            settings,
            transcripts: TranscriptStore::new(),
            provider,
            chain,
            assembler,
        })
    }
}

fn resolve_store_path(paths: &AppPaths, configured: &str) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.is_absolute() {
        path
    } else {
        paths.project_root.join(path)
    }
}
