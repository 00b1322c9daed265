//! Retrieval chain — embed the query, fetch top-k chunks, stuff them into a
//! prompt and ask the language model once.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::store::RagStore;
use crate::core::config::ChainType;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

/// A retrieved unit of source text with provenance metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub text: String,
    pub source: Option<String>,
    pub page: Option<i64>,
}

/// Answer text plus the passages it was conditioned on, in retrieval order.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub result: String,
    pub source_documents: Vec<Passage>,
}

/// The retrieval+generation abstraction the response assembler talks to.
#[async_trait]
pub trait AnswerChain: Send + Sync {
    async fn invoke(&self, query: &str) -> Result<ChainOutput, ApiError>;
}

pub struct RetrievalChain {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn RagStore>,
    llm_model: String,
    embedding_model: String,
    retrieval_k: usize,
    chain_type: ChainType,
}

impl RetrievalChain {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn RagStore>,
        llm_model: String,
        embedding_model: String,
        retrieval_k: usize,
        chain_type: ChainType,
    ) -> Self {
        Self {
            provider,
            store,
            llm_model,
            embedding_model,
            retrieval_k,
            chain_type,
        }
    }

    fn build_prompt(&self, query: &str, passages: &[Passage]) -> String {
        match self.chain_type {
            ChainType::Stuff => {
                let mut context = String::new();
                for passage in passages {
                    context.push_str(&passage.text);
                    context.push_str("\n\n");
                }

                format!(
                    "Use the following pieces of context to answer the question at the end. \
                     If you don't know the answer, just say that you don't know.\n\n\
                     {}Question: {}\nHelpful Answer:",
                    context, query
                )
            }
        }
    }
}

#[async_trait]
impl AnswerChain for RetrievalChain {
    async fn invoke(&self, query: &str) -> Result<ChainOutput, ApiError> {
        let embeddings = self
            .provider
            .embed(&self.embedding_model, &[query.to_string()])
            .await?;
        let query_embedding = embeddings
            .first()
            .ok_or_else(|| ApiError::Internal("embedding model returned no vector".to_string()))?;

        let results = self.store.search(query_embedding, self.retrieval_k).await?;
        tracing::debug!("retrieved {} passages for query", results.len());

        let passages: Vec<Passage> = results
            .into_iter()
            .map(|result| {
                let page = result
                    .chunk
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("page"))
                    .and_then(|v| v.as_i64());
                let source = if result.chunk.source.is_empty() {
                    None
                } else {
                    Some(result.chunk.source)
                };
                Passage {
                    text: result.chunk.content,
                    source,
                    page,
                }
            })
            .collect();

        let prompt = self.build_prompt(query, &passages);
        let result = self.provider.generate(&self.llm_model, &prompt).await?;

        Ok(ChainOutput {
            result,
            source_documents: passages,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::rag::store::{ChunkSearchResult, StoredChunk};

    struct FakeProvider {
        prompts: Mutex<Vec<String>>,
        answer: String,
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn generate(&self, _model: &str, prompt: &str) -> Result<String, ApiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }

        async fn embed(&self, _model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct FakeStore {
        chunks: Vec<StoredChunk>,
    }

    #[async_trait]
    impl RagStore for FakeStore {
        async fn insert(&self, _chunk: StoredChunk, _embedding: Vec<f32>) -> Result<(), ApiError> {
            Ok(())
        }

        async fn search(
            &self,
            _query_embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<ChunkSearchResult>, ApiError> {
            Ok(self
                .chunks
                .iter()
                .take(limit)
                .cloned()
                .map(|chunk| ChunkSearchResult { chunk, score: 1.0 })
                .collect())
        }

        async fn count(&self) -> Result<usize, ApiError> {
            Ok(self.chunks.len())
        }
    }

    fn chain_with(chunks: Vec<StoredChunk>, answer: &str) -> (RetrievalChain, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider {
            prompts: Mutex::new(Vec::new()),
            answer: answer.to_string(),
        });
        let chain = RetrievalChain::new(
            provider.clone(),
            Arc::new(FakeStore { chunks }),
            "llm".to_string(),
            "embed".to_string(),
            4,
            ChainType::Stuff,
        );
        (chain, provider)
    }

    #[tokio::test]
    async fn invoke_returns_answer_and_passages_in_order() {
        let chunks = vec![
            StoredChunk {
                chunk_id: "1".to_string(),
                content: "Enrollment opens in May.".to_string(),
                source: "a.pdf".to_string(),
                metadata: Some(json!({ "page": 2 })),
            },
            StoredChunk {
                chunk_id: "2".to_string(),
                content: "Fees are due in June.".to_string(),
                source: "".to_string(),
                metadata: None,
            },
        ];
        let (chain, _provider) = chain_with(chunks, "The answer.");

        let output = chain.invoke("When does enrollment open?").await.expect("invoke");

        assert_eq!(output.result, "The answer.");
        assert_eq!(output.source_documents.len(), 2);
        assert_eq!(output.source_documents[0].source.as_deref(), Some("a.pdf"));
        assert_eq!(output.source_documents[0].page, Some(2));
        assert_eq!(output.source_documents[1].source, None);
        assert_eq!(output.source_documents[1].page, None);
    }

    #[tokio::test]
    async fn stuff_prompt_contains_context_and_question() {
        let chunks = vec![StoredChunk {
            chunk_id: "1".to_string(),
            content: "Library hours are 8am-10pm.".to_string(),
            source: "handbook.pdf".to_string(),
            metadata: None,
        }];
        let (chain, provider) = chain_with(chunks, "ok");

        chain.invoke("When is the library open?").await.expect("invoke");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Library hours are 8am-10pm."));
        assert!(prompts[0].contains("Question: When is the library open?"));
    }

    #[tokio::test]
    async fn empty_store_yields_no_passages() {
        let (chain, _provider) = chain_with(Vec::new(), "I don't know.");

        let output = chain.invoke("anything").await.expect("invoke");

        assert!(output.source_documents.is_empty());
        assert_eq!(output.result, "I don't know.");
    }
}
