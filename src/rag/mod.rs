pub mod chain;
pub mod sqlite;
pub mod store;

pub use chain::{AnswerChain, ChainOutput, Passage, RetrievalChain};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
