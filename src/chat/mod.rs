pub mod assembler;
pub mod stream;
pub mod transcript;

pub use assembler::ResponseAssembler;
pub use transcript::{Message, Role, TranscriptStore};
