mod paths;
mod settings;

pub use paths::AppPaths;
pub use settings::{ChainType, ChatSettings, OllamaSettings, RagSettings, Settings, SettingsError, VectorStoreSettings};
