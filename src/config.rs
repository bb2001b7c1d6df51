use serde::Serialize;

/// The one collection the similarity query reads from.
pub const COLLECTION_NAME: &str = "document_collection";

pub const DEFAULT_N_RESULTS: usize = 5;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

pub const CHAT_TEMPERATURE: f32 = 0.7;
/// Context window requested from the chat model, in tokens.
pub const CHAT_NUM_CTX: u32 = 16384;

/// SQLite file created inside the store directory.
pub const STORE_FILE_NAME: &str = "vectors.sqlite3";

/// Log filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Generation options sent with every chat request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
    pub num_ctx: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: CHAT_TEMPERATURE,
            num_ctx: CHAT_NUM_CTX,
        }
    }
}

/// Options for opening the persistent vector store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub file_name: String,
    /// Create the store directory when it does not exist yet.
    pub create_if_missing: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            file_name: STORE_FILE_NAME.to_string(),
            create_if_missing: true,
        }
    }
}
