// iosim-api: Async client for the text-completion service used by the command fallback

pub mod completion;
pub mod error;
pub mod transport;

pub use completion::{
    CompletionClient, CompletionRequest, CompletionResponse, DEFAULT_ENDPOINT, Message, Role,
    StopReason, TokenUsage,
};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
