// ABOUTME: Backend API module — wire types, channel frame codec, and the HTTP client.
// ABOUTME: ChatBackend is the seam the TUI runtime talks through.

pub mod frame;
pub mod http;
pub mod types;

pub use frame::{Frame, OutboundFormat, parse_frame};
pub use http::{ApiError, ApiResult, ChatBackend, HttpBackend};
pub use types::{ChatMessage, Role};
