//! Sync layer: delivers assembled updates to the registro PPU backend and
//! runs case searches under caller-owned cancellation.

mod error;
pub mod search;
pub mod submit;
pub mod transport;

pub use error::{SyncError, server_message};
pub use search::{CancelHandle, SearchPage, SearchQuery, SearchSession};
pub use submit::{SubmitOutcome, SubmitSession};
pub use transport::{BulkUpdateReply, PdfAttachment, Transport};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::SyncClient;
