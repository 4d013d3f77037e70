//! Search pipeline: chat queries, document uploads, and their bookkeeping.

mod service;
pub mod staging;
pub mod types;

pub use service::{SearchApi, SearchService};
pub use types::{ChatRequest, ChatTurn, ServiceError, UploadReport};
