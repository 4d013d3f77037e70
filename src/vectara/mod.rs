//! Vectara indexing and query service integration.

pub mod auth;
pub mod client;
mod corpus;
pub mod query;
pub mod types;
mod upload;

pub use auth::TokenCache;
pub use client::VectaraClient;
pub use types::{
    AccessToken, CorpusDefinition, CorpusTarget, CreatedCorpus, Credential, Credentials,
    FileUpload, MetadataEntry, Passage, QueryRequest, QueryResult, ResponseDocument, StatusEntry,
    UploadDisposition, UploadReceipt, UploadRequest, VectaraError,
};
pub use upload::infer_mime_type;
