#![deny(missing_docs)]

//! Core library for SimpliMedi-Search: a thin Vectara client for uploading medical records and
//! chatting with AI-generated summaries of them.

/// HTTP routing and REST handlers.
pub mod api;
/// Selectable response languages and summarizer models.
pub mod catalog;
/// Per-session chat transcripts and reply formatting.
pub mod chat;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Upload and query counters.
pub mod metrics;
/// Chat and upload orchestration on top of the Vectara client.
pub mod search;
/// Vectara auth, indexing, and query client.
pub mod vectara;
