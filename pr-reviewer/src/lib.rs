//! Public entry for the PR review pipeline.
//!
//! The pipeline turns `(change source, config)` into a persisted, severity
//! ranked list of structured findings:
//!
//! 1) **Diff ingestion** — fetch (remote) or accept (manual) a unified
//!    diff and parse it into files × classified line events.
//! 2) **Orchestration** — fan the parsed change out to the enabled
//!    analyzers, each isolated behind its own deadline.
//! 3) **LLM invocation** — every analyzer translates prompt + code slice
//!    into typed findings through the shared `llm-gateway`.
//! 4) **Aggregation** — config filters, deterministic ordering, summary
//!    computation, Markdown rendering.
//! 5) **Persistence** — the completed `ReviewResult` lands in the SQLite
//!    store for later query.
//!
//! The crate uses `tracing` for debug logging and avoids `async-trait` and
//! heap trait objects (no `Box<dyn ...>`). It relies on plain `async fn`
//! and enum-dispatch over thin provider/LLM clients.

pub mod aggregate;
pub mod analyzers;
pub mod errors;
pub mod git_providers;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod service;
pub mod store;

// -----------------------------------------------------------------------------
// Convenience re-exports for downstream users
// -----------------------------------------------------------------------------

pub use errors::{Error, ParseError, PipelineResult, SourceError, StoreError};
pub use git_providers::{ProviderConfig, parse_pr_url};
pub use service::{ReviewService, ServiceLimits};
pub use store::{ReviewQuery, ReviewStore};
