//! Shared test fixtures for the Genesys export workspace.
//!
//! Provides a `wiremock` server that speaks the subset of the Genesys Cloud
//! API the export consumes:
//! - OAuth client-credentials token endpoint (`/oauth/token`)
//! - Page-numbered listing endpoints under `/api/v2`
//!
//! Each test starts its own server, so fixtures never share state.

mod fixtures;

pub use fixtures::*;
