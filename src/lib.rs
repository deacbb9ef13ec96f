//! # peermatch-gateway
//!
//! REST API and WebSocket gateway for a peer help-request matching
//! workflow: students post help requests, helpers volunteer, the
//! requester accepts one offer, and either party finishes the session.
//!
//! The lifecycle transitions that matter — accept and complete — are
//! single atomic conditional writes against a shared store, so the
//! independently acting clients that drive them cannot race each other
//! into duplicate matches or double cleanup.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket, pollers)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── MatchService (service/)
//!     ├── EventBus (domain/)        ── push channel
//!     ├── Poller (poll/)            ── interval fallback
//!     │
//!     ├── WorkflowStore (store/)
//!     │     ├── MemoryStore
//!     │     └── PostgresStore
//!     │
//!     └── AssistantClient (assistant/)
//! ```

pub mod api;
pub mod app_state;
pub mod assistant;
pub mod config;
pub mod domain;
pub mod error;
pub mod poll;
pub mod service;
pub mod store;
pub mod ws;
