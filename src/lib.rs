//! # Heartbeads Comments
//!
//! Threaded comments on beads issues, stored as records on the AT Protocol
//! network and read back through a GraphQL indexer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   comments ┐
//! │   Indexer    │────────────┼──▶ filter ──▶ profiles ──▶ assemble ──▶ thread ──▶ select
//! │  (GraphQL)   │   likes ───┘                  ▲
//! └──────────────┘                               │
//!                                       ┌────────┴───────┐
//!                                       │  Profile API   │
//!                                       └────────────────┘
//! ```
//!
//! Reading is anonymous. Posting ([`publish`]) needs a session.
//!
//! ## Quick Start
//!
//! ```bash
//! hbc get hb-123               # threaded comments on one issue
//! hbc list --pattern 'hb-*'    # comments across matching issues
//! hbc get hb-123 --json
//! hbc add hb-123 "Looks good"  # needs HB_DID and HB_ACCESS_TOKEN
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`indexer`] | Paginated GraphQL record fetch |
//! | [`profile`] | Bounded-concurrency profile resolution |
//! | [`records`] | Subject filtering and payload field access |
//! | [`assemble`] | Records + likes + profiles → comments |
//! | [`thread`] | Reply-tree construction and ordering |
//! | [`fetch`] | Retrieval pipeline and root selection |
//! | [`format`] | Text and JSON rendering |
//! | [`publish`] | Posting new comments |

pub mod assemble;
pub mod config;
pub mod fetch;
pub mod format;
pub mod indexer;
pub mod models;
pub mod profile;
pub mod publish;
pub mod records;
pub mod thread;
