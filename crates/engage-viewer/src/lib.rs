//! # engage-viewer
//!
//! Read side of the engagement audit trail written by `engage-audit`:
//! list and load sessions, render them as a table, JSON, or the raw
//! transcript, search commands by target or tool, re-verify artifact hashes,
//! and export a client-facing compliance report.
//!
//! ```rust,no_run
//! use engage_viewer::{AuditViewer, ViewFormat};
//!
//! let viewer = AuditViewer::open("/tmp/client-2026").unwrap();
//! println!("{}", viewer.view(None, ViewFormat::Table).unwrap());
//! let report = viewer.verify_integrity(None).unwrap();
//! assert!(report.passed());
//! ```

pub mod compliance;
pub mod error;
pub mod integrity;
pub mod render;
pub mod viewer;

pub use error::ViewerError;
pub use integrity::{CheckStatus, FileCheck, IntegrityReport};
pub use render::{integrity_report as render_integrity, search_hits as render_search_hits, ViewFormat};
pub use viewer::{AuditViewer, LoadedSession, SearchField, SearchHit};
