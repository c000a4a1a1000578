//! # Reunite Audit
//!
//! This crate provides the audit-entry contract shared by the Reunite
//! engine crates, along with the optimistic-concurrency primitives used
//! by every mutable engine entity.
//!
//! ## Overview
//!
//! The reunite-audit crate handles:
//! - **Audit entries**: the outbound record emitted by every
//!   state-changing engine operation
//! - **Audit sinks**: the append-only destination abstraction, with an
//!   in-memory implementation for tests and embedded use
//! - **Versioning**: the `Versioned` trait and `ConflictError` used for
//!   compare-and-swap writes
//!
//! ## Legal preservation
//!
//! Entries tied to scam, ban, proof-of-life, or legal-hold events carry
//! `preserved_for_legal = true` and are never removed by retention
//! sweeps, including [`MemoryAuditSink::purge_before`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reunite_audit::{AuditEntry, AuditEventType};
//! use uuid::Uuid;
//!
//! let entry = AuditEntry::new(AuditEventType::CaseStatusChanged, "status changed to triaged")
//!     .with_user(Uuid::now_v7())
//!     .with_reason("initial triage");
//! assert!(!entry.preserved_for_legal);
//! ```

pub mod entry;
pub mod sink;
pub mod version;

// Re-export main types for convenience
pub use entry::{AuditEntry, AuditEventType};
pub use sink::{AuditSink, AuditSinkError, AuditSinkResult, MemoryAuditSink};
pub use version::{ensure_version, ConflictError, Versioned};
