//! Document store façade.
//!
//! # Responsibility
//! - Evaluate ownership predicates against the index.
//! - Delegate document I/O to the repository layer.
//!
//! # Invariants
//! - Creation predicates run before the document row is written, inside the
//!   same transaction; any failure leaves neither document nor edges.
//! - Find and delete require at least one find predicate.

pub mod document_service;
pub mod document_store;
