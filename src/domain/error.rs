//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the hierarchy's own invariants.
/// These are independent of store or classifier concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The store's set of parentless units is not exactly one node.
    ///
    /// Fatal configuration problem (malformed or empty tree), not a normal
    /// empty-result case. The resolver performs no recovery.
    #[error("no unique root organisation unit: found {count}")]
    NoUniqueRoot { count: usize },
}
