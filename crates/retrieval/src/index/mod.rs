//! Multi-field voucher index
//!
//! The production engine is an external collaborator reachable through
//! the `VoucherIndex` trait; `MemoryIndex` is the bundled reference
//! engine used by tests and small deployments. Both support the same
//! single-round-trip hybrid query: a lexical best-fields clause OR'd
//! with a dense cosine clause, under hard metadata filters.

pub mod memory;
pub mod query;
pub mod schema;

pub use memory::MemoryIndex;
pub use query::{
    DenseClause, DenseField, FieldFilter, IndexHit, IndexQuery, LexicalClause, LexicalField,
};

use async_trait::async_trait;

use voucher_search_core::{Result, Voucher};

/// The index engine contract
///
/// Writers replace whole documents atomically, keyed by id, with
/// last-writer-wins semantics. Deletion is immediately visible to
/// retrieval. Engine failures surface as `Error::IndexUnavailable`;
/// writes that violate the document invariants are rejected with
/// `Error::InvalidDocument`.
#[async_trait]
pub trait VoucherIndex: Send + Sync + 'static {
    /// Whole-document upsert keyed by voucher id
    async fn upsert(&self, voucher: Voucher) -> Result<()>;

    /// Delete by id; true when a document was removed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Number of stored documents
    async fn count(&self) -> Result<usize>;

    /// Execute one hybrid query
    async fn search(&self, query: IndexQuery) -> Result<Vec<IndexHit>>;
}
