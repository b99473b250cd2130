//! Support tools consumed by the workflow.
//!
//! All three are deterministic and in-memory: the knowledge base is a
//! keyword search over built-in documents, order lookup is a fixed dataset
//! behind a regex extractor, and the policy checker is a static rules
//! table. Each returns formatted text for prompt interpolation, so a real
//! search index or order service can replace them behind the same calls.

mod knowledge;
mod orders;
mod policies;

pub use knowledge::{Document, KnowledgeBase};
pub use orders::{Order, OrderItem, OrderLookup, OrderStatus};
pub use policies::{PolicyChecker, RefundBreakdown, RefundEligibility, RETURN_WINDOW_DAYS};
