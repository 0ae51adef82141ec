//! Errors surfaced at the document boundary.
//!
//! Everything beneath [`Document`](crate::Document) signals failure with
//! sentinel values (an empty position, `None`, a zero rectangle); only the
//! boundary operations that accept caller-supplied nodes return these.

use kestrel_dom::{DomError, NodeId};
use thiserror::Error;

/// Failure of a boundary operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The DOM rejected the request.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The node exists but generates no render object.
    #[error("node {0:?} is not rendered")]
    NotRendered(NodeId),
}
