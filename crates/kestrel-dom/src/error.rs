//! DOM exceptions surfaced at the mutation boundary.
//!
//! [§ 2.5 DOMException](https://webidl.spec.whatwg.org/#idl-DOMException-error-names)

use thiserror::Error;

/// Errors raised by checked DOM mutations.
///
/// Each variant corresponds to a `DOMException` name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// "NotFoundError: The object can not be found here."
    #[error("node not found")]
    NotFound,
    /// "IndexSizeError: The index is not in the allowed range."
    #[error("offset {offset} exceeds node length {max}")]
    IndexSize {
        /// The rejected offset.
        offset: usize,
        /// The node's length.
        max: usize,
    },
    /// "HierarchyRequestError: The operation would yield an incorrect node tree."
    #[error("operation would yield an incorrect node tree")]
    HierarchyRequest,
    /// "WrongDocumentError: The object is in the wrong document."
    #[error("node belongs to a different document")]
    WrongDocument,
}
