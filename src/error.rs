//! Error type for heap construction and value ingestion.
//!
//! Comparing values never fails. Errors only arise while building the values
//! to compare: malformed regular expression flags, misaligned typed-array
//! buffers, mutation helpers pointed at the wrong kind of object, and CBOR
//! documents that have no counterpart in the value model.

use crate::heap::ObjectId;
use crate::object::ElementType;
use thiserror::Error;

/// Errors raised by [`Heap`](crate::heap::Heap) builders and the CBOR importer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CongruenceError {
    /// A regular expression flag outside `dgimsuvy`.
    #[error("invalid regular expression flag `{0}`")]
    InvalidRegexFlag(char),

    /// A regular expression flag given twice.
    #[error("duplicate regular expression flag `{0}`")]
    DuplicateRegexFlag(char),

    /// Byte length is not a multiple of the element width.
    #[error("{len} bytes cannot be viewed as {element:?} elements")]
    MisalignedBuffer {
        /// Requested element type.
        element: ElementType,
        /// Length of the byte buffer.
        len: usize,
    },

    /// The id does not refer to a live slot of the heap.
    #[error("{0} does not refer to a live heap object")]
    DanglingObject(ObjectId),

    /// A mutation helper was handed a primitive.
    #[error("expected an object, found {0}")]
    NotAnObject(&'static str),

    /// A mutation helper was handed an object of the wrong kind.
    #[error("{id} is not {expected}")]
    WrongKind {
        /// Target object.
        id: ObjectId,
        /// Human-readable name of the expected kind.
        expected: &'static str,
    },

    /// Only booleans, numbers, strings and symbols can be boxed.
    #[error("cannot box a {0}")]
    NotBoxable(&'static str),

    /// The CBOR document could not be decoded.
    #[error("failed to decode CBOR: {0}")]
    Cbor(String),

    /// The CBOR document decoded but contains an item with no value counterpart.
    #[error("unsupported CBOR item: {0}")]
    UnsupportedCbor(String),
}
