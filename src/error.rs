//! Error types for multipart parsing.

use thiserror::Error;

/// Error type for multipart body parsing.
///
/// All variants are terminal: once one is returned, the parser that produced
/// it must not be used again. The current [`crate::part::Part`] (if any) is
/// considered invalidated the moment an error surfaces.
#[derive(Debug, Error)]
pub enum MultipartError {
    /// The `Content-Type` header was missing, not `multipart/*`, or had no `boundary` parameter.
    #[error("missing or invalid multipart Content-Type header")]
    InvalidContentType,

    /// The announced boundary was empty or otherwise malformed.
    #[error("invalid multipart boundary")]
    InvalidBoundary,

    /// The request carried no body to parse.
    #[error("request has no body")]
    NoRequestBody,

    /// The ring buffer would have to grow past `memory_ceiling` to make progress.
    #[error("multipart buffer exceeded memory ceiling of {ceiling} bytes")]
    MemoryLimit {
        /// The configured ceiling that was hit.
        ceiling: usize,
    },

    /// Cumulative bytes read from the source exceeded `payload_ceiling`.
    #[error("multipart payload exceeded payload ceiling of {ceiling} bytes")]
    PayloadLimit {
        /// The configured ceiling that was hit.
        ceiling: u64,
    },

    /// `max_parts` was reached and another part was requested.
    #[error("multipart payload exceeded the configured part limit of {limit}")]
    PartLimit {
        /// The configured limit that was hit.
        limit: usize,
    },

    /// The source was exhausted before a required terminator was found.
    #[error("unexpected end of stream while scanning for a multipart boundary")]
    UnexpectedEof,

    /// A part's header block could not be parsed.
    #[error("invalid multipart part header block")]
    InvalidHeader,

    /// A part's body (or text convenience accessor) was not valid UTF-8.
    #[error("multipart part body was not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The underlying request body source returned an error.
    #[error(transparent)]
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl MultipartError {
    /// Wraps an arbitrary body-source error as [`MultipartError::Source`].
    pub fn from_source<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MultipartError::Source(Box::new(error))
    }
}
