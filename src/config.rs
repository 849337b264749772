//! Tunable limits for [`crate::parser::MultipartParser`].

/// Configuration knobs for a [`crate::parser::MultipartParser`].
///
/// There is no builder here: the three knobs are independent and always
/// valid in any combination, so a plain struct with [`Default`] is enough.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Maximum capacity the ring buffer may grow to. Exceeding it is fatal
    /// (`MultipartError::MemoryLimit`). Default: 4 MiB.
    pub memory_ceiling: usize,
    /// Maximum cumulative bytes read from the source across the whole body.
    /// Exceeding it is fatal (`MultipartError::PayloadLimit`). Default: 16 MiB.
    pub payload_ceiling: u64,
    /// Maximum number of parts the parser will yield before failing with
    /// `MultipartError::PartLimit`. Default: unbounded.
    pub max_parts: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            memory_ceiling: 4 * 1024 * 1024,
            payload_ceiling: 16 * 1024 * 1024,
            max_parts: None,
        }
    }
}
