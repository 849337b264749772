//! The iterator that drives the multipart state machine end to end.

use std::pin::Pin;

use bytes::Bytes;
use futures::future::poll_fn;
use http::HeaderMap;
use http_body::Body;
use tracing::{debug, trace, warn};

use crate::config::ParserConfig;
use crate::error::MultipartError;
use crate::header::{extract_boundary, extract_content_type, parse_header_block};
use crate::needle::Needle;
use crate::part::Part;
use crate::ring_buffer::RingBuffer;
use crate::scanner::{ScanResult, Scanner};

/// States of the part-emission state machine described in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Nothing has been read yet; still searching for the opening boundary.
    Start,
    /// Positioned right after a boundary line; searching for the CRLFCRLF
    /// that ends the next part's header block.
    HeadersPending,
    /// A `Part` has been handed to the consumer and may still be unread.
    PartActive,
    /// The current part's body has been fully drained; deciding whether
    /// another part follows or the terminal boundary has been reached.
    AfterPart,
    /// The terminal `--boundary--` has been seen; discarding the epilogue.
    EpilogueDrain,
    /// No more parts will ever be yielded.
    Done,
}

/// Drives a [`http_body::Body`] through RFC 7578 multipart/form-data framing,
/// yielding one [`Part`] at a time.
///
/// Owns the byte source and the scan buffer exclusively. A [`Part`] borrows
/// this parser for its lifetime, so the compiler — not a runtime flag —
/// enforces that only one part is live at once.
pub struct MultipartParser<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    pub(crate) body: B,
    pub(crate) buffer: RingBuffer,
    pub(crate) scanner: Scanner,
    opening: Needle,
    header_terminator: Needle,
    pub(crate) part_terminator: Needle,
    pub(crate) config: ParserConfig,
    pub(crate) bytes_read: u64,
    pub(crate) current_part_finished: bool,
    state: ParserState,
    parts_yielded: usize,
}

impl<B> MultipartParser<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    /// Builds a parser from a request's headers and body source.
    ///
    /// Fails immediately if `headers` carries no usable
    /// `Content-Type: multipart/<subtype>; boundary=<token>`.
    pub fn from_headers(headers: &HeaderMap, body: B, config: ParserConfig) -> Result<Self, MultipartError> {
        let content_type = extract_content_type(headers).ok_or(MultipartError::InvalidContentType)?;
        if !content_type.starts_with("multipart/") {
            return Err(MultipartError::InvalidContentType);
        }
        let raw_content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or(MultipartError::InvalidContentType)?;
        let boundary = extract_boundary(raw_content_type).ok_or(MultipartError::InvalidBoundary)?;
        Ok(Self::new(body, boundary, config))
    }

    /// Builds a parser directly from an already-extracted boundary token.
    pub fn new(body: B, boundary: impl AsRef<str>, config: ParserConfig) -> Self {
        let boundary = boundary.as_ref();
        let opening = Needle::new(format!("--{boundary}\r\n").into_bytes());
        let part_terminator = Needle::new(format!("\r\n--{boundary}").into_bytes());
        let header_terminator = Needle::new(*b"\r\n\r\n");
        Self {
            body,
            buffer: RingBuffer::new(config.memory_ceiling),
            scanner: Scanner::new(),
            opening,
            header_terminator,
            part_terminator,
            config,
            bytes_read: 0,
            current_part_finished: true,
            state: ParserState::Start,
            parts_yielded: 0,
        }
    }

    /// Returns the next part, or `None` once the body has been fully consumed.
    ///
    /// If the previously-yielded part's body was not read to completion, it
    /// is auto-drained here before the scan for the next part begins.
    pub async fn next_part(&mut self) -> Result<Option<Part<'_, B>>, MultipartError> {
        loop {
            match self.state {
                ParserState::Done => return Ok(None),
                ParserState::PartActive => {
                    self.drain_current_part().await?;
                    self.state = ParserState::AfterPart;
                }
                ParserState::Start => {
                    self.skip_preamble().await?;
                    self.state = ParserState::HeadersPending;
                }
                ParserState::AfterPart => {
                    self.decide_after_part().await?;
                }
                ParserState::EpilogueDrain => {
                    self.drain_epilogue().await?;
                    self.state = ParserState::Done;
                    return Ok(None);
                }
                ParserState::HeadersPending => {
                    if let Some(limit) = self.config.max_parts {
                        if self.parts_yielded >= limit {
                            warn!(limit, "multipart part limit reached");
                            return Err(MultipartError::PartLimit { limit });
                        }
                    }
                    let header_bytes = self.scan_headers().await?;
                    let headers = parse_header_block(&header_bytes);
                    self.parts_yielded += 1;
                    self.current_part_finished = false;
                    self.state = ParserState::PartActive;
                    debug!(part = self.parts_yielded, "multipart part header parsed");
                    return Ok(Some(Part::new(self, headers)));
                }
            }
        }
    }

    /// Repeatedly scans for `needle`, pulling more source chunks as needed.
    /// Does not shift the buffer; the caller decides what to do with a match.
    async fn scan_until(&mut self, needle: &Needle) -> Result<(), MultipartError> {
        loop {
            if self.scanner.find(&mut self.buffer, needle) == ScanResult::Found {
                return Ok(());
            }
            if !self.pull_chunk().await? {
                return Err(MultipartError::UnexpectedEof);
            }
        }
    }

    async fn skip_preamble(&mut self) -> Result<(), MultipartError> {
        let opening = self.opening.clone();
        self.scan_until(&opening).await?;
        let match_end = self.buffer.end();
        let _preamble = self.buffer.shift_to(match_end);
        trace!("multipart opening boundary found, preamble discarded");
        Ok(())
    }

    async fn scan_headers(&mut self) -> Result<Bytes, MultipartError> {
        let header_terminator = self.header_terminator.clone();
        self.scan_until(&header_terminator).await?;
        let match_end = self.buffer.end();
        Ok(self.buffer.shift_to(match_end))
    }

    /// Drains whatever remains of the current part's body without surfacing
    /// it, used when the consumer moved on without reading to completion.
    async fn drain_current_part(&mut self) -> Result<(), MultipartError> {
        if self.current_part_finished {
            return Ok(());
        }
        let part_terminator = self.part_terminator.clone();
        loop {
            match self.scanner.find(&mut self.buffer, &part_terminator) {
                ScanResult::Found => {
                    let match_end = self.buffer.end();
                    self.buffer.shift_to(match_end);
                    self.current_part_finished = true;
                    return Ok(());
                }
                ScanResult::NotFound => {
                    self.scanner.probe_partial_suffix(&mut self.buffer, &part_terminator);
                    if self.buffer.start() > 0 {
                        let match_end = self.buffer.end();
                        self.buffer.shift_to(match_end);
                        continue;
                    }
                    if !self.pull_chunk().await? {
                        return Err(MultipartError::UnexpectedEof);
                    }
                }
            }
        }
    }

    /// Peeks the two bytes following a consumed boundary to tell apart the
    /// terminal `--boundary--` from another `boundary CRLF part` sequence.
    async fn decide_after_part(&mut self) -> Result<(), MultipartError> {
        while self.buffer.valid() < 2 {
            if !self.pull_chunk().await? {
                return Err(MultipartError::UnexpectedEof);
            }
        }
        let is_terminal = &self.buffer.window()[..2] == b"--";
        self.state = if is_terminal {
            ParserState::EpilogueDrain
        } else {
            ParserState::HeadersPending
        };
        Ok(())
    }

    async fn drain_epilogue(&mut self) -> Result<(), MultipartError> {
        loop {
            if !self.pull_chunk().await? {
                return Ok(());
            }
            self.buffer.discard_all();
        }
    }

    /// Pulls the next data frame from the source, appending it to the
    /// buffer. Returns `Ok(false)` once the source is exhausted.
    async fn pull_chunk(&mut self) -> Result<bool, MultipartError> {
        loop {
            let frame = poll_fn(|cx| Pin::new(&mut self.body).poll_frame(cx)).await;
            match frame {
                None => return Ok(false),
                Some(Err(err)) => return Err(MultipartError::from_source(err)),
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) => {
                        if data.is_empty() {
                            continue;
                        }
                        let new_total = self.bytes_read + data.len() as u64;
                        if new_total > self.config.payload_ceiling {
                            return Err(MultipartError::PayloadLimit {
                                ceiling: self.config.payload_ceiling,
                            });
                        }
                        self.bytes_read = new_total;
                        self.buffer.append(&data)?;
                        return Ok(true);
                    }
                    Err(_trailers) => continue,
                },
            }
        }
    }
}
