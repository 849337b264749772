//! The per-part handle yielded by [`crate::parser::MultipartParser::next_part`].

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::future::poll_fn;
use futures::Stream;
use http::HeaderMap;
use http_body::{Body, Frame};
use tracing::trace;

use crate::error::MultipartError;
use crate::header::{extract_content_type, extract_filename, extract_name};
use crate::parser::MultipartParser;
use crate::scanner::ScanResult;

/// A single logical part of a multipart body.
///
/// Borrows the parser for its lifetime: the borrow checker is what enforces
/// the "at most one live part" rule described in the data model, rather than
/// a runtime flag on [`MultipartParser`].
pub struct Part<'p, B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    parser: &'p mut MultipartParser<B>,
    headers: HeaderMap,
    name: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
}

impl<'p, B> Part<'p, B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    pub(crate) fn new(parser: &'p mut MultipartParser<B>, headers: HeaderMap) -> Self {
        let name = extract_name(&headers);
        let filename = extract_filename(&headers);
        let content_type = extract_content_type(&headers);
        Self {
            parser,
            headers,
            name,
            filename,
            content_type,
        }
    }

    /// The part's headers, case-insensitive and multi-valued.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `name` parameter of `Content-Disposition`, if present.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The `filename` parameter of `Content-Disposition`, if present.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The base value of `Content-Type` (before the first `;`), if present.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns this part's body as a lazy, single-consumer byte stream.
    pub fn body(&mut self) -> PartStream<'_, B> {
        PartStream {
            parser: &mut *self.parser,
            finished: false,
        }
    }

    /// Drains this part's body into a single contiguous buffer.
    pub async fn bytes(mut self) -> Result<Bytes, MultipartError> {
        let mut out = BytesMut::new();
        let mut stream = self.body();
        while let Some(chunk) = stream.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out.freeze())
    }

    /// Drains this part's body and decodes it as UTF-8.
    pub async fn text(self) -> Result<String, MultipartError> {
        let bytes = self.bytes().await?;
        Ok(std::str::from_utf8(&bytes)?.to_string())
    }
}

/// A lazy, single-consumer byte stream over one part's body.
///
/// Pulls further input chunks from the parser's source on demand; never
/// buffers more than the one unconsumed prefix it just scanned out.
pub struct PartStream<'p, B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    parser: &'p mut MultipartParser<B>,
    finished: bool,
}

impl<'p, B> PartStream<'p, B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    /// `poll_fn`-driven convenience wrapper so callers that only need
    /// whole-body draining don't have to pull in `StreamExt`.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, MultipartError> {
        poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await.transpose()
    }

    /// Shared step: try to pull one emittable chunk (or terminal signal) out
    /// of whatever is already in the parser's buffer, without touching the
    /// source. Returns `None` if more input must be pulled first.
    fn try_emit(&mut self) -> Option<Poll<Option<Result<Bytes, MultipartError>>>> {
        match self
            .parser
            .scanner
            .find(&mut self.parser.buffer, &self.parser.part_terminator)
        {
            ScanResult::Found => {
                let match_end = self.parser.buffer.end();
                let chunk = self.parser.buffer.shift_to(match_end);
                self.finished = true;
                self.parser.current_part_finished = true;
                if chunk.is_empty() {
                    Some(Poll::Ready(None))
                } else {
                    Some(Poll::Ready(Some(Ok(chunk))))
                }
            }
            ScanResult::NotFound => {
                self.parser
                    .scanner
                    .probe_partial_suffix(&mut self.parser.buffer, &self.parser.part_terminator);
                if self.parser.buffer.start() > 0 {
                    let match_end = self.parser.buffer.end();
                    let chunk = self.parser.buffer.shift_to(match_end);
                    Some(Poll::Ready(Some(Ok(chunk))))
                } else {
                    None
                }
            }
        }
    }
}

impl<'p, B> Stream for PartStream<'p, B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<Bytes, MultipartError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // `PartStream` only ever holds a `&mut` reference plus plain data, so
        // it is trivially `Unpin`; no structural pinning is needed here.
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        loop {
            if let Some(result) = this.try_emit() {
                return result;
            }
            match Pin::new(&mut this.parser.body).poll_frame(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    return Poll::Ready(Some(Err(MultipartError::UnexpectedEof)));
                }
                Poll::Ready(Some(Err(err))) => {
                    return Poll::Ready(Some(Err(MultipartError::from_source(err))));
                }
                Poll::Ready(Some(Ok(frame))) => match frame_into_data(frame) {
                    Some(data) => {
                        if data.is_empty() {
                            continue;
                        }
                        let new_total = this.parser.bytes_read + data.len() as u64;
                        if new_total > this.parser.config.payload_ceiling {
                            return Poll::Ready(Some(Err(MultipartError::PayloadLimit {
                                ceiling: this.parser.config.payload_ceiling,
                            })));
                        }
                        this.parser.bytes_read = new_total;
                        if let Err(err) = this.parser.buffer.append(&data) {
                            return Poll::Ready(Some(Err(err)));
                        }
                        trace!(len = data.len(), "part stream pulled source chunk");
                    }
                    None => continue,
                },
            }
        }
    }
}

fn frame_into_data(frame: Frame<Bytes>) -> Option<Bytes> {
    frame.into_data().ok()
}
