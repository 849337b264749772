use std::convert::Infallible;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue};
use http_body::Frame;
use http_body_util::StreamBody;
use futures::stream;

pub type TestBody = StreamBody<stream::Iter<std::vec::IntoIter<Result<Frame<Bytes>, Infallible>>>>;

/// Builds a body that yields `chunks` as successive frames, one per poll.
pub fn chunked_body(chunks: Vec<&'static [u8]>) -> TestBody {
    let frames: Vec<Result<Frame<Bytes>, Infallible>> = chunks
        .into_iter()
        .map(|c| Ok(Frame::data(Bytes::from_static(c))))
        .collect();
    StreamBody::new(stream::iter(frames))
}

/// Builds a body that yields the whole input as one frame.
pub fn whole_body(data: &'static [u8]) -> TestBody {
    chunked_body(vec![data])
}

/// Splits `data` into single-byte chunks, exercising the worst-case framing.
pub fn byte_by_byte_body(data: &'static [u8]) -> TestBody {
    let frames: Vec<Result<Frame<Bytes>, Infallible>> = data
        .iter()
        .map(|&b| Ok(Frame::data(Bytes::copy_from_slice(&[b]))))
        .collect();
    StreamBody::new(stream::iter(frames))
}

/// A `Content-Type: multipart/form-data; boundary=<boundary>` header map.
pub fn content_type_headers(boundary: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("multipart/form-data; boundary={boundary}");
    headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_str(&value).unwrap());
    headers
}
