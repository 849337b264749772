//! Streaming multipart/form-data body parser with bounded memory usage.
//!
//! [`MultipartParser`] consumes an [`http_body::Body`] chunk by chunk and
//! yields one [`Part`] at a time, each exposing its own lazy byte stream, so
//! a consumer can forward a large upload without buffering the whole request
//! (or even the whole part) in memory.
//!
//! ```ignore
//! let mut parser = MultipartParser::from_headers(&headers, body, ParserConfig::default())?;
//! while let Some(part) = parser.next_part().await? {
//!     println!("{:?} -> {} bytes", part.name(), part.bytes().await?.len());
//! }
//! ```

mod config;
mod error;
mod header;
mod needle;
mod part;
mod parser;
mod ring_buffer;
mod scanner;

pub use config::ParserConfig;
pub use error::MultipartError;
pub use part::{Part, PartStream};
pub use parser::MultipartParser;
