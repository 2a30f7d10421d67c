//! Chunk sources feeding the parser.
//!
//! A source yields the document as a sequence of UTF-8 text chunks. Chunk
//! boundaries are arbitrary; the parser's output does not depend on them.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{ParserError, Result};

/// Pull-based producer of input chunks.
#[async_trait]
pub trait ChunkSource: Send {
    /// Next chunk, or `None` once the input is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<String>>;
}

/// Reads from an async byte stream and decodes UTF-8.
///
/// A multi-byte character split across reads is carried over to the next
/// chunk.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buffer: Vec<u8>,
    /// Undecoded tail of the previous read.
    pending: Vec<u8>,
    /// Byte offset of the start of `pending` in the stream.
    offset: u64,
    done: bool,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// A `chunk_size` of 0 is treated as 1.
    #[must_use]
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0; chunk_size.max(1)],
            pending: Vec::new(),
            offset: 0,
            done: false,
        }
    }

    /// Bytes decoded so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

#[async_trait]
impl<R> ChunkSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            if self.done {
                return Ok(None);
            }

            let read = self.reader.read(&mut self.buffer).await?;
            if read == 0 {
                self.done = true;
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Err(ParserError::Encoding {
                    offset: self.offset,
                });
            }
            self.pending.extend_from_slice(&self.buffer[..read]);

            let valid = match std::str::from_utf8(&self.pending) {
                Ok(_) => self.pending.len(),
                Err(err) if err.error_len().is_some() => {
                    self.done = true;
                    return Err(ParserError::Encoding {
                        offset: self.offset + err.valid_up_to() as u64,
                    });
                }
                Err(err) => err.valid_up_to(),
            };
            if valid == 0 {
                continue;
            }

            let tail = self.pending.split_off(valid);
            let head = std::mem::replace(&mut self.pending, tail);
            self.offset += valid as u64;
            let text = String::from_utf8(head).map_err(|err| ParserError::Encoding {
                offset: self.offset - valid as u64 + err.utf8_error().valid_up_to() as u64,
            })?;
            return Ok(Some(text));
        }
    }
}

/// Slices an in-memory document into chunks on character boundaries.
#[derive(Debug, Clone)]
pub struct StrSource {
    text: String,
    chunk_size: usize,
    position: usize,
}

impl StrSource {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_chunk_size(text, DEFAULT_CHUNK_SIZE)
    }

    /// Chunks are `chunk_size` bytes, extended to the next character
    /// boundary where needed. A `chunk_size` of 0 is treated as 1.
    #[must_use]
    pub fn with_chunk_size(text: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            text: text.into(),
            chunk_size: chunk_size.max(1),
            position: 0,
        }
    }
}

#[async_trait]
impl ChunkSource for StrSource {
    async fn next_chunk(&mut self) -> Result<Option<String>> {
        if self.position >= self.text.len() {
            return Ok(None);
        }
        let mut end = (self.position + self.chunk_size).min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end += 1;
        }
        let chunk = self.text[self.position..end].to_string();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// Adapts any iterator of strings.
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    chunks: I,
}

impl<I, S> IterSource<I>
where
    I: Iterator<Item = S> + Send,
    S: Into<String>,
{
    pub fn new(chunks: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            chunks: chunks.into_iter(),
        }
    }
}

#[async_trait]
impl<I, S> ChunkSource for IterSource<I>
where
    I: Iterator<Item = S> + Send,
    S: Into<String>,
{
    async fn next_chunk(&mut self) -> Result<Option<String>> {
        Ok(self.chunks.next().map(Into::into))
    }
}
