use crate::chunked::ChunkedBody;
use crate::constants::EMPTY_STRING_SHA256;
use bytes::{Buf, Bytes};
use cloudsign_core::hash::{hex_sha256, hex_sha256_read};
use cloudsign_core::{Error, Result};
use std::fmt::{Debug, Formatter};
use std::io::{self, Read, Seek, SeekFrom};

/// A reader that can be rewound.
pub trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

enum Body {
    Empty,
    Bytes(Bytes),
    Seekable(Box<dyn SeekRead>),
    Stream(Box<dyn Read + Send>),
    Chunked(ChunkedBody),
}

/// Body of a request plus the metadata signing needs.
///
/// - empty, in-memory and seekable payloads are repeatable: signing hashes
///   them and leaves them ready to be sent.
/// - one-shot streams are not repeatable: with a known length they are
///   signed chunk by chunk while being sent.
///
/// `Payload` implements [`Read`], so a transport can stream whatever body the
/// signer returned.
pub struct Payload {
    body: Body,
    content_length: Option<u64>,
    content_type: Option<String>,
    content_md5: Option<Vec<u8>>,
}

impl Payload {
    /// A request without body.
    pub fn empty() -> Self {
        Self::with_body(Body::Empty, None)
    }

    /// An in-memory body.
    pub fn from_bytes(bs: impl Into<Bytes>) -> Self {
        let bs = bs.into();
        let len = bs.len() as u64;
        Self::with_body(Body::Bytes(bs), Some(len))
    }

    /// A rewindable body. Hashing starts at the current position and
    /// restores it afterwards.
    pub fn from_seekable(r: impl SeekRead + 'static, content_length: Option<u64>) -> Self {
        Self::with_body(Body::Seekable(Box::new(r)), content_length)
    }

    /// A one-shot stream.
    pub fn from_stream(r: impl Read + Send + 'static, content_length: Option<u64>) -> Self {
        Self::with_body(Body::Stream(Box::new(r)), content_length)
    }

    fn with_body(body: Body, content_length: Option<u64>) -> Self {
        Self {
            body,
            content_length,
            content_type: None,
            content_md5: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Set the raw (not encoded) MD5 digest of the content.
    pub fn with_content_md5(mut self, md5: impl Into<Vec<u8>>) -> Self {
        self.content_md5 = Some(md5.into());
        self
    }

    /// Content length, if known.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Raw MD5 digest of the content, if set.
    pub fn content_md5(&self) -> Option<&[u8]> {
        self.content_md5.as_deref()
    }

    /// Whether the body has no content at all.
    pub fn is_empty(&self) -> bool {
        matches!(self.body, Body::Empty)
    }

    /// Whether the body can be read again after hashing.
    pub fn is_repeatable(&self) -> bool {
        matches!(self.body, Body::Empty | Body::Bytes(_) | Body::Seekable(_))
    }

    /// Whether the body has been wrapped by the chunked signer.
    pub fn is_chunked(&self) -> bool {
        matches!(self.body, Body::Chunked(_))
    }

    /// Whether this payload must be signed with the chunked upload signer:
    /// a non-repeatable body of known, non-zero length.
    pub fn needs_chunked_signing(&self) -> bool {
        matches!(self.body, Body::Stream(_)) && matches!(self.content_length, Some(n) if n > 0)
    }

    /// Hex encoded SHA256 of the whole body, leaving the body unconsumed.
    ///
    /// One-shot streams can only be hashed when they are known to be empty;
    /// anything else must go through the chunked signer.
    pub fn hex_sha256(&mut self) -> Result<String> {
        match &mut self.body {
            Body::Empty => Ok(EMPTY_STRING_SHA256.to_string()),
            Body::Bytes(bs) => Ok(hex_sha256(bs)),
            Body::Seekable(r) => {
                let pos = r.stream_position().map_err(|e| {
                    Error::request_invalid("failed to record payload position").with_source(e)
                })?;
                let hash = match self.content_length {
                    Some(n) => hex_sha256_read(r.by_ref().take(n))?,
                    None => hex_sha256_read(r.by_ref())?,
                };
                r.seek(SeekFrom::Start(pos)).map_err(|e| {
                    Error::request_invalid("failed to reset payload after hashing").with_source(e)
                })?;
                Ok(hash)
            }
            Body::Stream(_) if self.content_length == Some(0) => {
                Ok(EMPTY_STRING_SHA256.to_string())
            }
            Body::Stream(_) => Err(Error::request_invalid(
                "non-repeatable payload can't be reset after hashing, \
                 provide its content length to use chunked signing",
            )),
            Body::Chunked(_) => Err(Error::request_invalid("payload is already signed")),
        }
    }

    /// Take the one-shot stream out, leaving an empty body behind.
    pub(crate) fn take_stream(&mut self) -> Option<Box<dyn Read + Send>> {
        match std::mem::replace(&mut self.body, Body::Empty) {
            Body::Stream(r) => Some(r),
            other => {
                self.body = other;
                None
            }
        }
    }

    /// Replace the body with a signed chunked stream.
    pub(crate) fn set_chunked(&mut self, body: ChunkedBody, framed_length: u64) {
        self.body = Body::Chunked(body);
        self.content_length = Some(framed_length);
        self.content_md5 = None;
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Payload {
    fn from(bs: Bytes) -> Self {
        Self::from_bytes(bs)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bs: Vec<u8>) -> Self {
        Self::from_bytes(bs)
    }
}

impl From<&'static str> for Payload {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::from_bytes(s)
    }
}

impl Read for Payload {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.body {
            Body::Empty => Ok(0),
            Body::Bytes(bs) => {
                let n = buf.len().min(bs.len());
                bs.copy_to_slice(&mut buf[..n]);
                Ok(n)
            }
            Body::Seekable(r) => r.read(buf),
            Body::Stream(r) => r.read(buf),
            Body::Chunked(r) => r.read(buf),
        }
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.body {
            Body::Empty => "empty",
            Body::Bytes(_) => "bytes",
            Body::Seekable(_) => "seekable",
            Body::Stream(_) => "stream",
            Body::Chunked(_) => "chunked",
        };
        f.debug_struct("Payload")
            .field("body", &kind)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish()
    }
}
