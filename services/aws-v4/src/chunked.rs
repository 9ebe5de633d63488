// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Chunked upload signing.
//!
//! - [Signature calculations for the Authorization header: transferring payload in multiple chunks](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html)
//!
//! The request headers are signed once with a seed signature. The body is
//! then sent as a sequence of frames
//!
//! ```text
//! <hex-length>;chunk-signature=<signature>\r\n<data>\r\n
//! ```
//!
//! ending with a zero-length frame. Every chunk signature covers the
//! signature before it, so frames must be produced strictly in order.

use crate::constants::*;
use crate::sign_request::{authorization, calculate_signature};
use crate::{Credential, Payload, RequestSigner};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use cloudsign_core::hash::{hex_sha256, KeyedHmacSha256};
use cloudsign_core::time::{format_iso8601, DateTime};
use cloudsign_core::{Error, Result, SigningRequest};
use http::header::{HeaderName, AUTHORIZATION, CONTENT_ENCODING, CONTENT_LENGTH, DATE};
use http::Request;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::io::{self, Read};

/// Total length of the framed body for `original_length` bytes of content
/// cut into chunks of `chunk_size`.
///
/// Both values must be positive.
pub fn calculate_chunked_content_length(original_length: u64, chunk_size: usize) -> Result<u64> {
    if original_length == 0 {
        return Err(Error::request_invalid(
            "chunked content length requires a positive original length",
        ));
    }
    if chunk_size == 0 {
        return Err(Error::request_invalid("chunk size must be positive"));
    }

    let chunk_size = chunk_size as u64;
    let full_chunks = original_length / chunk_size;
    let remainder = original_length % chunk_size;

    let overflow = || Error::request_invalid("chunked content length overflows u64");
    let mut total = frame_length(0).ok_or_else(overflow)?;
    if full_chunks > 0 {
        let full = frame_length(chunk_size)
            .and_then(|n| n.checked_mul(full_chunks))
            .ok_or_else(overflow)?;
        total = total.checked_add(full).ok_or_else(overflow)?;
    }
    if remainder > 0 {
        let last = frame_length(remainder).ok_or_else(overflow)?;
        total = total.checked_add(last).ok_or_else(overflow)?;
    }
    Ok(total)
}

/// Length of one frame carrying `data_length` bytes.
fn frame_length(data_length: u64) -> Option<u64> {
    let overhead = format!("{data_length:x}").len() as u64
        + CHUNK_SIGNATURE.len() as u64
        + SIGNATURE_LENGTH
        + 2 * CRLF.len() as u64;
    data_length.checked_add(overhead)
}

/// Signing chain carried across the chunks of one upload.
pub struct ChunkedUploadState {
    signature: String,
    chunk_size: usize,
    timestamp: String,
    scope: String,
    hmac: KeyedHmacSha256,
}

impl ChunkedUploadState {
    /// Start a chain from the seed signature of the request headers.
    pub fn new(
        seed_signature: String,
        chunk_size: usize,
        timestamp: String,
        scope: String,
        hmac: KeyedHmacSha256,
    ) -> Self {
        Self {
            signature: seed_signature,
            chunk_size,
            timestamp,
            scope,
            hmac,
        }
    }

    /// The latest signature of the chain.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Bytes of content per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// String to sign for the next chunk.
    ///
    /// Chunk extensions are never used, so the extension hash is always the
    /// hash of the empty string.
    pub fn chunk_string_to_sign(&self, data: &[u8]) -> String {
        format!(
            "{AWS4_HMAC_SHA256_PAYLOAD}\n{}\n{}\n{}\n{EMPTY_STRING_SHA256}\n{}",
            self.timestamp,
            self.scope,
            self.signature,
            hex_sha256(data)
        )
    }

    /// Sign the next chunk and advance the chain.
    pub fn sign_chunk(&mut self, data: &[u8]) -> &str {
        let string_to_sign = self.chunk_string_to_sign(data);
        self.signature = self.hmac.hex_sign(string_to_sign.as_bytes());
        &self.signature
    }
}

impl Debug for ChunkedUploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedUploadState")
            .field("signature", &self.signature)
            .field("chunk_size", &self.chunk_size)
            .field("timestamp", &self.timestamp)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    /// Data chunks may remain.
    Streaming,
    /// The terminal zero-length frame has been emitted.
    Final,
    /// Nothing more will be produced.
    Done,
}

/// Body that frames and signs a stream chunk by chunk as it is read.
///
/// As an [`Iterator`] it yields one complete frame per item; as a [`Read`] it
/// yields the concatenated frames. Exactly `decoded_length` bytes are taken
/// from the wrapped stream; a stream that ends earlier fails with
/// [`io::ErrorKind::UnexpectedEof`]. After an error nothing more is produced.
pub struct ChunkedBody {
    state: ChunkState,
    upload: ChunkedUploadState,
    reader: Box<dyn Read + Send>,
    remaining: u64,
    buf: Vec<u8>,
    pending: Bytes,
}

impl ChunkedBody {
    /// Wrap `reader`, which must yield `decoded_length` bytes.
    pub fn new(
        reader: Box<dyn Read + Send>,
        decoded_length: u64,
        upload: ChunkedUploadState,
    ) -> Self {
        // A chunk never holds more than the whole payload.
        let capacity = usize::try_from(decoded_length)
            .map_or(upload.chunk_size(), |n| n.min(upload.chunk_size()));
        let buf = vec![0; capacity];
        Self {
            state: ChunkState::Streaming,
            upload,
            reader,
            remaining: decoded_length,
            buf,
            pending: Bytes::new(),
        }
    }

    /// Fill the buffer with the next chunk of content.
    fn read_chunk(&mut self) -> io::Result<usize> {
        let want = self.remaining.min(self.buf.len() as u64) as usize;
        let mut filled = 0;
        while filled < want {
            match self.reader.read(&mut self.buf[filled..want]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "payload ended {} bytes before its declared content length",
                            self.remaining - filled as u64
                        ),
                    ))
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        self.remaining -= filled as u64;
        Ok(filled)
    }
}

fn frame(data: &[u8], signature: &str) -> Bytes {
    let header = format!("{:x}{CHUNK_SIGNATURE}{signature}{CRLF}", data.len());
    let mut bs = BytesMut::with_capacity(header.len() + data.len() + CRLF.len());
    bs.put_slice(header.as_bytes());
    bs.put_slice(data);
    bs.put_slice(CRLF.as_bytes());
    bs.freeze()
}

impl Iterator for ChunkedBody {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ChunkState::Done => None,
            ChunkState::Final => {
                self.state = ChunkState::Done;
                None
            }
            ChunkState::Streaming => match self.read_chunk() {
                Ok(0) => {
                    let signature = self.upload.sign_chunk(&[]);
                    let bs = frame(&[], signature);
                    self.state = ChunkState::Final;
                    Some(Ok(bs))
                }
                Ok(n) => {
                    let data = &self.buf[..n];
                    let signature = self.upload.sign_chunk(data);
                    Some(Ok(frame(data, signature)))
                }
                Err(err) => {
                    self.state = ChunkState::Done;
                    Some(Err(err))
                }
            },
        }
    }
}

impl Read for ChunkedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() {
            match self.next() {
                None => return Ok(0),
                Some(Err(err)) => return Err(err),
                Some(Ok(bs)) => self.pending = bs,
            }
        }

        let n = buf.len().min(self.pending.len());
        self.pending.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl Debug for ChunkedBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedBody")
            .field("state", &self.state)
            .field("upload", &self.upload)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl RequestSigner {
    /// Sign a request whose one-shot body is sent with `aws-chunked`
    /// encoding.
    ///
    /// The payload must be a stream with a known, positive content length.
    /// The returned request carries the seed signature in `Authorization`
    /// and a [`ChunkedBody`] that signs each chunk while it is read.
    pub fn sign_chunked(
        &self,
        req: Request<Payload>,
        cred: &Credential,
        now: DateTime,
    ) -> Result<Request<Payload>> {
        let (mut parts, mut payload) = req.into_parts();

        let decoded_length = match payload.content_length() {
            Some(n) if n > 0 => n,
            _ => {
                return Err(Error::request_invalid(
                    "chunked signing requires a known, positive content length",
                ))
            }
        };
        let framed_length = calculate_chunked_content_length(decoded_length, self.chunk_size)?;
        let Some(stream) = payload.take_stream() else {
            return Err(Error::request_invalid(
                "chunked signing requires a non-repeatable stream payload",
            ));
        };

        let mut req = SigningRequest::build(&mut parts)?;
        let sr = self.service_and_region(&req)?;
        req.headers.remove(AUTHORIZATION);
        req.headers.remove(DATE);

        let mut signed = self.canonicalize_headers(&mut req, &payload, cred)?;

        let content_encoding = match req.header_get(CONTENT_ENCODING)? {
            Some(v) if !v.is_empty() && !v.starts_with(AWS_CHUNKED) => {
                format!("{AWS_CHUNKED},{v}")
            }
            Some(v) if !v.is_empty() => v.to_string(),
            _ => AWS_CHUNKED.to_string(),
        };
        req.header_insert(CONTENT_ENCODING, &content_encoding)?;
        signed.insert(CONTENT_ENCODING.as_str(), &content_encoding);

        let decoded = decoded_length.to_string();
        req.header_insert(HeaderName::from_static(X_AMZ_DECODED_CONTENT_LENGTH), &decoded)?;
        signed.insert(X_AMZ_DECODED_CONTENT_LENGTH, &decoded);

        let framed = framed_length.to_string();
        req.header_insert(CONTENT_LENGTH, &framed)?;
        signed.insert(CONTENT_LENGTH.as_str(), &framed);

        req.header_insert(
            HeaderName::from_static(X_AMZ_CONTENT_SHA_256),
            STREAMING_AWS4_HMAC_SHA256_PAYLOAD,
        )?;
        signed.insert(X_AMZ_CONTENT_SHA_256, STREAMING_AWS4_HMAC_SHA256_PAYLOAD);

        let timestamp = format_iso8601(now);
        req.header_insert(HeaderName::from_static(X_AMZ_DATE), &timestamp)?;
        signed.insert(X_AMZ_DATE, &timestamp);

        let sig = calculate_signature(
            &req,
            &signed,
            STREAMING_AWS4_HMAC_SHA256_PAYLOAD,
            cred,
            now,
            &sr,
        )?;
        debug!("calculated seed signature: {}", sig.signature);
        req.header_insert_sensitive(
            AUTHORIZATION,
            &authorization(cred, &sig.scope, &signed, &sig.signature),
        )?;

        let upload = ChunkedUploadState::new(
            sig.signature,
            self.chunk_size,
            timestamp,
            sig.scope,
            KeyedHmacSha256::new(&sig.signing_key)?,
        );
        payload.set_chunked(ChunkedBody::new(stream, decoded_length, upload), framed_length);

        req.apply(&mut parts, &AWS_QUERY_ENCODE_SET)?;
        Ok(Request::from_parts(parts, payload))
    }
}
