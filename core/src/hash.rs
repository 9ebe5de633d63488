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

//! Hash related utils.

use std::fmt::{Debug, Formatter};
use std::io::Read;

use crate::{Error, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use sha2::Digest;
use sha2::Sha256;

/// Base64 encode
pub fn base64_encode(content: &[u8]) -> String {
    BASE64_STANDARD.encode(content)
}

/// Hex encoded SHA256 hash.
///
/// Use this function instead of `hex::encode(sha256(content))` can reduce
/// extra copy.
pub fn hex_sha256(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content).as_slice())
}

/// Hex encoded SHA256 hash of everything `r` yields.
///
/// The reader is drained in fixed size blocks so the content never needs to
/// be held in memory at once. Any read failure is returned as an
/// [`ErrorKind::Unexpected`](crate::ErrorKind::Unexpected) error.
pub fn hex_sha256_read(mut r: impl Read) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8 * 1024];
    loop {
        let n = match r.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(Error::unexpected("failed to read payload for hashing").with_source(err))
            }
        };
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize().as_slice()))
}

/// HMAC with SHA256 hash.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> Vec<u8> {
    // SAFETY: HMAC's new_from_slice always returns Ok - it handles any key length
    let mut h = Hmac::<Sha256>::new_from_slice(key).unwrap();
    h.update(content);

    h.finalize().into_bytes().to_vec()
}

/// Hex encoded HMAC with SHA256 hash.
///
/// Use this function instead of `hex::encode(hmac_sha256(key, content))` can
/// reduce extra copy.
pub fn hex_hmac_sha256(key: &[u8], content: &[u8]) -> String {
    // SAFETY: HMAC's new_from_slice always returns Ok - it handles any key length
    let mut h = Hmac::<Sha256>::new_from_slice(key).unwrap();
    h.update(content);

    hex::encode(h.finalize().into_bytes())
}

/// HMAC-SHA256 processor bound to a key.
///
/// The key schedule runs once in [`KeyedHmacSha256::new`]; every call to
/// [`KeyedHmacSha256::hex_sign`] starts from a clone of that state. Used when
/// many messages are signed with the same derived key, e.g. the chunks of a
/// streaming upload.
#[derive(Clone)]
pub struct KeyedHmacSha256 {
    mac: Hmac<Sha256>,
}

impl KeyedHmacSha256 {
    /// Build a processor for `key`.
    pub fn new(key: &[u8]) -> Result<Self> {
        let mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|e| Error::unexpected(format!("invalid hmac key: {e}")))?;
        Ok(Self { mac })
    }

    /// Hex encoded HMAC of `content`.
    pub fn hex_sign(&self, content: &[u8]) -> String {
        let mut h = self.mac.clone();
        h.update(content);

        hex::encode(h.finalize().into_bytes())
    }
}

impl Debug for KeyedHmacSha256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyedHmacSha256 { .. }")
    }
}
