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

//! Canonical request construction and signing key derivation.
//!
//! - [Create a canonical request](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html)

use crate::constants::{AWS4_HMAC_SHA256, AWS4_REQUEST, AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET};
use cloudsign_core::hash::{hex_sha256, hmac_sha256};
use cloudsign_core::time::{format_date, format_iso8601, DateTime};
use cloudsign_core::Result;
use http::Method;
use percent_encoding::{percent_decode_str, percent_encode, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Headers that take part in the signature.
///
/// Names are stored lowercase and values trimmed; iteration is in
/// lexicographic name order, which is the order both the canonical headers
/// block and the `SignedHeaders` list require.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedHeaders(BTreeMap<String, String>);

impl SignedHeaders {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.insert(
            name.to_ascii_lowercase(),
            value.trim_matches(' ').to_string(),
        );
    }

    /// Insert a header, joining with `,` if it is already present.
    pub fn append(&mut self, name: &str, value: &str) {
        let value = value.trim_matches(' ');
        self.0
            .entry(name.to_ascii_lowercase())
            .and_modify(|v| {
                v.push(',');
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Get the value of a header by lowercase name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether a header by lowercase name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of signed headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` in signing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Semicolon joined header names, the `SignedHeaders` value.
    pub fn names(&self) -> String {
        self.0.keys().map(String::as_str).collect::<Vec<_>>().join(";")
    }
}

/// Percent encode a path with AWS rules.
///
/// The path is decoded first so that an already encoded uri path isn't
/// encoded twice. Encoding works on raw bytes, so escapes that don't form
/// valid utf-8 survive unchanged. An empty path canonicalizes to `/`.
pub fn canonical_uri(path: &str) -> Result<String> {
    let decoded: Vec<u8> = percent_decode_str(path).collect();
    if decoded.is_empty() {
        return Ok("/".to_string());
    }

    Ok(percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
}

/// Canonical query string: every key and value encoded on its own, pairs
/// sorted by encoded key (then encoded value), joined by `&`.
///
/// Empty input gives an empty string.
pub fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical request.
///
/// ```text
/// METHOD
/// /encoded/path
/// canonical=query
/// name:value (one line per signed header)
///
/// signed;header;names
/// payload-hash
/// ```
pub fn canonical_request(
    method: &Method,
    path: &str,
    query: &[(String, String)],
    headers: &SignedHeaders,
    payload_hash: &str,
) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    writeln!(f, "{method}")?;
    writeln!(f, "{}", canonical_uri(path)?)?;
    writeln!(f, "{}", canonical_query_string(query))?;
    for (name, value) in headers.iter() {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    writeln!(f, "{}", headers.names())?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

/// Scope: `20220313/<region>/<service>/aws4_request`
pub fn credential_scope(time: DateTime, region: &str, service: &str) -> String {
    format!("{}/{region}/{service}/{AWS4_REQUEST}", format_date(time))
}

/// StringToSign:
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20220313T072004Z
/// 20220313/<region>/<service>/aws4_request
/// <hashed_canonical_request>
/// ```
pub fn string_to_sign(time: DateTime, scope: &str, canonical_request: &str) -> String {
    format!(
        "{AWS4_HMAC_SHA256}\n{}\n{scope}\n{}",
        format_iso8601(time),
        hex_sha256(canonical_request.as_bytes())
    )
}

/// Derive the signing key for one date, region and service.
pub fn generate_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}
