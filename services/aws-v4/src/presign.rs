//! Query string signing.
//!
//! - [Authenticating Requests: Using Query Parameters](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html)

use crate::canonical::{credential_scope, SignedHeaders};
use crate::constants::*;
use crate::sign_request::calculate_signature;
use crate::{Credential, Payload, RequestSigner};
use cloudsign_core::time::{format_iso8601, DateTime};
use cloudsign_core::{Result, SigningRequest};
use http::header::{HeaderName, AUTHORIZATION, DATE, HOST};
use http::Request;
use log::{debug, warn};
use std::time::Duration;

/// Query keys written by presigning, replaced when a request is presigned again.
const PRESIGN_QUERY_KEYS: [&str; 7] = [
    X_AMZ_SECURITY_TOKEN_QUERY,
    X_AMZ_ALGORITHM,
    X_AMZ_CREDENTIAL,
    X_AMZ_DATE_QUERY,
    X_AMZ_EXPIRES,
    X_AMZ_SIGNED_HEADERS,
    X_AMZ_SIGNATURE,
];

impl RequestSigner {
    /// Presign a request so that it can be sent by anyone holding the url
    /// until `expires_in` has passed.
    ///
    /// Only `host` is signed and the payload is never hashed. AWS accepts
    /// lifetimes between 1 second and 7 days; values outside that window are
    /// logged and used as given.
    pub fn presign(
        &self,
        req: Request<Payload>,
        cred: &Credential,
        now: DateTime,
        expires_in: Duration,
    ) -> Result<Request<Payload>> {
        let (mut parts, payload) = req.into_parts();
        let mut req = SigningRequest::build(&mut parts)?;
        let sr = self.service_and_region(&req)?;

        let expires = expires_in.as_secs();
        if !(1..=MAX_PRESIGN_EXPIRES_SECS).contains(&expires) {
            warn!(
                "presign expires {expires}s is outside of 1..={MAX_PRESIGN_EXPIRES_SECS}, aws will reject it"
            );
        }

        req.headers.remove(AUTHORIZATION);
        req.headers.remove(HeaderName::from_static(X_AMZ_CONTENT_SHA_256));
        req.headers.remove(HeaderName::from_static(X_AMZ_DATE));
        req.headers.remove(DATE);
        req.query.retain(|(k, _)| {
            !PRESIGN_QUERY_KEYS
                .iter()
                .any(|key| k.eq_ignore_ascii_case(key))
        });

        let host = req.host_header();
        req.header_insert(HOST, &host)?;
        let mut signed = SignedHeaders::new();
        signed.insert(HOST.as_str(), &host);

        let scope = credential_scope(now, &sr.region, &sr.service);
        if let Some(token) = &cred.session_token {
            req.query_push(X_AMZ_SECURITY_TOKEN_QUERY, token);
        }
        req.query_push(X_AMZ_ALGORITHM, AWS4_HMAC_SHA256);
        req.query_push(
            X_AMZ_CREDENTIAL,
            format!("{}/{scope}", cred.access_key_id),
        );
        req.query_push(X_AMZ_DATE_QUERY, format_iso8601(now));
        req.query_push(X_AMZ_EXPIRES, expires.to_string());
        req.query_push(X_AMZ_SIGNED_HEADERS, signed.names());

        let sig = calculate_signature(&req, &signed, UNSIGNED_PAYLOAD, cred, now, &sr)?;
        debug!("calculated presign signature: {}", sig.signature);
        req.query_push(X_AMZ_SIGNATURE, sig.signature);

        req.apply(&mut parts, &AWS_QUERY_ENCODE_SET)?;
        Ok(Request::from_parts(parts, payload))
    }
}
