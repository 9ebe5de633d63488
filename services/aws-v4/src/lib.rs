//! AWS SigV4 service signer.
//!
//! Sign requests in the `Authorization` header, presign them into a url, or
//! sign a streamed upload chunk by chunk.
//!
//! ## Example
//!
//! ```no_run
//! use cloudsign_aws_v4::{EnvCredentialProvider, Payload, RequestSigner};
//! use cloudsign_core::{Context, OsEnv, Result, Signer};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let signer = Signer::new(ctx, EnvCredentialProvider::new(), RequestSigner::new());
//!
//! let req = http::Request::get("https://examplebucket.s3.amazonaws.com/test.txt")
//!     .body(Payload::empty())?;
//! let req = signer.sign(req, None).await?;
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::{
    DEFAULT_CHUNK_SIZE, EMPTY_STRING_SHA256, STREAMING_AWS4_HMAC_SHA256_PAYLOAD, UNSIGNED_PAYLOAD,
};

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

pub mod canonical;
mod region;
pub use region::{parse_region_name, parse_service_name, ServiceAndRegion};

mod payload;
pub use payload::{Payload, SeekRead};

mod sign_request;
pub use sign_request::RequestSigner;

mod presign;

mod chunked;
pub use chunked::{calculate_chunked_content_length, ChunkedBody, ChunkedUploadState};

mod provide_credential;
pub use provide_credential::{
    EnvCredentialProvider, ProvideCredentialChain, StaticCredentialProvider,
};
