//! Core components for signing cloud API requests.
//!
//! This crate holds the provider-neutral pieces: hashing primitives, time
//! helpers, the [`Context`] that carries injectable collaborators, the
//! traits every signer implements, and the [`Signer`] orchestrator.
//!
//! ## Overview
//!
//! - **Context**: holds the environment and the clock used while signing
//! - **Traits**: [`ProvideCredential`] loads credentials, [`SignRequest`] signs
//!   a request with them, [`SigningCredential`] validates them
//! - **Signer**: fetches a credential and hands it to a [`SignRequest`]
//!
//! ## Example
//!
//! ```no_run
//! use cloudsign_core::{Context, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     token: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.token.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ProvideCredential for MyProvider {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<MyCredential>> {
//!         Ok(Some(MyCredential { token: "token".to_string() }))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MySigner;
//!
//! #[async_trait]
//! impl SignRequest for MySigner {
//!     type Credential = MyCredential;
//!     type Body = String;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         mut req: http::Request<String>,
//!         cred: Option<&MyCredential>,
//!         _: Option<Duration>,
//!     ) -> Result<http::Request<String>> {
//!         if let Some(cred) = cred {
//!             req.headers_mut().insert("authorization", cred.token.parse()?);
//!         }
//!         Ok(req)
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new(), MyProvider, MySigner);
//! let req = http::Request::get("https://example.com").body(String::new())?;
//! let req = signer.sign(req, None).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
mod env;
pub use env::{Env, NoopEnv, OsEnv, StaticEnv};
mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod request;
pub use request::SigningRequest;
mod signer;
pub use signer::Signer;
