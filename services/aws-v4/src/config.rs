use crate::constants::{AWS_DEFAULT_REGION, AWS_REGION, DEFAULT_CHUNK_SIZE, DEFAULT_HEADER_TAG};
use cloudsign_core::{Context, Error, Result};
use serde::Deserialize;

/// Config for AWS SigV4 signing.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Service name to sign for. Parsed from the request host when unset.
    pub service: Option<String>,
    /// Region to sign for. Parsed from the request host when unset.
    pub region: Option<String>,
    /// Prefix tag of headers that are always signed: `x-<tag>-*`.
    pub header_tag: String,
    /// Content bytes per chunk for chunked uploads.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: None,
            region: None,
            header_tag: DEFAULT_HEADER_TAG.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Create a new config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the header tag.
    pub fn with_header_tag(mut self, tag: impl Into<String>) -> Self {
        self.header_tag = tag.into();
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Load config from environment variables.
    ///
    /// `AWS_REGION` wins over `AWS_DEFAULT_REGION`.
    pub fn from_env(ctx: &Context) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = ctx.env_var(AWS_REGION) {
            cfg.region = Some(v);
        } else if let Some(v) = ctx.env_var(AWS_DEFAULT_REGION) {
            cfg.region = Some(v);
        }

        cfg
    }

    /// Check that the config can be used for signing.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config_invalid("chunk_size must be positive"));
        }
        if self.header_tag.is_empty() {
            return Err(Error::config_invalid("header_tag must not be empty"));
        }
        if self.service.as_deref() == Some("") {
            return Err(Error::config_invalid("service must not be empty when set"));
        }
        if self.region.as_deref() == Some("") {
            return Err(Error::config_invalid("region must not be empty when set"));
        }

        Ok(())
    }
}
