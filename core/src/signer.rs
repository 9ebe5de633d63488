use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Signer is the main struct used to sign the request.
///
/// It pairs a credential provider with a request signer. The credential is
/// fetched again for every request, so rotated credentials take effect on
/// the next call.
#[derive(Debug)]
pub struct Signer<K: SigningCredential, B> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    signer: Arc<dyn SignRequest<Credential = K, Body = B>>,
}

impl<K: SigningCredential, B> Clone for Signer<K, B> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            provider: self.provider.clone(),
            signer: self.signer.clone(),
        }
    }
}

impl<K: SigningCredential, B: Send + 'static> Signer<K, B> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        signer: impl SignRequest<Credential = K, Body = B>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            signer: Arc::new(signer),
        }
    }

    /// The context this signer runs with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Signing request.
    ///
    /// A provider returning no credential yields an unsigned request.
    pub async fn sign(
        &self,
        req: http::Request<B>,
        expires_in: Option<Duration>,
    ) -> Result<http::Request<B>> {
        let cred = self.provider.provide_credential(&self.ctx).await?;
        match &cred {
            None => debug!("no credential provided, request will be sent anonymously"),
            Some(c) if !c.is_valid() => {
                return Err(Error::credential_expired(
                    "credential is expired or incomplete",
                ))
            }
            Some(_) => {}
        }

        self.signer
            .sign_request(&self.ctx, req, cred.as_ref(), expires_in)
            .await
    }
}
