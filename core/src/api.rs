use crate::{Context, Result};
use std::fmt::Debug;
use std::time::Duration;

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is valid.
    fn is_valid(&self) -> bool;
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(cred) = self else {
            return false;
        };

        cred.is_valid()
    }
}

/// ProvideCredential is the trait used by signer to load the credential.
///
/// Service may require different credential to sign the request, for example,
/// AWS require access key and secret key.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load credential from current context.
    ///
    /// Returns `Ok(None)` if this provider has nothing to offer.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used by signer to sign the request.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this signer.
    type Credential: Send + Sync + Unpin + 'static;

    /// Body carried by the requests this signer accepts and returns.
    type Body: Send + 'static;

    /// Sign the request.
    ///
    /// The request is consumed and a signed request is returned. On error no
    /// part of a signature has been attached to anything the caller can see.
    ///
    /// ## Credential
    ///
    /// `None` means anonymous access: the request is returned unchanged.
    ///
    /// ## Expires In
    ///
    /// The `expires_in` parameter specifies the validity window of the
    /// signature. Signers put it into a presigned query string; signers that
    /// can't express expiration should return an error.
    async fn sign_request(
        &self,
        ctx: &Context,
        req: http::Request<Self::Body>,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<http::Request<Self::Body>>;
}
