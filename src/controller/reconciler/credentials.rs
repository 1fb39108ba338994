//! # Credential Resolution
//!
//! Reads the data-store password from the Secret named by `connectionSecret`.
//! The stored value is base64 text; it is decoded into a zeroizing buffer that
//! lives for one reconciliation and is never logged.

use crate::constants::PASSWORD_SECRET_KEYS;
use crate::controller::api::{ApiError, BackupApi};
use base64::Engine;
use k8s_openapi::api::core::v1::Secret;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("secret '{0}' not found")]
    SecretNotFound(String),
    #[error("secret '{secret}' has none of the keys {keys:?}")]
    MissingKey {
        secret: String,
        keys: [&'static str; 2],
    },
    #[error("secret '{secret}' key '{key}' is not valid base64-encoded UTF-8")]
    Undecodable { secret: String, key: &'static str },
    #[error("reading secret '{secret}': {source}")]
    Api {
        secret: String,
        #[source]
        source: ApiError,
    },
}

/// Fetch `secret_name` from `namespace` and decode the password it holds
pub async fn resolve_password<A: BackupApi + ?Sized>(
    api: &A,
    namespace: &str,
    secret_name: &str,
) -> Result<Zeroizing<String>, CredentialError> {
    let secret = match api.get_secret(namespace, secret_name).await {
        Ok(secret) => secret,
        Err(ApiError::NotFound) => {
            return Err(CredentialError::SecretNotFound(secret_name.to_string()));
        }
        Err(source) => {
            return Err(CredentialError::Api {
                secret: secret_name.to_string(),
                source,
            });
        }
    };
    password_from_secret(secret_name, &secret)
}

/// Decode the password held in `secret`, trying each known key in order
pub fn password_from_secret(
    secret_name: &str,
    secret: &Secret,
) -> Result<Zeroizing<String>, CredentialError> {
    let data = secret.data.as_ref();
    let Some((key, raw)) = PASSWORD_SECRET_KEYS
        .iter()
        .find_map(|key| data.and_then(|d| d.get(*key)).map(|value| (*key, value)))
    else {
        return Err(CredentialError::MissingKey {
            secret: secret_name.to_string(),
            keys: PASSWORD_SECRET_KEYS,
        });
    };
    debug!(secret = secret_name, key, "Resolved password key");

    let undecodable = || CredentialError::Undecodable {
        secret: secret_name.to_string(),
        key,
    };
    let encoded = raw.0.trim_ascii();
    let decoded = Zeroizing::new(
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()
            .ok_or_else(undecodable)?,
    );
    let password = std::str::from_utf8(&decoded).ok().ok_or_else(undecodable)?;
    Ok(Zeroizing::new(password.to_owned()))
}
