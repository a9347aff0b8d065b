use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256};
use thiserror::Error;
use warp::http::StatusCode;

use crate::errors::{ErrorSeverity, IntoErrorResponse};

type HmacSha256 = Hmac<Sha256>;

/// Bearer tokens are valid for one hour from issuance.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("no token provided")]
    MissingToken,
    #[error("malformed token")]
    MalformedToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("token address does not match request address")]
    AddressMismatch,
}

impl IntoErrorResponse for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidSignature => StatusCode::BAD_REQUEST,
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::AddressMismatch => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::AddressMismatch => "address_mismatch",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Client
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    address: String,
    issued_at: i64,
    expires_at: i64,
}

/// Verifies wallet-message signatures and issues/validates bearer tokens.
///
/// The signature scheme is Ethereum `personal_sign`: the message is hashed
/// with the EIP-191 prefix and the signer's address is recovered from the
/// 65-byte secp256k1 signature. Tokens are HMAC-SHA256-signed claims with a
/// fixed lifetime; the service holds the shared secret.
#[derive(Debug)]
pub struct Authenticator {
    secret: Vec<u8>,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self::with_ttl(secret, Duration::seconds(TOKEN_TTL_SECS))
    }

    pub fn with_ttl(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Verify that `signature` signs `message` under `address` and mint a
    /// bearer token for the address.
    ///
    /// The challenge message is not stored anywhere; verification is a pure
    /// cryptographic recomputation.
    pub fn authenticate(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, AuthError> {
        let recovered = recover_signer(message, signature)?;
        if !recovered.eq_ignore_ascii_case(address) {
            tracing::info!(
                claimed = %address,
                recovered = %recovered,
                "signature recovers to a different address"
            );
            return Err(AuthError::InvalidSignature);
        }
        Ok(self.issue_token(address))
    }

    /// Validate a bearer token against the address the request claims.
    ///
    /// Expired tokens are a handled [`AuthError::ExpiredToken`], never a
    /// fatal condition; callers re-authenticate by signing a new challenge.
    pub fn authorize(&self, token: Option<&str>, claimed_address: &str) -> Result<(), AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let claims = self.decode_token(token)?;
        if Utc::now().timestamp() >= claims.expires_at {
            return Err(AuthError::ExpiredToken);
        }
        if !claims.address.eq_ignore_ascii_case(claimed_address) {
            return Err(AuthError::AddressMismatch);
        }
        Ok(())
    }

    fn issue_token(&self, address: &str) -> String {
        let issued_at = Utc::now().timestamp();
        let claims = TokenClaims {
            address: address.to_string(),
            issued_at,
            expires_at: issued_at + self.ttl.num_seconds(),
        };
        let payload = serde_json::to_vec(&claims).expect("claims serialize");
        let tag = self.sign(&payload);
        format!("{}.{}", hex::encode(payload), hex::encode(tag))
    }

    fn decode_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let (payload_hex, tag_hex) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let payload = hex::decode(payload_hex).map_err(|_| AuthError::MalformedToken)?;
        let tag = hex::decode(tag_hex).map_err(|_| AuthError::MalformedToken)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(&payload);
        mac.verify_slice(&tag)
            .map_err(|_| AuthError::MalformedToken)?;

        serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Recover the 0x-prefixed signer address from a `personal_sign` signature.
fn recover_signer(message: &str, signature: &str) -> Result<String, AuthError> {
    let bytes = hex::decode(signature.trim_start_matches("0x"))
        .map_err(|_| AuthError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(AuthError::InvalidSignature);
    }

    let sig = Signature::from_slice(&bytes[..64]).map_err(|_| AuthError::InvalidSignature)?;
    // wallets emit v as 27/28; raw recovery ids are 0/1
    let v = bytes[64];
    let recovery = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
        .ok_or(AuthError::InvalidSignature)?;

    let digest = personal_message_digest(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery)
        .map_err(|_| AuthError::InvalidSignature)?;
    Ok(address_of(&key))
}

/// Keccak-256 over the EIP-191 prefixed message.
fn personal_message_digest(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()));
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Ethereum address: last 20 bytes of the Keccak-256 of the uncompressed key.
fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}
