//! Signing grants into opaque tokens.
//!
//! Token layout: `base64url(json(grant)) "." base64url(hmac_sha256(secret, payload))`,
//! both parts unpadded. The MAC covers the encoded payload exactly as it
//! appears in the token, so any change to either part fails verification.
//!
//! The codec checks integrity only. Freshness is the provider's business: an
//! expired access token is rejected upstream when it is used.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{OAuthError, Result};
use crate::grant::{Grant, OpaqueToken};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies [`OpaqueToken`]s with a server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec. The secret must be non-empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(OAuthError::Config("signing secret is required".to_string()));
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Sign a grant into an opaque token.
    pub fn sign(&self, grant: &Grant) -> Result<OpaqueToken> {
        let json = serde_json::to_vec(grant)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes())?.finalize().into_bytes());
        Ok(OpaqueToken::new(format!("{}.{}", payload, signature)))
    }

    /// Verify a token and recover the grant it carries.
    pub fn verify(&self, token: &str) -> Result<Grant> {
        if token.trim().is_empty() {
            return Err(OAuthError::InvalidRequest("token is empty".to_string()));
        }

        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| OAuthError::InvalidToken("malformed token".to_string()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| OAuthError::InvalidToken("malformed signature".to_string()))?;

        self.mac(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| OAuthError::InvalidToken("signature mismatch".to_string()))?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| OAuthError::InvalidToken("malformed payload".to_string()))?;

        serde_json::from_slice(&json)
            .map_err(|e| OAuthError::InvalidToken(format!("payload is not a grant: {}", e)))
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| OAuthError::Config(format!("HMAC initialization failed: {}", e)))?;
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn grant() -> Grant {
        Grant {
            access_token: "6qrZcUqja7812RVdnEKjpzOL4CvHBFG".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 604800,
            refresh_token: "D43f5y0ahjqew82jZ4NViEr2YafMKhue".to_string(),
            scope: "identify guilds guilds.join".to_string(),
            obtained_at: Utc.timestamp_opt(1_700_000_000, 0).single(),
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = TokenCodec::new("server-secret").unwrap();
        let token = codec.sign(&grant()).unwrap();
        assert_eq!(codec.verify(token.as_str()).unwrap(), grant());
    }

    #[test]
    fn test_round_trip_without_refresh_token() {
        let codec = TokenCodec::new("server-secret").unwrap();
        let g = Grant {
            refresh_token: String::new(),
            obtained_at: None,
            ..grant()
        };
        let token = codec.sign(&g).unwrap();
        assert_eq!(codec.verify(token.as_str()).unwrap(), g);
    }

    #[test]
    fn test_every_bit_flip_is_rejected() {
        let codec = TokenCodec::new("server-secret").unwrap();
        let token = codec.sign(&grant()).unwrap().into_string();
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[i] ^= 1 << bit;
                // Flips that leave the string non-UTF-8 can't even be presented.
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };
                let result = codec.verify(&tampered);
                assert!(
                    matches!(result, Err(OAuthError::InvalidToken(_))),
                    "flip at byte {i} bit {bit} was accepted"
                );
            }
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenCodec::new("one").unwrap().sign(&grant()).unwrap();
        let result = TokenCodec::new("two").unwrap().verify(token.as_str());
        assert!(matches!(result, Err(OAuthError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let codec = TokenCodec::new("server-secret").unwrap();
        for input in ["no-dot", "a.b", "..", "eyJhIjoxfQ.", "a.b.c"] {
            assert!(
                matches!(codec.verify(input), Err(OAuthError::InvalidToken(_))),
                "{input} was accepted"
            );
        }
        assert!(matches!(codec.verify("  "), Err(OAuthError::InvalidRequest(_))));
    }

    #[test]
    fn test_signed_non_grant_payload_is_rejected() {
        let codec = TokenCodec::new("server-secret").unwrap();
        let payload = URL_SAFE_NO_PAD.encode(br#"{"hello":"world"}"#);
        let sig = URL_SAFE_NO_PAD.encode(
            codec
                .mac(payload.as_bytes())
                .unwrap()
                .finalize()
                .into_bytes(),
        );
        let result = codec.verify(&format!("{}.{}", payload, sig));
        assert!(matches!(result, Err(OAuthError::InvalidToken(_))));
    }

    #[test]
    fn test_empty_secret() {
        assert!(matches!(TokenCodec::new(""), Err(OAuthError::Config(_))));
    }
}
