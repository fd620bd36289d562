//! Signed, time-limited bearer tokens.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! where the MAC is HMAC-SHA256 over the first two segments. Verification checks
//! the MAC before looking at any claim, then the expiry.

mod error;

pub use error::{TokenError, VerificationError};

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{
    fmt,
    time::{Duration, SystemTime},
};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Payload bound into every token. Times are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, VerificationError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| VerificationError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| VerificationError::Malformed)
}

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Issues and verifies tokens with one process-wide HMAC key.
#[derive(Clone)]
pub struct TokenService {
    mac: HmacSha256,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .field("secret", &"***")
            .finish()
    }
}

impl TokenService {
    /// # Errors
    /// Returns [`TokenError::EmptySecret`] if the secret is empty.
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let key = secret.expose_secret().as_bytes();
        if key.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        // HMAC accepts keys of any length.
        let mac = HmacSha256::new_from_slice(key).map_err(|_| TokenError::EmptySecret)?;

        Ok(Self { mac })
    }

    fn sign(&self, signing_input: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Issue a token for `username` that expires `ttl` from now.
    ///
    /// # Errors
    /// Returns an error if the ttl does not fit in a Unix timestamp or the
    /// claims cannot be encoded.
    pub fn issue(&self, username: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(username, ttl, now_unix_seconds())
    }

    /// Same as [`TokenService::issue`] with an explicit issue time.
    ///
    /// # Errors
    /// See [`TokenService::issue`].
    pub fn issue_at(
        &self,
        username: &str,
        ttl: Duration,
        now_unix_seconds: i64,
    ) -> Result<String, TokenError> {
        let ttl = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
        let exp = now_unix_seconds
            .checked_add(ttl)
            .ok_or(TokenError::InvalidTtl)?;

        let claims = Claims {
            username: username.to_string(),
            iat: now_unix_seconds,
            exp,
        };

        let header_b64 = b64e_json(&Header::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature_b64 = Base64UrlUnpadded::encode_string(&self.sign(&signing_input));

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// - [`VerificationError::Malformed`] if the token is not a three segment
    ///   HS256 JWT with decodable header and claims,
    /// - [`VerificationError::SignatureInvalid`] if the MAC does not match,
    /// - [`VerificationError::Expired`] if `exp` is not in the future.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        self.verify_at(token, now_unix_seconds())
    }

    /// Same as [`TokenService::verify`] against an explicit clock.
    ///
    /// # Errors
    /// See [`TokenService::verify`].
    pub fn verify_at(&self, token: &str, now_unix_seconds: i64) -> Result<Claims, VerificationError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(VerificationError::Malformed)?;
        let claims_b64 = parts.next().ok_or(VerificationError::Malformed)?;
        let sig_b64 = parts.next().ok_or(VerificationError::Malformed)?;
        if parts.next().is_some() {
            return Err(VerificationError::Malformed);
        }

        let header: Header = b64d_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(VerificationError::Malformed);
        }

        // A signature segment that does not even decode has been tampered with.
        let signature = Base64UrlUnpadded::decode_vec(sig_b64)
            .map_err(|_| VerificationError::SignatureInvalid)?;

        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| VerificationError::SignatureInvalid)?;

        let claims: Claims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds {
            return Err(VerificationError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_string())).unwrap()
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(ToString::to_string).collect()
    }

    #[test]
    fn issue_then_verify_returns_identity() {
        let tokens = service("s3cret");
        let token = tokens.issue("alice", HOUR).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_is_compact_hs256_jwt() {
        let token = service("s3cret").issue_at("alice", HOUR, 1_700_000_000).unwrap();
        let parts = segments(&token);
        assert_eq!(parts.len(), 3);

        let header: Header = b64d_json(&parts[0]).unwrap();
        assert_eq!(header, Header::hs256());

        let claims: Claims = b64d_json(&parts[1]).unwrap();
        assert_eq!(
            claims,
            Claims {
                username: "alice".to_string(),
                iat: 1_700_000_000,
                exp: 1_700_003_600,
            }
        );
    }

    #[test]
    fn expired_after_ttl() {
        let tokens = service("s3cret");
        let issued = 1_700_000_000;
        let token = tokens.issue_at("alice", HOUR, issued).unwrap();

        assert!(tokens.verify_at(&token, issued + 3599).is_ok());
        assert_eq!(
            tokens.verify_at(&token, issued + 3600),
            Err(VerificationError::Expired)
        );
        assert_eq!(
            tokens.verify_at(&token, issued + 7200),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn expired_with_real_clock() {
        let tokens = service("s3cret");
        let token = tokens
            .issue_at("alice", HOUR, now_unix_seconds() - 2 * 3600)
            .unwrap();

        assert_eq!(tokens.verify(&token), Err(VerificationError::Expired));
    }

    #[test]
    fn every_flipped_signature_bit_is_rejected() {
        let tokens = service("s3cret");
        let token = tokens.issue("alice", HOUR).unwrap();
        let parts = segments(&token);
        let signature = Base64UrlUnpadded::decode_vec(&parts[2]).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!(
                    "{}.{}.{}",
                    parts[0],
                    parts[1],
                    Base64UrlUnpadded::encode_string(&tampered)
                );

                assert_eq!(
                    tokens.verify(&forged),
                    Err(VerificationError::SignatureInvalid),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn signature_checked_before_expiry() {
        let tokens = service("s3cret");
        let issued = 1_700_000_000;
        let token = tokens.issue_at("alice", HOUR, issued).unwrap();
        let mut parts = segments(&token);
        parts[2] = Base64UrlUnpadded::encode_string(&[0u8; 32]);

        assert_eq!(
            tokens.verify_at(&parts.join("."), issued + 10 * 3600),
            Err(VerificationError::SignatureInvalid)
        );
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let tokens = service("s3cret");
        let issued = 1_700_000_000;
        let token = tokens.issue_at("alice", HOUR, issued).unwrap();
        let mut parts = segments(&token);

        let forged = Claims {
            username: "mallory".to_string(),
            iat: issued,
            exp: issued + 100 * 3600,
        };
        parts[1] = b64e_json(&forged).unwrap();

        assert_eq!(
            tokens.verify_at(&parts.join("."), issued + 1),
            Err(VerificationError::SignatureInvalid)
        );
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = service("first").issue("alice", HOUR).unwrap();

        assert_eq!(
            service("second").verify(&token),
            Err(VerificationError::SignatureInvalid)
        );
    }

    #[test]
    fn malformed_tokens() {
        let tokens = service("s3cret");
        let token = tokens.issue("alice", HOUR).unwrap();
        let parts = segments(&token);

        for bad in [
            String::new(),
            "garbage".to_string(),
            format!("{}.{}", parts[0], parts[1]),
            format!("{token}.extra"),
            format!("!!!.{}.{}", parts[1], parts[2]),
        ] {
            assert_eq!(tokens.verify(&bad), Err(VerificationError::Malformed), "{bad}");
        }
    }

    #[test]
    fn other_algorithms_are_malformed() {
        let tokens = service("s3cret");
        let token = tokens.issue("alice", HOUR).unwrap();
        let parts = segments(&token);
        let none = b64e_json(&Header {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })
        .unwrap();

        assert_eq!(
            tokens.verify(&format!("{none}.{}.", parts[1])),
            Err(VerificationError::Malformed)
        );
    }

    #[test]
    fn valid_signature_over_garbage_claims_is_malformed() {
        let tokens = service("s3cret");
        let header_b64 = b64e_json(&Header::hs256()).unwrap();
        let claims_b64 = Base64UrlUnpadded::encode_string(b"{\"user\":1}");
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = Base64UrlUnpadded::encode_string(&tokens.sign(&signing_input));

        assert_eq!(
            tokens.verify(&format!("{signing_input}.{signature}")),
            Err(VerificationError::Malformed)
        );
    }

    #[test]
    fn empty_secret_is_rejected() {
        let result = TokenService::new(&SecretString::from(String::new()));
        assert!(matches!(result, Err(TokenError::EmptySecret)));
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", service("s3cret"));
        assert!(!debug.contains("s3cret"));
    }
}
