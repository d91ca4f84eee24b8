// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Bearer-token codec.
//!
//! Tokens are compact HS256-signed JWTs: three base64url segments
//! (header, claims, signature) over the claim set in [`Claims`]. Issuing
//! and verifying are pure functions over the secret and the input, safe
//! for unbounded concurrent use.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::MIN_TOKEN_SECRET_LEN;

use super::claims::Claims;
use super::roles::Role;

/// Fixed token lifetime: 24 hours from issuance.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Token verification/issuance failures.
///
/// All verification variants result in an unauthenticated request, never a
/// 5xx: the gate treats them as "no principal" and logs the reason.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The string does not parse as the expected three-part structure.
    #[error("token is malformed")]
    Malformed,
    /// The signature does not verify against the server secret.
    #[error("token signature is invalid")]
    BadSignature,
    /// The token's expiry is in the past.
    #[error("token has expired")]
    Expired,
    /// Claim serialization failed during issuance. Should not occur once
    /// the codec constructed successfully.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Rejected signing secret at startup.
#[derive(Debug, thiserror::Error)]
#[error("token signing secret must be at least {MIN_TOKEN_SECRET_LEN} bytes")]
pub struct SecretTooShort;

/// Issues and verifies bearer tokens with a server-held symmetric secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec from the signing secret.
    ///
    /// Key misconfiguration is the only failure mode and it is fatal at
    /// startup; per-call signing never fails on key material.
    pub fn new(secret: &[u8]) -> Result<Self, SecretTooShort> {
        if secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(SecretTooShort);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // A token is valid strictly while now < exp; no clock-skew grace.
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Issue a token for `subject` with the given role, expiring 24 hours
    /// from now.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a presented token and return its claims.
    ///
    /// The signature is recomputed and compared in constant time before any
    /// claim is interpreted; expiry is checked after the signature holds.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).unwrap()
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(TokenCodec::new(b"too-short").is_err());
    }

    #[test]
    fn issued_tokens_verify_with_matching_claims() {
        let codec = codec();
        let token = codec.issue("alice", Role::User).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECS);
    }

    #[test]
    fn expired_token_reports_expired() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "alice".to_string(),
            role: Role::User,
            iat: now - 2 * TOKEN_TTL_SECS,
            exp: now - TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_reports_bad_signature() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let codec = codec();
        let token = codec.issue("alice", Role::User).unwrap();

        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut sig_bytes = URL_SAFE_NO_PAD.decode(sig).unwrap();
        sig_bytes[0] ^= 0x01;
        let tampered = format!("{head}.{}", URL_SAFE_NO_PAD.encode(sig_bytes));

        assert_eq!(codec.verify(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenCodec::new(b"ffffffffffffffffffffffffffffffff").unwrap();
        let token = other.issue("alice", Role::Admin).unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_strings_report_malformed() {
        let codec = codec();
        for bad in ["", "not-a-token", "a.b", "a.b.c.d", "??.!!.##"] {
            assert_eq!(codec.verify(bad), Err(TokenError::Malformed), "{bad}");
        }
    }

    #[test]
    fn claims_with_unknown_role_report_malformed() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        // Properly signed token whose role string is not a known variant.
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let exp = Utc::now().timestamp() + 600;
        let claims = URL_SAFE_NO_PAD.encode(
            format!(r#"{{"sub":"alice","role":"SUPERUSER","iat":0,"exp":{exp}}}"#).as_bytes(),
        );
        let signing_input = format!("{header}.{claims}");
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(SECRET).unwrap();
        mac.update(signing_input.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let token = format!("{signing_input}.{sig}");
        assert_eq!(codec().verify(&token), Err(TokenError::Malformed));
    }
}
