//! Minimal JWT payload decoding.
//!
//! Signatures are not verified here; the API rejects forged tokens. We only
//! need the identity claims and the expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::api::AuthError;
use crate::models::IdTokenClaims;

pub fn decode_claims(token: &str) -> Result<IdTokenClaims, AuthError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::MalformedToken("expected three segments".into())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("unexpected claims: {e}")))
}

#[cfg(test)]
pub(crate) fn encode_for_test(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_claims() {
        let token = encode_for_test(&json!({
            "cognito:username": "m-123",
            "email": "a@b.com",
            "given_name": "Ada",
            "exp": 1_900_000_000i64,
        }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.member_uuid, "m-123");
        assert_eq!(claims.first_name.as_deref(), Some("Ada"));
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.exp, 1_900_000_000);
    }

    #[test]
    fn test_malformed_tokens() {
        for bad in ["IT1", "a.b", "a.b.c.d", "a.!!!.c"] {
            assert!(
                matches!(decode_claims(bad), Err(AuthError::MalformedToken(_))),
                "{bad} should be rejected"
            );
        }

        // Valid base64 but missing required claims
        let token = encode_for_test(&json!({ "email": "a@b.com" }));
        assert!(matches!(decode_claims(&token), Err(AuthError::MalformedToken(_))));
    }
}
