//! Token expiry derivation.
//!
//! Three sources of truth, in order: a server-declared TTL, the `exp` claim
//! embedded in the token itself, and a fixed fallback window. The claim is
//! read without any signature check - the TLS channel to the issuing server
//! is the trust boundary, and the value is only a hint for local expiry
//! bookkeeping, never treated as self-authenticating.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Validity window assumed when neither the server nor the token says
/// anything about expiry.
const DEFAULT_VALIDITY_MINUTES: i64 = 60;

/// Derive the expiry for a freshly issued token.
///
/// A positive `server_ttl_secs` always wins; otherwise the token's `exp`
/// claim if one can be decoded; otherwise now + 60 minutes.
pub fn derive(server_ttl_secs: Option<i64>, raw_token: &str) -> DateTime<Utc> {
    derive_at(Utc::now(), server_ttl_secs, raw_token)
}

fn derive_at(now: DateTime<Utc>, server_ttl_secs: Option<i64>, raw_token: &str) -> DateTime<Utc> {
    if let Some(ttl) = server_ttl_secs {
        if ttl > 0 {
            return now + Duration::seconds(ttl);
        }
    }
    if let Some(exp) = claim_expiry(raw_token) {
        return exp;
    }
    now + Duration::minutes(DEFAULT_VALIDITY_MINUTES)
}

/// Best-effort read of the `exp` claim from a JWT-shaped token: second
/// dot-delimited segment, base64url without padding, JSON object. Any decode
/// or parse failure means "no claim available", never an error.
fn claim_expiry(raw_token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: Option<i64>,
    }

    let payload = raw_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.exp.filter(|&e| e > 0)?;
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_with_claims(claims: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims))
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_server_ttl_wins_over_claim() {
        let token = token_with_claims(r#"{"exp":1700000000}"#);
        let exp = derive_at(fixed_now(), Some(120), &token);
        assert_eq!(exp, fixed_now() + Duration::seconds(120));
    }

    #[test]
    fn test_zero_ttl_falls_through_to_claim() {
        let token = token_with_claims(r#"{"exp":1700000000}"#);
        let exp = derive_at(fixed_now(), Some(0), &token);
        assert_eq!(exp, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn test_missing_ttl_uses_claim() {
        let token = token_with_claims(r#"{"exp":1700000000,"sub":"alice"}"#);
        let exp = derive_at(fixed_now(), None, &token);
        assert_eq!(exp, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn test_garbage_token_uses_fallback_window() {
        let exp = derive_at(fixed_now(), Some(0), "not.a.validtoken");
        assert_eq!(exp, fixed_now() + Duration::minutes(60));
    }

    #[test]
    fn test_single_segment_token_uses_fallback() {
        let exp = derive_at(fixed_now(), None, "opaque-token-no-dots");
        assert_eq!(exp, fixed_now() + Duration::minutes(60));
    }

    #[test]
    fn test_claims_without_exp_use_fallback() {
        let token = token_with_claims(r#"{"sub":"alice"}"#);
        let exp = derive_at(fixed_now(), None, &token);
        assert_eq!(exp, fixed_now() + Duration::minutes(60));
    }

    #[test]
    fn test_zero_exp_claim_is_ignored() {
        let token = token_with_claims(r#"{"exp":0}"#);
        let exp = derive_at(fixed_now(), None, &token);
        assert_eq!(exp, fixed_now() + Duration::minutes(60));
    }

    #[test]
    fn test_negative_ttl_falls_through() {
        let exp = derive_at(fixed_now(), Some(-5), "x.y.z");
        assert_eq!(exp, fixed_now() + Duration::minutes(60));
    }
}
