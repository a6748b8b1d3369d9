//! Verification of Slack's `X-Slack-Signature` request header.
//!
//! The signature is `v0=` followed by the hex HMAC-SHA256 of
//! `v0:{X-Slack-Request-Timestamp}:{raw body}` keyed by the app's signing secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;
const VERSION: &str = "v0";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing request header `{0}`")]
    MissingHeader(&'static str),
    #[error("request timestamp is not a unix epoch: `{0}`")]
    InvalidTimestamp(String),
    #[error("request timestamp is {age_secs}s away from server time")]
    StaleTimestamp { age_secs: i64 },
    #[error("signature is not a `v0=` hex digest")]
    Malformed,
    #[error("signature does not match request body")]
    Mismatch,
}

pub struct RequestVerifier {
    signing_secret: SecretString,
    max_skew_secs: i64,
}

impl RequestVerifier {
    pub fn new(signing_secret: SecretString) -> Self {
        Self { signing_secret, max_skew_secs: MAX_TIMESTAMP_SKEW_SECS }
    }

    pub fn verify(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let sent_at = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;
        let age_secs = now_unix.saturating_sub(sent_at);
        if age_secs.abs() > self.max_skew_secs {
            return Err(SignatureError::StaleTimestamp { age_secs });
        }

        let digest = signature
            .strip_prefix("v0=")
            .and_then(decode_hex)
            .ok_or(SignatureError::Malformed)?;

        let mac = mac_for(self.signing_secret.expose_secret().as_bytes(), timestamp, body)?;
        mac.verify_slice(&digest).map_err(|_| SignatureError::Mismatch)?;
        Ok(())
    }
}

/// Computes the header value Slack would send for `body`.
pub fn sign(signing_secret: &str, timestamp: &str, body: &[u8]) -> String {
    match mac_for(signing_secret.as_bytes(), timestamp, body) {
        Ok(mac) => format!("{VERSION}={}", encode_hex(mac.finalize().into_bytes().as_slice())),
        Err(_) => format!("{VERSION}="),
    }
}

fn mac_for(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Malformed)?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return None;
    }

    bytes
        .chunks_exact(2)
        .map(|pair| Some((hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?))
        .collect()
}

fn hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_hex, sign, RequestVerifier, SignatureError};

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const NOW: i64 = 1_531_420_618;

    fn verifier() -> RequestVerifier {
        RequestVerifier::new(SECRET.to_owned().into())
    }

    #[test]
    fn matches_slack_documentation_example() {
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";

        assert_eq!(
            sign(SECRET, "1531420618", body),
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
        verifier()
            .verify(
                "1531420618",
                "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503",
                body,
                NOW,
            )
            .expect("documented signature verifies");
    }

    #[test]
    fn tampered_body_is_rejected() {
        let signature = sign(SECRET, "1531420618", b"{\"text\":\"@a++\"}");

        let error = verifier()
            .verify("1531420618", &signature, b"{\"text\":\"@a--\"}", NOW)
            .expect_err("tampered");

        assert_eq!(error, SignatureError::Mismatch);
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let signature = sign(SECRET, "1531420000", b"{}");

        let error = verifier().verify("1531420000", &signature, b"{}", NOW).expect_err("stale");

        assert_eq!(error, SignatureError::StaleTimestamp { age_secs: 618 });
    }

    #[test]
    fn malformed_inputs_are_reported() {
        assert!(matches!(
            verifier().verify("yesterday", "v0=00", b"{}", NOW),
            Err(SignatureError::InvalidTimestamp(_))
        ));
        assert_eq!(
            verifier().verify("1531420618", "v1=abcd", b"{}", NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verifier().verify("1531420618", "v0=zz", b"{}", NOW),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn hex_decoding_accepts_both_cases() {
        assert_eq!(decode_hex("0aFf"), Some(vec![0x0a, 0xff]));
        assert_eq!(decode_hex("abc"), None);
    }
}
