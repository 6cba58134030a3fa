//! Webhook signature verification.
//!
//! The gateway signs each notification with HMAC-SHA256 over the manifest
//! `id:<data.id>;request-id:<x-request-id>;ts:<ts>;` and sends the result in
//! the `x-signature` header as `ts=<unix>,v1=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing x-signature header")]
    MissingHeader,

    #[error("missing x-request-id header")]
    MissingRequestId,

    #[error("malformed x-signature header")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,

    #[error("webhook secret cannot be used as an HMAC key")]
    InvalidSecret,
}

#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader<'a> {
    ts: &'a str,
    v1: &'a str,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, SignatureError> {
    let mut ts = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim()),
            Some(("v1", value)) => v1 = Some(value.trim()),
            _ => {}
        }
    }
    match (ts, v1) {
        (Some(ts), Some(v1)) if !ts.is_empty() && !v1.is_empty() => Ok(SignatureHeader { ts, v1 }),
        _ => Err(SignatureError::Malformed),
    }
}

pub fn manifest(data_id: &str, request_id: &str, ts: &str) -> String {
    format!("id:{};request-id:{request_id};ts:{ts};", data_id.to_ascii_lowercase())
}

fn mac(secret: &str, message: &str) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(message.as_bytes());
    Ok(mac)
}

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
pub fn sign(secret: &str, message: &str) -> Result<String, SignatureError> {
    Ok(hex::encode(mac(secret, message)?.finalize().into_bytes()))
}

/// Checks the `x-signature` header of a notification for `data_id`. Both
/// headers are required.
pub fn verify(secret: &str, header: Option<&str>, request_id: Option<&str>, data_id: &str) -> Result<(), SignatureError> {
    let header = parse_header(header.ok_or(SignatureError::MissingHeader)?)?;
    let request_id = request_id.filter(|r| !r.trim().is_empty()).ok_or(SignatureError::MissingRequestId)?;
    let expected = hex::decode(header.v1).map_err(|_| SignatureError::Malformed)?;

    mac(secret, &manifest(data_id, request_id, header.ts))?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn header_for(data_id: &str, request_id: &str, ts: &str) -> String {
        format!("ts={ts},v1={}", sign(SECRET, &manifest(data_id, request_id, ts)).unwrap())
    }

    #[test]
    fn test_valid_signature() {
        let header = header_for("123", "req-1", "1704908010");
        assert_eq!(verify(SECRET, Some(&header), Some("req-1"), "123"), Ok(()));
    }

    #[test]
    fn test_wrong_secret() {
        let ts = "1704908010";
        let header = format!("ts={ts},v1={}", sign("other", &manifest("123", "req-1", ts)).unwrap());
        assert_eq!(verify(SECRET, Some(&header), Some("req-1"), "123"), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_tampered_payment_id() {
        let header = header_for("123", "req-1", "1704908010");
        assert_eq!(verify(SECRET, Some(&header), Some("req-1"), "124"), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(verify(SECRET, None, None, "1"), Err(SignatureError::MissingHeader));
        assert_eq!(verify(SECRET, Some("v1=abcd"), Some("r"), "1"), Err(SignatureError::Malformed));
        assert_eq!(verify(SECRET, Some("ts=1,v1=zz"), Some("r"), "1"), Err(SignatureError::Malformed));
    }

    #[test]
    fn test_request_id_is_required() {
        // Signed over an empty request id, which must not stand in for a missing header.
        let header = header_for("77", "", "1");
        assert_eq!(verify(SECRET, Some(&header), None, "77"), Err(SignatureError::MissingRequestId));
        assert_eq!(verify(SECRET, Some(&header), Some(" "), "77"), Err(SignatureError::MissingRequestId));
    }

    #[test]
    fn test_header_parts_in_any_order_with_spaces() {
        let ts = "99";
        let sig = sign(SECRET, &manifest("ABC", "r", ts)).unwrap();
        let header = format!(" v1={sig} , ts={ts}");
        assert_eq!(verify(SECRET, Some(&header), Some("r"), "ABC"), Ok(()));
    }
}
