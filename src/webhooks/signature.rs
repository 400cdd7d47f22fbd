//! Request signature verification for Slack and GitHub deliveries.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::webhooks::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Slack requests older than this are rejected as possible replays.
pub const SLACK_MAX_AGE_SECS: i64 = 60 * 5;

pub const GITHUB_SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

fn mac(secret: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).ok()
}

/// `sha256=<hex>` over the raw body, as GitHub sends it.
pub fn github_signature(secret: &str, payload: &[u8]) -> String {
    match mac(secret) {
        Some(mut mac) => {
            mac.update(payload);
            format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
        }
        None => String::new(),
    }
}

pub fn verify_github_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Some(mut mac) = mac(secret) else {
        return false;
    };

    mac.update(payload);
    mac.verify_slice(&signature_bytes).is_ok()
}

/// `v0=<hex>` over `v0:{timestamp}:{body}`.
pub fn slack_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    match mac(secret) {
        Some(mut mac) => {
            mac.update(format!("v0:{}:", timestamp).as_bytes());
            mac.update(body);
            format!("v0={}", hex::encode(mac.finalize().into_bytes()))
        }
        None => String::new(),
    }
}

pub fn verify_slack_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> bool {
    let Ok(sent_at) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now - sent_at).abs() > SLACK_MAX_AGE_SECS {
        return false;
    }

    let Some(signature_hex) = signature.strip_prefix("v0=") else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Some(mut mac) = mac(secret) else {
        return false;
    };

    mac.update(format!("v0:{}:", timestamp).as_bytes());
    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}

fn header<'a>(parts: &'a axum::http::request::Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

pub async fn verify_github_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let signature = header(&parts, GITHUB_SIGNATURE_HEADER).ok_or(StatusCode::UNAUTHORIZED)?;
    if !verify_github_signature(&state.config.github_webhook_secret, &bytes, signature) {
        warn!("Invalid GitHub webhook signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

pub async fn verify_slack_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let timestamp = header(&parts, SLACK_TIMESTAMP_HEADER).ok_or(StatusCode::UNAUTHORIZED)?;
    let signature = header(&parts, SLACK_SIGNATURE_HEADER).ok_or(StatusCode::UNAUTHORIZED)?;
    let now = chrono::Utc::now().timestamp();

    if !verify_slack_signature(
        &state.config.slack_signing_secret,
        timestamp,
        &bytes,
        signature,
        now,
    ) {
        warn!("Invalid or stale Slack request signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_signature_round_trip() {
        let body = br#"{"action":"closed"}"#;
        let signature = github_signature("secret", body);
        assert!(signature.starts_with("sha256="));
        assert!(verify_github_signature("secret", body, &signature));
        assert!(!verify_github_signature("other", body, &signature));
        assert!(!verify_github_signature("secret", b"tampered", &signature));
    }

    #[test]
    fn test_github_signature_rejects_malformed_header() {
        assert!(!verify_github_signature("secret", b"{}", "sha1=abcd"));
        assert!(!verify_github_signature("secret", b"{}", "sha256=not-hex"));
        assert!(!verify_github_signature("secret", b"{}", ""));
    }

    #[test]
    fn test_slack_signature_matches_documented_example() {
        // Example request from Slack's "Verifying requests" guide.
        let secret = "8f742231b10e8888abcd99yyyzzz85a5";
        let timestamp = "1531420618";
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        let expected = "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503";

        assert_eq!(slack_signature(secret, timestamp, body), expected);
        assert!(verify_slack_signature(secret, timestamp, body, expected, 1531420618));
    }

    #[test]
    fn test_slack_signature_rejects_stale_timestamp() {
        let body = b"text=track";
        let signature = slack_signature("secret", "1000", body);
        assert!(verify_slack_signature("secret", "1000", body, &signature, 1000 + 60));
        assert!(!verify_slack_signature(
            "secret",
            "1000",
            body,
            &signature,
            1000 + SLACK_MAX_AGE_SECS + 1
        ));
        assert!(!verify_slack_signature("secret", "soon", body, &signature, 1000));
    }
}
