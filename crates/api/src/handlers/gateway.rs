//! Payment-gateway webhook endpoint.
//!
//! The gateway delivers notifications form-encoded or as JSON and
//! expects a plain-text ack token back. The token vocabulary is a fixed
//! external contract: `OK` and `FAIL` are terminal (no redelivery), any
//! non-2xx status invites redelivery. Malformed-but-received payloads are
//! therefore acked `FAIL` instead of erroring, which keeps redelivery
//! storms away.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use swimdesk_core::payment::Ack;
use swimdesk_db::models::payment::GatewayNotification;

use crate::services::reconciliation;
use crate::state::AppState;

/// Body returned on transient internal failure; any non-2xx status makes
/// the gateway redeliver regardless of the body.
const TRANSIENT_BODY: &str = "ERROR";

/// POST /api/v1/gateway/notification
pub async fn notification(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // Optional production allow-list on the peer address.
    let allowed = &state.config.gateway_allowed_ips;
    if !allowed.is_empty() && !allowed.iter().any(|ip| ip == &addr.ip().to_string()) {
        tracing::warn!(peer = %addr.ip(), "Gateway notification from unlisted address rejected");
        return (StatusCode::FORBIDDEN, Ack::Fail.as_str());
    }

    let notification = match parse_notification(&headers, &body) {
        Ok(n) => n,
        Err(reason) => {
            tracing::error!(peer = %addr.ip(), reason, "Unparseable gateway notification");
            return (StatusCode::OK, Ack::Fail.as_str());
        }
    };

    match reconciliation::handle_notification(&state, &notification).await {
        Ok(ack) => (StatusCode::OK, ack.as_str()),
        Err(e) => {
            tracing::error!(
                tid = %notification.tid,
                error = %e,
                "Gateway notification processing failed transiently",
            );
            (StatusCode::INTERNAL_SERVER_ERROR, TRANSIENT_BODY)
        }
    }
}

/// Decode the payload as JSON or form-encoded based on the content type.
fn parse_notification(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<GatewayNotification, &'static str> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        serde_json::from_slice(body).map_err(|_| "invalid JSON payload")
    } else {
        serde_urlencoded::from_bytes(body).map_err(|_| "invalid form payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    #[test]
    fn parses_json_payload() {
        let body = Bytes::from_static(
            br#"{"tid":"T100","order_ref":"enr-7","result_code":"0000","amount":40000}"#,
        );
        let n = parse_notification(&headers_with("application/json"), &body).unwrap();
        assert_eq!(n.tid, "T100");
        assert_eq!(n.order_ref, "enr-7");
        assert_eq!(n.amount, 40_000);
        assert!(n.result_message.is_none());
    }

    #[test]
    fn parses_form_payload() {
        let body = Bytes::from_static(
            b"tid=T200&order_ref=enr-9&result_code=0000&amount=35000&pay_method=CARD",
        );
        let n =
            parse_notification(&headers_with("application/x-www-form-urlencoded"), &body).unwrap();
        assert_eq!(n.tid, "T200");
        assert_eq!(n.pay_method.as_deref(), Some("CARD"));
    }

    #[test]
    fn missing_content_type_defaults_to_form() {
        let body = Bytes::from_static(b"tid=T300&order_ref=enr-1&result_code=9999&amount=0");
        let n = parse_notification(&HeaderMap::new(), &body).unwrap();
        assert_eq!(n.result_code, "9999");
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let body = Bytes::from_static(b"{not json");
        assert!(parse_notification(&headers_with("application/json"), &body).is_err());
    }

    #[test]
    fn form_payload_missing_required_field_is_rejected() {
        let body = Bytes::from_static(b"tid=T400&amount=100");
        assert!(parse_notification(&HeaderMap::new(), &body).is_err());
    }
}
