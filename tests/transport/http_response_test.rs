//! HTTP error body sanitization.

use folio::transport::{check_http_response, TransportError};

use crate::http::serve_once;

#[tokio::test]
async fn check_http_response_redacts_api_keys() {
    let raw_key = "re_abcdefghijklmnopqrstuvwxyz";
    let (base, _rx) = serve_once("401 Unauthorized", &format!("bad key {raw_key}")).await;

    let response = match reqwest::get(base).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };

    match check_http_response(response).await {
        Err(TransportError::HttpStatus { status, body }) => {
            assert_eq!(status, 401);
            assert!(!body.contains(raw_key));
            assert!(body.contains("[REDACTED]"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn check_http_response_passes_success_body_through() {
    let (base, _rx) = serve_once("200 OK", r#"{"id":"x"}"#).await;
    let response = match reqwest::get(base).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };
    match check_http_response(response).await {
        Ok(body) => assert_eq!(body, r#"{"id":"x"}"#),
        Err(err) => panic!("success should pass through: {err}"),
    }
}
