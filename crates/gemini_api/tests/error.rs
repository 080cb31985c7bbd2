use reqwest::StatusCode;

use gemini_api::error::parse_error_message;
use gemini_api::GeminiApiError;

#[test]
fn parse_error_message_is_friendly_on_quota_exhaustion() {
    let body = r#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;

    let message = parse_error_message(StatusCode::TOO_MANY_REQUESTS, body);
    assert!(message.starts_with("Gemini quota exhausted."));
    assert!(message.contains("Quota exceeded for metric"));
}

#[test]
fn parse_error_message_uses_json_message() {
    let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
    let message = parse_error_message(StatusCode::BAD_REQUEST, body);
    assert_eq!(message, "API key not valid. Please pass a valid API key.");
}

#[test]
fn parse_error_message_falls_back_to_raw_body_then_reason() {
    assert_eq!(
        parse_error_message(StatusCode::BAD_GATEWAY, "upstream died"),
        "upstream died"
    );
    assert_eq!(
        parse_error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
        "Service Unavailable"
    );
}

#[test]
fn display_messages_are_user_facing() {
    assert_eq!(GeminiApiError::MissingApiKey.to_string(), "API key is required");
    assert_eq!(
        GeminiApiError::Status(StatusCode::FORBIDDEN, "denied".to_string()).to_string(),
        "HTTP 403 Forbidden denied"
    );
    assert_eq!(
        GeminiApiError::Blocked("SAFETY".to_string()).to_string(),
        "response blocked by provider (SAFETY)"
    );
}
