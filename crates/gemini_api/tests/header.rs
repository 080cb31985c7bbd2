use gemini_api::headers::{
    build_headers, redacted, HEADER_ACCEPT, HEADER_API_KEY, HEADER_CONTENT_TYPE,
    HEADER_USER_AGENT,
};
use gemini_api::{GeminiApiConfig, GeminiApiError};

#[test]
fn header_map_contains_gemini_headers() {
    let config = GeminiApiConfig::new(" secret-key ").insert_header("X-Extra", "value");

    let headers = build_headers(&config, None).expect("header construction");
    assert_eq!(
        headers.get(HEADER_API_KEY).expect("api key header"),
        &"secret-key".to_owned()
    );
    assert_eq!(
        headers.get(HEADER_ACCEPT).expect("accept"),
        &"application/json".to_owned()
    );
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE).expect("content-type"),
        &"application/json".to_owned()
    );
    assert_eq!(headers.get("x-extra").expect("custom"), &"value".to_owned());
}

#[test]
fn header_map_prefers_explicit_user_agent() {
    let config = GeminiApiConfig::new("key").with_user_agent("configured-agent");

    let explicit = build_headers(&config, Some("test-agent")).expect("header construction");
    assert_eq!(
        explicit.get(HEADER_USER_AGENT).expect("user-agent"),
        &"test-agent".to_string()
    );

    let configured = build_headers(&config, None).expect("header construction");
    assert_eq!(
        configured.get(HEADER_USER_AGENT).expect("user-agent"),
        &"configured-agent".to_string()
    );
}

#[test]
fn header_map_rejects_blank_api_key() {
    let error = build_headers(&GeminiApiConfig::new("   "), None)
        .expect_err("blank key must be rejected");
    assert!(matches!(error, GeminiApiError::MissingApiKey));
}

#[test]
fn redacted_headers_hide_the_api_key() {
    let headers = build_headers(&GeminiApiConfig::new("secret-key"), None).expect("headers");
    let shown = redacted(&headers);

    assert_eq!(shown.get(HEADER_API_KEY).map(String::as_str), Some("<redacted>"));
    assert_eq!(shown.get(HEADER_ACCEPT), headers.get(HEADER_ACCEPT));
}
