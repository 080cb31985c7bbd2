/// Default base URL for Gemini transport requests.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const GENERATE_METHOD: &str = ":generateContent";

/// Normalize a base URL and model id to a `generateContent` endpoint.
///
/// Normalization rules:
/// 1) keep URLs already ending in `:generateContent` unchanged
/// 2) accept model ids with or without the `models/` prefix
/// 3) append `/{model}:generateContent` when the path ends in `/models`
/// 4) append `/models/{model}:generateContent` otherwise
pub fn normalize_generate_url(input: &str, model: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_GEMINI_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(GENERATE_METHOD) {
        return trimmed.to_string();
    }

    let model = model.trim();
    let model = model.strip_prefix("models/").unwrap_or(model);
    if trimmed.ends_with("/models") {
        return format!("{trimmed}/{model}{GENERATE_METHOD}");
    }
    format!("{trimmed}/models/{model}{GENERATE_METHOD}")
}
