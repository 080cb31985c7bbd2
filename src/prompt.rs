//! Prompt composition.

/// A fixed instruction plus the normalized input. Built once, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    template: String,
    body: String,
}

impl CompletionRequest {
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// `template` followed directly by `body`.
    #[must_use]
    pub fn prompt(&self) -> String {
        let mut prompt = String::with_capacity(self.template.len() + self.body.len());
        prompt.push_str(&self.template);
        prompt.push_str(&self.body);
        prompt
    }
}

/// Pure concatenation: no trimming, escaping or size limit.
#[must_use]
pub fn compose(template: &str, body: &str) -> CompletionRequest {
    CompletionRequest {
        template: template.to_string(),
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_template_then_body_verbatim() {
        let request = compose("Summarize into bullet points:\n", "  <b>cells</b> & tissues\n");

        assert_eq!(
            request.prompt(),
            "Summarize into bullet points:\n  <b>cells</b> & tissues\n"
        );
        assert_eq!(request.template(), "Summarize into bullet points:\n");
        assert_eq!(request.body(), "  <b>cells</b> & tissues\n");
    }

    #[test]
    fn empty_template_passes_body_through() {
        assert_eq!(compose("", "what is osmosis").prompt(), "what is osmosis");
    }

    #[test]
    fn long_bodies_are_not_truncated() {
        let body = "x".repeat(200_000);

        assert_eq!(compose("T:", &body).prompt().len(), 200_002);
    }
}
