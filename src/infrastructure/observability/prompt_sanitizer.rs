const MAX_VISIBLE_LENGTH: usize = 100;

/// Sanitizes user message text for safe logging.
pub fn sanitize_prompt(prompt: &str) -> String {
    let trimmed = prompt.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let sanitized = if trimmed.chars().count() > MAX_VISIBLE_LENGTH {
        format!(
            "{}... ({} chars total)",
            trimmed.chars().take(MAX_VISIBLE_LENGTH).collect::<String>(),
            trimmed.chars().count()
        )
    } else {
        trimmed.to_string()
    };

    redact_sensitive_patterns(&sanitized)
}

fn redact_sensitive_patterns(text: &str) -> String {
    let patterns = [
        ("Bearer ", "Bearer [REDACTED]"),
        ("api_key=", "api_key=[REDACTED]"),
        ("password=", "password=[REDACTED]"),
        ("secret=", "secret=[REDACTED]"),
        ("token=", "token=[REDACTED]"),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        if let Some(idx) = result.find(pattern) {
            let end = result[idx + pattern.len()..]
                .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
                .map(|i| idx + pattern.len() + i)
                .unwrap_or(result.len());
            result = format!("{}{}{}", &result[..idx], replacement, &result[end..]);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_prompt_when_sanitized_then_placeholder() {
        assert_eq!(sanitize_prompt("   "), "[EMPTY]");
    }

    #[test]
    fn given_long_prompt_when_sanitized_then_truncated() {
        let prompt = "x".repeat(150);
        let sanitized = sanitize_prompt(&prompt);
        assert!(sanitized.contains("(150 chars total)"));
    }

    #[test]
    fn given_bearer_token_when_sanitized_then_redacted() {
        let sanitized = sanitize_prompt("use Bearer abc123 please");
        assert!(sanitized.contains("Bearer [REDACTED]"));
        assert!(!sanitized.contains("abc123"));
    }
}
