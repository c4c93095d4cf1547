//! Known maximum context sizes per model.
//!
//! Used by final synthesis to pick a truncation budget after a context
//! overflow. May lag behind provider releases; unknown models return
//! `None` and the caller must not guess.

/// Known (model id substring, context window in tokens) pairs.
const MODEL_TOKEN_LIMITS: &[(&str, usize)] = &[
    ("openai:gpt-4.1-mini", 1_047_576),
    ("openai:gpt-4.1-nano", 1_047_576),
    ("openai:gpt-4.1", 1_047_576),
    ("openai:gpt-4o-mini", 128_000),
    ("openai:gpt-4o", 128_000),
    ("openai:o4-mini", 200_000),
    ("openai:o3", 200_000),
    ("openai:o1", 200_000),
    ("anthropic:claude-opus-4", 200_000),
    ("anthropic:claude-sonnet-4", 200_000),
    ("anthropic:claude-3-7-sonnet", 200_000),
    ("anthropic:claude-3-5-sonnet", 200_000),
    ("anthropic:claude-3-5-haiku", 200_000),
    ("google:gemini-1.5-pro", 2_097_152),
    ("google:gemini-1.5-flash", 1_048_576),
    ("google:gemini-pro", 32_768),
];

/// Look up the known context window for a model id.
pub fn model_token_limit(model_id: &str) -> Option<usize> {
    MODEL_TOKEN_LIMITS
        .iter()
        .find(|(key, _)| model_id.contains(key))
        .map(|(_, limit)| *limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models() {
        assert_eq!(
            model_token_limit("anthropic:claude-sonnet-4"),
            Some(200_000)
        );
        assert_eq!(model_token_limit("openai:gpt-4.1-mini"), Some(1_047_576));
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(
            model_token_limit("anthropic:claude-3-5-haiku-20241022"),
            Some(200_000)
        );
    }

    #[test]
    fn test_unknown_model_returns_none() {
        assert_eq!(model_token_limit("acme:frontier-1"), None);
    }
}
