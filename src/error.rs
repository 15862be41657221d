use anyhow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Provider,
    Session,
    Tooling,
    Input,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Provider => "PROVIDER",
            ErrorCategory::Session => "SESSION",
            ErrorCategory::Tooling => "TOOLING",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ErrorCategory::Provider => {
                "Set GOOGLE_API_KEY for the Gemini provider or run with --provider mock."
            }
            ErrorCategory::Session => {
                "Check --session-backend/--session-dir; file sessions live under .b2shift/sessions."
            }
            ErrorCategory::Tooling => {
                "Review agent/tool configuration and retry with RUST_LOG=info for delegation logs."
            }
            ErrorCategory::Input => "Run b2shift-cluster --help and correct command arguments.",
            ErrorCategory::Internal => {
                "Retry with RUST_LOG=debug. If it persists, capture logs and open an issue."
            }
        }
    }
}

pub fn categorize_error(err: &anyhow::Error) -> ErrorCategory {
    let msg = format!("{err:#}").to_ascii_lowercase();

    if msg.contains("api_key")
        || msg.contains("google_api_key")
        || msg.contains("no provider could be auto-detected")
        || msg.contains("provider")
        || msg.contains("gemini")
    {
        return ErrorCategory::Provider;
    }

    if msg.contains("--force")
        || msg.contains("destructive")
        || msg.contains("invalid value")
        || msg.contains("unknown argument")
        || msg.contains("scenario")
        || msg.contains("profile")
        || msg.contains("prompt cannot be empty")
    {
        return ErrorCategory::Input;
    }

    if msg.contains("session") {
        return ErrorCategory::Session;
    }

    if msg.contains("tool") || msg.contains("agent") || msg.contains("delegat") {
        return ErrorCategory::Tooling;
    }

    ErrorCategory::Internal
}

pub fn format_cli_error(err: &anyhow::Error) -> String {
    let category = categorize_error(err);
    format!(
        "[{}] {}\nHint: {}",
        category.code(),
        redact_sensitive_text(&err.to_string()),
        category.hint()
    )
}

/// Provider requests carry the API key as a `key=` query parameter; never let
/// it leak into rendered errors.
pub fn redact_sensitive_text(text: &str) -> String {
    redact_key_params(text)
}

pub fn redact_key_params(text: &str) -> String {
    const KEY_PREFIX: &str = "key=";
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    while let Some(offset) = text[cursor..].find(KEY_PREFIX) {
        let start = cursor + offset;
        let value_start = start + KEY_PREFIX.len();
        out.push_str(&text[cursor..value_start]);

        let remainder = &text[value_start..];
        let end = remainder
            .find(|ch: char| {
                ch.is_whitespace()
                    || matches!(
                        ch,
                        '&' | '"' | '\'' | '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';'
                    )
            })
            .unwrap_or(remainder.len());

        if end == 0 {
            // "key=" with no value attached; leave untouched.
        } else {
            out.push_str("[REDACTED]");
        }
        cursor = value_start + end;
    }

    out.push_str(&text[cursor..]);
    out
}
