//! Manual channel: interpreting lines the user pastes into the terminal.

use url::Url;

use crate::types::CallbackOutcome;

/// Printed again when a pasted line carried no code.
pub const REPROMPT: &str =
    "No code found in that input. Paste the full redirect URL or just the code: ";

/// Shortest bare code accepted without a digit in it.
const MIN_LETTER_ONLY_CODE_LEN: usize = 16;

/// How one pasted line affects the race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line, nothing to do.
    Ignored,
    /// Not usable; prompt again and keep waiting.
    Unrecognized,
    /// Settles the race.
    Terminal(CallbackOutcome),
}

/// Interpret a pasted line as a redirect URL or a bare authorization code.
pub fn classify_line(input: &str) -> LineOutcome {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return LineOutcome::Ignored;
    }

    if let Ok(url) = Url::parse(trimmed) {
        let mut error = None;
        let mut code = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "error" if error.is_none() => error = Some(value.into_owned()),
                "code" if code.is_none() => code = Some(value.into_owned()),
                _ => {},
            }
        }
        return match outcome_from_params(error.as_deref(), code.as_deref()) {
            Some(outcome) => LineOutcome::Terminal(outcome),
            None => LineOutcome::Unrecognized,
        };
    }

    if looks_like_code(trimmed) {
        LineOutcome::Terminal(CallbackOutcome::Code(trimmed.to_string()))
    } else {
        LineOutcome::Unrecognized
    }
}

/// Resolve callback query parameters; `error` wins over `code`.
///
/// Returns `None` when neither carries a value.
pub(crate) fn outcome_from_params(
    error: Option<&str>,
    code: Option<&str>,
) -> Option<CallbackOutcome> {
    if let Some(error) = error.filter(|e| !e.is_empty()) {
        return Some(CallbackOutcome::ProviderError(error.to_string()));
    }
    code.filter(|c| !c.is_empty())
        .map(|c| CallbackOutcome::Code(c.to_string()))
}

/// Authorization codes are opaque URL-safe tokens. A plain word such as
/// "hello" is rejected: it needs a digit, or enough length to be random.
fn looks_like_code(s: &str) -> bool {
    let url_safe = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    url_safe
        && (s.chars().any(|c| c.is_ascii_digit()) || s.len() >= MIN_LETTER_ONLY_CODE_LEN)
}
