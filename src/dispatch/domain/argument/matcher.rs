//! Matchers that extract an argument candidate from the remaining body.

use regex::Regex;

/// A candidate extracted from the body plus what is left afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedCandidate {
    /// Candidate text handed to the resolver.
    pub candidate: String,
    /// Body after the candidate was consumed, trimmed.
    pub remainder: String,
}

/// Strategy for pulling one argument's text out of the remaining body.
#[derive(Debug, Clone, Default)]
pub enum ArgumentMatcher {
    /// First whitespace-delimited token; a quoted token may contain spaces.
    #[default]
    FirstToken,
    /// Everything that remains.
    Rest,
    /// First match of a pattern; the first capture group when present.
    Pattern(Regex),
}

impl ArgumentMatcher {
    /// Extracts a candidate, or `None` when the body offers nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::dispatch::domain::ArgumentMatcher;
    ///
    /// let matched = ArgumentMatcher::FirstToken
    ///     .extract("\"new york\" tomorrow")
    ///     .expect("candidate");
    /// assert_eq!(matched.candidate, "new york");
    /// assert_eq!(matched.remainder, "tomorrow");
    /// ```
    #[must_use]
    pub fn extract(&self, raw_body: &str) -> Option<MatchedCandidate> {
        let body = raw_body.trim();
        if body.is_empty() {
            return None;
        }
        match self {
            Self::FirstToken => split_first_token(body),
            Self::Rest => Some(MatchedCandidate {
                candidate: body.to_owned(),
                remainder: String::new(),
            }),
            Self::Pattern(regex) => extract_pattern(regex, body),
        }
    }
}

fn extract_pattern(regex: &Regex, body: &str) -> Option<MatchedCandidate> {
    let captures = regex.captures(body)?;
    let whole = captures.get(0)?;
    let candidate = captures
        .get(1)
        .map_or_else(|| whole.as_str(), |group| group.as_str())
        .trim();
    if candidate.is_empty() {
        return None;
    }
    let before = body.get(..whole.start()).unwrap_or_default().trim_end();
    let after = body.get(whole.end()..).unwrap_or_default().trim_start();
    let remainder = match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_owned(),
        (false, true) => before.to_owned(),
        (false, false) => format!("{before} {after}"),
    };
    Some(MatchedCandidate {
        candidate: candidate.to_owned(),
        remainder,
    })
}

/// Splits the first token off `body`, honouring `"` and `'` quoting with
/// backslash escapes inside quotes. An unterminated quote falls back to a
/// plain whitespace split so user typos never swallow the whole body; an
/// explicit empty quote is consumed as an empty candidate.
fn split_first_token(body: &str) -> Option<MatchedCandidate> {
    let mut token = String::new();
    let mut quoted = false;
    let mut in_quotes: Option<char> = None;
    let mut escaped = false;
    let mut end = body.len();

    for (offset, character) in body.char_indices() {
        if let Some(quote_char) = in_quotes {
            if escaped {
                token.push(character);
                escaped = false;
                continue;
            }
            match character {
                '\\' => escaped = true,
                _ if character == quote_char => in_quotes = None,
                _ => token.push(character),
            }
            continue;
        }

        match character {
            '"' | '\'' if token.is_empty() && offset == 0 => {
                quoted = true;
                in_quotes = Some(character);
            }
            _ if character.is_whitespace() => {
                end = offset;
                break;
            }
            _ => token.push(character),
        }
    }

    if in_quotes.is_some() || escaped {
        return plain_split(body);
    }
    if token.is_empty() && !quoted {
        return None;
    }
    Some(MatchedCandidate {
        candidate: token,
        remainder: body.get(end..).unwrap_or_default().trim().to_owned(),
    })
}

fn plain_split(body: &str) -> Option<MatchedCandidate> {
    let (candidate, remainder) = body
        .split_once(char::is_whitespace)
        .unwrap_or((body, ""));
    if candidate.is_empty() {
        return None;
    }
    Some(MatchedCandidate {
        candidate: candidate.to_owned(),
        remainder: remainder.trim().to_owned(),
    })
}
