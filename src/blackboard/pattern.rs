//! Hint key patterns.
//!
//! Callers write patterns with `*` as the only wildcard, e.g.
//! `aqe/test-queue/*`. A pattern has two renderings:
//!
//! - the **store form**, a SQL `LIKE` pattern with `*` turned into `%` and
//!   literal `%`, `_` and `\` escaped by `\` (queried with `ESCAPE '\'`);
//! - the **live matcher**, an anchored full-key match used to filter hint
//!   notifications.
//!
//! Both treat `*` as zero or more characters of any kind, `/` included, so
//! `aqe/*` matches `aqe/` and `aqe/a/b` but not `aqe`. Every other character
//! is literal.

use std::fmt;

/// Escape character of the store form.
pub const STORE_ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    /// One character (`_` in the store form).
    AnyOne,
    /// Zero or more characters.
    AnyRun,
}

/// Translate a caller pattern into the store's `LIKE` form.
pub fn to_store_wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    for c in pattern.chars() {
        match c {
            '*' => out.push('%'),
            '%' | '_' | STORE_ESCAPE => {
                out.push(STORE_ESCAPE);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Compile a caller pattern into its live matcher.
pub fn to_matcher(pattern: &str) -> HintPattern {
    HintPattern::new(pattern)
}

/// Test `key` against a pattern already in store form.
///
/// Interprets `%`, `_` and `\` escapes the way SQLite's case-sensitive
/// `LIKE ... ESCAPE '\'` does.
pub fn store_wildcard_matches(store_pattern: &str, key: &str) -> bool {
    let tokens = parse_store_form(store_pattern);
    wildcard_match(&tokens, key)
}

/// A compiled hint key pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct HintPattern {
    raw: String,
    store: String,
    tokens: Vec<Token>,
}

impl HintPattern {
    /// Compile `pattern`; `*` is the only wildcard.
    pub fn new(pattern: &str) -> Self {
        let tokens = pattern
            .chars()
            .map(|c| if c == '*' { Token::AnyRun } else { Token::Literal(c) })
            .collect();
        Self {
            raw: pattern.to_string(),
            store: to_store_wildcard(pattern),
            tokens,
        }
    }

    /// Whole-key match.
    pub fn matches(&self, key: &str) -> bool {
        wildcard_match(&self.tokens, key)
    }

    /// The pattern as the caller wrote it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The pattern in store `LIKE` form.
    pub fn store_form(&self) -> &str {
        &self.store
    }
}

impl fmt::Debug for HintPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintPattern")
            .field("raw", &self.raw)
            .field("store", &self.store)
            .finish()
    }
}

impl fmt::Display for HintPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_store_form(store_pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(store_pattern.len());
    let mut chars = store_pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            STORE_ESCAPE => Token::Literal(chars.next().unwrap_or(STORE_ESCAPE)),
            other => Token::Literal(other),
        };
        tokens.push(token);
    }
    tokens
}

/// Greedy wildcard match with single-point backtracking to the last run.
fn wildcard_match(tokens: &[Token], key: &str) -> bool {
    let key: Vec<char> = key.chars().collect();
    let (mut t, mut k) = (0usize, 0usize);
    // Position after the last `AnyRun` seen and the key index it resumes from.
    let mut resume: Option<(usize, usize)> = None;

    while k < key.len() {
        match tokens.get(t) {
            Some(Token::Literal(c)) if *c == key[k] => {
                t += 1;
                k += 1;
                continue;
            }
            Some(Token::AnyOne) => {
                t += 1;
                k += 1;
                continue;
            }
            Some(Token::AnyRun) => {
                t += 1;
                resume = Some((t, k));
                continue;
            }
            _ => {}
        }
        match resume {
            Some((rt, rk)) => {
                t = rt;
                k = rk + 1;
                resume = Some((rt, rk + 1));
            }
            None => return false,
        }
    }

    tokens[t..].iter().all(|tok| *tok == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_form_translation() {
        assert_eq!(to_store_wildcard("aqe/test-queue/*"), "aqe/test-queue/%");
        assert_eq!(to_store_wildcard("*/x/*"), "%/x/%");
        assert_eq!(to_store_wildcard("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(to_store_wildcard(""), "");
    }

    #[test]
    fn test_trailing_wildcard() {
        let p = to_matcher("aqe/test-queue/*");
        assert!(p.matches("aqe/test-queue/1"));
        assert!(p.matches("aqe/test-queue/a/b/c"));
        assert!(p.matches("aqe/test-queue/"));
        assert!(!p.matches("aqe/test-queue"));
        assert!(!p.matches("other/queue/1"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = to_matcher("aqe/v1.0/(a+b)?/*");
        assert!(p.matches("aqe/v1.0/(a+b)?/x"));
        assert!(!p.matches("aqe/v1x0/(a+b)?/x"));
        assert!(!p.matches("aqe/v1.0/aab/x"));

        let p = to_matcher("cost/$[0-9]^");
        assert!(p.matches("cost/$[0-9]^"));
        assert!(!p.matches("cost/$5^"));
    }

    #[test]
    fn test_adjacent_and_inner_wildcards() {
        let p = to_matcher("a**b");
        assert!(p.matches("ab"));
        assert!(p.matches("a-x-b"));
        assert!(!p.matches("a-x-c"));

        let p = to_matcher("aqe/*/result/*");
        assert!(p.matches("aqe/agent-1/result/42"));
        assert!(p.matches("aqe/a/b/result/"));
        assert!(!p.matches("aqe/agent-1/results"));
    }

    #[test]
    fn test_backtracking_over_repeated_segments() {
        let p = to_matcher("*ab*abc");
        assert!(p.matches("xxabyyababc"));
        assert!(!p.matches("xxabyyabab"));
    }

    #[test]
    fn test_no_wildcard_is_exact() {
        let p = to_matcher("aqe/result/42");
        assert!(p.matches("aqe/result/42"));
        assert!(!p.matches("aqe/result/420"));
        assert!(!p.matches("aqe/result/4"));
    }

    #[test]
    fn test_empty_pattern_matches_only_empty_key() {
        let p = to_matcher("");
        assert!(p.matches(""));
        assert!(!p.matches("a"));

        let star = to_matcher("*");
        assert!(star.matches(""));
        assert!(star.matches("anything/at/all"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(!to_matcher("AQE/*").matches("aqe/1"));
    }

    #[test]
    fn test_store_form_agrees_with_live_matcher() {
        let patterns = [
            "aqe/test-queue/*",
            "100%/*",
            "snake_case/*",
            "back\\slash/*",
            "a**b",
            "*",
            "",
            "exact/key",
        ];
        let keys = [
            "aqe/test-queue/1",
            "aqe/test-queue",
            "100%/x",
            "100x/x",
            "snake_case/1",
            "snakeXcase/1",
            "back\\slash/2",
            "backslash/2",
            "ab",
            "a/b",
            "",
            "exact/key",
            "exact/keys",
        ];
        for pattern in patterns {
            let live = to_matcher(pattern);
            for key in keys {
                assert_eq!(
                    store_wildcard_matches(live.store_form(), key),
                    live.matches(key),
                    "pattern {:?} key {:?}",
                    pattern,
                    key
                );
            }
        }
    }

    #[test]
    fn test_store_single_char_wildcard() {
        assert!(store_wildcard_matches("task_1", "taskX1"));
        assert!(!store_wildcard_matches("task_1", "task1"));
        assert!(store_wildcard_matches("task\\_1", "task_1"));
        assert!(!store_wildcard_matches("task\\_1", "taskX1"));
    }
}
