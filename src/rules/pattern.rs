use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;

/// Upper bound on matches collected per rule per file.
const MAX_MATCHES: usize = 1000;

/// Longest context snippet kept for a match, in characters.
const SNIPPET_CHARS: usize = 120;

/// Compiled regex size ceiling, so a pathological custom pattern cannot
/// balloon memory.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Short text with word and line boundaries, used to spot matchers that
/// only produce zero-width matches.
const ZERO_WIDTH_SAMPLE: &str = "ab cd\nef";

/// One occurrence of a rule in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub text: String,
    /// Byte offset into the scanned content.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    pub context_snippet: String,
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("matcher failed: {0}")]
    Failed(String),
}

/// A stateless textual matcher.
///
/// Implementations must not carry a scan position between calls: the same
/// instance is applied to every file of a scan.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Source pattern, for listing and validation.
    fn pattern(&self) -> &str;

    /// Finds every match in `content`.
    fn find_all(&self, content: &str) -> Result<Vec<Match>, MatchError>;

    /// Returns true if the matcher matches the empty string, or only ever
    /// produces zero-width matches (`\b`, `x*`). Either way it would fire
    /// on every file.
    fn matches_empty(&self) -> bool {
        if self.find_all("").map(|m| !m.is_empty()).unwrap_or(false) {
            return true;
        }
        match self.find_all(ZERO_WIDTH_SAMPLE) {
            Ok(matches) => !matches.is_empty() && matches.iter().all(|m| m.text.is_empty()),
            Err(_) => false,
        }
    }
}

/// Regex-backed matcher.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
}

impl PatternRule {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()?;
        Ok(Self { regex })
    }

    /// Finds every non-overlapping match, starting fresh from offset 0.
    pub fn matches(&self, content: &str) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut lines = LineTracker::default();
        let mut pos = 0;

        while pos <= content.len() && matches.len() < MAX_MATCHES {
            let Some(m) = self.regex.find_at(content, pos) else {
                break;
            };

            matches.push(Match {
                text: m.as_str().to_string(),
                offset: m.start(),
                line: lines.line_of(content, m.start()),
                context_snippet: snippet(content, m.start()),
            });

            // Zero-width matches must still move forward.
            pos = if m.end() > m.start() {
                m.end()
            } else {
                next_char_boundary(content, m.end())
            };
        }

        matches
    }
}

impl Matcher for PatternRule {
    fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    fn find_all(&self, content: &str) -> Result<Vec<Match>, MatchError> {
        Ok(self.matches(content))
    }

    fn matches_empty(&self) -> bool {
        if self.regex.is_match("") {
            return true;
        }
        let mut hits = self.regex.find_iter(ZERO_WIDTH_SAMPLE).peekable();
        hits.peek().is_some() && hits.all(|m| m.is_empty())
    }
}

/// Incremental line counter. Offsets passed in must be non-decreasing.
#[derive(Default)]
struct LineTracker {
    offset: usize,
    line: usize,
}

impl LineTracker {
    fn line_of(&mut self, content: &str, offset: usize) -> usize {
        let newlines = content.as_bytes()[self.offset..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.line += newlines;
        self.offset = offset;
        self.line + 1
    }
}

fn next_char_boundary(content: &str, index: usize) -> usize {
    index
        + content[index..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1)
}

fn snippet(content: &str, offset: usize) -> String {
    let start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = content[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(content.len());
    let line = content[start..end].trim();

    if line.chars().count() > SNIPPET_CHARS {
        let truncated: String = line.chars().take(SNIPPET_CHARS - 3).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
