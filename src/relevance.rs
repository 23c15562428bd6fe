//! Keyword relevance scoring and excerpt extraction.
//!
//! An article's score is `3 * headline mentions + body mentions`, so one
//! headline hit outweighs a couple of passing mentions in the body.
//! Mentions are counted case-insensitively and only as whole words:
//! "Trumpet" is not a mention of "Trump".

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Article;

/// Weight of a keyword occurrence in the headline.
pub const HEADLINE_WEIGHT: u32 = 3;
/// Weight of a keyword occurrence in the body.
pub const BODY_WEIGHT: u32 = 1;

static CLOSING_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Scores articles against one keyword.
///
/// The keyword is compiled once into a case-insensitive pattern; word
/// boundaries are checked on the surrounding characters of each match.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    keyword: String,
    pattern: Option<Regex>,
}

impl RelevanceScorer {
    /// Build a scorer for `keyword`. An empty keyword never matches.
    ///
    /// # Errors
    ///
    /// Returns an error only if the escaped keyword exceeds the regex size limit.
    pub fn new(keyword: &str) -> Result<Self, regex::Error> {
        let keyword = keyword.trim();
        let pattern = if keyword.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("(?i){}", regex::escape(keyword)))?)
        };

        Ok(Self {
            keyword: keyword.to_string(),
            pattern,
        })
    }

    /// The trimmed keyword this scorer matches.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Count whole-word, case-insensitive occurrences of the keyword.
    ///
    /// A match counts when the characters on either side of it are not
    /// alphanumeric. After a rejected match the scan resumes one character
    /// later, so a rejected match never hides an overlapping one.
    ///
    /// # Arguments
    ///
    /// * `text` - Plain text or raw markup; tags are not stripped first.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let scorer = RelevanceScorer::new("Trump")?;
    /// assert_eq!(scorer.count_mentions("Trump, trumpet, TRUMP"), 2);
    /// ```
    pub fn count_mentions(&self, text: &str) -> u32 {
        let Some(pattern) = &self.pattern else {
            return 0;
        };

        let mut count = 0;
        let mut pos = 0;
        while let Some(m) = pattern.find_at(text, pos) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();

            if !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric) {
                count += 1;
                pos = m.end();
            } else {
                pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            }
        }
        count
    }

    /// Weighted relevance of `article`.
    ///
    /// # Returns
    ///
    /// `HEADLINE_WEIGHT * headline mentions + BODY_WEIGHT * body mentions`,
    /// where the headline is [`Article::headline`] and missing fields count
    /// as empty. Zero means the article is not relevant.
    pub fn score(&self, article: &Article) -> u32 {
        let headline = article.headline().unwrap_or_default();
        let body = article.body.as_deref().unwrap_or_default();

        HEADLINE_WEIGHT * self.count_mentions(headline) + BODY_WEIGHT * self.count_mentions(body)
    }
}

/// Plain-text excerpt of the first `max_paragraphs` paragraphs of `markup`.
///
/// Closing `</p>` tags become paragraph breaks, every other tag is stripped,
/// and the text is split on blank lines. Paragraphs are trimmed, empty ones
/// dropped, and the survivors joined with a blank line.
///
/// # Returns
///
/// The excerpt, or an empty string when `markup` holds no text.
///
/// # Examples
///
/// ```ignore
/// let excerpt = extract_excerpt("<p>One.</p><p>Two.</p><p>Three.</p>", 2);
/// assert_eq!(excerpt, "One.\n\nTwo.");
/// ```
pub fn extract_excerpt(markup: &str, max_paragraphs: usize) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }

    let text = CLOSING_PARAGRAPH.replace_all(markup, "\n\n");
    let text = TAG.replace_all(&text, "");

    BLANK_LINES
        .split(text.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(max_paragraphs)
        .collect::<Vec<_>>()
        .join("\n\n")
}
