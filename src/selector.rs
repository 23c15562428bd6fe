//! Reduce a day's candidates to the single most relevant article.

use itertools::Itertools;
use tracing::debug;

use crate::models::{Article, SelectedArticle};
use crate::relevance::{RelevanceScorer, extract_excerpt};

/// Paragraphs kept in the excerpt of the selected article.
pub const EXCERPT_PARAGRAPHS: usize = 3;

/// A candidate paired with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredArticle<'a> {
    pub score: u32,
    pub article: &'a Article,
}

/// Score every candidate and order them best first.
///
/// Candidates scoring zero are dropped. The sort is stable, so among equal
/// scores the input order is kept.
pub fn rank<'a>(candidates: &'a [Article], scorer: &RelevanceScorer) -> Vec<ScoredArticle<'a>> {
    candidates
        .iter()
        .map(|article| ScoredArticle {
            score: scorer.score(article),
            article,
        })
        .filter(|scored| scored.score > 0)
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .collect()
}

/// Pick and format the most relevant candidate.
///
/// Returns `None` when there are no candidates or none mention the keyword;
/// that is a quiet day, not an error. Ties go to the earliest candidate.
pub fn select_best(candidates: &[Article], scorer: &RelevanceScorer) -> Option<SelectedArticle> {
    let ranked = rank(candidates, scorer);
    let best = ranked.first()?;

    debug!(
        candidates = candidates.len(),
        relevant = ranked.len(),
        score = best.score,
        id = %best.article.id,
        thumbnail = ?best.article.thumbnail,
        "Selected article"
    );

    Some(format_article(best.article))
}

fn format_article(article: &Article) -> SelectedArticle {
    let headline = article
        .headline()
        .filter(|h| !h.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let excerpt = extract_excerpt(article.body.as_deref().unwrap_or_default(), EXCERPT_PARAGRAPHS);
    let excerpt = if excerpt.is_empty() {
        headline.clone()
    } else {
        excerpt
    };

    SelectedArticle {
        headline,
        excerpt,
        url: article.url.clone().unwrap_or_default(),
        published: article.published.clone().unwrap_or_default(),
    }
}
