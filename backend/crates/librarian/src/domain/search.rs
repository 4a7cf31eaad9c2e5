//! Keyword Search
//!
//! Questions are reduced to lowercase terms; candidate articles are scored by
//! how often the terms occur, with title hits weighted over tag hits and tag
//! hits over body hits.

use crate::domain::entities::Article;

const TERM_CHARS_MIN: usize = 3;
const TERMS_MAX: usize = 12;

const TITLE_WEIGHT: u32 = 3;
const TAG_WEIGHT: u32 = 2;
const BODY_WEIGHT: u32 = 1;

const STOP_WORDS: &[&str] = &[
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was", "one",
    "our", "out", "has", "have", "how", "what", "when", "where", "which", "who", "why", "with",
    "this", "that", "from", "they", "will", "would", "there", "their", "about", "into", "does",
    "your", "been", "were", "than", "then", "them", "these", "those", "some", "should", "could",
    // Ukrainian
    "але", "або", "для", "як", "що", "які", "який", "яка", "яке", "коли", "чому", "щоб", "цей",
    "ця", "це", "ці", "мені", "мене", "нас", "вас", "вони", "воно", "вона", "він", "так", "там",
    "тут", "від", "над", "під", "при", "про", "без", "через", "також", "можна", "треба", "чи",
    "де", "хто", "все", "всі", "було", "буде", "бути", "його", "її", "їх",
];

/// Distinct lowercase search terms of at least three characters, stop words
/// removed, in order of first appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let term = word.to_lowercase();
        if term.chars().count() < TERM_CHARS_MIN || STOP_WORDS.contains(&term.as_str()) {
            continue;
        }
        if !terms.contains(&term) {
            terms.push(term);
            if terms.len() == TERMS_MAX {
                break;
            }
        }
    }
    terms
}

fn occurrences(haystack: &str, term: &str) -> u32 {
    haystack.matches(term).count() as u32
}

/// Weighted occurrence count of `terms` in the article
pub fn score(article: &Article, terms: &[String]) -> u32 {
    let title = article.title.to_lowercase();
    let body = article.body.to_lowercase();

    terms
        .iter()
        .map(|term| {
            let tag_hits: u32 = article
                .tags
                .iter()
                .map(|tag| occurrences(tag, term))
                .sum();
            occurrences(&title, term) * TITLE_WEIGHT
                + tag_hits * TAG_WEIGHT
                + occurrences(&body, term) * BODY_WEIGHT
        })
        .sum()
}

#[derive(Debug, Clone)]
pub struct ScoredArticle {
    pub article: Article,
    pub score: u32,
}

/// Best `limit` articles with a positive score, highest first; ties go to
/// the most recently updated.
pub fn rank(candidates: Vec<Article>, terms: &[String], limit: usize) -> Vec<ScoredArticle> {
    let mut scored: Vec<ScoredArticle> = candidates
        .into_iter()
        .map(|article| ScoredArticle {
            score: score(&article, terms),
            article,
        })
        .filter(|s| s.score > 0)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.article.updated_at.cmp(&a.article.updated_at))
    });
    scored.truncate(limit);
    scored
}
