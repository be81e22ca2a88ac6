//! Offline heuristic evaluator.
//!
//! Scores a resume by keyword overlap with the job description. No network,
//! fully deterministic, so keyless environments and tests can run the whole
//! pipeline against it (`provider = "keyword"`).

use std::sync::LazyLock;

use regex::Regex;

use super::{Evaluation, Evaluator, EvaluatorError};

static RE_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)(?:\.\d+)?\s*\+?\s*years?").unwrap());

const MIN_TOKEN_LEN: usize = 3;
const MISSING_SHORTLIST: usize = 5;

/// Job-posting boilerplate that would otherwise match every resume.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "will", "our", "are", "this", "that", "have",
    "has", "from", "about", "into", "over", "who", "can", "able", "must", "should", "would",
    "their", "they", "been", "being", "work", "working", "years", "experience", "required",
    "preferred", "strong", "knowledge", "ability", "skills", "team", "role",
];

#[derive(Debug, Default)]
pub struct KeywordEvaluator;

impl KeywordEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for KeywordEvaluator {
    fn evaluate(
        &self,
        document_text: &str,
        job_description: &str,
    ) -> Result<Evaluation, EvaluatorError> {
        let keywords = keywords_of(job_description);
        let resume = document_text.to_lowercase();

        // Substring containment, not word boundaries.
        let (matched, missing): (Vec<&String>, Vec<&String>) =
            keywords.iter().partition(|k| resume.contains(k.as_str()));

        let match_percentage = if keywords.is_empty() {
            0
        } else {
            (matched.len() * 100 / keywords.len()) as i64
        };

        Ok(Evaluation {
            candidate_name: guess_name(document_text),
            years_experience: extract_years(document_text),
            match_percentage,
            feedback: build_feedback(matched.len(), keywords.len(), &missing),
        })
    }
}

/// Distinct lowercased keywords in first-seen order.
fn keywords_of(job_description: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for token in job_description
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
    {
        if token.len() < MIN_TOKEN_LEN || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

/// First non-empty line, taken as the candidate's name when it looks like
/// one (a few words, no digits).
fn guess_name(document_text: &str) -> String {
    let first_line = document_text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    let word_count = first_line.split_whitespace().count();
    if (1..=5).contains(&word_count)
        && first_line.len() <= 64
        && !first_line.chars().any(|c| c.is_ascii_digit())
    {
        first_line.to_string()
    } else {
        "Unknown".to_string()
    }
}

/// Largest "N years" mention anywhere in the resume, 0 if none.
fn extract_years(document_text: &str) -> i64 {
    RE_YEARS
        .captures_iter(document_text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}

fn build_feedback(matched: usize, total: usize, missing: &[&String]) -> String {
    if total == 0 {
        return "Job description contained no scoreable keywords.".to_string();
    }
    if missing.is_empty() {
        return format!("Covers all {total} keywords from the job description.");
    }

    let shortlist = missing
        .iter()
        .take(MISSING_SHORTLIST)
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Matched {matched} of {total} keywords from the job description. Not found: {shortlist}.")
}
