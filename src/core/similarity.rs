//! TF-IDF significator matching.
//!
//! The vector space is fit over every candidate's symbol text plus the query,
//! so the query's own terms are always part of the vocabulary.

use crate::core::{CardDefinition, RandomSource};
use crate::utils::error::{Result, TarotError};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 兩個以上的文字字元視為一個詞
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Lower-cased tokens of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sparse L2-normalised term weights, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learns vocabulary and smoothed idf weights: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for doc in corpus {
            let mut terms = tokenize(doc.as_ref());
            terms.sort();
            terms.dedup();
            for term in terms {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(term).or_insert(next_id);
                if id == document_frequency.len() {
                    document_frequency.push(0);
                }
                document_frequency[id] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Raw term counts times idf, L2-normalised. Unknown terms are ignored.
    pub fn transform(&self, doc: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in tokenize(doc) {
            if let Some(&id) = self.vocabulary.get(&term) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }
        SparseVector { entries }
    }
}

/// Index of the first maximal score.
pub fn first_argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// How a significator was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionMethod {
    /// Blank query: uniform choice among candidates.
    Random,
    /// TF-IDF match; one score per candidate in candidate order.
    Similarity { scores: Vec<f64> },
}

#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub card: &'a CardDefinition,
    pub position: usize,
    pub method: SelectionMethod,
}

/// Scores each candidate's symbol text against the query.
pub fn similarity_scores(candidates: &[&CardDefinition], query: &str) -> Vec<f64> {
    let mut corpus: Vec<&str> = candidates.iter().map(|c| c.symbol_text.as_str()).collect();
    corpus.push(query);

    let vectorizer = TfidfVectorizer::fit(&corpus);
    let query_vector = vectorizer.transform(query);
    candidates
        .iter()
        .map(|c| vectorizer.transform(&c.symbol_text).dot(&query_vector))
        .collect()
}

/// Picks the significator from `candidates`.
///
/// A blank query selects uniformly at random; otherwise the highest TF-IDF
/// score wins and ties go to the earliest candidate.
pub fn select_significator<'a>(
    candidates: &[&'a CardDefinition],
    query: &str,
    rng: &mut dyn RandomSource,
) -> Result<Selection<'a>> {
    if candidates.is_empty() {
        return Err(TarotError::data_unavailable(
            "no significator candidates are available",
        ));
    }

    if query.trim().is_empty() {
        let position = rng.next_index(candidates.len());
        tracing::debug!("Blank query, picked candidate {} at random", position);
        return Ok(Selection {
            card: candidates[position],
            position,
            method: SelectionMethod::Random,
        });
    }

    let scores = similarity_scores(candidates, query);
    let position = first_argmax(&scores)
        .ok_or_else(|| TarotError::contract("similarity produced no scores"))?;
    tracing::debug!(
        "Significator '{}' scored {:.4} against query",
        candidates[position].display_name,
        scores[position]
    );

    Ok(Selection {
        card: candidates[position],
        position,
        method: SelectionMethod::Similarity { scores },
    })
}
