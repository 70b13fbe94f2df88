use std::fmt;

use super::record::MemoryRecord;

const SEMANTIC_WEIGHT: f32 = 0.7;
const METADATA_WEIGHT: f32 = 0.3;

const CATEGORY_MATCH_WEIGHT: f32 = 3.0;
const EMOTION_MATCH_WEIGHT: f32 = 2.0;
const TIMESTAMP_MATCH_WEIGHT: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimilarityError {
    LengthMismatch { left: usize, right: usize },
    NonFiniteComponent,
}

impl fmt::Display for SimilarityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityError::LengthMismatch { left, right } => {
                write!(f, "embedding lengths differ: {left} vs {right}")
            }
            SimilarityError::NonFiniteComponent => {
                write!(f, "embedding contains a non-finite component")
            }
        }
    }
}

impl std::error::Error for SimilarityError {}

/// Cosine similarity in [-1, 1]. Zero-magnitude vectors score 0 rather than
/// dividing by zero; mismatched lengths and non-finite components are errors
/// for the caller to degrade to 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0_f64;
    let mut magnitude_a = 0.0_f64;
    let mut magnitude_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b) {
        if !x.is_finite() || !y.is_finite() {
            return Err(SimilarityError::NonFiniteComponent);
        }

        dot += f64::from(x) * f64::from(y);
        magnitude_a += f64::from(x) * f64::from(x);
        magnitude_b += f64::from(y) * f64::from(y);
    }

    let magnitude = magnitude_a.sqrt() * magnitude_b.sqrt();
    if magnitude == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / magnitude) as f32)
}

/// Embedding-based similarity in [0, 1]: negative cosine similarity is
/// clamped to 0, and anything unscorable (missing or malformed embeddings)
/// scores 0 instead of failing the caller.
pub fn semantic_similarity(a: &MemoryRecord, b: &MemoryRecord) -> f32 {
    semantic_similarity_between(
        a.embedding_values().as_deref(),
        b.embedding_values().as_deref(),
    )
}

/// Variant of [`semantic_similarity`] over already-parsed embeddings, for
/// callers that score many pairs and parse each record once.
pub fn semantic_similarity_between(a: Option<&[f32]>, b: Option<&[f32]>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => cosine_similarity(a, b).map_or(0.0, |value| value.max(0.0)),
        _ => 0.0,
    }
}

/// Weighted metadata overlap in [0, 1]. A field pair only counts toward the
/// denominator when both records carry it, so sparsely-annotated records are
/// scored on what they have rather than penalized for gaps.
pub fn metadata_similarity(a: &MemoryRecord, b: &MemoryRecord) -> f32 {
    let mut matched = 0.0_f32;
    let mut applied = 0.0_f32;

    if let (Some(category_a), Some(category_b)) = (&a.metadata.category, &b.metadata.category) {
        applied += CATEGORY_MATCH_WEIGHT;
        if category_a == category_b {
            matched += CATEGORY_MATCH_WEIGHT;
        }
    }

    if let (Some(emotion_a), Some(emotion_b)) = (&a.metadata.emotion, &b.metadata.emotion) {
        applied += EMOTION_MATCH_WEIGHT;
        if emotion_a == emotion_b {
            matched += EMOTION_MATCH_WEIGHT;
        }
    }

    if let (Some(timestamp_a), Some(timestamp_b)) = (&a.metadata.timestamp, &b.metadata.timestamp)
    {
        applied += TIMESTAMP_MATCH_WEIGHT;
        if let (Some(seconds_a), Some(seconds_b)) =
            (parse_timestamp(timestamp_a), parse_timestamp(timestamp_b))
        {
            let difference = seconds_a.abs_diff(seconds_b);
            if difference < 30 {
                matched += TIMESTAMP_MATCH_WEIGHT;
            } else if difference < 120 {
                matched += TIMESTAMP_MATCH_WEIGHT / 2.0;
            }
        }
    }

    if applied == 0.0 { 0.0 } else { matched / applied }
}

/// Parse "m:ss" or "m:ss-m:ss" (the start of the range) to seconds.
/// Malformed input is a non-match, never an error.
pub fn parse_timestamp(timestamp: &str) -> Option<u32> {
    let start = timestamp.split('-').next()?.trim();
    let (minutes, seconds) = start.split_once(':')?;
    let minutes = minutes.trim().parse::<u32>().ok()?;
    let seconds = seconds.trim().parse::<u32>().ok()?;
    Some(minutes * 60 + seconds)
}

pub fn blend_similarity(semantic: f32, metadata: f32) -> f32 {
    (semantic * SEMANTIC_WEIGHT) + (metadata * METADATA_WEIGHT)
}

/// Combined score in [0, 1], weighting embedding similarity over metadata
/// overlap. Symmetric in its arguments.
pub fn combined_similarity(a: &MemoryRecord, b: &MemoryRecord) -> f32 {
    blend_similarity(semantic_similarity(a, b), metadata_similarity(a, b))
}
