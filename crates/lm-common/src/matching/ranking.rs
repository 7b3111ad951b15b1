use serde::Serialize;

use super::scoring::MatchScore;
use crate::Candidate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Rule score plus any similarity blend. Comparable within one search only.
    pub score: f64,
    pub skill_match: bool,
    pub wage_match: bool,
    pub distance_match: bool,
    /// Cosine similarity reported by the index; `None` on the fallback path.
    pub similarity: Option<f32>,
    pub breakdown: MatchScore,
}

impl ScoredCandidate {
    pub fn new(
        candidate: Candidate,
        breakdown: MatchScore,
        similarity: Option<f32>,
        similarity_weight: f64,
    ) -> Self {
        let blend = match similarity {
            Some(s) if s.is_finite() && similarity_weight != 0.0 => {
                f64::from(s) * similarity_weight
            }
            _ => 0.0,
        };
        Self {
            candidate,
            score: breakdown.total + blend,
            skill_match: breakdown.skill_match,
            wage_match: breakdown.wage_match,
            distance_match: breakdown.distance_match,
            similarity,
            breakdown,
        }
    }
}

/// Sort by score, highest first, and keep the first `limit`.
///
/// The sort is stable: equal scores keep their input order, which on the
/// semantic path is similarity order.
pub fn rank(mut scored: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
