use serde::Serialize;

use super::{
    query::SearchQuery,
    skills::{job_requirement, match_skills, SkillMatchKind},
    weights::{Weights, DEFAULT_WEIGHTS},
};
use crate::{Candidate, Job, MatchProfile, Worker};

pub const STATUS_MATCH: &str = "MATCH";
pub const STATUS_PARTIAL_MATCH: &str = "PARTIAL_MATCH";
pub const STATUS_MISS: &str = "MISS";
pub const STATUS_UNKNOWN: &str = "UNKNOWN";
pub const STATUS_RESERVED: &str = "RESERVED";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Per-component maximum points.
    pub weights: Weights,
    /// Points for a generic-label skill match.
    pub generic_skill_credit: f64,
    /// Constant credit held in the distance bucket until locations carry
    /// coordinates.
    pub distance_placeholder: f64,
    /// Points for an urgent job; the rest of the bucket is unallocated.
    pub urgency_credit: f64,
    /// Skill labels that count as "general labour".
    pub generic_labels: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            generic_skill_credit: 10.0,
            distance_placeholder: 15.0,
            urgency_credit: 10.0,
            generic_labels: vec!["general".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentScore {
    pub score: f64,
    pub max_score: f64,
    pub status: &'static str,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub total: f64,
    pub skill_match: bool,
    pub wage_match: bool,
    /// Always false while distance scoring is reserved.
    pub distance_match: bool,
    pub skills: ComponentScore,
    pub wage: ComponentScore,
    pub distance: ComponentScore,
    pub urgency: ComponentScore,
}

/// The side of a pairing that offers work.
struct JobSide {
    requirement: Option<String>,
    wage: Option<f64>,
    urgent: bool,
}

/// The side of a pairing that looks for work.
struct WorkerSide<'a> {
    skills: Vec<&'a str>,
    wage_expectation: Option<f64>,
}

impl JobSide {
    fn from_query(query: &SearchQuery) -> Self {
        Self {
            requirement: query.required_skill().map(str::to_string),
            wage: query.wage_offered,
            urgent: query.urgent,
        }
    }

    fn from_job(job: &Job) -> Self {
        Self {
            requirement: job_requirement(job),
            wage: job.wage,
            urgent: job.urgent,
        }
    }
}

impl<'a> WorkerSide<'a> {
    fn from_query(query: &'a SearchQuery) -> Self {
        Self {
            skills: query.skills.iter().map(String::as_str).collect(),
            wage_expectation: query.wage_expectation,
        }
    }

    fn from_worker(worker: &'a Worker) -> Self {
        Self {
            skills: worker.skills(),
            wage_expectation: worker.wage_expectation,
        }
    }
}

/// Rule-based score between a job side and a worker side.
///
/// A worker candidate is scored against the query as the job; a job candidate
/// is scored against the query as the worker, or against the query's required
/// skill when the query lists no skills. Absent fields score zero, they never
/// error.
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    config: ScoringConfig,
}

impl MatchScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, query: &SearchQuery, candidate: &Candidate) -> MatchScore {
        match candidate {
            Candidate::Worker(worker) => self.evaluate(
                &JobSide::from_query(query),
                &WorkerSide::from_worker(worker),
            ),
            Candidate::Job(job) => match Self::query_requirement(query) {
                Some(requirement) => self.evaluate(
                    &JobSide {
                        requirement: Some(requirement.to_string()),
                        ..JobSide::from_job(job)
                    },
                    &WorkerSide {
                        skills: job.skills(),
                        wage_expectation: query.wage_expectation,
                    },
                ),
                None => self.evaluate(&JobSide::from_job(job), &WorkerSide::from_query(query)),
            },
        }
    }

    /// A job search without a skill list matches the job's own skills against
    /// the query's required skill (or search phrase).
    fn query_requirement(query: &SearchQuery) -> Option<&str> {
        if query.skills.is_empty() {
            query.required_skill()
        } else {
            None
        }
    }

    /// Score a concrete job/worker pair.
    pub fn score_pair(&self, job: &Job, worker: &Worker) -> MatchScore {
        self.evaluate(&JobSide::from_job(job), &WorkerSide::from_worker(worker))
    }

    fn evaluate(&self, job: &JobSide, worker: &WorkerSide<'_>) -> MatchScore {
        let skills = self.score_skills(job, worker);
        let wage = self.score_wage(job, worker);
        let distance = self.score_distance();
        let urgency = self.score_urgency(job);

        let total = skills.score + wage.score + distance.score + urgency.score;

        MatchScore {
            total,
            skill_match: skills.status == STATUS_MATCH,
            wage_match: wage.status == STATUS_MATCH,
            distance_match: false,
            skills,
            wage,
            distance,
            urgency,
        }
    }

    fn score_skills(&self, job: &JobSide, worker: &WorkerSide<'_>) -> ComponentScore {
        let max_score = self.config.weights.skills;
        let result = match_skills(
            job.requirement.as_deref(),
            &worker.skills,
            &self.config.generic_labels,
        );

        match result.kind {
            SkillMatchKind::Exact => ComponentScore {
                score: max_score,
                max_score,
                status: STATUS_MATCH,
                details: format!(
                    "skill '{}' found in requirement",
                    result.matched.unwrap_or_default()
                ),
            },
            SkillMatchKind::Generic => ComponentScore {
                score: self.config.generic_skill_credit.min(max_score),
                max_score,
                status: STATUS_PARTIAL_MATCH,
                details: format!(
                    "generic label '{}' only",
                    result.matched.unwrap_or_default()
                ),
            },
            SkillMatchKind::None if job.requirement.is_none() || worker.skills.is_empty() => {
                ComponentScore {
                    score: 0.0,
                    max_score,
                    status: STATUS_UNKNOWN,
                    details: "skill requirement or skill list missing".into(),
                }
            }
            SkillMatchKind::None => ComponentScore {
                score: 0.0,
                max_score,
                status: STATUS_MISS,
                details: format!(
                    "no skill of [{}] in '{}'",
                    worker.skills.join(", "),
                    job.requirement.as_deref().unwrap_or_default()
                ),
            },
        }
    }

    fn score_wage(&self, job: &JobSide, worker: &WorkerSide<'_>) -> ComponentScore {
        let max_score = self.config.weights.wage;
        let Some(offered) = job.wage else {
            return ComponentScore {
                score: 0.0,
                max_score,
                status: STATUS_UNKNOWN,
                details: "offered wage unknown".into(),
            };
        };

        let expected = worker.wage_expectation.unwrap_or(0.0);
        if offered >= expected {
            ComponentScore {
                score: max_score,
                max_score,
                status: STATUS_MATCH,
                details: format!("offered {offered:.0} >= expected {expected:.0}"),
            }
        } else {
            ComponentScore {
                score: 0.0,
                max_score,
                status: STATUS_MISS,
                details: format!("offered {offered:.0} < expected {expected:.0}"),
            }
        }
    }

    // Locations are free text; there is nothing to measure yet.
    fn score_distance(&self) -> ComponentScore {
        let max_score = self.config.weights.distance;
        ComponentScore {
            score: self.config.distance_placeholder.min(max_score),
            max_score,
            status: STATUS_RESERVED,
            details: "proximity not computed; constant credit".into(),
        }
    }

    fn score_urgency(&self, job: &JobSide) -> ComponentScore {
        let max_score = self.config.weights.urgency;
        if job.urgent {
            ComponentScore {
                score: self.config.urgency_credit.min(max_score),
                max_score,
                status: STATUS_MATCH,
                details: "urgent job".into(),
            }
        } else {
            ComponentScore {
                score: 0.0,
                max_score,
                status: STATUS_MISS,
                details: "not urgent".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(skill: &str, wage: f64) -> Candidate {
        Candidate::Worker(Worker {
            id: skill.to_lowercase(),
            skills: vec![skill.into()],
            wage_expectation: Some(wage),
            ..Worker::default()
        })
    }

    fn plumbing_query() -> SearchQuery {
        SearchQuery {
            skills_required: Some("Plumbing".into()),
            wage_offered: Some(600.0),
            ..SearchQuery::default()
        }
    }

    #[test]
    fn plumber_outscores_electrician() {
        let scorer = MatchScorer::default();
        let plumber = scorer.score(&plumbing_query(), &worker("Plumbing", 500.0));
        let electrician = scorer.score(&plumbing_query(), &worker("Electrical", 800.0));

        assert_eq!(plumber.skills.score, 40.0);
        assert_eq!(plumber.wage.score, 15.0);
        assert_eq!(plumber.total, 70.0);
        assert!(plumber.skill_match && plumber.wage_match);

        assert_eq!(electrician.skills.score, 0.0);
        assert_eq!(electrician.wage.score, 0.0);
        assert_eq!(electrician.total, 15.0);
        assert!(plumber.total > electrician.total);
    }

    #[test]
    fn exact_skill_beats_generic_skill() {
        let scorer = MatchScorer::default();
        let exact = scorer.score(&plumbing_query(), &worker("Plumbing", 500.0));
        let generic = scorer.score(&plumbing_query(), &worker("General", 500.0));

        assert_eq!(generic.skills.score, 10.0);
        assert_eq!(generic.skills.status, STATUS_PARTIAL_MATCH);
        assert!(!generic.skill_match);
        assert!(exact.total >= generic.total);
    }

    #[test]
    fn distance_is_reserved_and_never_matches() {
        let scorer = MatchScorer::default();
        let score = scorer.score(&SearchQuery::default(), &worker("Painting", 0.0));

        assert_eq!(score.distance.score, 15.0);
        assert_eq!(score.distance.max_score, 25.0);
        assert_eq!(score.distance.status, STATUS_RESERVED);
        assert!(!score.distance_match);
    }

    #[test]
    fn missing_fields_score_zero() {
        let scorer = MatchScorer::default();
        let bare = Candidate::Worker(Worker {
            id: "w".into(),
            ..Worker::default()
        });
        let score = scorer.score(&SearchQuery::default(), &bare);

        assert_eq!(score.skills.status, STATUS_UNKNOWN);
        assert_eq!(score.wage.status, STATUS_UNKNOWN);
        assert_eq!(score.urgency.score, 0.0);
        assert_eq!(score.total, 15.0);
    }

    #[test]
    fn job_candidates_use_query_as_worker() {
        let scorer = MatchScorer::default();
        let job = Candidate::Job(Job {
            id: "j1".into(),
            skill: Some("Need urgent Welding".into()),
            wage: Some(900.0),
            urgent: true,
            ..Job::default()
        });
        let query = SearchQuery {
            skills: vec!["Welding".into()],
            wage_expectation: Some(700.0),
            ..SearchQuery::default()
        };

        let score = scorer.score(&query, &job);
        assert_eq!(score.skills.score, 40.0);
        assert_eq!(score.wage.score, 15.0);
        assert_eq!(score.urgency.score, 10.0);
        assert_eq!(score.total, 80.0);
    }

    fn job(id: &str, skill: &str, wage: f64) -> Candidate {
        Candidate::Job(Job {
            id: id.into(),
            skill: Some(skill.into()),
            wage: Some(wage),
            ..Job::default()
        })
    }

    #[test]
    fn job_candidates_match_required_skill() {
        let scorer = MatchScorer::default();
        let plumbing = scorer.score(&plumbing_query(), &job("plumbing", "Plumbing", 500.0));
        let electrical = scorer.score(
            &plumbing_query(),
            &job("electrical", "Electrical", 800.0),
        );

        assert_eq!(plumbing.skills.status, STATUS_MATCH);
        assert_eq!(plumbing.skills.score, 40.0);
        assert!(plumbing.skill_match);
        assert_eq!(electrical.skills.status, STATUS_MISS);
        assert!(plumbing.total > electrical.total);

        let text = scorer.score(
            &SearchQuery::text("need plumbing work"),
            &job("plumbing", "Plumbing", 500.0),
        );
        assert!(text.skill_match);

        let general = scorer.score(&plumbing_query(), &job("helper", "General help", 500.0));
        assert_eq!(general.skills.status, STATUS_PARTIAL_MATCH);
    }

    #[test]
    fn missing_expectation_counts_as_zero() {
        let scorer = MatchScorer::default();
        let job = Job {
            wage: Some(0.0),
            ..Job::default()
        };
        let score = scorer.score_pair(&job, &Worker::default());
        assert!(score.wage_match);
    }
}
