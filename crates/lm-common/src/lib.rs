pub mod config;
pub mod db;
pub mod embedding;
pub mod index;
pub mod logging;
pub mod matching;
pub mod run_id;
pub mod store;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Which side of the marketplace a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidateKind {
    Worker,
    Job,
}

// Commonly used data models for matching functions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub wage_expectation: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Primary skill asked for by the employer.
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub skill_tags: Vec<String>,
    #[serde(default)]
    pub wage: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    /// Employer rating, when known.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

/// A record being ranked against a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    Worker(Worker),
    Job(Job),
}

/// Read-only view shared by workers and jobs.
///
/// Everything the filter, scorer and similarity stages need goes through this
/// trait, so neither stage has to care which side of the marketplace it is
/// looking at.
pub trait MatchProfile {
    fn id(&self) -> &str;

    fn kind(&self) -> CandidateKind;

    /// Skill labels in declaration order. Free text, not normalized.
    fn skills(&self) -> Vec<&str>;

    /// Offered wage for jobs, expected wage for workers.
    fn wage(&self) -> Option<f64>;

    fn location(&self) -> Option<&str>;

    fn rating(&self) -> f64 {
        0.0
    }

    fn embedding(&self) -> Option<&[f32]>;

    /// Text submitted to the embedding provider for this record.
    fn embedding_text(&self) -> String;
}

pub(crate) fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl MatchProfile for Worker {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> CandidateKind {
        CandidateKind::Worker
    }

    fn skills(&self) -> Vec<&str> {
        self.skills.iter().map(String::as_str).collect()
    }

    fn wage(&self) -> Option<f64> {
        self.wage_expectation
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    fn embedding_text(&self) -> String {
        join_non_empty(
            self.skills
                .iter()
                .map(String::as_str)
                .chain(self.location.as_deref()),
        )
    }
}

impl MatchProfile for Job {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> CandidateKind {
        CandidateKind::Job
    }

    fn skills(&self) -> Vec<&str> {
        self.skill
            .as_deref()
            .into_iter()
            .chain(self.skill_tags.iter().map(String::as_str))
            .collect()
    }

    fn wage(&self) -> Option<f64> {
        self.wage
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    fn embedding_text(&self) -> String {
        join_non_empty(
            self.title
                .as_deref()
                .into_iter()
                .chain(self.description.as_deref())
                .chain(self.skills()),
        )
    }
}

impl Candidate {
    fn profile(&self) -> &dyn MatchProfile {
        match self {
            Candidate::Worker(worker) => worker,
            Candidate::Job(job) => job,
        }
    }
}

impl MatchProfile for Candidate {
    fn id(&self) -> &str {
        self.profile().id()
    }

    fn kind(&self) -> CandidateKind {
        self.profile().kind()
    }

    fn skills(&self) -> Vec<&str> {
        self.profile().skills()
    }

    fn wage(&self) -> Option<f64> {
        self.profile().wage()
    }

    fn location(&self) -> Option<&str> {
        self.profile().location()
    }

    fn rating(&self) -> f64 {
        self.profile().rating()
    }

    fn embedding(&self) -> Option<&[f32]> {
        self.profile().embedding()
    }

    fn embedding_text(&self) -> String {
        self.profile().embedding_text()
    }
}

impl From<Worker> for Candidate {
    fn from(value: Worker) -> Self {
        Candidate::Worker(value)
    }
}

impl From<Job> for Candidate {
    fn from(value: Job) -> Self {
        Candidate::Job(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_skills_put_primary_skill_first() {
        let job = Job {
            id: "j1".into(),
            skill: Some("Plumbing".into()),
            skill_tags: vec!["pipes".into()],
            ..Job::default()
        };

        assert_eq!(job.skills(), vec!["Plumbing", "pipes"]);
    }

    #[test]
    fn embedding_text_skips_missing_parts() {
        let worker = Worker {
            id: "w1".into(),
            skills: vec!["Masonry".into(), " ".into()],
            location: Some("Indore, MP".into()),
            ..Worker::default()
        };
        assert_eq!(worker.embedding_text(), "Masonry Indore, MP");

        let job = Job {
            id: "j1".into(),
            title: Some("Need urgent Welding expert".into()),
            skill_tags: vec!["Welding".into()],
            ..Job::default()
        };
        assert_eq!(job.embedding_text(), "Need urgent Welding expert Welding");
    }

    #[test]
    fn candidate_delegates_to_inner_record() {
        let candidate = Candidate::from(Worker {
            id: "w9".into(),
            wage_expectation: Some(450.0),
            ..Worker::default()
        });

        assert_eq!(candidate.id(), "w9");
        assert_eq!(candidate.kind(), CandidateKind::Worker);
        assert_eq!(candidate.wage(), Some(450.0));
        assert_eq!(candidate.rating(), 0.0);
    }

    #[test]
    fn candidate_serializes_with_kind_tag() {
        let candidate = Candidate::Job(Job {
            id: "j2".into(),
            urgent: true,
            ..Job::default()
        });

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["kind"], "job");
        assert_eq!(json["urgent"], true);
        assert_eq!(CandidateKind::Worker.as_ref(), "worker");
    }
}
