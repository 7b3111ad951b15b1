use serde::{Deserialize, Serialize};

use super::skills::job_requirement;
use crate::{join_non_empty, Job, Worker};

/// What a search is looking for.
///
/// `skills_required`, `wage_offered` and `urgent` describe a job being staffed
/// (worker search). `skills` and `wage_expectation` describe a worker looking
/// for work (job search). `text` is a free search phrase usable in both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub skills_required: Option<String>,
    #[serde(default)]
    pub wage_offered: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub wage_expectation: Option<f64>,
    /// Precomputed query vector; skips the embedding provider when set.
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Query for staffing `job`: its requirement, wage, urgency and vector.
    pub fn for_job(job: &Job) -> Self {
        Self {
            text: None,
            skills_required: job_requirement(job),
            wage_offered: job.wage,
            location: job.location.clone(),
            urgent: job.urgent,
            embedding: job.embedding.clone(),
            ..Self::default()
        }
    }

    /// Query for finding work for `worker`.
    pub fn for_worker(worker: &Worker) -> Self {
        Self {
            location: worker.location.clone(),
            skills: worker.skills.clone(),
            wage_expectation: worker.wage_expectation,
            embedding: worker.embedding.clone(),
            ..Self::default()
        }
    }

    /// Skill the job side asks for: `skills_required`, else the search phrase.
    pub fn required_skill(&self) -> Option<&str> {
        non_blank(self.skills_required.as_deref()).or_else(|| self.search_text())
    }

    pub fn search_text(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }

    /// Text handed to the embedding provider. The search phrase wins; a
    /// structured query is flattened to `skills_required skills… location`.
    pub fn embedding_text(&self) -> String {
        if let Some(text) = self.search_text() {
            return text.trim().to_string();
        }

        join_non_empty(
            self.skills_required
                .as_deref()
                .into_iter()
                .chain(self.skills.iter().map(String::as_str))
                .chain(self.location.as_deref()),
        )
    }
}

impl From<&Worker> for SearchQuery {
    fn from(worker: &Worker) -> Self {
        Self::for_worker(worker)
    }
}

impl From<&Job> for SearchQuery {
    fn from(job: &Job) -> Self {
        Self::for_job(job)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchProfile;

    #[test]
    fn required_skill_falls_back_to_search_text() {
        let query = SearchQuery::text("urgent plumber");
        assert_eq!(query.required_skill(), Some("urgent plumber"));

        let structured = SearchQuery {
            text: Some("ignored".into()),
            skills_required: Some("Plumbing".into()),
            ..SearchQuery::default()
        };
        assert_eq!(structured.required_skill(), Some("Plumbing"));

        let blank = SearchQuery::text("   ");
        assert_eq!(blank.required_skill(), None);
        assert_eq!(blank.embedding_text(), "");
    }

    #[test]
    fn structured_queries_flatten_to_embedding_text() {
        let worker = Worker {
            id: "w1".into(),
            skills: vec!["Masonry".into(), "Tiling".into()],
            location: Some("Indore".into()),
            wage_expectation: Some(650.0),
            ..Worker::default()
        };
        let query = SearchQuery::for_worker(&worker);

        assert_eq!(query.embedding_text(), "Masonry Tiling Indore");
        assert_eq!(query.embedding_text(), worker.embedding_text());
        assert_eq!(query.wage_expectation, Some(650.0));
    }

    #[test]
    fn job_query_carries_requirement_and_urgency() {
        let job = Job {
            id: "j1".into(),
            skill: Some("Electrical".into()),
            wage: Some(900.0),
            urgent: true,
            embedding: Some(vec![0.1, 0.2]),
            ..Job::default()
        };
        let query = SearchQuery::from(&job);

        assert_eq!(query.required_skill(), Some("Electrical"));
        assert_eq!(query.wage_offered, Some(900.0));
        assert!(query.urgent);
        assert_eq!(query.embedding.as_deref(), Some(&[0.1, 0.2][..]));
    }
}
