use crate::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillMatchKind {
    /// A worker skill appears inside the requirement.
    Exact,
    /// Only a generic label ("general") was found on one side.
    Generic,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub kind: SkillMatchKind,
    pub matched: Option<String>,
}

impl SkillMatch {
    fn none() -> Self {
        Self {
            kind: SkillMatchKind::None,
            matched: None,
        }
    }
}

/// What a job asks for: the primary skill, else its tags joined by spaces.
pub fn job_requirement(job: &Job) -> Option<String> {
    if let Some(skill) = job.skill.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Some(skill.to_string());
    }

    let tags = crate::join_non_empty(job.skill_tags.iter().map(String::as_str));
    (!tags.is_empty()).then_some(tags)
}

/// Case-insensitive containment of worker skills in the requirement text.
///
/// Skills are free text; "Plumbing" matches a requirement of
/// "need plumbing work" but "Pipe fitting" does not match "plumbing".
pub fn match_skills(
    requirement: Option<&str>,
    worker_skills: &[&str],
    generic_labels: &[String],
) -> SkillMatch {
    let requirement = requirement
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty());

    let skills: Vec<String> = worker_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(req) = requirement.as_deref() {
        if let Some(hit) = skills.iter().find(|skill| req.contains(skill.as_str())) {
            return SkillMatch {
                kind: SkillMatchKind::Exact,
                matched: Some(hit.clone()),
            };
        }
    }

    let labels: Vec<String> = generic_labels
        .iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();

    let generic = labels.iter().find(|label| {
        requirement
            .as_deref()
            .is_some_and(|req| req.contains(label.as_str()))
            || skills.iter().any(|skill| skill.contains(label.as_str()))
    });

    match generic {
        Some(label) => SkillMatch {
            kind: SkillMatchKind::Generic,
            matched: Some(label.clone()),
        },
        None => SkillMatch::none(),
    }
}
