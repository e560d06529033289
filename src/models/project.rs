use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    /// Owner-driven transitions. `in_progress` is only reachable through
    /// proposal acceptance, never by a direct status edit.
    pub fn can_transition(self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Draft, Open) | (Draft, Cancelled) | (Open, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub client_id: ObjectId,
    pub title: String,
    pub desc: String,
    pub category: String,
    pub skills: Vec<String>,
    pub budget_min: Option<i32>,
    pub budget_max: Option<i32>,
    pub status: ProjectStatus,
    /// Set when a proposal is accepted.
    pub freelancer_id: Option<ObjectId>,
    pub version: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectDto {
    pub title: String,
    pub desc: String,
    pub category: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub budget_min: Option<i32>,
    pub budget_max: Option<i32>,
    /// When true the project is published immediately instead of saved as a draft.
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProjectDto {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub category: Option<String>,
    pub skills: Option<Vec<String>>,
    pub budget_min: Option<i32>,
    pub budget_max: Option<i32>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub desc: String,
    pub category: String,
    pub skills: Vec<String>,
    pub budget_min: Option<i32>,
    pub budget_max: Option<i32>,
    pub status: ProjectStatus,
    pub freelancer_id: Option<String>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
            client_id: project.client_id.to_hex(),
            title: project.title,
            desc: project.desc,
            category: project.category,
            skills: project.skills,
            budget_min: project.budget_min,
            budget_max: project.budget_max,
            status: project.status,
            freelancer_id: project.freelancer_id.map(|id| id.to_hex()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_status_transitions() {
        use ProjectStatus::*;

        assert!(Draft.can_transition(Open));
        assert!(Open.can_transition(Cancelled));
        assert!(InProgress.can_transition(Completed));
        assert!(InProgress.can_transition(Cancelled));

        // in_progress is reserved for proposal acceptance
        assert!(!Open.can_transition(InProgress));
        assert!(!Draft.can_transition(InProgress));

        // no resurrection out of terminal states
        assert!(!Completed.can_transition(Open));
        assert!(!Cancelled.can_transition(Open));

        // no skipping ahead
        assert!(!Draft.can_transition(Completed));
        assert!(!Open.can_transition(Completed));
    }

    #[test]
    fn status_wire_form_matches_serde() {
        for status in [
            ProjectStatus::Draft,
            ProjectStatus::Open,
            ProjectStatus::InProgress,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
