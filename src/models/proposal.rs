use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalAction {
    Accept,
    Reject,
}

impl ProposalAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(ProposalAction::Accept),
            "reject" => Some(ProposalAction::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Proposal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub freelancer_id: ObjectId,
    pub cover_letter: String,
    pub bid_amount: i32,
    pub delivery_days: i32,
    pub status: ProposalStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProposalDto {
    pub cover_letter: String,
    pub bid_amount: i32,
    pub delivery_days: i32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProposalActionDto {
    pub action: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProposalResponse {
    pub id: String,
    pub project_id: String,
    pub freelancer_id: String,
    pub cover_letter: String,
    pub bid_amount: i32,
    pub delivery_days: i32,
    pub status: ProposalStatus,
}

impl From<Proposal> for ProposalResponse {
    fn from(proposal: Proposal) -> Self {
        ProposalResponse {
            id: proposal.id.map(|id| id.to_hex()).unwrap_or_default(),
            project_id: proposal.project_id.to_hex(),
            freelancer_id: proposal.freelancer_id.to_hex(),
            cover_letter: proposal.cover_letter,
            bid_amount: proposal.bid_amount,
            delivery_days: proposal.delivery_days,
            status: proposal.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tokens() {
        assert_eq!(ProposalAction::parse("accept"), Some(ProposalAction::Accept));
        assert_eq!(ProposalAction::parse("reject"), Some(ProposalAction::Reject));
        assert_eq!(ProposalAction::parse("withdraw"), None);
    }
}
