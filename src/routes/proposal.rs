use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{
    Project, ProjectStatus, Proposal, ProposalResponse, ProposalStatus, ProposalAction,
    CreateProposalDto, ProposalActionDto,
};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Proposal")]
#[post("/projects/<project_id>/proposals", data = "<dto>")]
pub async fn create_proposal(
    db: &State<DbConn>,
    auth: AuthGuard,
    project_id: String,
    dto: Json<CreateProposalDto>,
) -> Result<Json<ApiResponse<ProposalResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&project_id)
        .map_err(|_| ApiError::bad_request("Invalid project ID"))?;

    if dto.cover_letter.trim().is_empty() {
        return Err(ApiError::bad_request("A cover letter is required"));
    }
    if dto.bid_amount <= 0 || dto.delivery_days <= 0 {
        return Err(ApiError::bad_request("Bid amount and delivery days must be positive"));
    }

    let project = db.collection::<Project>("projects")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if project.client_id == auth.user_id {
        return Err(ApiError::forbidden("You cannot bid on your own project"));
    }

    if project.status != ProjectStatus::Open {
        return Err(ApiError::bad_request("Project is not open for proposals"));
    }

    let proposals = db.collection::<Proposal>("proposals");

    let existing = proposals
        .find_one(
            doc! { "project_id": object_id, "freelancer_id": auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("You have already bid on this project"));
    }

    let proposal = Proposal {
        id: None,
        project_id: object_id,
        freelancer_id: auth.user_id,
        cover_letter: dto.cover_letter.clone(),
        bid_amount: dto.bid_amount,
        delivery_days: dto.delivery_days,
        status: ProposalStatus::Pending,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = proposals
        .insert_one(&proposal, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to submit proposal: {}", e)))?;

    let mut created = proposal;
    created.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Proposal submitted".to_string(),
        created.into(),
    )))
}

/// All proposals on a project, for its owner.
#[openapi(tag = "Proposal")]
#[get("/projects/<project_id>/proposals")]
pub async fn get_project_proposals(
    db: &State<DbConn>,
    auth: AuthGuard,
    project_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&project_id)
        .map_err(|_| ApiError::bad_request("Invalid project ID"))?;

    let project = db.collection::<Project>("projects")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if project.client_id != auth.user_id {
        return Err(ApiError::forbidden("Only the project owner can list proposals"));
    }

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Proposal>("proposals")
        .find(doc! { "project_id": object_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut proposals: Vec<ProposalResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let proposal: Proposal = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        proposals.push(proposal.into());
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "proposals": proposals,
        "total": proposals.len()
    }))))
}

/// The caller's own bids across all projects.
#[openapi(tag = "Proposal")]
#[get("/proposals/mine")]
pub async fn get_my_proposals(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Proposal>("proposals")
        .find(doc! { "freelancer_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut proposals: Vec<ProposalResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let proposal: Proposal = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        proposals.push(proposal.into());
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "proposals": proposals,
        "total": proposals.len()
    }))))
}

/// Accept or reject a proposal, as the project owner.
///
/// Acceptance claims the project first with a status+version-conditional
/// write, so two concurrent acceptances cannot both record a freelancer;
/// the loser sees a 409.
#[openapi(tag = "Proposal")]
#[patch("/proposals/<proposal_id>", data = "<dto>")]
pub async fn update_proposal(
    db: &State<DbConn>,
    auth: AuthGuard,
    proposal_id: String,
    dto: Json<ProposalActionDto>,
) -> Result<Json<ApiResponse<ProposalResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&proposal_id)
        .map_err(|_| ApiError::bad_request("Invalid proposal ID"))?;

    let action = ProposalAction::parse(&dto.action)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown action '{}'", dto.action)))?;

    let proposals = db.collection::<Proposal>("proposals");

    let proposal = proposals
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Proposal not found"))?;

    let project = db.collection::<Project>("projects")
        .find_one(doc! { "_id": proposal.project_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if project.client_id != auth.user_id {
        return Err(ApiError::forbidden("Only the project owner can decide on proposals"));
    }

    if proposal.status != ProposalStatus::Pending {
        return Err(ApiError::bad_request(format!(
            "Proposal is already {}",
            proposal.status.as_str()
        )));
    }

    let new_status = match action {
        ProposalAction::Accept => {
            // Claim the project before touching the proposal; the conditional
            // write is what makes double-acceptance impossible.
            let claimed = db.collection::<Project>("projects")
                .update_one(
                    doc! {
                        "_id": proposal.project_id,
                        "status": ProjectStatus::Open.as_str(),
                        "version": project.version,
                    },
                    doc! {
                        "$set": {
                            "status": ProjectStatus::InProgress.as_str(),
                            "freelancer_id": proposal.freelancer_id,
                            "updated_at": DateTime::now(),
                        },
                        "$inc": { "version": 1 }
                    },
                    None,
                )
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to update project: {}", e)))?;

            if claimed.matched_count == 0 {
                return Err(ApiError::conflict("Project is no longer open for acceptance"));
            }

            ProposalStatus::Accepted
        }
        // Rejection leaves the project untouched
        ProposalAction::Reject => ProposalStatus::Rejected,
    };

    let result = proposals
        .update_one(
            doc! { "_id": object_id, "status": ProposalStatus::Pending.as_str() },
            doc! {
                "$set": {
                    "status": new_status.as_str(),
                    "updated_at": DateTime::now(),
                }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update proposal: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::conflict("Proposal was modified concurrently"));
    }

    let mut updated = proposal;
    updated.status = new_status;

    Ok(Json(ApiResponse::success_with_message(
        format!("Proposal {}", new_status.as_str()),
        updated.into(),
    )))
}
