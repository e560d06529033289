use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{Project, ProjectResponse, ProjectStatus, CreateProjectDto, UpdateProjectDto};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Project")]
#[post("/projects", data = "<dto>")]
pub async fn create_project(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateProjectDto>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    if dto.title.trim().is_empty() || dto.desc.trim().is_empty() {
        return Err(ApiError::bad_request("Title and description are required"));
    }

    if let (Some(min), Some(max)) = (dto.budget_min, dto.budget_max) {
        if min > max {
            return Err(ApiError::bad_request("Budget range is inverted"));
        }
    }

    let project = Project {
        id: None,
        client_id: auth.user_id,
        title: dto.title.clone(),
        desc: dto.desc.clone(),
        category: dto.category.clone(),
        skills: dto.skills.clone(),
        budget_min: dto.budget_min,
        budget_max: dto.budget_max,
        status: if dto.publish { ProjectStatus::Open } else { ProjectStatus::Draft },
        freelancer_id: None,
        version: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db.collection::<Project>("projects")
        .insert_one(&project, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create project: {}", e)))?;

    let mut created = project;
    created.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Project created".to_string(),
        created.into(),
    )))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct ProjectQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    /// When true, only the caller's own projects.
    pub mine: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Project")]
#[get("/projects?<query..>")]
pub async fn get_projects(
    db: &State<DbConn>,
    auth: AuthGuard,
    query: ProjectQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};

    if query.mine.unwrap_or(false) {
        filter.insert("client_id", auth.user_id);
        if let Some(ref status) = query.status {
            filter.insert("status", status);
        }
    } else {
        // Drafts are only visible to their owner through `mine`
        match query.status.as_deref() {
            None => {
                filter.insert("status", doc! { "$ne": "draft" });
            }
            Some("draft") => {
                return Err(ApiError::forbidden("Drafts are private, use mine=true"));
            }
            Some(status) => {
                filter.insert("status", status);
            }
        }
    }

    if let Some(ref category) = query.category {
        filter.insert("category", category);
    }

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Project>("projects")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut projects: Vec<ProjectResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let project: Project = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        projects.push(project.into());
    }

    let total = db.collection::<Project>("projects")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "projects": projects,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

#[openapi(tag = "Project")]
#[get("/projects/<project_id>")]
pub async fn get_project(
    db: &State<DbConn>,
    auth: AuthGuard,
    project_id: String,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&project_id)
        .map_err(|_| ApiError::bad_request("Invalid project ID"))?;

    let project = db.collection::<Project>("projects")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if project.status == ProjectStatus::Draft && project.client_id != auth.user_id {
        return Err(ApiError::not_found("Project not found"));
    }

    Ok(Json(ApiResponse::success(project.into())))
}

#[openapi(tag = "Project")]
#[put("/projects/<project_id>", data = "<dto>")]
pub async fn update_project(
    db: &State<DbConn>,
    auth: AuthGuard,
    project_id: String,
    dto: Json<UpdateProjectDto>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&project_id)
        .map_err(|_| ApiError::bad_request("Invalid project ID"))?;

    let projects = db.collection::<Project>("projects");

    let project = projects
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if project.client_id != auth.user_id {
        return Err(ApiError::forbidden("You can only edit your own projects"));
    }

    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(next) = dto.status {
        if !project.status.can_transition(next) {
            return Err(ApiError::bad_request(format!(
                "Cannot move project from {} to {}",
                project.status.as_str(),
                next.as_str()
            )));
        }
        let status_bson = to_bson(&next).map_err(|e| ApiError::internal_error(e.to_string()))?;
        update_doc.insert("status", status_bson);
    }

    // Content edits only while the project hasn't started
    let editable = matches!(project.status, ProjectStatus::Draft | ProjectStatus::Open);
    let has_content_edit = dto.title.is_some()
        || dto.desc.is_some()
        || dto.category.is_some()
        || dto.skills.is_some()
        || dto.budget_min.is_some()
        || dto.budget_max.is_some();

    if has_content_edit && !editable {
        return Err(ApiError::bad_request("Project content can no longer be edited"));
    }

    if let Some(ref title) = dto.title {
        update_doc.insert("title", title);
    }
    if let Some(ref desc) = dto.desc {
        update_doc.insert("desc", desc);
    }
    if let Some(ref category) = dto.category {
        update_doc.insert("category", category);
    }
    if let Some(ref skills) = dto.skills {
        update_doc.insert("skills", skills);
    }
    if let Some(min) = dto.budget_min {
        update_doc.insert("budget_min", min);
    }
    if let Some(max) = dto.budget_max {
        update_doc.insert("budget_max", max);
    }

    let result = projects
        .update_one(
            doc! { "_id": object_id, "version": project.version },
            doc! { "$set": update_doc, "$inc": { "version": 1 } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update project: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::conflict("Project was modified concurrently, try again"));
    }

    let updated = projects
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(ApiResponse::success_with_message(
        "Project updated".to_string(),
        updated.into(),
    )))
}

#[openapi(tag = "Project")]
#[delete("/projects/<project_id>")]
pub async fn delete_project(
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
        return Err(ApiError::forbidden("You can only delete your own projects"));
    }

    if project.status == ProjectStatus::InProgress {
        return Err(ApiError::bad_request("A project with an accepted freelancer cannot be deleted"));
    }

    db.collection::<Project>("projects")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete project: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Project deleted"
    }))))
}
