use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use crate::db::DbConn;
use crate::models::{User, UpdateProfileDto, UserResponse};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError, validate_email};

#[openapi(tag = "User")]
#[get("/users/me")]
pub async fn get_me(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// Public profile. Sellers are looked up by buyers before ordering.
#[openapi(tag = "User")]
#[get("/users/<user_id>")]
pub async fn get_user(
    db: &State<DbConn>,
    user_id: String,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(user.into())))
}

#[openapi(tag = "User")]
#[put("/users/me", data = "<dto>")]
pub async fn update_me(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<UpdateProfileDto>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    if let Some(ref email) = dto.email {
        if !validate_email(email) {
            return Err(ApiError::bad_request("Invalid email address"));
        }
    }

    // Build update document
    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref email) = dto.email {
        update_doc.insert("email", email);
    }
    if let Some(ref country) = dto.country {
        update_doc.insert("country", country);
    }
    if let Some(ref img) = dto.img {
        update_doc.insert("img", img);
    }
    if let Some(ref phone) = dto.phone {
        update_doc.insert("phone", phone);
    }
    if let Some(ref desc) = dto.desc {
        update_doc.insert("desc", desc);
    }

    let users = db.collection::<User>("users");

    users
        .update_one(
            doc! { "_id": auth.user_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update profile: {}", e)))?;

    let user = users
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile updated successfully".to_string(),
        user.into(),
    )))
}

#[openapi(tag = "User")]
#[delete("/users/me")]
pub async fn delete_me(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    db.collection::<User>("users")
        .delete_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete account: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Account deleted"
    }))))
}
