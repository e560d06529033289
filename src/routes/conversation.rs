use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{conversation_id, Conversation, ConversationResponse, CreateConversationDto, User};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

/// Open (or return) the thread between the caller and another user.
/// The id is derived from the pair, so repeated calls converge on one thread.
#[openapi(tag = "Conversation")]
#[post("/conversations", data = "<dto>")]
pub async fn create_conversation(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateConversationDto>,
) -> Result<Json<ApiResponse<ConversationResponse>>, ApiError> {
    let other_id = ObjectId::parse_str(&dto.to)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    if other_id == auth.user_id {
        return Err(ApiError::bad_request("You cannot message yourself"));
    }

    let other = db.collection::<User>("users")
        .find_one(doc! { "_id": other_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // The seller side of the pair keys the id
    let (seller_id, buyer_id) = if auth.is_seller && !other.is_seller {
        (auth.user_id, other_id)
    } else {
        (other_id, auth.user_id)
    };

    let id = conversation_id(&seller_id, &buyer_id);

    let conversations = db.collection::<Conversation>("conversations");

    if let Some(existing) = conversations
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
    {
        return Ok(Json(ApiResponse::success(existing.into())));
    }

    let conversation = Conversation {
        id,
        seller_id,
        buyer_id,
        read_by_seller: auth.user_id == seller_id,
        read_by_buyer: auth.user_id == buyer_id,
        last_message: None,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    conversations
        .insert_one(&conversation, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create conversation: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Conversation created".to_string(),
        conversation.into(),
    )))
}

#[openapi(tag = "Conversation")]
#[get("/conversations")]
pub async fn get_conversations(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let filter = doc! {
        "$or": [
            { "seller_id": auth.user_id },
            { "buyer_id": auth.user_id },
        ]
    };

    let find_options = FindOptions::builder()
        .sort(doc! { "updated_at": -1 })
        .build();

    let mut cursor = db.collection::<Conversation>("conversations")
        .find(filter, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut conversations: Vec<ConversationResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let conversation: Conversation = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        conversations.push(conversation.into());
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "conversations": conversations,
        "total": conversations.len()
    }))))
}

#[openapi(tag = "Conversation")]
#[get("/conversations/<id>")]
pub async fn get_conversation(
    db: &State<DbConn>,
    auth: AuthGuard,
    id: String,
) -> Result<Json<ApiResponse<ConversationResponse>>, ApiError> {
    let conversation = db.collection::<Conversation>("conversations")
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    if !conversation.is_participant(&auth.user_id) {
        return Err(ApiError::forbidden("You are not part of this conversation"));
    }

    Ok(Json(ApiResponse::success(conversation.into())))
}

/// Mark the caller's side of the thread as read.
#[openapi(tag = "Conversation")]
#[put("/conversations/<id>")]
pub async fn mark_read(
    db: &State<DbConn>,
    auth: AuthGuard,
    id: String,
) -> Result<Json<ApiResponse<ConversationResponse>>, ApiError> {
    let conversations = db.collection::<Conversation>("conversations");

    let conversation = conversations
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    if !conversation.is_participant(&auth.user_id) {
        return Err(ApiError::forbidden("You are not part of this conversation"));
    }

    let field = if auth.user_id == conversation.seller_id {
        "read_by_seller"
    } else {
        "read_by_buyer"
    };

    conversations
        .update_one(
            doc! { "_id": &id },
            doc! { "$set": { field: true, "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update conversation: {}", e)))?;

    let mut updated = conversation;
    match field {
        "read_by_seller" => updated.read_by_seller = true,
        _ => updated.read_by_buyer = true,
    }

    Ok(Json(ApiResponse::success(updated.into())))
}
