use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{Conversation, Message, MessageResponse, CreateMessageDto};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Message")]
#[post("/messages", data = "<dto>")]
pub async fn create_message(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateMessageDto>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if dto.text.trim().is_empty() {
        return Err(ApiError::bad_request("Message text is required"));
    }

    let conversations = db.collection::<Conversation>("conversations");

    let conversation = conversations
        .find_one(doc! { "_id": &dto.conversation_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    if !conversation.is_participant(&auth.user_id) {
        return Err(ApiError::forbidden("You are not part of this conversation"));
    }

    let message = Message {
        id: None,
        conversation_id: dto.conversation_id.clone(),
        user_id: auth.user_id,
        text: dto.text.clone(),
        created_at: DateTime::now(),
    };

    let result = db.collection::<Message>("messages")
        .insert_one(&message, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to send message: {}", e)))?;

    // Sending flips the thread unread for the other side
    let from_seller = auth.user_id == conversation.seller_id;
    conversations
        .update_one(
            doc! { "_id": &dto.conversation_id },
            doc! {
                "$set": {
                    "last_message": &dto.text,
                    "read_by_seller": from_seller,
                    "read_by_buyer": !from_seller,
                    "updated_at": DateTime::now(),
                }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update conversation: {}", e)))?;

    let mut created = message;
    created.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success(created.into())))
}

#[openapi(tag = "Message")]
#[get("/messages/<conversation_id>")]
pub async fn get_messages(
    db: &State<DbConn>,
    auth: AuthGuard,
    conversation_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let conversation = db.collection::<Conversation>("conversations")
        .find_one(doc! { "_id": &conversation_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    if !conversation.is_participant(&auth.user_id) {
        return Err(ApiError::forbidden("You are not part of this conversation"));
    }

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": 1 })
        .build();

    let mut cursor = db.collection::<Message>("messages")
        .find(doc! { "conversation_id": &conversation_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut messages: Vec<MessageResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let message: Message = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        messages.push(message.into());
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "messages": messages,
        "total": messages.len()
    }))))
}
