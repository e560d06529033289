use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub conversation_id: String,
    pub user_id: ObjectId,
    pub text: String,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMessageDto {
    pub conversation_id: String,
    pub text: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub text: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        MessageResponse {
            id: message.id.map(|id| id.to_hex()).unwrap_or_default(),
            conversation_id: message.conversation_id,
            user_id: message.user_id.to_hex(),
            text: message.text,
        }
    }
}
