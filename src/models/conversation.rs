use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Derive the deterministic conversation id for a seller/buyer pair.
/// Both parties compute the same id, so "create" is naturally an upsert.
pub fn conversation_id(seller_id: &ObjectId, buyer_id: &ObjectId) -> String {
    format!("{}{}", seller_id.to_hex(), buyer_id.to_hex())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Conversation {
    /// Deterministic pair id, not an ObjectId.
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: ObjectId,
    pub buyer_id: ObjectId,
    pub read_by_seller: bool,
    pub read_by_buyer: bool,
    pub last_message: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Conversation {
    pub fn is_participant(&self, user_id: &ObjectId) -> bool {
        self.seller_id == *user_id || self.buyer_id == *user_id
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateConversationDto {
    /// The other participant's user id.
    pub to: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub read_by_seller: bool,
    pub read_by_buyer: bool,
    pub last_message: Option<String>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        ConversationResponse {
            id: conversation.id,
            seller_id: conversation.seller_id.to_hex(),
            buyer_id: conversation.buyer_id.to_hex(),
            read_by_seller: conversation.read_by_seller,
            read_by_buyer: conversation.read_by_buyer,
            last_message: conversation.last_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let seller = ObjectId::new();
        let buyer = ObjectId::new();

        assert_eq!(conversation_id(&seller, &buyer), conversation_id(&seller, &buyer));
        assert_eq!(conversation_id(&seller, &buyer).len(), 48);
    }

    #[test]
    fn id_is_ordered_seller_first() {
        let seller = ObjectId::new();
        let buyer = ObjectId::new();

        let id = conversation_id(&seller, &buyer);
        assert!(id.starts_with(&seller.to_hex()));
        assert!(id.ends_with(&buyer.to_hex()));
        // Swapping roles yields a different thread.
        assert_ne!(id, conversation_id(&buyer, &seller));
    }
}
