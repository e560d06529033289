use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    /// bcrypt hash; never leaves through `UserResponse`.
    pub password: String,
    pub country: String,
    pub img: Option<String>,
    pub phone: Option<String>,
    pub desc: Option<String>,
    pub is_seller: bool,
    pub is_verified: bool,
    /// Incremented every time one of this seller's orders completes.
    pub completed_orders: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterDto {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: String,
    pub img: Option<String>,
    pub phone: Option<String>,
    pub desc: Option<String>,
    #[serde(default)]
    pub is_seller: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginDto {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProfileDto {
    pub email: Option<String>,
    pub country: Option<String>,
    pub img: Option<String>,
    pub phone: Option<String>,
    pub desc: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub country: String,
    pub img: Option<String>,
    pub phone: Option<String>,
    pub desc: Option<String>,
    pub is_seller: bool,
    pub is_verified: bool,
    pub completed_orders: i32,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username,
            email: user.email,
            country: user.country,
            img: user.img,
            phone: user.phone,
            desc: user.desc,
            is_seller: user.is_seller,
            is_verified: user.is_verified,
            completed_orders: user.completed_orders,
        }
    }
}
