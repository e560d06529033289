use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Otp {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime,
    pub verified: bool,
    pub attempts: i32,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VerifyOtpDto {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResendOtpDto {
    pub email: String,
}
