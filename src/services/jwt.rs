use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub username: String,
    pub is_seller: bool,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    pub fn generate_token(user_id: &ObjectId, username: &str, is_seller: bool) -> Result<String, jsonwebtoken::errors::Error> {
        let expiry = crate::config::Config::jwt_expiry();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            username: username.to_string(),
            is_seller,
            exp: now + expiry,
            iat: now,
        };

        let secret = crate::config::Config::jwt_secret();
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = crate::config::Config::jwt_secret();

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_token(&user_id, "some_seller", true).unwrap();
        let claims = JwtService::verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_hex());
        assert_eq!(claims.username, "some_seller");
        assert!(claims.is_seller);
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(JwtService::verify_token("not.a.token").is_err());
    }
}
