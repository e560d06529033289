use rocket::request::{self, FromRequest, Request, Outcome};
use rocket::http::Status;
use mongodb::bson::oid::ObjectId;

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

/// JWT-based authentication guard.
///
/// The token travels in the `access_token` HTTP-only cookie; a bearer
/// `Authorization` header is accepted as a fallback for API clients.
pub struct AuthGuard {
    pub user_id: ObjectId,
    pub username: String,
    pub is_seller: bool,
}

fn extract_token<'r>(req: &'r Request<'_>) -> Option<String> {
    if let Some(cookie) = req.cookies().get("access_token") {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get_one("Authorization")
        .map(|h| h.trim_start_matches("Bearer ").to_string())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match extract_token(req) {
            Some(token) => match crate::services::JwtService::verify_token(&token) {
                Ok(claims) => match ObjectId::parse_str(&claims.sub) {
                    Ok(user_id) => Outcome::Success(AuthGuard {
                        user_id,
                        username: claims.username,
                        is_seller: claims.is_seller,
                    }),
                    Err(_) => Outcome::Error((Status::Unauthorized, ())),
                },
                Err(_) => Outcome::Error((Status::Unauthorized, ())),
            },
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// === OpenAPI Integration (Fallback for older versions) ===
/// Keeps OpenAPI generation working even without new traits.
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        // The guard doesn't contribute any special header/parameter for docs
        Ok(RequestHeaderInput::None)
    }
}
