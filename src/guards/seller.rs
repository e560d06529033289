use rocket::request::{self, Request, FromRequest, Outcome};
use rocket::http::Status;
use rocket::State;
use crate::db::DbConn;
use crate::guards::AuthGuard;
use mongodb::bson::doc;
use rocket_okapi::request::OpenApiFromRequest;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::RequestHeaderInput;

/// Restricts a route to verified seller accounts.
///
/// The seller flag in the token is only a hint; the user document is the
/// source of truth, so a demoted seller loses access without re-login.
pub struct SellerGuard {
    pub auth: AuthGuard,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SellerGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let auth_outcome = req.guard::<AuthGuard>().await;

        match auth_outcome {
            Outcome::Success(auth) => {
                let db = req.guard::<&State<DbConn>>().await.unwrap();

                let user = db.collection::<crate::models::User>("users")
                    .find_one(doc! { "_id": &auth.user_id }, None)
                    .await;

                match user {
                    Ok(Some(user)) if user.is_seller => Outcome::Success(SellerGuard { auth }),
                    Ok(Some(_)) => {
                        warn!("Seller guard rejected - user is not a seller");
                        Outcome::Error((Status::Forbidden, ()))
                    }
                    Ok(None) => {
                        warn!("Seller guard rejected - user not found");
                        Outcome::Error((Status::Forbidden, ()))
                    }
                    Err(e) => {
                        warn!("Seller guard rejected - DB error: {:?}", e);
                        Outcome::Error((Status::Forbidden, ()))
                    }
                }
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for SellerGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
