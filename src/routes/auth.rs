use rocket::serde::json::Json;
use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite};
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOneOptions;
use crate::db::DbConn;
use crate::models::{
    RegisterDto, LoginDto, VerifyOtpDto, ResendOtpDto,
    User, Otp, UserResponse,
};
use crate::services::{JwtService, EmailService};
use crate::utils::{validate_email, validate_username, validate_password, generate_otp, ApiResponse, ApiError};

const OTP_TTL_MS: i64 = 10 * 60 * 1000;
const OTP_MAX_ATTEMPTS: i32 = 5;
const OTP_SEND_LIMIT: i32 = 3;
const OTP_SEND_WINDOW_MS: i64 = 10 * 60 * 1000;

/// --------------------
/// Rate limiter helper
/// --------------------
async fn rate_limit(
    db: &DbConn,
    key: &str,
    limit: i32,
    window_ms: i64,
) -> Result<(), ApiError> {
    let now = chrono::Utc::now().timestamp_millis();
    let window_expires = DateTime::from_millis(now + window_ms);

    let collection = db.collection::<mongodb::bson::Document>("rate_limits");

    let doc = collection
        .find_one(doc! { "key": key }, None)
        .await
        .map_err(|_| ApiError::internal_error("Rate limiter lookup failed"))?;

    match doc {
        // First request OR expired window
        None => {
            collection
                .insert_one(
                    doc! {
                        "key": key,
                        "count": 1,
                        "expires_at": window_expires
                    },
                    None,
                )
                .await
                .map_err(|_| ApiError::internal_error("Rate limiter insert failed"))?;
            Ok(())
        }

        Some(d) => {
            let count = d.get_i32("count").unwrap_or(0);
            let expires_at = d.get_datetime("expires_at").ok();

            // Window expired → reset
            if expires_at.map(|e| *e < DateTime::now()).unwrap_or(true) {
                collection
                    .update_one(
                        doc! { "key": key },
                        doc! {
                            "$set": {
                                "count": 1,
                                "expires_at": window_expires
                            }
                        },
                        None,
                    )
                    .await
                    .map_err(|_| ApiError::internal_error("Rate limiter reset failed"))?;
                return Ok(());
            }

            // Limit exceeded
            if count >= limit {
                return Err(ApiError::too_many_requests(
                    "Too many requests. Please try later.",
                ));
            }

            // Increment count
            collection
                .update_one(
                    doc! { "key": key },
                    doc! { "$inc": { "count": 1 } },
                    None,
                )
                .await
                .map_err(|_| ApiError::internal_error("Rate limiter increment failed"))?;

            Ok(())
        }
    }
}

async fn issue_otp(db: &DbConn, email: &str, username: &str) -> Result<(), ApiError> {
    let code = generate_otp();
    let now = chrono::Utc::now().timestamp_millis();

    let otp = Otp {
        id: None,
        email: email.to_string(),
        code: code.clone(),
        expires_at: DateTime::from_millis(now + OTP_TTL_MS),
        verified: false,
        attempts: 0,
        created_at: DateTime::now(),
    };

    db.collection::<Otp>("otps")
        .insert_one(&otp, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    // Delivery failures are logged inside the service; registration still
    // succeeds so the user can ask for a resend.
    EmailService::send_otp_email(email, &code, username).await;

    Ok(())
}

/// --------------------
/// Register
/// --------------------
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_username(&dto.username) {
        return Err(ApiError::bad_request("Invalid username"));
    }
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }
    if !validate_password(&dto.password) {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    rate_limit(
        db,
        &format!("send_otp:{}", dto.email),
        OTP_SEND_LIMIT,
        OTP_SEND_WINDOW_MS,
    ).await?;

    let users = db.collection::<User>("users");

    let existing = users
        .find_one(
            doc! { "$or": [ { "username": &dto.username }, { "email": &dto.email } ] },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("Username or email already taken"));
    }

    let hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let user = User {
        id: None,
        username: dto.username.clone(),
        email: dto.email.clone(),
        password: hash,
        country: dto.country.clone(),
        img: dto.img.clone(),
        phone: dto.phone.clone(),
        desc: dto.desc.clone(),
        is_seller: dto.is_seller,
        is_verified: false,
        completed_orders: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    users
        .insert_one(&user, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    issue_otp(db, &dto.email, &dto.username).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Registration successful. Check your email for the verification code."
    }))))
}

/// --------------------
/// Verify OTP
/// --------------------
#[post("/auth/verify-otp", data = "<dto>")]
pub async fn verify_otp(
    db: &State<DbConn>,
    dto: Json<VerifyOtpDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let otps = db.collection::<Otp>("otps");

    let latest = FindOneOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let otp = otps
        .find_one(doc! { "email": &dto.email }, latest)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::bad_request("No verification code pending for this email"))?;

    if otp.attempts >= OTP_MAX_ATTEMPTS {
        return Err(ApiError::too_many_requests("Too many attempts. Request a new code."));
    }

    if otp.expires_at < DateTime::now() {
        return Err(ApiError::bad_request("Verification code expired. Request a new one."));
    }

    if otp.code != dto.otp {
        otps.update_one(
            doc! { "_id": otp.id },
            doc! { "$inc": { "attempts": 1 } },
            None,
        )
        .await
        .ok();
        return Err(ApiError::bad_request("Invalid verification code"));
    }

    let users = db.collection::<User>("users");
    let user = users
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    users
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "is_verified": true, "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    // Used codes are gone for good
    otps.delete_many(doc! { "email": &dto.email }, None).await.ok();

    EmailService::send_welcome_email(&user.email, &user.username).await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Email verified. You can now log in."
    }))))
}

/// --------------------
/// Resend OTP
/// --------------------
#[post("/auth/resend-otp", data = "<dto>")]
pub async fn resend_otp(
    db: &State<DbConn>,
    dto: Json<ResendOtpDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let user = db.collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("No account for this email"))?;

    if user.is_verified {
        return Err(ApiError::bad_request("Account is already verified"));
    }

    rate_limit(
        db,
        &format!("send_otp:{}", dto.email),
        OTP_SEND_LIMIT,
        OTP_SEND_WINDOW_MS,
    ).await?;

    issue_otp(db, &dto.email, &user.username).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Verification code resent"
    }))))
}

/// --------------------
/// Login
/// --------------------
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    cookies: &CookieJar<'_>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db.collection::<User>("users")
        .find_one(doc! { "username": &dto.username }, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::unauthorized("Wrong username or password"))?;

    let valid = bcrypt::verify(&dto.password, &user.password)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    if !valid {
        return Err(ApiError::unauthorized("Wrong username or password"));
    }

    if !user.is_verified {
        return Err(ApiError::forbidden("Verify your email before logging in"));
    }

    let user_id = user.id.ok_or_else(|| ApiError::internal_error("User has no id"))?;

    let token = JwtService::generate_token(&user_id, &user.username, user.is_seller)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    cookies.add(
        Cookie::build(("access_token", token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(!crate::config::Config::is_development())
            .path("/"),
    );

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Login successful",
        "user": UserResponse::from(user)
    }))))
}

/// --------------------
/// Logout
/// --------------------
#[post("/auth/logout")]
pub async fn logout(
    cookies: &CookieJar<'_>,
) -> Json<ApiResponse<serde_json::Value>> {
    cookies.remove(Cookie::build("access_token").path("/"));

    Json(ApiResponse::success(serde_json::json!({
        "message": "Logged out"
    })))
}
