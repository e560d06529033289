use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{
    rating_decrement, rating_increment, CreateReviewDto, Gig, Order, Review, ReviewResponse,
};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Review")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateReviewDto>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    // Validate rating
    if dto.star < 1 || dto.star > 5 {
        return Err(ApiError::bad_request("Rating must be between 1 and 5"));
    }

    let gig_id = ObjectId::parse_str(&dto.gig_id)
        .map_err(|_| ApiError::bad_request("Invalid gig ID"))?;

    let gig = db.collection::<Gig>("gigs")
        .find_one(doc! { "_id": gig_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Gig not found"))?;

    if gig.user_id == auth.user_id {
        return Err(ApiError::forbidden("You cannot review your own gig"));
    }

    // Proof of purchase: a completed order by this buyer for this gig
    let completed_order = db.collection::<Order>("orders")
        .find_one(
            doc! {
                "gig_id": gig_id,
                "buyer_id": auth.user_id,
                "status": "completed",
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if completed_order.is_none() {
        return Err(ApiError::forbidden("Only buyers with a completed order can review this gig"));
    }

    let reviews = db.collection::<Review>("reviews");

    let existing = reviews
        .find_one(
            doc! { "gig_id": gig_id, "user_id": auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("You have already reviewed this gig"));
    }

    let review = Review {
        id: None,
        gig_id,
        user_id: auth.user_id,
        star: dto.star,
        desc: dto.desc.clone(),
        created_at: DateTime::now(),
    };

    let result = reviews
        .insert_one(&review, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create review: {}", e)))?;

    db.collection::<Gig>("gigs")
        .update_one(doc! { "_id": gig_id }, rating_increment(dto.star), None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update rating: {}", e)))?;

    let mut created = review;
    created.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        created.into(),
    )))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct GigReviewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Review")]
#[get("/reviews/gig/<gig_id>?<query..>")]
pub async fn get_gig_reviews(
    db: &State<DbConn>,
    gig_id: String,
    query: GigReviewsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let object_id = ObjectId::parse_str(&gig_id)
        .map_err(|_| ApiError::bad_request("Invalid gig ID"))?;

    let filter = doc! { "gig_id": object_id };

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Review>("reviews")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut reviews: Vec<ReviewResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let review: Review = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        reviews.push(review.into());
    }

    let total = db.collection::<Review>("reviews")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "reviews": reviews,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

#[openapi(tag = "Review")]
#[delete("/reviews/<review_id>")]
pub async fn delete_review(
    db: &State<DbConn>,
    auth: AuthGuard,
    review_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&review_id)
        .map_err(|_| ApiError::bad_request("Invalid review ID"))?;

    // Verify ownership
    let review = db.collection::<Review>("reviews")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    if review.user_id != auth.user_id {
        return Err(ApiError::forbidden("Not authorized to delete this review"));
    }

    db.collection::<Review>("reviews")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete review: {}", e)))?;

    // Removing the review takes its stars back out of the aggregate
    db.collection::<Gig>("gigs")
        .update_one(doc! { "_id": review.gig_id }, rating_decrement(review.star), None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update rating: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Review deleted successfully"
    }))))
}
