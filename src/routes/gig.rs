use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{Gig, GigResponse, CreateGigDto};
use crate::guards::{AuthGuard, SellerGuard};
use crate::services::EnhanceService;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Gig")]
#[post("/gigs", data = "<dto>")]
pub async fn create_gig(
    db: &State<DbConn>,
    seller: SellerGuard,
    dto: Json<CreateGigDto>,
) -> Result<Json<ApiResponse<GigResponse>>, ApiError> {
    if dto.title.trim().is_empty() || dto.desc.trim().is_empty() {
        return Err(ApiError::bad_request("Title and description are required"));
    }
    if dto.plans.is_empty() {
        return Err(ApiError::bad_request("A gig needs at least one pricing plan"));
    }
    for plan in &dto.plans {
        if plan.price <= 0 || plan.delivery_days <= 0 {
            return Err(ApiError::bad_request("Plan price and delivery days must be positive"));
        }
    }

    let mut names: Vec<&str> = dto.plans.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    names.dedup();
    if names.len() != dto.plans.len() {
        return Err(ApiError::bad_request("Plan names must be unique"));
    }

    let gig = Gig {
        id: None,
        user_id: seller.auth.user_id,
        title: dto.title.clone(),
        desc: dto.desc.clone(),
        category: dto.category.clone(),
        cover: dto.cover.clone(),
        images: dto.images.clone(),
        plans: dto.plans.clone(),
        total_stars: 0,
        star_number: 0,
        sales: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db.collection::<Gig>("gigs")
        .insert_one(&gig, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create gig: {}", e)))?;

    let mut created = gig;
    created.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Gig created successfully".to_string(),
        created.into(),
    )))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct GigQuery {
    pub category: Option<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub search: Option<String>,
    pub user_id: Option<String>,
    /// "sales" for bestsellers, anything else sorts by newest.
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn build_gig_filter(query: &GigQuery) -> Result<Document, ApiError> {
    let mut filter = doc! {};

    if let Some(ref category) = query.category {
        filter.insert("category", category);
    }

    if let Some(ref user_id) = query.user_id {
        let object_id = ObjectId::parse_str(user_id)
            .map_err(|_| ApiError::bad_request("Invalid user ID"))?;
        filter.insert("user_id", object_id);
    }

    let mut price = doc! {};
    if let Some(min) = query.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = query.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        // A gig matches when any of its plans falls inside the range
        filter.insert("plans.price", price);
    }

    if let Some(ref search) = query.search {
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": search, "$options": "i" } },
                doc! { "desc": { "$regex": search, "$options": "i" } },
            ],
        );
    }

    Ok(filter)
}

#[openapi(tag = "Gig")]
#[get("/gigs?<query..>")]
pub async fn get_gigs(
    db: &State<DbConn>,
    query: GigQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let sort = match query.sort.as_deref() {
        Some("sales") => doc! { "sales": -1 },
        _ => doc! { "created_at": -1 },
    };

    let filter = build_gig_filter(&query)?;

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(sort)
        .build();

    let mut cursor = db.collection::<Gig>("gigs")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut gigs: Vec<GigResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let gig: Gig = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        gigs.push(gig.into());
    }

    let total = db.collection::<Gig>("gigs")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "gigs": gigs,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

#[openapi(tag = "Gig")]
#[get("/gigs/<gig_id>")]
pub async fn get_gig(
    db: &State<DbConn>,
    gig_id: String,
) -> Result<Json<ApiResponse<GigResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&gig_id)
        .map_err(|_| ApiError::bad_request("Invalid gig ID"))?;

    let gig = db.collection::<Gig>("gigs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Gig not found"))?;

    Ok(Json(ApiResponse::success(gig.into())))
}

#[openapi(tag = "Gig")]
#[delete("/gigs/<gig_id>")]
pub async fn delete_gig(
    db: &State<DbConn>,
    auth: AuthGuard,
    gig_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&gig_id)
        .map_err(|_| ApiError::bad_request("Invalid gig ID"))?;

    let gig = db.collection::<Gig>("gigs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Gig not found"))?;

    if gig.user_id != auth.user_id {
        return Err(ApiError::forbidden("You can only delete your own gigs"));
    }

    db.collection::<Gig>("gigs")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete gig: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Gig deleted successfully"
    }))))
}

/// Rewrite the gig description through the configured AI provider.
/// Upstream failures surface as 502; nothing is retried.
#[openapi(tag = "Gig")]
#[post("/gigs/<gig_id>/enhance-description")]
pub async fn enhance_description(
    db: &State<DbConn>,
    auth: AuthGuard,
    gig_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&gig_id)
        .map_err(|_| ApiError::bad_request("Invalid gig ID"))?;

    let gig = db.collection::<Gig>("gigs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Gig not found"))?;

    if gig.user_id != auth.user_id {
        return Err(ApiError::forbidden("You can only enhance your own gigs"));
    }

    let enhanced = EnhanceService::enhance_description(&gig.title, &gig.desc)
        .await
        .map_err(|e| ApiError::bad_gateway(format!("Enhancement failed: {}", e)))?;

    db.collection::<Gig>("gigs")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "desc": &enhanced, "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save description: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Description enhanced".to_string(),
        serde_json::json!({ "desc": enhanced }),
    )))
}
