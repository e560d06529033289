use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{
    Gig, Order, OrderResponse, OrderStatus, OrderAction, CreateOrderDto, OrderActionDto,
    TransitionError, User,
};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Order")]
#[post("/orders/<gig_id>", data = "<dto>")]
pub async fn create_order(
    db: &State<DbConn>,
    auth: AuthGuard,
    gig_id: String,
    dto: Json<CreateOrderDto>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&gig_id)
        .map_err(|_| ApiError::bad_request("Invalid gig ID"))?;

    let gig = db.collection::<Gig>("gigs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Gig not found"))?;

    if gig.user_id == auth.user_id {
        return Err(ApiError::forbidden("You cannot order your own gig"));
    }

    let plan = gig.plan(&dto.plan)
        .ok_or_else(|| ApiError::bad_request(format!("Gig has no plan named '{}'", dto.plan)))?
        .clone();

    let order = Order {
        id: None,
        gig_id: object_id,
        buyer_id: auth.user_id,
        seller_id: gig.user_id,
        title: gig.title.clone(),
        cover: gig.cover.clone(),
        plan,
        buyer_accepted: false,
        seller_accepted: false,
        buyer_completed: false,
        seller_completed: false,
        is_completed: false,
        status: OrderStatus::Pending,
        version: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db.collection::<Order>("orders")
        .insert_one(&order, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create order: {}", e)))?;

    let mut created = order;
    created.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Order placed".to_string(),
        created.into(),
    )))
}

/// Orders where the caller is either side of the deal.
#[openapi(tag = "Order")]
#[get("/orders")]
pub async fn get_orders(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let filter = doc! {
        "$or": [
            { "buyer_id": auth.user_id },
            { "seller_id": auth.user_id },
        ]
    };

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Order>("orders")
        .find(filter, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut orders: Vec<OrderResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let order: Order = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        orders.push(order.into());
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "orders": orders,
        "total": orders.len()
    }))))
}

#[openapi(tag = "Order")]
#[get("/orders/<order_id>")]
pub async fn get_order(
    db: &State<DbConn>,
    auth: AuthGuard,
    order_id: String,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&order_id)
        .map_err(|_| ApiError::bad_request("Invalid order ID"))?;

    let order = db.collection::<Order>("orders")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if order.role_of(&auth.user_id).is_none() {
        return Err(ApiError::forbidden("You are not a party to this order"));
    }

    Ok(Json(ApiResponse::success(order.into())))
}

/// Apply `accept`, `refuse`, or `complete` to an order.
///
/// The write is conditional on the version read here, so two racing updates
/// cannot both land; the loser gets a 409 and can retry against fresh state.
#[openapi(tag = "Order")]
#[put("/orders/<order_id>", data = "<dto>")]
pub async fn update_order(
    db: &State<DbConn>,
    auth: AuthGuard,
    order_id: String,
    dto: Json<OrderActionDto>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&order_id)
        .map_err(|_| ApiError::bad_request("Invalid order ID"))?;

    let action = OrderAction::parse(&dto.action)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown action '{}'", dto.action)))?;

    let orders = db.collection::<Order>("orders");

    let order = orders
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let role = order.role_of(&auth.user_id)
        .ok_or_else(|| ApiError::forbidden("You are not a party to this order"))?;

    let next = order.apply_action(role, action).map_err(|e| match e {
        TransitionError::Terminal(status) => {
            ApiError::bad_request(format!("Order is already {}", status.as_str()))
        }
        TransitionError::NotInProgress(status) => {
            ApiError::bad_request(format!("Order cannot be completed while {}", status.as_str()))
        }
    })?;

    let status_bson = to_bson(&next.status)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let result = orders
        .update_one(
            doc! { "_id": object_id, "version": order.version },
            doc! {
                "$set": {
                    "status": status_bson,
                    "buyer_accepted": next.buyer_accepted,
                    "seller_accepted": next.seller_accepted,
                    "buyer_completed": next.buyer_completed,
                    "seller_completed": next.seller_completed,
                    "is_completed": next.is_completed,
                    "updated_at": DateTime::now(),
                },
                "$inc": { "version": 1 }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update order: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::conflict("Order was modified concurrently, try again"));
    }

    // The version guard above means this branch runs once per order lifetime.
    if next.completes_order() {
        db.collection::<Gig>("gigs")
            .update_one(
                doc! { "_id": order.gig_id },
                doc! { "$inc": { "sales": 1 } },
                None,
            )
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to record sale: {}", e)))?;

        db.collection::<User>("users")
            .update_one(
                doc! { "_id": order.seller_id },
                doc! { "$inc": { "completed_orders": 1 } },
                None,
            )
            .await
            .ok();
    }

    let mut updated = order;
    updated.status = next.status;
    updated.buyer_accepted = next.buyer_accepted;
    updated.seller_accepted = next.seller_accepted;
    updated.buyer_completed = next.buyer_completed;
    updated.seller_completed = next.seller_completed;
    updated.is_completed = next.is_completed;

    Ok(Json(ApiResponse::success_with_message(
        format!("Order {}", updated.status.as_str()),
        updated.into(),
    )))
}
