use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::Plan;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Refused,
    InProgress,
    Completed,
}

impl OrderStatus {
    /// Wire form, matching the serde representation. Used in query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Refused => "refused",
            OrderStatus::InProgress => "inProgress",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Refused | OrderStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRole {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Refuse,
    Complete,
}

impl OrderAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(OrderAction::Accept),
            "refuse" => Some(OrderAction::Refuse),
            "complete" => Some(OrderAction::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub gig_id: ObjectId,
    pub buyer_id: ObjectId,
    pub seller_id: ObjectId,
    // Snapshot of the gig at purchase time; later gig edits don't leak in.
    pub title: String,
    pub cover: Option<String>,
    pub plan: Plan,
    pub buyer_accepted: bool,
    pub seller_accepted: bool,
    pub buyer_completed: bool,
    pub seller_completed: bool,
    pub is_completed: bool,
    pub status: OrderStatus,
    /// Optimistic-concurrency counter; every write is conditional on it.
    pub version: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// The state an order moves to when an action is applied. The route handler
/// turns this into a version-guarded document update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: OrderStatus,
    pub buyer_accepted: bool,
    pub seller_accepted: bool,
    pub buyer_completed: bool,
    pub seller_completed: bool,
    pub is_completed: bool,
}

impl OrderUpdate {
    /// True exactly when this update is the completing transition, which is
    /// the one moment the gig's sales counter may be incremented.
    pub fn completes_order(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is in a terminal state and accepts no further actions.
    Terminal(OrderStatus),
    /// `complete` was sent before both parties accepted.
    NotInProgress(OrderStatus),
}

impl Order {
    pub fn role_of(&self, user_id: &ObjectId) -> Option<OrderRole> {
        if *user_id == self.buyer_id {
            Some(OrderRole::Buyer)
        } else if *user_id == self.seller_id {
            Some(OrderRole::Seller)
        } else {
            None
        }
    }

    /// Apply one action from one party and produce the next state.
    ///
    /// Dual-flag rules: `accept` and `complete` each set the caller's flag;
    /// the status only flips once both sides have flagged. `refuse` is a
    /// one-way terminal transition. Re-sending `accept` is a no-op by
    /// construction (setting a true flag true again changes nothing).
    pub fn apply_action(&self, role: OrderRole, action: OrderAction) -> Result<OrderUpdate, TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }

        let mut next = OrderUpdate {
            status: self.status,
            buyer_accepted: self.buyer_accepted,
            seller_accepted: self.seller_accepted,
            buyer_completed: self.buyer_completed,
            seller_completed: self.seller_completed,
            is_completed: self.is_completed,
        };

        match action {
            OrderAction::Accept => {
                match role {
                    OrderRole::Buyer => next.buyer_accepted = true,
                    OrderRole::Seller => next.seller_accepted = true,
                }
                if next.buyer_accepted && next.seller_accepted {
                    next.status = OrderStatus::InProgress;
                } else if next.status == OrderStatus::Pending {
                    next.status = OrderStatus::Accepted;
                }
            }
            OrderAction::Refuse => {
                next.status = OrderStatus::Refused;
            }
            OrderAction::Complete => {
                if self.status != OrderStatus::InProgress {
                    return Err(TransitionError::NotInProgress(self.status));
                }
                match role {
                    OrderRole::Buyer => next.buyer_completed = true,
                    OrderRole::Seller => next.seller_completed = true,
                }
                if next.buyer_completed && next.seller_completed {
                    next.status = OrderStatus::Completed;
                    next.is_completed = true;
                }
            }
        }

        Ok(next)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrderDto {
    /// Name of the gig plan being purchased.
    pub plan: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OrderResponse {
    pub id: String,
    pub gig_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub title: String,
    pub cover: Option<String>,
    pub plan: Plan,
    pub buyer_accepted: bool,
    pub seller_accepted: bool,
    pub buyer_completed: bool,
    pub seller_completed: bool,
    pub is_completed: bool,
    pub status: OrderStatus,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id.map(|id| id.to_hex()).unwrap_or_default(),
            gig_id: order.gig_id.to_hex(),
            buyer_id: order.buyer_id.to_hex(),
            seller_id: order.seller_id.to_hex(),
            title: order.title,
            cover: order.cover,
            plan: order.plan,
            buyer_accepted: order.buyer_accepted,
            seller_accepted: order.seller_accepted,
            buyer_completed: order.buyer_completed,
            seller_completed: order.seller_completed,
            is_completed: order.is_completed,
            status: order.status,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrderActionDto {
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Plan;

    fn fresh_order() -> Order {
        Order {
            id: Some(ObjectId::new()),
            gig_id: ObjectId::new(),
            buyer_id: ObjectId::new(),
            seller_id: ObjectId::new(),
            title: "Logo design".to_string(),
            cover: None,
            plan: Plan {
                name: "basic".to_string(),
                price: 25,
                delivery_days: 2,
                revisions: 1,
                features: vec![],
            },
            buyer_accepted: false,
            seller_accepted: false,
            buyer_completed: false,
            seller_completed: false,
            is_completed: false,
            status: OrderStatus::Pending,
            version: 0,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    fn applied(order: &Order, role: OrderRole, action: OrderAction) -> Order {
        let upd = order.apply_action(role, action).unwrap();
        let mut next = order.clone();
        next.status = upd.status;
        next.buyer_accepted = upd.buyer_accepted;
        next.seller_accepted = upd.seller_accepted;
        next.buyer_completed = upd.buyer_completed;
        next.seller_completed = upd.seller_completed;
        next.is_completed = upd.is_completed;
        next
    }

    #[test]
    fn single_accept_does_not_start_work() {
        let order = fresh_order();
        let upd = order.apply_action(OrderRole::Buyer, OrderAction::Accept).unwrap();

        assert!(upd.buyer_accepted);
        assert!(!upd.seller_accepted);
        assert_eq!(upd.status, OrderStatus::Accepted);
    }

    #[test]
    fn both_accepts_move_to_in_progress() {
        let order = fresh_order();
        let order = applied(&order, OrderRole::Buyer, OrderAction::Accept);
        let upd = order.apply_action(OrderRole::Seller, OrderAction::Accept).unwrap();

        assert_eq!(upd.status, OrderStatus::InProgress);
        assert!(upd.buyer_accepted && upd.seller_accepted);
    }

    #[test]
    fn in_progress_implies_both_accepted() {
        // Property from the dual-acceptance rule: there is no path to
        // inProgress with a missing flag.
        let order = fresh_order();
        for first in [OrderRole::Buyer, OrderRole::Seller] {
            let after_one = applied(&order, first, OrderAction::Accept);
            assert_ne!(after_one.status, OrderStatus::InProgress);
        }
    }

    #[test]
    fn duplicate_accept_is_a_noop() {
        let order = fresh_order();
        let order = applied(&order, OrderRole::Buyer, OrderAction::Accept);
        let again = order.apply_action(OrderRole::Buyer, OrderAction::Accept).unwrap();

        assert_eq!(again.status, OrderStatus::Accepted);
        assert!(again.buyer_accepted);
        assert!(!again.seller_accepted);
    }

    #[test]
    fn refuse_is_unconditional_and_terminal() {
        let order = fresh_order();
        let order = applied(&order, OrderRole::Buyer, OrderAction::Accept);
        let order = applied(&order, OrderRole::Seller, OrderAction::Refuse);

        assert_eq!(order.status, OrderStatus::Refused);
        assert_eq!(
            order.apply_action(OrderRole::Buyer, OrderAction::Accept),
            Err(TransitionError::Terminal(OrderStatus::Refused))
        );
    }

    #[test]
    fn complete_requires_in_progress() {
        let order = fresh_order();
        assert_eq!(
            order.apply_action(OrderRole::Buyer, OrderAction::Complete),
            Err(TransitionError::NotInProgress(OrderStatus::Pending))
        );
    }

    #[test]
    fn full_lifecycle_scenario() {
        // buyer accepted, seller accepts -> inProgress; buyer completes ->
        // still inProgress; seller completes -> completed, is_completed set,
        // and the update reports the one sales increment.
        let order = fresh_order();
        let order = applied(&order, OrderRole::Buyer, OrderAction::Accept);
        let order = applied(&order, OrderRole::Seller, OrderAction::Accept);
        assert_eq!(order.status, OrderStatus::InProgress);

        let order = applied(&order, OrderRole::Buyer, OrderAction::Complete);
        assert_eq!(order.status, OrderStatus::InProgress);
        assert!(!order.is_completed);

        let upd = order.apply_action(OrderRole::Seller, OrderAction::Complete).unwrap();
        assert_eq!(upd.status, OrderStatus::Completed);
        assert!(upd.is_completed);
        assert!(upd.buyer_completed && upd.seller_completed);
        assert!(upd.completes_order());

        // And once terminal, nothing more fires, so sales can't double-count.
        let order = applied(&order, OrderRole::Seller, OrderAction::Complete);
        assert_eq!(
            order.apply_action(OrderRole::Seller, OrderAction::Complete),
            Err(TransitionError::Terminal(OrderStatus::Completed))
        );
    }

    #[test]
    fn non_completing_updates_do_not_touch_sales() {
        let order = fresh_order();
        let upd = order.apply_action(OrderRole::Buyer, OrderAction::Accept).unwrap();
        assert!(!upd.completes_order());
    }

    #[test]
    fn role_resolution() {
        let order = fresh_order();
        assert_eq!(order.role_of(&order.buyer_id), Some(OrderRole::Buyer));
        assert_eq!(order.role_of(&order.seller_id), Some(OrderRole::Seller));
        assert_eq!(order.role_of(&ObjectId::new()), None);
    }

    #[test]
    fn action_tokens() {
        assert_eq!(OrderAction::parse("accept"), Some(OrderAction::Accept));
        assert_eq!(OrderAction::parse("refuse"), Some(OrderAction::Refuse));
        assert_eq!(OrderAction::parse("complete"), Some(OrderAction::Complete));
        assert_eq!(OrderAction::parse("cancel"), None);
        assert_eq!(OrderAction::parse("ACCEPT"), None);
    }

    #[test]
    fn status_wire_form_matches_serde() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Refused,
            OrderStatus::InProgress,
            OrderStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
