use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// A priced tier of a gig.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Plan {
    pub name: String,
    pub price: i32,
    pub delivery_days: i32,
    pub revisions: i32,
    pub features: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Gig {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    pub desc: String,
    pub category: String,
    pub cover: Option<String>,
    pub images: Vec<String>,
    pub plans: Vec<Plan>,
    // Rating aggregates, maintained incrementally by review create/delete.
    pub total_stars: i32,
    pub star_number: i32,
    pub sales: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Gig {
    pub fn plan(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateGigDto {
    pub title: String,
    pub desc: String,
    pub category: String,
    pub cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub plans: Vec<Plan>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GigResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub desc: String,
    pub category: String,
    pub cover: Option<String>,
    pub images: Vec<String>,
    pub plans: Vec<Plan>,
    pub total_stars: i32,
    pub star_number: i32,
    pub sales: i32,
}

impl From<Gig> for GigResponse {
    fn from(gig: Gig) -> Self {
        GigResponse {
            id: gig.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: gig.user_id.to_hex(),
            title: gig.title,
            desc: gig.desc,
            category: gig.category,
            cover: gig.cover,
            images: gig.images,
            plans: gig.plans,
            total_stars: gig.total_stars,
            star_number: gig.star_number,
            sales: gig.sales,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig_with_plans() -> Gig {
        Gig {
            id: None,
            user_id: ObjectId::new(),
            title: "I will build your API".to_string(),
            desc: "Rust backends".to_string(),
            category: "programming".to_string(),
            cover: None,
            images: vec![],
            plans: vec![
                Plan {
                    name: "basic".to_string(),
                    price: 50,
                    delivery_days: 3,
                    revisions: 1,
                    features: vec!["1 endpoint".to_string()],
                },
                Plan {
                    name: "premium".to_string(),
                    price: 200,
                    delivery_days: 7,
                    revisions: 3,
                    features: vec!["full service".to_string()],
                },
            ],
            total_stars: 0,
            star_number: 0,
            sales: 0,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn plan_lookup_by_name() {
        let gig = gig_with_plans();
        assert_eq!(gig.plan("premium").unwrap().price, 200);
        assert!(gig.plan("enterprise").is_none());
    }
}
