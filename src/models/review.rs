use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub gig_id: ObjectId,
    pub user_id: ObjectId,
    pub star: i32, // 1-5
    pub desc: String,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewDto {
    pub gig_id: String,
    pub star: i32,
    pub desc: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub gig_id: String,
    pub user_id: String,
    pub star: i32,
    pub desc: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            gig_id: review.gig_id.to_hex(),
            user_id: review.user_id.to_hex(),
            star: review.star,
            desc: review.desc,
        }
    }
}

/// Incremental rating update applied to the gig when a review is created.
pub fn rating_increment(star: i32) -> Document {
    doc! { "$inc": { "total_stars": star, "star_number": 1 } }
}

/// Inverse update applied when a review is deleted.
pub fn rating_decrement(star: i32) -> Document {
    doc! { "$inc": { "total_stars": -star, "star_number": -1 } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_adds_stars_and_count() {
        let update = rating_increment(4);
        let inc = update.get_document("$inc").unwrap();
        assert_eq!(inc.get_i32("total_stars").unwrap(), 4);
        assert_eq!(inc.get_i32("star_number").unwrap(), 1);
    }

    #[test]
    fn delete_reverses_create() {
        // Applying increment then decrement for the same star count nets zero.
        for star in 1..=5 {
            let up = rating_increment(star);
            let down = rating_decrement(star);
            let up_inc = up.get_document("$inc").unwrap();
            let down_inc = down.get_document("$inc").unwrap();
            assert_eq!(
                up_inc.get_i32("total_stars").unwrap() + down_inc.get_i32("total_stars").unwrap(),
                0
            );
            assert_eq!(
                up_inc.get_i32("star_number").unwrap() + down_inc.get_i32("star_number").unwrap(),
                0
            );
        }
    }
}
