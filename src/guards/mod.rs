pub mod auth;
pub mod seller;

pub use auth::AuthGuard;
pub use seller::SellerGuard;
