pub mod user;
pub mod otp;
pub mod gig;
pub mod order;
pub mod project;
pub mod proposal;
pub mod conversation;
pub mod message;
pub mod review;

pub use user::*;
pub use otp::*;
pub use gig::*;
pub use order::*;
pub use project::*;
pub use proposal::*;
pub use conversation::*;
pub use message::*;
pub use review::*;
