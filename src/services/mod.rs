pub mod email;
pub mod enhance;
pub mod jwt;

pub use email::EmailService;
pub use enhance::EnhanceService;
pub use jwt::JwtService;
