pub mod auth;
pub mod review;

pub use auth::AuthService;
pub use review::DoctorReviewService;
