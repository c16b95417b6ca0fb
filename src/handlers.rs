pub mod auth;
pub mod onboarding;
pub mod profiles;
pub mod properties;
pub mod technicians;
pub mod work_orders;
