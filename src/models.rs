pub mod account;
pub mod auth;
pub mod onboarding;
pub mod profile;
pub mod property;
pub mod technician;
pub mod work_order;
