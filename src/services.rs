pub mod auth;
pub mod onboarding_service;
pub mod profile_service;
pub mod property_service;
pub mod technician_service;
pub mod tenancy_service;
pub mod token_service;
pub mod work_order_service;
