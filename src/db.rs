pub mod account_repo;
pub use account_repo::{AccountRepository, PgAccountRepository};
pub mod property_repo;
pub use property_repo::{PgPropertyRepository, PropertyRepository};
pub mod technician_repo;
pub use technician_repo::{PgTechnicianRepository, TechnicianRepository};
pub mod work_order_repo;
pub use work_order_repo::{PgWorkOrderRepository, WorkOrderRepository};
pub mod onboarding_repo;
pub use onboarding_repo::{OnboardingRepository, PgOnboardingRepository};
pub mod profile_repo;
pub use profile_repo::{PgProfileRepository, ProfileRepository};
