// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::signup,
        handlers::auth::signin,
        handlers::auth::google_signin,
        handlers::auth::refresh,
        handlers::auth::verify_link,
        handlers::auth::verify_otp,
        handlers::auth::resend_verification,
        handlers::auth::forgot_password,
        handlers::auth::reset_password_otp,
        handlers::auth::me,

        // --- Onboarding ---
        handlers::onboarding::complete_onboarding,
        handlers::onboarding::get_onboarding_status,
        handlers::profiles::onboard_owner,
        handlers::profiles::onboard_subcontractor,
        handlers::profiles::upload_pma,
        handlers::profiles::get_signed_url,
        handlers::profiles::list_categories,
        handlers::profiles::create_category,

        // --- Properties ---
        handlers::properties::list_properties,
        handlers::properties::create_property,
        handlers::properties::get_property,
        handlers::properties::update_property,
        handlers::properties::delete_property,
        handlers::properties::list_units,
        handlers::properties::create_unit,
        handlers::properties::update_unit,
        handlers::properties::delete_unit,

        // --- Technicians ---
        handlers::technicians::list_technicians,
        handlers::technicians::create_technician,
        handlers::technicians::get_technician,
        handlers::technicians::update_technician,
        handlers::technicians::delete_technician,

        // --- Work Orders ---
        handlers::work_orders::list_work_orders,
        handlers::work_orders::create_work_order,
        handlers::work_orders::get_work_order_options,
        handlers::work_orders::get_work_order,
        handlers::work_orders::update_work_order,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::SignupPayload,
            models::auth::SigninPayload,
            models::auth::GoogleSigninPayload,
            models::auth::RefreshPayload,
            models::auth::VerifyOtpPayload,
            models::auth::VerifyLinkPayload,
            models::auth::EmailPayload,
            models::auth::ResetPasswordOtpPayload,
            models::auth::SignupResponse,
            models::auth::SigninResponse,
            models::auth::GoogleSigninResponse,
            models::auth::TokenPairResponse,
            models::auth::MessageResponse,
            models::auth::MeResponse,

            // --- Contas ---
            models::account::AppUser,
            models::account::Company,

            // --- Onboarding ---
            models::onboarding::AdminAccountPayload,
            models::onboarding::OnboardingPropertyPayload,
            models::onboarding::OnboardingTechnicianPayload,
            models::onboarding::EmergencyVendorPayload,
            models::onboarding::OnboardingPayload,
            models::onboarding::EmergencyVendor,
            models::onboarding::OnboardingSummary,
            models::onboarding::OnboardingResponse,
            models::onboarding::PropertySummary,
            models::onboarding::TechnicianSummary,
            models::onboarding::EmergencyVendorSummary,
            models::onboarding::OnboardingStatusResponse,

            // --- Perfis ---
            models::profile::OwnerOnboardingPayload,
            models::profile::Owner,
            models::profile::LocationPayload,
            models::profile::ServicePayload,
            models::profile::SubcontractorOnboardingPayload,
            models::profile::RoleOnboardingResult,
            models::profile::Document,
            models::profile::DocumentUploadResponse,
            models::profile::SignedUrlResponse,
            models::profile::ServiceCategory,
            models::profile::CreateCategoryPayload,

            // --- Properties ---
            models::property::Property,
            models::property::Unit,
            models::property::CreatePropertyPayload,
            models::property::PropertyChanges,
            models::property::CreateUnitPayload,
            models::property::UnitChanges,

            // --- Technicians ---
            models::technician::Technician,
            models::technician::CreateTechnicianPayload,
            models::technician::UpdateTechnicianPayload,

            // --- Work Orders ---
            models::work_order::WorkOrder,
            models::work_order::CreateWorkOrderPayload,
            models::work_order::UpdateWorkOrderPayload,
            models::work_order::WorkOrderListResponse,
            models::work_order::UnitOption,
            models::work_order::PropertyOption,
            models::work_order::WorkOrderOptionsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e verificação de e-mail"),
        (name = "Onboarding", description = "Configuração inicial da empresa e perfis por papel"),
        (name = "Properties", description = "Propriedades e unidades"),
        (name = "Technicians", description = "Equipe de manutenção"),
        (name = "Work Orders", description = "Ordens de serviço")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
