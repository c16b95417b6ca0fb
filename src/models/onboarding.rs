// src/models/onboarding.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::property::default_true;

pub const VENDOR_CATEGORIES: &[&str] = &["hvac", "plumbing", "electrical", "general"];
pub const INTAKE_METHODS: &[&str] = &["manual", "email"];
pub const ON_CALL_ROTATIONS: &[&str] = &["weekly", "custom"];

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("validation.{}", code).into());
        Err(err)
    }
}

fn validate_vendor_category(value: &str) -> Result<(), ValidationError> {
    one_of(value, VENDOR_CATEGORIES, "vendor_category")
}

fn validate_intake_method(value: &str) -> Result<(), ValidationError> {
    one_of(value, INTAKE_METHODS, "intake_method")
}

fn validate_on_call_rotation(value: &str) -> Result<(), ValidationError> {
    one_of(value, ON_CALL_ROTATIONS, "on_call_rotation")
}

// ============================================================================
// Requisição
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AdminAccountPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[validate(length(min = 8, max = 64, message = "validation.password_length"))]
    pub password: String,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OnboardingPropertyPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OnboardingTechnicianPayload {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub last_name: String,
    pub phone: Option<String>,
    #[validate(email(message = "validation.email"))]
    pub email: Option<String>,
    pub shift: Option<String>,
    /// UUID de propriedade existente ou nome de uma propriedade desta requisição.
    #[serde(alias = "defaultProperty")]
    pub default_property: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
    #[serde(alias = "meritPercent")]
    #[validate(range(min = 0, message = "validation.merit_percent"))]
    pub merit_percent: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmergencyVendorPayload {
    #[validate(custom(function = "validate_vendor_category"))]
    pub category: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OnboardingPayload {
    #[serde(alias = "companyName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub company_name: Option<String>,
    pub timezone: Option<String>,
    #[serde(alias = "workHoursStart")]
    #[validate(length(min = 1, message = "validation.hour_format"))]
    pub work_hours_start: String,
    #[serde(alias = "workHoursEnd")]
    #[validate(length(min = 1, message = "validation.hour_format"))]
    pub work_hours_end: String,
    #[serde(default = "default_true", alias = "autoAssign")]
    pub auto_assign: bool,
    #[serde(default, alias = "onCallEnabled")]
    pub on_call_enabled: bool,
    #[serde(default = "default_rotation", alias = "onCallRotation")]
    #[validate(custom(function = "validate_on_call_rotation"))]
    pub on_call_rotation: String,
    #[serde(default = "default_intake", alias = "intakeMethod")]
    #[validate(custom(function = "validate_intake_method"))]
    pub intake_method: String,
    #[serde(default = "default_true", alias = "collectPte")]
    pub collect_pte: bool,
    #[serde(default = "default_true", alias = "collectWindow")]
    pub collect_window: bool,
    #[serde(alias = "adminAccount")]
    #[validate(nested)]
    pub admin_account: Option<AdminAccountPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub properties: Vec<OnboardingPropertyPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub technicians: Vec<OnboardingTechnicianPayload>,
    #[serde(default, alias = "emergencyVendors")]
    #[validate(nested)]
    pub emergency_vendors: Vec<EmergencyVendorPayload>,
}

fn default_rotation() -> String {
    "weekly".to_string()
}

fn default_intake() -> String {
    "manual".to_string()
}

// ============================================================================
// Persistência
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmergencyVendor {
    pub id: Uuid,
    pub company_id: Uuid,
    pub category: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEmergencyVendor {
    pub category: String,
    pub name: String,
    pub phone: Option<String>,
}

// ============================================================================
// Respostas
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct OnboardingSummary {
    pub company_name: String,
    pub timezone: String,
    pub work_hours_start: String,
    pub work_hours_end: String,
    pub auto_assign: bool,
    pub on_call_enabled: bool,
    pub on_call_rotation: String,
    pub intake_method: String,
    pub collect_pte: bool,
    pub collect_window: bool,
    pub properties_total: usize,
    pub technicians_total: usize,
    pub emergency_vendors_total: usize,
    pub admin_user_created: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OnboardingResponse {
    pub success: bool,
    pub company_id: Uuid,
    pub summary: OnboardingSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PropertySummary {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TechnicianSummary {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub shift: Option<String>,
    pub default_property_id: Option<Uuid>,
    pub default_property_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmergencyVendorSummary {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OnboardingStatusResponse {
    pub company_id: Uuid,
    pub company_name: String,
    pub timezone: String,
    pub timezone_label: String,
    pub work_hours_start: String,
    pub work_hours_end: String,
    pub auto_assign: bool,
    pub on_call_enabled: bool,
    pub on_call_rotation: String,
    pub intake_method: String,
    pub collect_pte: bool,
    pub collect_window: bool,
    pub properties: Vec<PropertySummary>,
    pub technicians: Vec<TechnicianSummary>,
    pub emergency_vendors: Vec<EmergencyVendorSummary>,
    pub onboarding_completed: bool,
}
