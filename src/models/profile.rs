// src/models/profile.rs
//
// Onboarding por papel: proprietário / gestor de imóveis / subcontratado,
// mais documentos enviados e o catálogo de categorias de serviço.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_PROPERTY_MANAGER: &str = "property_manager";
pub const ROLE_SUBCONTRACTOR: &str = "subcontractor";

pub const DOC_TYPE_PMA: &str = "pma";
pub const DOCUMENT_PENDING_REVIEW: &str = "pending_review";

pub const DEFAULT_SIGNED_URL_TTL: u64 = 3600;
pub const MAX_SIGNED_URL_TTL: u64 = 604_800;

fn validate_owner_role(value: &str) -> Result<(), ValidationError> {
    if value == ROLE_OWNER || value == ROLE_PROPERTY_MANAGER {
        Ok(())
    } else {
        let mut err = ValidationError::new("role");
        err.message = Some("validation.role".into());
        Err(err)
    }
}

// ============================================================================
// Owner / Property manager
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OwnerOnboardingPayload {
    #[serde(default = "default_owner_role")]
    #[validate(custom(function = "validate_owner_role"))]
    pub role: String,
    #[serde(alias = "companyName")]
    pub company_name: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "businessRegistrationNumber")]
    pub business_registration_number: Option<String>,
    #[serde(alias = "taxId")]
    pub tax_id: Option<String>,
    #[serde(alias = "portfolioSize")]
    #[validate(range(min = 0))]
    pub portfolio_size: Option<i32>,
    /// Caminho devolvido por `POST /onboarding/owner/pma`.
    #[serde(alias = "pmaDocumentUrl", alias = "pma_document_path", alias = "pmaDocumentPath")]
    pub pma_document_url: Option<String>,
}

fn default_owner_role() -> String {
    ROLE_OWNER.to_string()
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Owner {
    pub user_id: Uuid,
    pub role: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub business_registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub portfolio_size: Option<i32>,
    pub pma_document_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOwner {
    pub user_id: Uuid,
    pub role: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub business_registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub portfolio_size: Option<i32>,
    pub pma_document_path: Option<String>,
}

// ============================================================================
// Subcontractor
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LocationPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "postalCode")]
    pub postal_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default, alias = "isPrimary")]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ServicePayload {
    /// UUID, slug ou nome exato da categoria.
    #[serde(alias = "categoryId", alias = "category")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub category_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubcontractorOnboardingPayload {
    #[serde(alias = "businessName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub business_name: String,
    pub phone: Option<String>,
    #[serde(alias = "licenseNumber")]
    pub license_number: Option<String>,
    #[serde(alias = "insuranceProvider")]
    pub insurance_provider: Option<String>,
    #[serde(alias = "serviceRadiusMiles")]
    #[validate(range(min = 0))]
    pub service_radius_miles: Option<i32>,
    #[serde(alias = "primaryServiceCategoryId")]
    pub primary_service_category_id: Option<String>,
    #[serde(alias = "yearsInBusiness")]
    #[validate(range(min = 0))]
    pub years_in_business: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub locations: Vec<LocationPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub services: Vec<ServicePayload>,
}

#[derive(Debug, Clone)]
pub struct NewSubcontractor {
    pub user_id: Uuid,
    pub business_name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub insurance_provider: Option<String>,
    pub service_radius_miles: Option<i32>,
    pub primary_service_category_id: Option<Uuid>,
    pub years_in_business: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewSubcontractorService {
    pub category_id: Uuid,
    pub description: Option<String>,
}

// ============================================================================
// Resultado
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleOnboardingResult {
    pub success: bool,
    pub user_id: Uuid,
    pub role: String,
    pub onboarding_status: String,
    pub locations_total: usize,
    pub services_total: usize,
}

// ============================================================================
// Documentos
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doc_type: String,
    pub storage_path: String,
    pub original_filename: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentUploadResponse {
    pub document_id: Uuid,
    pub path: String,
    pub url: String,
    pub doc_type: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignedUrlQuery {
    #[validate(length(min = 1, message = "validation.required"))]
    pub path: String,
    #[validate(range(min = 1, max = 604_800, message = "validation.expires_in"))]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
    pub expires_in: u64,
}

// ============================================================================
// Categorias de serviço
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewServiceCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}
