// src/models/technician.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_MERIT_PERCENT: i32 = 100;
pub const DEFAULT_AVAILABILITY: &str = "available";

/// Técnico com o nome da propriedade padrão já resolvido (LEFT JOIN).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Technician {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub default_property_id: Option<Uuid>,
    pub default_property_name: Option<String>,
    pub shift: Option<String>,
    pub merit_percent: i32,
    pub availability: String,
}

/// Linha pronta para inserir; referências já validadas pelo serviço.
#[derive(Debug, Clone)]
pub struct NewTechnician {
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub default_property_id: Option<Uuid>,
    pub shift: Option<String>,
    pub merit_percent: i32,
    pub availability: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTechnicianPayload {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub last_name: String,
    pub phone: Option<String>,
    #[validate(email(message = "validation.email"))]
    pub email: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
    #[serde(alias = "defaultPropertyId")]
    pub default_property_id: Option<String>,
    pub shift: Option<String>,
    #[serde(alias = "meritPercent")]
    #[validate(range(min = 0, message = "validation.merit_percent"))]
    pub merit_percent: Option<i32>,
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTechnicianPayload {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "validation.email"))]
    pub email: Option<String>,
    /// Placeholder ("", "none"...) limpa a propriedade padrão.
    #[serde(alias = "defaultPropertyId")]
    pub default_property_id: Option<String>,
    pub shift: Option<String>,
    #[serde(alias = "meritPercent")]
    #[validate(range(min = 0, message = "validation.merit_percent"))]
    pub merit_percent: Option<i32>,
    pub availability: Option<String>,
}

/// Alterações já resolvidas. `Some(None)` limpa a coluna.
#[derive(Debug, Clone, Default)]
pub struct TechnicianChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub default_property_id: Option<Option<Uuid>>,
    pub shift: Option<String>,
    pub merit_percent: Option<i32>,
    pub availability: Option<String>,
}

impl TechnicianChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.default_property_id.is_none()
            && self.shift.is_none()
            && self.merit_percent.is_none()
            && self.availability.is_none()
    }
}
