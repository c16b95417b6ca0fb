// src/models/property.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Property {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Unit {
    pub id: Uuid,
    pub company_id: Uuid,
    pub property_id: Uuid,
    pub label: String,
    pub notes: Option<String>,
    pub is_active: bool,
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePropertyPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub name: String,
    pub address: String,
    pub notes: Option<String>,
}

impl From<CreatePropertyPayload> for NewProperty {
    fn from(p: CreatePropertyPayload) -> Self {
        Self { name: p.name.trim().to_string(), address: p.address.trim().to_string(), notes: p.notes }
    }
}

/// Só os campos presentes são gravados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PropertyChanges {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "validation.required"))]
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl PropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUnitPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub label: String,
    pub notes: Option<String>,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UnitChanges {
    #[validate(length(min = 1, message = "validation.required"))]
    pub label: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

impl UnitChanges {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.notes.is_none() && self.is_active.is_none()
    }
}

pub(crate) fn default_true() -> bool {
    true
}
