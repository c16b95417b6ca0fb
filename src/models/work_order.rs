// src/models/work_order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Ordem de serviço com o nome da propriedade resolvido.
/// `unit_label` é a coluna desnormalizada `unit`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct WorkOrder {
    pub id: Uuid,
    pub company_id: Uuid,
    pub property_id: Uuid,
    pub property_name: Option<String>,
    pub unit_id: Option<Uuid>,
    pub unit_label: Option<String>,
    pub issue: String,
    pub priority: String,
    pub status: String,
    pub pte: Option<bool>,
    pub preferred_window: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub assigned_technician_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub property_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub unit_label: Option<String>,
    pub issue: String,
    pub priority: String,
    pub pte: Option<bool>,
    pub preferred_window: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub assigned_technician_id: Option<Uuid>,
}

const ISSUE_MIN_CHARS: usize = 3;

/// Conta depois do `trim`, que é o valor gravado.
fn validate_issue(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() >= ISSUE_MIN_CHARS {
        Ok(())
    } else {
        let mut err = ValidationError::new("issue");
        err.message = Some("validation.issue_length".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkOrderPayload {
    #[serde(alias = "propertyId")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub property_id: String,
    #[serde(alias = "unitId")]
    pub unit_id: Option<String>,
    #[serde(alias = "unitLabel")]
    pub unit_label: Option<String>,
    #[validate(custom(function = "validate_issue"))]
    pub issue: String,
    pub priority: Option<String>,
    pub pte: Option<bool>,
    #[serde(alias = "preferredWindow")]
    pub preferred_window: Option<String>,
    #[serde(alias = "tenantName")]
    pub tenant_name: Option<String>,
    #[serde(alias = "tenantPhone")]
    pub tenant_phone: Option<String>,
    #[serde(alias = "assignedTechnicianId")]
    pub assigned_technician_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkOrderPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub status: Option<String>,
    pub priority: Option<String>,
    /// String vazia remove a atribuição.
    #[serde(alias = "assignedTechnicianId")]
    pub assigned_technician_id: Option<String>,
    #[validate(custom(function = "validate_issue"))]
    pub issue: Option<String>,
    #[serde(alias = "preferredWindow")]
    pub preferred_window: Option<String>,
    #[serde(alias = "tenantName")]
    pub tenant_name: Option<String>,
    #[serde(alias = "tenantPhone")]
    pub tenant_phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkOrderChanges {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_technician_id: Option<Option<Uuid>>,
    pub issue: Option<String>,
    pub preferred_window: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
}

impl WorkOrderChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assigned_technician_id.is_none()
            && self.issue.is_none()
            && self.preferred_window.is_none()
            && self.tenant_name.is_none()
            && self.tenant_phone.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkOrderListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[validate(range(min = 1, max = 100, message = "validation.pagination"))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, message = "validation.pagination"))]
    pub offset: Option<i64>,
}

/// Filtro já normalizado que chega ao repositório.
#[derive(Debug, Clone)]
pub struct WorkOrderFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkOrderListResponse {
    pub work_orders: Vec<WorkOrder>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitOption {
    pub id: Uuid,
    pub label: String,
    pub notes: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyOption {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub units: Vec<UnitOption>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkOrderOptionsResponse {
    pub company_id: Uuid,
    pub properties: Vec<PropertyOption>,
}
