// src/models/account.rs

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const ONBOARDING_PENDING: &str = "pending";
pub const ONBOARDING_COMPLETED: &str = "completed";

/// Perfil interno que liga uma identidade a uma empresa (tabela `app_users`).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct AppUser {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub onboarding_status: String,
}

/// Campos gravados no upsert de `app_users`. `None` preserva o valor atual.
#[derive(Debug, Clone, Default)]
pub struct AppUserUpsert {
    pub company_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub onboarding_status: Option<String>,
}

// O tenant.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub work_hours_start: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:00:00")]
    pub work_hours_end: Option<NaiveTime>,
    pub auto_assign: bool,
    pub intake: String,
    pub collect_pte: bool,
    pub collect_window: bool,
    pub on_call_enabled: bool,
    pub on_call_rotation: String,
    pub created_at: DateTime<Utc>,
}

/// Configurações gravadas pelo onboarding inicial, todas de uma vez.
#[derive(Debug, Clone)]
pub struct CompanySettings {
    pub name: String,
    pub timezone: String,
    pub work_hours_start: NaiveTime,
    pub work_hours_end: NaiveTime,
    pub auto_assign: bool,
    pub intake: String,
    pub collect_pte: bool,
    pub collect_window: bool,
    pub on_call_enabled: bool,
    pub on_call_rotation: String,
}
