// src/db/account_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::account::{AppUser, AppUserUpsert, Company, CompanySettings},
};

/// Empresas e perfis `app_users`.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_app_user(&self, user_id: Uuid) -> Result<Option<AppUser>, AppError>;
    /// Atualiza o perfil existente ou cria um novo. Campos `None` preservam o valor atual.
    async fn upsert_app_user(&self, user_id: Uuid, fields: &AppUserUpsert) -> Result<AppUser, AppError>;

    async fn create_company(&self, name: &str) -> Result<Company, AppError>;
    async fn find_company(&self, company_id: Uuid) -> Result<Option<Company>, AppError>;
    async fn update_company_settings(
        &self,
        company_id: Uuid,
        settings: &CompanySettings,
    ) -> Result<Company, AppError>;
    async fn delete_company(&self, company_id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const APP_USER_COLUMNS: &str = "user_id, company_id, first_name, last_name, is_active, onboarding_status";

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_app_user(&self, user_id: Uuid) -> Result<Option<AppUser>, AppError> {
        let user = sqlx::query_as::<_, AppUser>(&format!(
            "SELECT {} FROM app_users WHERE user_id = $1",
            APP_USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn upsert_app_user(&self, user_id: Uuid, fields: &AppUserUpsert) -> Result<AppUser, AppError> {
        // COALESCE mantém o valor atual quando o campo não veio.
        let user = sqlx::query_as::<_, AppUser>(&format!(
            r#"
            INSERT INTO app_users (user_id, company_id, first_name, last_name, is_active, onboarding_status)
            VALUES ($1, $2, $3, $4, COALESCE($5, TRUE), COALESCE($6, 'pending'))
            ON CONFLICT (user_id) DO UPDATE SET
                company_id        = COALESCE($2, app_users.company_id),
                first_name        = COALESCE($3, app_users.first_name),
                last_name         = COALESCE($4, app_users.last_name),
                is_active         = COALESCE($5, app_users.is_active),
                onboarding_status = COALESCE($6, app_users.onboarding_status)
            RETURNING {}
            "#,
            APP_USER_COLUMNS
        ))
        .bind(user_id)
        .bind(fields.company_id)
        .bind(fields.first_name.as_deref())
        .bind(fields.last_name.as_deref())
        .bind(fields.is_active)
        .bind(fields.onboarding_status.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_company(&self, name: &str) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>("INSERT INTO companies (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(company)
    }

    async fn find_company(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn update_company_settings(
        &self,
        company_id: Uuid,
        settings: &CompanySettings,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = $2,
                timezone = $3,
                work_hours_start = $4,
                work_hours_end = $5,
                auto_assign = $6,
                intake = $7,
                collect_pte = $8,
                collect_window = $9,
                on_call_enabled = $10,
                on_call_rotation = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&settings.name)
        .bind(&settings.timezone)
        .bind(settings.work_hours_start)
        .bind(settings.work_hours_end)
        .bind(settings.auto_assign)
        .bind(&settings.intake)
        .bind(settings.collect_pte)
        .bind(settings.collect_window)
        .bind(settings.on_call_enabled)
        .bind(&settings.on_call_rotation)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CompanyRecordMissing)?;
        Ok(company)
    }

    async fn delete_company(&self, company_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
