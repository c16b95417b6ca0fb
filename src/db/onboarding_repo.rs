// src/db/onboarding_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::onboarding::{EmergencyVendor, NewEmergencyVendor},
};

#[async_trait]
pub trait OnboardingRepository: Send + Sync {
    /// Sonda de existência: a empresa já tem propriedade, técnico ou fornecedor de emergência?
    async fn company_has_records(&self, company_id: Uuid) -> Result<bool, AppError>;
    async fn create_vendors(
        &self,
        company_id: Uuid,
        vendors: &[NewEmergencyVendor],
    ) -> Result<Vec<EmergencyVendor>, AppError>;
    async fn list_vendors(&self, company_id: Uuid) -> Result<Vec<EmergencyVendor>, AppError>;
}

#[derive(Clone)]
pub struct PgOnboardingRepository {
    pool: PgPool,
}

impl PgOnboardingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OnboardingRepository for PgOnboardingRepository {
    async fn company_has_records(&self, company_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM properties WHERE company_id = $1)
                OR EXISTS (SELECT 1 FROM technicians WHERE company_id = $1)
                OR EXISTS (SELECT 1 FROM emergency_vendors WHERE company_id = $1)
            "#,
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_vendors(
        &self,
        company_id: Uuid,
        vendors: &[NewEmergencyVendor],
    ) -> Result<Vec<EmergencyVendor>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(vendors.len());
        for vendor in vendors {
            let row = sqlx::query_as::<_, EmergencyVendor>(
                r#"
                INSERT INTO emergency_vendors (company_id, category, name, phone)
                VALUES ($1, $2, $3, $4)
                RETURNING id, company_id, category, name, phone
                "#,
            )
            .bind(company_id)
            .bind(&vendor.category)
            .bind(&vendor.name)
            .bind(vendor.phone.as_deref())
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_vendors(&self, company_id: Uuid) -> Result<Vec<EmergencyVendor>, AppError> {
        let rows = sqlx::query_as::<_, EmergencyVendor>(
            "SELECT id, company_id, category, name, phone FROM emergency_vendors WHERE company_id = $1 ORDER BY name",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
