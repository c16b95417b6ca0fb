// src/db/profile_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::profile::{
        Document, LocationPayload, NewOwner, NewServiceCategory, NewSubcontractor, NewSubcontractorService,
        Owner, ServiceCategory,
    },
};

/// Perfis por papel (owners / subcontractors), documentos e categorias de serviço.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Existe linha em `owners` ou em `subcontractors` para esta identidade?
    async fn has_role_profile(&self, user_id: Uuid) -> Result<bool, AppError>;
    async fn create_owner(&self, owner: &NewOwner) -> Result<Owner, AppError>;
    /// Subcontratado, locais e serviços numa única transação.
    async fn create_subcontractor(
        &self,
        subcontractor: &NewSubcontractor,
        locations: &[LocationPayload],
        services: &[NewSubcontractorService],
    ) -> Result<(), AppError>;

    async fn create_document(
        &self,
        user_id: Uuid,
        doc_type: &str,
        storage_path: &str,
        original_filename: &str,
    ) -> Result<Document, AppError>;

    async fn list_categories(&self) -> Result<Vec<ServiceCategory>, AppError>;
    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<ServiceCategory>, AppError>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<ServiceCategory>, AppError>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<ServiceCategory>, AppError>;
    async fn create_category(&self, category: &NewServiceCategory) -> Result<ServiceCategory, AppError>;
}

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, description, icon, is_active, sort_order";

// PK duplicada em owners/subcontractors = perfil já existe.
fn map_role_conflict(e: sqlx::Error) -> AppError {
    match map_unique_violation(e, "Role profile") {
        AppError::UniqueConstraintViolation(_) => AppError::RoleProfileAlreadyExists,
        other => other,
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn has_role_profile(&self, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM owners WHERE user_id = $1)
                OR EXISTS (SELECT 1 FROM subcontractors WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_owner(&self, owner: &NewOwner) -> Result<Owner, AppError> {
        sqlx::query_as::<_, Owner>(
            r#"
            INSERT INTO owners
                (user_id, role, company_name, phone, business_registration_number,
                 tax_id, portfolio_size, pma_document_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.role)
        .bind(owner.company_name.as_deref())
        .bind(owner.phone.as_deref())
        .bind(owner.business_registration_number.as_deref())
        .bind(owner.tax_id.as_deref())
        .bind(owner.portfolio_size)
        .bind(owner.pma_document_path.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_role_conflict)
    }

    async fn create_subcontractor(
        &self,
        subcontractor: &NewSubcontractor,
        locations: &[LocationPayload],
        services: &[NewSubcontractorService],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO subcontractors
                (user_id, business_name, phone, license_number, insurance_provider,
                 service_radius_miles, primary_service_category_id, years_in_business)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(subcontractor.user_id)
        .bind(&subcontractor.business_name)
        .bind(subcontractor.phone.as_deref())
        .bind(subcontractor.license_number.as_deref())
        .bind(subcontractor.insurance_provider.as_deref())
        .bind(subcontractor.service_radius_miles)
        .bind(subcontractor.primary_service_category_id)
        .bind(subcontractor.years_in_business)
        .execute(&mut *tx)
        .await
        .map_err(map_role_conflict)?;

        for loc in locations {
            sqlx::query(
                r#"
                INSERT INTO subcontractor_locations
                    (subcontractor_id, address, city, state, postal_code, latitude, longitude, is_primary)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(subcontractor.user_id)
            .bind(&loc.address)
            .bind(loc.city.as_deref())
            .bind(loc.state.as_deref())
            .bind(loc.postal_code.as_deref())
            .bind(loc.latitude)
            .bind(loc.longitude)
            .bind(loc.is_primary)
            .execute(&mut *tx)
            .await?;
        }

        for service in services {
            sqlx::query(
                "INSERT INTO subcontractor_services (subcontractor_id, category_id, description) VALUES ($1, $2, $3)",
            )
            .bind(subcontractor.user_id)
            .bind(service.category_id)
            .bind(service.description.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_document(
        &self,
        user_id: Uuid,
        doc_type: &str,
        storage_path: &str,
        original_filename: &str,
    ) -> Result<Document, AppError> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO user_documents (user_id, doc_type, storage_path, original_filename)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, doc_type, storage_path, original_filename, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(doc_type)
        .bind(storage_path)
        .bind(original_filename)
        .fetch_one(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn list_categories(&self) -> Result<Vec<ServiceCategory>, AppError> {
        let rows = sqlx::query_as::<_, ServiceCategory>(&format!(
            "SELECT {} FROM service_categories ORDER BY sort_order, name",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<ServiceCategory>, AppError> {
        let row = sqlx::query_as::<_, ServiceCategory>(&format!(
            "SELECT {} FROM service_categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<ServiceCategory>, AppError> {
        let row = sqlx::query_as::<_, ServiceCategory>(&format!(
            "SELECT {} FROM service_categories WHERE slug = $1",
            CATEGORY_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<ServiceCategory>, AppError> {
        let row = sqlx::query_as::<_, ServiceCategory>(&format!(
            "SELECT {} FROM service_categories WHERE name = $1 LIMIT 1",
            CATEGORY_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_category(&self, category: &NewServiceCategory) -> Result<ServiceCategory, AppError> {
        sqlx::query_as::<_, ServiceCategory>(&format!(
            r#"
            INSERT INTO service_categories (name, slug, description, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.description.as_deref())
        .bind(category.icon.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Service category"))
    }
}
