// src/db/property_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::property::{NewProperty, Property, PropertyChanges, Unit, UnitChanges},
};

/// Propriedades e unidades. Toda consulta filtra por `company_id`.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn list(&self, company_id: Uuid) -> Result<Vec<Property>, AppError>;
    async fn find(&self, company_id: Uuid, property_id: Uuid) -> Result<Option<Property>, AppError>;
    async fn create(&self, company_id: Uuid, property: &NewProperty) -> Result<Property, AppError>;
    /// Inserção em lote, na ordem recebida.
    async fn create_many(&self, company_id: Uuid, properties: &[NewProperty]) -> Result<Vec<Property>, AppError>;
    async fn update(
        &self,
        company_id: Uuid,
        property_id: Uuid,
        changes: &PropertyChanges,
    ) -> Result<Option<Property>, AppError>;
    async fn delete(&self, company_id: Uuid, property_id: Uuid) -> Result<bool, AppError>;

    // --- Unidades ---
    async fn list_units(&self, company_id: Uuid, property_id: Uuid) -> Result<Vec<Unit>, AppError>;
    async fn list_company_units(&self, company_id: Uuid) -> Result<Vec<Unit>, AppError>;
    async fn find_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<Option<Unit>, AppError>;
    async fn find_unit_by_label(&self, property_id: Uuid, label: &str) -> Result<Option<Unit>, AppError>;
    /// Rótulo repetido na mesma propriedade vira conflito.
    async fn create_unit(
        &self,
        company_id: Uuid,
        property_id: Uuid,
        label: &str,
        notes: Option<&str>,
        is_active: bool,
    ) -> Result<Unit, AppError>;
    async fn update_unit(&self, company_id: Uuid, unit_id: Uuid, changes: &UnitChanges) -> Result<Option<Unit>, AppError>;
    async fn delete_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgPropertyRepository {
    pool: PgPool,
}

impl PgPropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROPERTY_COLUMNS: &str = "id, company_id, name, address, notes";
const UNIT_COLUMNS: &str = "id, company_id, property_id, label, notes, is_active";

#[async_trait]
impl PropertyRepository for PgPropertyRepository {
    async fn list(&self, company_id: Uuid) -> Result<Vec<Property>, AppError> {
        let rows = sqlx::query_as::<_, Property>(&format!(
            "SELECT {} FROM properties WHERE company_id = $1 ORDER BY name",
            PROPERTY_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find(&self, company_id: Uuid, property_id: Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query_as::<_, Property>(&format!(
            "SELECT {} FROM properties WHERE id = $1 AND company_id = $2",
            PROPERTY_COLUMNS
        ))
        .bind(property_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, company_id: Uuid, property: &NewProperty) -> Result<Property, AppError> {
        let row = sqlx::query_as::<_, Property>(&format!(
            "INSERT INTO properties (company_id, name, address, notes) VALUES ($1, $2, $3, $4) RETURNING {}",
            PROPERTY_COLUMNS
        ))
        .bind(company_id)
        .bind(&property.name)
        .bind(&property.address)
        .bind(property.notes.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_many(&self, company_id: Uuid, properties: &[NewProperty]) -> Result<Vec<Property>, AppError> {
        // Tudo ou nada.
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(properties.len());
        for property in properties {
            let row = sqlx::query_as::<_, Property>(&format!(
                "INSERT INTO properties (company_id, name, address, notes) VALUES ($1, $2, $3, $4) RETURNING {}",
                PROPERTY_COLUMNS
            ))
            .bind(company_id)
            .bind(&property.name)
            .bind(&property.address)
            .bind(property.notes.as_deref())
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn update(
        &self,
        company_id: Uuid,
        property_id: Uuid,
        changes: &PropertyChanges,
    ) -> Result<Option<Property>, AppError> {
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE properties SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(name) = &changes.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(address) = &changes.address {
                set.push("address = ").push_bind_unseparated(address.clone());
            }
            if let Some(notes) = &changes.notes {
                set.push("notes = ").push_bind_unseparated(notes.clone());
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(property_id)
            .push(" AND company_id = ")
            .push_bind(company_id)
            .push(format!(" RETURNING {}", PROPERTY_COLUMNS));

        let row = qb.build_query_as::<Property>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn delete(&self, company_id: Uuid, property_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1 AND company_id = $2")
            .bind(property_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_units(&self, company_id: Uuid, property_id: Uuid) -> Result<Vec<Unit>, AppError> {
        let rows = sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM property_units WHERE company_id = $1 AND property_id = $2 ORDER BY label",
            UNIT_COLUMNS
        ))
        .bind(company_id)
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_company_units(&self, company_id: Uuid) -> Result<Vec<Unit>, AppError> {
        let rows = sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM property_units WHERE company_id = $1 ORDER BY label",
            UNIT_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<Option<Unit>, AppError> {
        let row = sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM property_units WHERE id = $1 AND company_id = $2",
            UNIT_COLUMNS
        ))
        .bind(unit_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_unit_by_label(&self, property_id: Uuid, label: &str) -> Result<Option<Unit>, AppError> {
        let row = sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM property_units WHERE property_id = $1 AND label = $2",
            UNIT_COLUMNS
        ))
        .bind(property_id)
        .bind(label)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_unit(
        &self,
        company_id: Uuid,
        property_id: Uuid,
        label: &str,
        notes: Option<&str>,
        is_active: bool,
    ) -> Result<Unit, AppError> {
        sqlx::query_as::<_, Unit>(&format!(
            r#"
            INSERT INTO property_units (company_id, property_id, label, notes, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            UNIT_COLUMNS
        ))
        .bind(company_id)
        .bind(property_id)
        .bind(label)
        .bind(notes)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Unit"))
    }

    async fn update_unit(&self, company_id: Uuid, unit_id: Uuid, changes: &UnitChanges) -> Result<Option<Unit>, AppError> {
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE property_units SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(label) = &changes.label {
                set.push("label = ").push_bind_unseparated(label.clone());
            }
            if let Some(notes) = &changes.notes {
                set.push("notes = ").push_bind_unseparated(notes.clone());
            }
            if let Some(is_active) = changes.is_active {
                set.push("is_active = ").push_bind_unseparated(is_active);
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(unit_id)
            .push(" AND company_id = ")
            .push_bind(company_id)
            .push(format!(" RETURNING {}", UNIT_COLUMNS));

        qb.build_query_as::<Unit>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Unit"))
    }

    async fn delete_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM property_units WHERE id = $1 AND company_id = $2")
            .bind(unit_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
