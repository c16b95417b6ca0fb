// src/db/technician_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::technician::{NewTechnician, Technician, TechnicianChanges},
};

#[async_trait]
pub trait TechnicianRepository: Send + Sync {
    async fn list(&self, company_id: Uuid) -> Result<Vec<Technician>, AppError>;
    async fn find(&self, company_id: Uuid, technician_id: Uuid) -> Result<Option<Technician>, AppError>;
    async fn create(&self, company_id: Uuid, technician: &NewTechnician) -> Result<Technician, AppError>;
    async fn create_many(&self, company_id: Uuid, technicians: &[NewTechnician]) -> Result<Vec<Technician>, AppError>;
    async fn update(
        &self,
        company_id: Uuid,
        technician_id: Uuid,
        changes: &TechnicianChanges,
    ) -> Result<Option<Technician>, AppError>;
    async fn delete(&self, company_id: Uuid, technician_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgTechnicianRepository {
    pool: PgPool,
}

impl PgTechnicianRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// O nome da propriedade padrão vem de um LEFT JOIN; `t` pode ser a tabela ou uma CTE.
const TECHNICIAN_SELECT: &str = r#"
    SELECT t.id, t.company_id, t.user_id, t.first_name, t.last_name, t.phone, t.email,
           t.default_property_id, p.name AS default_property_name,
           t.shift, t.merit_percent, t.availability
"#;

const INSERT_TECHNICIAN: &str = r#"
    WITH t AS (
        INSERT INTO technicians
            (company_id, user_id, first_name, last_name, phone, email,
             default_property_id, shift, merit_percent, availability)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
    )
"#;

#[async_trait]
impl TechnicianRepository for PgTechnicianRepository {
    async fn list(&self, company_id: Uuid) -> Result<Vec<Technician>, AppError> {
        let rows = sqlx::query_as::<_, Technician>(&format!(
            "{} FROM technicians t LEFT JOIN properties p ON p.id = t.default_property_id
             WHERE t.company_id = $1 ORDER BY t.last_name, t.first_name",
            TECHNICIAN_SELECT
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find(&self, company_id: Uuid, technician_id: Uuid) -> Result<Option<Technician>, AppError> {
        let row = sqlx::query_as::<_, Technician>(&format!(
            "{} FROM technicians t LEFT JOIN properties p ON p.id = t.default_property_id
             WHERE t.id = $1 AND t.company_id = $2",
            TECHNICIAN_SELECT
        ))
        .bind(technician_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, company_id: Uuid, technician: &NewTechnician) -> Result<Technician, AppError> {
        let mut created = self.create_many(company_id, std::slice::from_ref(technician)).await?;
        created.pop().ok_or_else(|| anyhow::anyhow!("INSERT em technicians não retornou linha").into())
    }

    async fn create_many(&self, company_id: Uuid, technicians: &[NewTechnician]) -> Result<Vec<Technician>, AppError> {
        let sql = format!(
            "{} {} FROM t LEFT JOIN properties p ON p.id = t.default_property_id",
            INSERT_TECHNICIAN, TECHNICIAN_SELECT
        );

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(technicians.len());
        for tech in technicians {
            let row = sqlx::query_as::<_, Technician>(&sql)
                .bind(company_id)
                .bind(tech.user_id)
                .bind(&tech.first_name)
                .bind(&tech.last_name)
                .bind(tech.phone.as_deref())
                .bind(tech.email.as_deref())
                .bind(tech.default_property_id)
                .bind(tech.shift.as_deref())
                .bind(tech.merit_percent)
                .bind(&tech.availability)
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
        technician_id: Uuid,
        changes: &TechnicianChanges,
    ) -> Result<Option<Technician>, AppError> {
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE technicians SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(v) = &changes.first_name {
                set.push("first_name = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.last_name {
                set.push("last_name = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.phone {
                set.push("phone = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.email {
                set.push("email = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = changes.default_property_id {
                set.push("default_property_id = ").push_bind_unseparated(v);
            }
            if let Some(v) = &changes.shift {
                set.push("shift = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = changes.merit_percent {
                set.push("merit_percent = ").push_bind_unseparated(v);
            }
            if let Some(v) = &changes.availability {
                set.push("availability = ").push_bind_unseparated(v.clone());
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(technician_id)
            .push(" AND company_id = ")
            .push_bind(company_id)
            .push(" RETURNING id");

        let updated: Option<Uuid> = qb.build_query_scalar().fetch_optional(&self.pool).await?;
        match updated {
            Some(id) => self.find(company_id, id).await,
            None => Ok(None),
        }
    }

    async fn delete(&self, company_id: Uuid, technician_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM technicians WHERE id = $1 AND company_id = $2")
            .bind(technician_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
