// src/db/work_order_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::work_order::{NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderFilter},
};

#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    async fn create(&self, company_id: Uuid, work_order: &NewWorkOrder) -> Result<WorkOrder, AppError>;
    async fn find(&self, company_id: Uuid, work_order_id: Uuid) -> Result<Option<WorkOrder>, AppError>;
    /// Página mais recente primeiro, junto do total que casa com o filtro.
    async fn list(&self, company_id: Uuid, filter: &WorkOrderFilter) -> Result<(Vec<WorkOrder>, i64), AppError>;
    async fn update(
        &self,
        company_id: Uuid,
        work_order_id: Uuid,
        changes: &WorkOrderChanges,
    ) -> Result<Option<WorkOrder>, AppError>;
}

#[derive(Clone)]
pub struct PgWorkOrderRepository {
    pool: PgPool,
}

impl PgWorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const WORK_ORDER_SELECT: &str = r#"
    SELECT w.id, w.company_id, w.property_id, p.name AS property_name,
           w.unit_id, w.unit AS unit_label, w.issue, w.priority, w.status, w.pte,
           w.preferred_window, w.tenant_name, w.tenant_phone,
           w.assigned_technician_id, w.created_at
"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, company_id: Uuid, filter: &WorkOrderFilter) {
    qb.push(" WHERE w.company_id = ").push_bind(company_id);
    if let Some(status) = &filter.status {
        qb.push(" AND w.status = ").push_bind(status.clone());
    }
    if let Some(priority) = &filter.priority {
        qb.push(" AND w.priority = ").push_bind(priority.clone());
    }
}

#[async_trait]
impl WorkOrderRepository for PgWorkOrderRepository {
    async fn create(&self, company_id: Uuid, work_order: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        let row = sqlx::query_as::<_, WorkOrder>(&format!(
            r#"
            WITH w AS (
                INSERT INTO work_orders
                    (company_id, property_id, unit_id, unit, issue, priority, pte,
                     preferred_window, tenant_name, tenant_phone, assigned_technician_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
            )
            {} FROM w LEFT JOIN properties p ON p.id = w.property_id
            "#,
            WORK_ORDER_SELECT
        ))
        .bind(company_id)
        .bind(work_order.property_id)
        .bind(work_order.unit_id)
        .bind(work_order.unit_label.as_deref())
        .bind(&work_order.issue)
        .bind(&work_order.priority)
        .bind(work_order.pte)
        .bind(work_order.preferred_window.as_deref())
        .bind(work_order.tenant_name.as_deref())
        .bind(work_order.tenant_phone.as_deref())
        .bind(work_order.assigned_technician_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find(&self, company_id: Uuid, work_order_id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let row = sqlx::query_as::<_, WorkOrder>(&format!(
            "{} FROM work_orders w LEFT JOIN properties p ON p.id = w.property_id
             WHERE w.id = $1 AND w.company_id = $2",
            WORK_ORDER_SELECT
        ))
        .bind(work_order_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, company_id: Uuid, filter: &WorkOrderFilter) -> Result<(Vec<WorkOrder>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM work_orders w");
        push_filters(&mut count_qb, company_id, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(WORK_ORDER_SELECT);
        qb.push(" FROM work_orders w LEFT JOIN properties p ON p.id = w.property_id");
        push_filters(&mut qb, company_id, filter);
        qb.push(" ORDER BY w.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = qb.build_query_as::<WorkOrder>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    async fn update(
        &self,
        company_id: Uuid,
        work_order_id: Uuid,
        changes: &WorkOrderChanges,
    ) -> Result<Option<WorkOrder>, AppError> {
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE work_orders SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(v) = &changes.status {
                set.push("status = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.priority {
                set.push("priority = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = changes.assigned_technician_id {
                set.push("assigned_technician_id = ").push_bind_unseparated(v);
            }
            if let Some(v) = &changes.issue {
                set.push("issue = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.preferred_window {
                set.push("preferred_window = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.tenant_name {
                set.push("tenant_name = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.tenant_phone {
                set.push("tenant_phone = ").push_bind_unseparated(v.clone());
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(work_order_id)
            .push(" AND company_id = ")
            .push_bind(company_id)
            .push(" RETURNING id");

        let updated: Option<Uuid> = qb.build_query_scalar().fetch_optional(&self.pool).await?;
        match updated {
            Some(id) => self.find(company_id, id).await,
            None => Ok(None),
        }
    }
}
