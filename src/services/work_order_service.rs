// src/services/work_order_service.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{clean_optional_uuid, is_placeholder, normalize_priority, parse_uuid, PRIORITY_ROUTINE},
    },
    db::{PropertyRepository, TechnicianRepository, WorkOrderRepository},
    models::work_order::{
        CreateWorkOrderPayload, NewWorkOrder, PropertyOption, UnitOption, UpdateWorkOrderPayload, WorkOrder,
        WorkOrderChanges, WorkOrderFilter, WorkOrderListQuery, WorkOrderListResponse, WorkOrderOptionsResponse,
        DEFAULT_PAGE_LIMIT,
    },
};

#[derive(Clone)]
pub struct WorkOrderService {
    work_orders: Arc<dyn WorkOrderRepository>,
    properties: Arc<dyn PropertyRepository>,
    technicians: Arc<dyn TechnicianRepository>,
}

impl WorkOrderService {
    pub fn new(
        work_orders: Arc<dyn WorkOrderRepository>,
        properties: Arc<dyn PropertyRepository>,
        technicians: Arc<dyn TechnicianRepository>,
    ) -> Self {
        Self { work_orders, properties, technicians }
    }

    /// Abre uma ordem de serviço.
    ///
    /// A unidade vem de um `unit_id` (que precisa ser desta propriedade) ou de
    /// um rótulo livre; o rótulo é idempotente dentro da propriedade.
    pub async fn create(&self, company_id: Uuid, payload: &CreateWorkOrderPayload) -> Result<WorkOrder, AppError> {
        // 1. Propriedade da mesma empresa
        let property_id = parse_uuid(&payload.property_id, "property_id")?;
        if self.properties.find(company_id, property_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("Property".to_string()));
        }

        // 2. Prioridade
        let priority = match payload.priority.as_deref() {
            Some(value) if !is_placeholder(value) => normalize_priority(value)?,
            _ => PRIORITY_ROUTINE.to_string(),
        };

        // 3. Técnico
        let assigned_technician_id =
            clean_optional_uuid(payload.assigned_technician_id.as_deref(), "assigned_technician_id")?;
        if let Some(id) = assigned_technician_id {
            self.check_technician(company_id, id).await?;
        }

        // 4. Unidade
        let unit_id = clean_optional_uuid(payload.unit_id.as_deref(), "unit_id")?;
        let (unit_id, unit_label) = self
            .resolve_unit(company_id, property_id, unit_id, payload.unit_label.as_deref())
            .await?;

        let work_order = NewWorkOrder {
            property_id,
            unit_id,
            unit_label,
            issue: payload.issue.trim().to_string(),
            priority,
            pte: payload.pte,
            preferred_window: payload.preferred_window.clone(),
            tenant_name: payload.tenant_name.clone(),
            tenant_phone: payload.tenant_phone.clone(),
            assigned_technician_id,
        };

        let created = self.work_orders.create(company_id, &work_order).await?;
        tracing::info!("🛠️ Ordem de serviço {} aberta ({})", created.id, created.priority);
        Ok(created)
    }

    async fn check_technician(&self, company_id: Uuid, technician_id: Uuid) -> Result<(), AppError> {
        if self.technicians.find(company_id, technician_id).await?.is_none() {
            return Err(AppError::TechnicianNotInCompany);
        }
        Ok(())
    }

    async fn resolve_unit(
        &self,
        company_id: Uuid,
        property_id: Uuid,
        unit_id: Option<Uuid>,
        unit_label: Option<&str>,
    ) -> Result<(Option<Uuid>, Option<String>), AppError> {
        if let Some(unit_id) = unit_id {
            let unit = self
                .properties
                .find_unit(company_id, unit_id)
                .await?
                .filter(|u| u.property_id == property_id)
                .ok_or(AppError::UnitNotInProperty)?;
            return Ok((Some(unit.id), Some(unit.label)));
        }

        let Some(label) = unit_label.map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok((None, None));
        };

        if let Some(unit) = self.properties.find_unit_by_label(property_id, label).await? {
            return Ok((Some(unit.id), Some(unit.label)));
        }

        match self.properties.create_unit(company_id, property_id, label, None, true).await {
            Ok(unit) => Ok((Some(unit.id), Some(unit.label))),
            // Outra requisição criou o mesmo rótulo entre a busca e o insert
            Err(AppError::UniqueConstraintViolation(_)) => {
                let unit = self
                    .properties
                    .find_unit_by_label(property_id, label)
                    .await?
                    .ok_or_else(|| AppError::UniqueConstraintViolation("Unit".to_string()))?;
                Ok((Some(unit.id), Some(unit.label)))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, company_id: Uuid, work_order_id: Uuid) -> Result<WorkOrder, AppError> {
        self.work_orders
            .find(company_id, work_order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Work order".to_string()))
    }

    pub async fn list(&self, company_id: Uuid, query: &WorkOrderListQuery) -> Result<WorkOrderListResponse, AppError> {
        let priority = match query.priority.as_deref() {
            Some(value) if !is_placeholder(value) => Some(normalize_priority(value)?),
            _ => None,
        };
        let filter = WorkOrderFilter {
            status: query
                .status
                .as_deref()
                .filter(|s| !is_placeholder(s))
                .map(|s| s.trim().to_string()),
            priority,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            offset: query.offset.unwrap_or(0),
        };

        let (work_orders, total) = self.work_orders.list(company_id, &filter).await?;
        Ok(WorkOrderListResponse { work_orders, total, limit: filter.limit, offset: filter.offset })
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        work_order_id: Uuid,
        payload: &UpdateWorkOrderPayload,
    ) -> Result<WorkOrder, AppError> {
        self.get(company_id, work_order_id).await?;

        // String vazia (ou placeholder) desatribui
        let assigned_technician_id = match payload.assigned_technician_id.as_deref() {
            None => None,
            Some(value) => {
                let id = clean_optional_uuid(Some(value), "assigned_technician_id")?;
                if let Some(id) = id {
                    self.check_technician(company_id, id).await?;
                }
                Some(id)
            }
        };

        let changes = WorkOrderChanges {
            status: payload.status.as_deref().map(|s| s.trim().to_string()),
            priority: payload.priority.as_deref().map(normalize_priority).transpose()?,
            assigned_technician_id,
            issue: payload.issue.as_deref().map(|s| s.trim().to_string()),
            preferred_window: payload.preferred_window.clone(),
            tenant_name: payload.tenant_name.clone(),
            tenant_phone: payload.tenant_phone.clone(),
        };
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        self.work_orders
            .update(company_id, work_order_id, &changes)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Work order".to_string()))
    }

    /// Propriedades da empresa com suas unidades, para o formulário de abertura.
    pub async fn options(&self, company_id: Uuid) -> Result<WorkOrderOptionsResponse, AppError> {
        let properties = self.properties.list(company_id).await?;
        let units = self.properties.list_company_units(company_id).await?;

        let mut by_property: HashMap<Uuid, Vec<UnitOption>> = HashMap::new();
        for unit in units {
            by_property.entry(unit.property_id).or_default().push(UnitOption {
                id: unit.id,
                label: unit.label,
                notes: unit.notes,
                is_active: unit.is_active,
            });
        }

        let properties = properties
            .into_iter()
            .map(|p| {
                let mut units = by_property.remove(&p.id).unwrap_or_default();
                units.sort_by(|a, b| a.label.cmp(&b.label));
                PropertyOption { id: p.id, name: p.name, address: Some(p.address), notes: p.notes, units }
            })
            .collect();

        Ok(WorkOrderOptionsResponse { company_id, properties })
    }
}
