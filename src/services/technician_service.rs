// src/services/technician_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::clean_optional_uuid},
    db::{PropertyRepository, TechnicianRepository},
    models::technician::{
        CreateTechnicianPayload, NewTechnician, Technician, TechnicianChanges, UpdateTechnicianPayload,
        DEFAULT_AVAILABILITY, DEFAULT_MERIT_PERCENT,
    },
};

#[derive(Clone)]
pub struct TechnicianService {
    technicians: Arc<dyn TechnicianRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl TechnicianService {
    pub fn new(technicians: Arc<dyn TechnicianRepository>, properties: Arc<dyn PropertyRepository>) -> Self {
        Self { technicians, properties }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<Technician>, AppError> {
        self.technicians.list(company_id).await
    }

    pub async fn get(&self, company_id: Uuid, technician_id: Uuid) -> Result<Technician, AppError> {
        self.technicians
            .find(company_id, technician_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Technician".to_string()))
    }

    // Propriedade padrão só pode apontar para a própria empresa.
    async fn check_property(&self, company_id: Uuid, property_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = property_id {
            if self.properties.find(company_id, id).await?.is_none() {
                return Err(AppError::PropertyNotInCompany(id.to_string()));
            }
        }
        Ok(())
    }

    pub async fn create(&self, company_id: Uuid, payload: &CreateTechnicianPayload) -> Result<Technician, AppError> {
        let user_id = clean_optional_uuid(payload.user_id.as_deref(), "user_id")?;
        let default_property_id = clean_optional_uuid(payload.default_property_id.as_deref(), "default_property_id")?;
        self.check_property(company_id, default_property_id).await?;

        let technician = NewTechnician {
            user_id,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            phone: payload.phone.clone(),
            email: payload.email.clone(),
            default_property_id,
            shift: payload.shift.clone(),
            merit_percent: payload.merit_percent.unwrap_or(DEFAULT_MERIT_PERCENT),
            availability: payload
                .availability
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AVAILABILITY.to_string()),
        };

        self.technicians.create(company_id, &technician).await
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        technician_id: Uuid,
        payload: &UpdateTechnicianPayload,
    ) -> Result<Technician, AppError> {
        self.get(company_id, technician_id).await?;

        let default_property_id = match payload.default_property_id.as_deref() {
            Some(value) => Some(clean_optional_uuid(Some(value), "default_property_id")?),
            None => None,
        };
        if let Some(property_id) = default_property_id {
            self.check_property(company_id, property_id).await?;
        }

        let changes = TechnicianChanges {
            first_name: payload.first_name.as_deref().map(|s| s.trim().to_string()),
            last_name: payload.last_name.as_deref().map(|s| s.trim().to_string()),
            phone: payload.phone.clone(),
            email: payload.email.clone(),
            default_property_id,
            shift: payload.shift.clone(),
            merit_percent: payload.merit_percent,
            availability: payload.availability.clone(),
        };
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        self.technicians
            .update(company_id, technician_id, &changes)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Technician".to_string()))
    }

    pub async fn delete(&self, company_id: Uuid, technician_id: Uuid) -> Result<(), AppError> {
        if !self.technicians.delete(company_id, technician_id).await? {
            return Err(AppError::ResourceNotFound("Technician".to_string()));
        }
        Ok(())
    }
}
