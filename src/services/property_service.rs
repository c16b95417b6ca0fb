// src/services/property_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PropertyRepository,
    models::property::{CreatePropertyPayload, CreateUnitPayload, NewProperty, Property, PropertyChanges, Unit, UnitChanges},
};

/// Propriedades e unidades. Todo método recebe o `company_id` já resolvido
/// e filtra por ele; linha de outra empresa é simplesmente "não encontrada".
#[derive(Clone)]
pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
}

impl PropertyService {
    pub fn new(properties: Arc<dyn PropertyRepository>) -> Self {
        Self { properties }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<Property>, AppError> {
        self.properties.list(company_id).await
    }

    pub async fn get(&self, company_id: Uuid, property_id: Uuid) -> Result<Property, AppError> {
        self.properties
            .find(company_id, property_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Property".to_string()))
    }

    pub async fn create(&self, company_id: Uuid, payload: CreatePropertyPayload) -> Result<Property, AppError> {
        let property = self.properties.create(company_id, &NewProperty::from(payload)).await?;
        tracing::info!("🏠 Propriedade '{}' criada na empresa {}", property.name, company_id);
        Ok(property)
    }

    pub async fn update(&self, company_id: Uuid, property_id: Uuid, changes: &PropertyChanges) -> Result<Property, AppError> {
        self.get(company_id, property_id).await?;
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        self.properties
            .update(company_id, property_id, changes)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Property".to_string()))
    }

    pub async fn delete(&self, company_id: Uuid, property_id: Uuid) -> Result<(), AppError> {
        if !self.properties.delete(company_id, property_id).await? {
            return Err(AppError::ResourceNotFound("Property".to_string()));
        }
        Ok(())
    }

    // --- Unidades ---

    pub async fn list_units(&self, company_id: Uuid, property_id: Uuid) -> Result<Vec<Unit>, AppError> {
        self.get(company_id, property_id).await?;
        self.properties.list_units(company_id, property_id).await
    }

    pub async fn create_unit(&self, company_id: Uuid, property_id: Uuid, payload: &CreateUnitPayload) -> Result<Unit, AppError> {
        // A propriedade precisa ser da mesma empresa
        self.get(company_id, property_id).await?;
        self.properties
            .create_unit(
                company_id,
                property_id,
                payload.label.trim(),
                payload.notes.as_deref(),
                payload.is_active,
            )
            .await
    }

    pub async fn update_unit(&self, company_id: Uuid, unit_id: Uuid, changes: &UnitChanges) -> Result<Unit, AppError> {
        if self.properties.find_unit(company_id, unit_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("Unit".to_string()));
        }
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        self.properties
            .update_unit(company_id, unit_id, changes)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Unit".to_string()))
    }

    pub async fn delete_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<(), AppError> {
        if !self.properties.delete_unit(company_id, unit_id).await? {
            return Err(AppError::ResourceNotFound("Unit".to_string()));
        }
        Ok(())
    }
}
