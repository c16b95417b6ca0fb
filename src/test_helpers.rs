// src/test_helpers.rs
//
// Colaboradores em memória para os testes (unitários e de integração).
// Mesmos contratos dos repositórios Postgres e dos clientes HTTP.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    clients::{
        identity::ADMIN_PAGE_SIZE, GoogleClaims, GoogleTokenVerifier, Identity, IdentityProvider, NewIdentity, ObjectStore, OtpType,
        ProviderSession,
    },
    common::error::AppError,
    config::{AppState, Backends, Settings},
    db::{
        AccountRepository, OnboardingRepository, ProfileRepository, PropertyRepository, TechnicianRepository,
        WorkOrderRepository,
    },
    models::{
        account::{AppUser, AppUserUpsert, Company, CompanySettings, ONBOARDING_PENDING},
        onboarding::{EmergencyVendor, NewEmergencyVendor},
        profile::{
            Document, LocationPayload, NewOwner, NewServiceCategory, NewSubcontractor, NewSubcontractorService, Owner,
            ServiceCategory, DOCUMENT_PENDING_REVIEW,
        },
        property::{NewProperty, Property, PropertyChanges, Unit, UnitChanges},
        technician::{NewTechnician, Technician, TechnicianChanges},
        work_order::{NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderFilter},
    },
};

/// Código aceito pelo provedor falso em qualquer verificação por OTP.
pub const TEST_OTP: &str = "123456";
pub const GOOGLE_TOKEN_PREFIX: &str = "google:";

pub fn test_settings() -> Settings {
    Settings {
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        run_migrations: false,
        supabase_url: "http://identity.test".to_string(),
        supabase_key: "anon".to_string(),
        supabase_service_key: Some("service".to_string()),
        storage_bucket: "PMA".to_string(),
        google_client_id: "client-id".to_string(),
        jwt_secret: "test-secret-with-enough-entropy".to_string(),
        jwt_algorithm: "HS256".to_string(),
        access_token_minutes: 30,
        refresh_token_days: 7,
        cors_origins: vec![],
        frontend_url: "http://localhost:3000".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        rate_limit_per_minute: 10,
        max_upload_bytes: 1024 * 1024,
    }
}

// ============================================================================
// Banco em memória
// ============================================================================

#[derive(Default)]
struct Tables {
    companies: HashMap<Uuid, Company>,
    app_users: HashMap<Uuid, AppUser>,
    properties: Vec<Property>,
    units: Vec<Unit>,
    technicians: Vec<Technician>,
    work_orders: Vec<WorkOrder>,
    vendors: Vec<EmergencyVendor>,
    owners: Vec<Owner>,
    subcontractors: Vec<Uuid>,
    documents: Vec<Document>,
    categories: Vec<ServiceCategory>,
}

impl Tables {
    fn property_name(&self, property_id: Option<Uuid>) -> Option<String> {
        property_id.and_then(|id| self.properties.iter().find(|p| p.id == id).map(|p| p.name.clone()))
    }

    // Reproduz o LEFT JOIN dos repositórios Postgres.
    fn with_property_name(&self, mut technician: Technician) -> Technician {
        technician.default_property_name = self.property_name(technician.default_property_id);
        technician
    }

    fn with_work_order_joins(&self, mut work_order: WorkOrder) -> WorkOrder {
        work_order.property_name = self.property_name(Some(work_order.property_id));
        work_order
    }

    fn label_taken(&self, property_id: Uuid, label: &str, except: Option<Uuid>) -> bool {
        self.units
            .iter()
            .any(|u| u.property_id == property_id && u.label == label && Some(u.id) != except)
    }
}

/// Um único armazenamento que implementa todos os repositórios,
/// assim a sonda de existência enxerga propriedades, técnicos e fornecedores.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_create_company: AtomicBool,
    fail_upsert_app_user: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create_company(&self, fail: bool) {
        self.fail_create_company.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upsert_app_user(&self, fail: bool) {
        self.fail_upsert_app_user.store(fail, Ordering::SeqCst);
    }

    pub async fn company_count(&self) -> usize {
        self.tables.lock().await.companies.len()
    }

    pub async fn app_user(&self, user_id: Uuid) -> Option<AppUser> {
        self.tables.lock().await.app_users.get(&user_id).cloned()
    }

    pub async fn unit_count(&self, property_id: Uuid) -> usize {
        self.tables.lock().await.units.iter().filter(|u| u.property_id == property_id).count()
    }

    pub async fn seed_category(&self, name: &str, slug: &str, sort_order: i32) -> ServiceCategory {
        let category = ServiceCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            icon: None,
            is_active: true,
            sort_order,
        };
        self.tables.lock().await.categories.push(category.clone());
        category
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn find_app_user(&self, user_id: Uuid) -> Result<Option<AppUser>, AppError> {
        Ok(self.tables.lock().await.app_users.get(&user_id).cloned())
    }

    async fn upsert_app_user(&self, user_id: Uuid, fields: &AppUserUpsert) -> Result<AppUser, AppError> {
        if self.fail_upsert_app_user.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("falha injetada: upsert_app_user")));
        }
        let mut tables = self.tables.lock().await;
        let user = tables.app_users.entry(user_id).or_insert_with(|| AppUser {
            user_id,
            company_id: None,
            first_name: None,
            last_name: None,
            is_active: true,
            onboarding_status: ONBOARDING_PENDING.to_string(),
        });
        if fields.company_id.is_some() {
            user.company_id = fields.company_id;
        }
        if let Some(first_name) = &fields.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &fields.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(is_active) = fields.is_active {
            user.is_active = is_active;
        }
        if let Some(status) = &fields.onboarding_status {
            user.onboarding_status = status.clone();
        }
        Ok(user.clone())
    }

    async fn create_company(&self, name: &str) -> Result<Company, AppError> {
        if self.fail_create_company.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("falha injetada: create_company")));
        }
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            timezone: "America/Detroit".to_string(),
            work_hours_start: None,
            work_hours_end: None,
            auto_assign: true,
            intake: "manual".to_string(),
            collect_pte: true,
            collect_window: true,
            on_call_enabled: false,
            on_call_rotation: "weekly".to_string(),
            created_at: Utc::now(),
        };
        self.tables.lock().await.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn find_company(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.tables.lock().await.companies.get(&company_id).cloned())
    }

    async fn update_company_settings(&self, company_id: Uuid, settings: &CompanySettings) -> Result<Company, AppError> {
        let mut tables = self.tables.lock().await;
        let company = tables.companies.get_mut(&company_id).ok_or(AppError::CompanyRecordMissing)?;
        company.name = settings.name.clone();
        company.timezone = settings.timezone.clone();
        company.work_hours_start = Some(settings.work_hours_start);
        company.work_hours_end = Some(settings.work_hours_end);
        company.auto_assign = settings.auto_assign;
        company.intake = settings.intake.clone();
        company.collect_pte = settings.collect_pte;
        company.collect_window = settings.collect_window;
        company.on_call_enabled = settings.on_call_enabled;
        company.on_call_rotation = settings.on_call_rotation.clone();
        Ok(company.clone())
    }

    async fn delete_company(&self, company_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.companies.remove(&company_id);
        // ON DELETE SET NULL
        for user in tables.app_users.values_mut().filter(|u| u.company_id == Some(company_id)) {
            user.company_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyRepository for InMemoryStore {
    async fn list(&self, company_id: Uuid) -> Result<Vec<Property>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Property> =
            tables.properties.iter().filter(|p| p.company_id == company_id).cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find(&self, company_id: Uuid, property_id: Uuid) -> Result<Option<Property>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .properties
            .iter()
            .find(|p| p.id == property_id && p.company_id == company_id)
            .cloned())
    }

    async fn create(&self, company_id: Uuid, property: &NewProperty) -> Result<Property, AppError> {
        let row = Property {
            id: Uuid::new_v4(),
            company_id,
            name: property.name.clone(),
            address: property.address.clone(),
            notes: property.notes.clone(),
        };
        self.tables.lock().await.properties.push(row.clone());
        Ok(row)
    }

    async fn create_many(&self, company_id: Uuid, properties: &[NewProperty]) -> Result<Vec<Property>, AppError> {
        let mut created = Vec::with_capacity(properties.len());
        for property in properties {
            created.push(PropertyRepository::create(self, company_id, property).await?);
        }
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
        let mut tables = self.tables.lock().await;
        let Some(row) = tables
            .properties
            .iter_mut()
            .find(|p| p.id == property_id && p.company_id == company_id)
        else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            row.name = name.clone();
        }
        if let Some(address) = &changes.address {
            row.address = address.clone();
        }
        if let Some(notes) = &changes.notes {
            row.notes = Some(notes.clone());
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, company_id: Uuid, property_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.properties.len();
        tables.properties.retain(|p| !(p.id == property_id && p.company_id == company_id));
        let removed = tables.properties.len() < before;
        if removed {
            tables.units.retain(|u| u.property_id != property_id);
            tables.work_orders.retain(|w| w.property_id != property_id);
            for tech in tables.technicians.iter_mut().filter(|t| t.default_property_id == Some(property_id)) {
                tech.default_property_id = None;
            }
        }
        Ok(removed)
    }

    async fn list_units(&self, company_id: Uuid, property_id: Uuid) -> Result<Vec<Unit>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Unit> = tables
            .units
            .iter()
            .filter(|u| u.company_id == company_id && u.property_id == property_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(rows)
    }

    async fn list_company_units(&self, company_id: Uuid) -> Result<Vec<Unit>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Unit> = tables.units.iter().filter(|u| u.company_id == company_id).cloned().collect();
        rows.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(rows)
    }

    async fn find_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<Option<Unit>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.units.iter().find(|u| u.id == unit_id && u.company_id == company_id).cloned())
    }

    async fn find_unit_by_label(&self, property_id: Uuid, label: &str) -> Result<Option<Unit>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .units
            .iter()
            .find(|u| u.property_id == property_id && u.label == label)
            .cloned())
    }

    async fn create_unit(
        &self,
        company_id: Uuid,
        property_id: Uuid,
        label: &str,
        notes: Option<&str>,
        is_active: bool,
    ) -> Result<Unit, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.label_taken(property_id, label, None) {
            return Err(AppError::UniqueConstraintViolation("Unit".to_string()));
        }
        let unit = Unit {
            id: Uuid::new_v4(),
            company_id,
            property_id,
            label: label.to_string(),
            notes: notes.map(str::to_string),
            is_active,
        };
        tables.units.push(unit.clone());
        Ok(unit)
    }

    async fn update_unit(&self, company_id: Uuid, unit_id: Uuid, changes: &UnitChanges) -> Result<Option<Unit>, AppError> {
        if changes.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        let mut tables = self.tables.lock().await;
        let Some(position) = tables.units.iter().position(|u| u.id == unit_id && u.company_id == company_id) else {
            return Ok(None);
        };
        if let Some(label) = &changes.label {
            let property_id = tables.units[position].property_id;
            if tables.label_taken(property_id, label, Some(unit_id)) {
                return Err(AppError::UniqueConstraintViolation("Unit".to_string()));
            }
        }
        let unit = &mut tables.units[position];
        if let Some(label) = &changes.label {
            unit.label = label.clone();
        }
        if let Some(notes) = &changes.notes {
            unit.notes = Some(notes.clone());
        }
        if let Some(is_active) = changes.is_active {
            unit.is_active = is_active;
        }
        Ok(Some(unit.clone()))
    }

    async fn delete_unit(&self, company_id: Uuid, unit_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.units.len();
        tables.units.retain(|u| !(u.id == unit_id && u.company_id == company_id));
        Ok(tables.units.len() < before)
    }
}

#[async_trait]
impl TechnicianRepository for InMemoryStore {
    async fn list(&self, company_id: Uuid) -> Result<Vec<Technician>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Technician> = tables
            .technicians
            .iter()
            .filter(|t| t.company_id == company_id)
            .cloned()
            .map(|t| tables.with_property_name(t))
            .collect();
        rows.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(rows)
    }

    async fn find(&self, company_id: Uuid, technician_id: Uuid) -> Result<Option<Technician>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .technicians
            .iter()
            .find(|t| t.id == technician_id && t.company_id == company_id)
            .cloned()
            .map(|t| tables.with_property_name(t)))
    }

    async fn create(&self, company_id: Uuid, technician: &NewTechnician) -> Result<Technician, AppError> {
        let mut tables = self.tables.lock().await;
        let row = Technician {
            id: Uuid::new_v4(),
            company_id,
            user_id: technician.user_id,
            first_name: technician.first_name.clone(),
            last_name: technician.last_name.clone(),
            phone: technician.phone.clone(),
            email: technician.email.clone(),
            default_property_id: technician.default_property_id,
            default_property_name: None,
            shift: technician.shift.clone(),
            merit_percent: technician.merit_percent,
            availability: technician.availability.clone(),
        };
        tables.technicians.push(row.clone());
        Ok(tables.with_property_name(row))
    }

    async fn create_many(&self, company_id: Uuid, technicians: &[NewTechnician]) -> Result<Vec<Technician>, AppError> {
        let mut created = Vec::with_capacity(technicians.len());
        for technician in technicians {
            created.push(TechnicianRepository::create(self, company_id, technician).await?);
        }
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
        let mut tables = self.tables.lock().await;
        let Some(row) = tables
            .technicians
            .iter_mut()
            .find(|t| t.id == technician_id && t.company_id == company_id)
        else {
            return Ok(None);
        };
        if let Some(v) = &changes.first_name {
            row.first_name = v.clone();
        }
        if let Some(v) = &changes.last_name {
            row.last_name = v.clone();
        }
        if let Some(v) = &changes.phone {
            row.phone = Some(v.clone());
        }
        if let Some(v) = &changes.email {
            row.email = Some(v.clone());
        }
        if let Some(v) = changes.default_property_id {
            row.default_property_id = v;
        }
        if let Some(v) = &changes.shift {
            row.shift = Some(v.clone());
        }
        if let Some(v) = changes.merit_percent {
            row.merit_percent = v;
        }
        if let Some(v) = &changes.availability {
            row.availability = v.clone();
        }
        let updated = row.clone();
        Ok(Some(tables.with_property_name(updated)))
    }

    async fn delete(&self, company_id: Uuid, technician_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.technicians.len();
        tables.technicians.retain(|t| !(t.id == technician_id && t.company_id == company_id));
        let removed = tables.technicians.len() < before;
        if removed {
            for order in tables.work_orders.iter_mut().filter(|w| w.assigned_technician_id == Some(technician_id)) {
                order.assigned_technician_id = None;
            }
        }
        Ok(removed)
    }
}

// Mesmo CHECK da coluna `work_orders.issue`.
fn check_issue_length(issue: &str) -> Result<(), AppError> {
    if issue.chars().count() < 3 {
        return Err(AppError::DatabaseError(sqlx::Error::Protocol(
            "violates check constraint work_orders_issue_check".to_string(),
        )));
    }
    Ok(())
}

#[async_trait]
impl WorkOrderRepository for InMemoryStore {
    async fn create(&self, company_id: Uuid, work_order: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        check_issue_length(&work_order.issue)?;
        let mut tables = self.tables.lock().await;
        let row = WorkOrder {
            id: Uuid::new_v4(),
            company_id,
            property_id: work_order.property_id,
            property_name: None,
            unit_id: work_order.unit_id,
            unit_label: work_order.unit_label.clone(),
            issue: work_order.issue.clone(),
            priority: work_order.priority.clone(),
            status: "open".to_string(),
            pte: work_order.pte,
            preferred_window: work_order.preferred_window.clone(),
            tenant_name: work_order.tenant_name.clone(),
            tenant_phone: work_order.tenant_phone.clone(),
            assigned_technician_id: work_order.assigned_technician_id,
            created_at: Utc::now(),
        };
        tables.work_orders.push(row.clone());
        Ok(tables.with_work_order_joins(row))
    }

    async fn find(&self, company_id: Uuid, work_order_id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .work_orders
            .iter()
            .find(|w| w.id == work_order_id && w.company_id == company_id)
            .cloned()
            .map(|w| tables.with_work_order_joins(w)))
    }

    async fn list(&self, company_id: Uuid, filter: &WorkOrderFilter) -> Result<(Vec<WorkOrder>, i64), AppError> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<WorkOrder> = tables
            .work_orders
            .iter()
            .filter(|w| w.company_id == company_id)
            .filter(|w| filter.status.as_ref().is_none_or(|s| &w.status == s))
            .filter(|w| filter.priority.as_ref().is_none_or(|p| &w.priority == p))
            .cloned()
            .collect();
        // Mais recentes primeiro; a ordem de inserção desempata.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .map(|w| tables.with_work_order_joins(w))
            .collect();
        Ok((page, total))
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
        if let Some(issue) = &changes.issue {
            check_issue_length(issue)?;
        }
        let mut tables = self.tables.lock().await;
        let Some(row) = tables
            .work_orders
            .iter_mut()
            .find(|w| w.id == work_order_id && w.company_id == company_id)
        else {
            return Ok(None);
        };
        if let Some(v) = &changes.status {
            row.status = v.clone();
        }
        if let Some(v) = &changes.priority {
            row.priority = v.clone();
        }
        if let Some(v) = changes.assigned_technician_id {
            row.assigned_technician_id = v;
        }
        if let Some(v) = &changes.issue {
            row.issue = v.clone();
        }
        if let Some(v) = &changes.preferred_window {
            row.preferred_window = Some(v.clone());
        }
        if let Some(v) = &changes.tenant_name {
            row.tenant_name = Some(v.clone());
        }
        if let Some(v) = &changes.tenant_phone {
            row.tenant_phone = Some(v.clone());
        }
        let updated = row.clone();
        Ok(Some(tables.with_work_order_joins(updated)))
    }
}

#[async_trait]
impl OnboardingRepository for InMemoryStore {
    async fn company_has_records(&self, company_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.properties.iter().any(|p| p.company_id == company_id)
            || tables.technicians.iter().any(|t| t.company_id == company_id)
            || tables.vendors.iter().any(|v| v.company_id == company_id))
    }

    async fn create_vendors(&self, company_id: Uuid, vendors: &[NewEmergencyVendor]) -> Result<Vec<EmergencyVendor>, AppError> {
        let mut tables = self.tables.lock().await;
        let created: Vec<EmergencyVendor> = vendors
            .iter()
            .map(|v| EmergencyVendor {
                id: Uuid::new_v4(),
                company_id,
                category: v.category.clone(),
                name: v.name.clone(),
                phone: v.phone.clone(),
            })
            .collect();
        tables.vendors.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_vendors(&self, company_id: Uuid) -> Result<Vec<EmergencyVendor>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<EmergencyVendor> =
            tables.vendors.iter().filter(|v| v.company_id == company_id).cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn has_role_profile(&self, user_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.owners.iter().any(|o| o.user_id == user_id) || tables.subcontractors.contains(&user_id))
    }

    async fn create_owner(&self, owner: &NewOwner) -> Result<Owner, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.owners.iter().any(|o| o.user_id == owner.user_id) {
            return Err(AppError::RoleProfileAlreadyExists);
        }
        let row = Owner {
            user_id: owner.user_id,
            role: owner.role.clone(),
            company_name: owner.company_name.clone(),
            phone: owner.phone.clone(),
            business_registration_number: owner.business_registration_number.clone(),
            tax_id: owner.tax_id.clone(),
            portfolio_size: owner.portfolio_size,
            pma_document_path: owner.pma_document_path.clone(),
            created_at: Utc::now(),
        };
        tables.owners.push(row.clone());
        Ok(row)
    }

    async fn create_subcontractor(
        &self,
        subcontractor: &NewSubcontractor,
        _locations: &[LocationPayload],
        _services: &[NewSubcontractorService],
    ) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if tables.subcontractors.contains(&subcontractor.user_id) {
            return Err(AppError::RoleProfileAlreadyExists);
        }
        tables.subcontractors.push(subcontractor.user_id);
        Ok(())
    }

    async fn create_document(
        &self,
        user_id: Uuid,
        doc_type: &str,
        storage_path: &str,
        original_filename: &str,
    ) -> Result<Document, AppError> {
        let row = Document {
            id: Uuid::new_v4(),
            user_id,
            doc_type: doc_type.to_string(),
            storage_path: storage_path.to_string(),
            original_filename: original_filename.to_string(),
            status: DOCUMENT_PENDING_REVIEW.to_string(),
            created_at: Utc::now(),
        };
        self.tables.lock().await.documents.push(row.clone());
        Ok(row)
    }

    async fn list_categories(&self) -> Result<Vec<ServiceCategory>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows = tables.categories.clone();
        rows.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));
        Ok(rows)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<ServiceCategory>, AppError> {
        Ok(self.tables.lock().await.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<ServiceCategory>, AppError> {
        Ok(self.tables.lock().await.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<ServiceCategory>, AppError> {
        Ok(self.tables.lock().await.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn create_category(&self, category: &NewServiceCategory) -> Result<ServiceCategory, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.categories.iter().any(|c| c.slug == category.slug) {
            return Err(AppError::UniqueConstraintViolation("Service category".to_string()));
        }
        let row = ServiceCategory {
            id: Uuid::new_v4(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            icon: category.icon.clone(),
            is_active: true,
            sort_order: 0,
        };
        tables.categories.push(row.clone());
        Ok(row)
    }
}

// ============================================================================
// Provedor de identidade falso
// ============================================================================

struct Account {
    identity: Identity,
    password: String,
}

#[derive(Default)]
struct IdentityTables {
    accounts: HashMap<Uuid, Account>,
    // token de sessão do provedor -> usuário
    sessions: HashMap<String, Uuid>,
    link_tokens: HashMap<String, Uuid>,
    sent_otps: Vec<(String, OtpType)>,
    magic_links: Vec<String>,
}

impl IdentityTables {
    fn find_by_email(&self, email: &str) -> Option<Uuid> {
        let wanted = email.trim().to_lowercase();
        self.accounts
            .values()
            .find(|a| a.identity.email.as_deref().map(str::to_lowercase).as_deref() == Some(wanted.as_str()))
            .map(|a| a.identity.id)
    }

    fn open_session(&mut self, user_id: Uuid) -> Result<ProviderSession, AppError> {
        let account = self
            .accounts
            .get(&user_id)
            .ok_or_else(|| AppError::Upstream("user not found".to_string()))?;
        let token = format!("provider-{}", Uuid::new_v4());
        let user = account.identity.clone();
        self.sessions.insert(token.clone(), user_id);
        Ok(ProviderSession { access_token: Some(token), user })
    }

    fn confirm(&mut self, user_id: Uuid) {
        if let Some(account) = self.accounts.get_mut(&user_id) {
            if account.identity.email_confirmed_at.is_none() {
                account.identity.email_confirmed_at = Some(Utc::now());
            }
        }
    }
}

/// Provedor em memória. Todo OTP válido é `TEST_OTP`.
pub struct FakeIdentityProvider {
    tables: Mutex<IdentityTables>,
    admin_credential: AtomicBool,
    admin_page_size: AtomicU32,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self {
            tables: Mutex::default(),
            admin_credential: AtomicBool::new(true),
            admin_page_size: AtomicU32::new(ADMIN_PAGE_SIZE),
        }
    }
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_admin_credential(&self, enabled: bool) {
        self.admin_credential.store(enabled, Ordering::SeqCst);
    }

    /// Páginas pequenas para exercitar a paginação da listagem administrativa.
    pub fn set_admin_page_size(&self, per_page: u32) {
        self.admin_page_size.store(per_page, Ordering::SeqCst);
    }

    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.accounts.len()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<Identity> {
        let tables = self.tables.lock().await;
        tables
            .find_by_email(email)
            .and_then(|id| tables.accounts.get(&id))
            .map(|a| a.identity.clone())
    }

    pub async fn sent_otps(&self) -> Vec<(String, OtpType)> {
        self.tables.lock().await.sent_otps.clone()
    }

    pub async fn magic_links(&self) -> Vec<String> {
        self.tables.lock().await.magic_links.clone()
    }

    /// Token de link de verificação, resgatável uma única vez por `verify_link`.
    pub async fn issue_link_token(&self, user_id: Uuid) -> String {
        let token = format!("link-{}", Uuid::new_v4());
        self.tables.lock().await.link_tokens.insert(token.clone(), user_id);
        token
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn has_admin_credential(&self) -> bool {
        self.admin_credential.load(Ordering::SeqCst)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let mut tables = self.tables.lock().await;
        let user_id = tables
            .find_by_email(email)
            .filter(|id| tables.accounts.get(id).is_some_and(|a| a.password == password))
            .ok_or_else(|| AppError::Upstream("invalid login credentials".to_string()))?;
        tables.open_session(user_id)
    }

    async fn sign_in_with_id_token(&self, provider: &str, id_token: &str) -> Result<ProviderSession, AppError> {
        let email = id_token
            .strip_prefix(GOOGLE_TOKEN_PREFIX)
            .filter(|_| provider == "google")
            .ok_or_else(|| AppError::Upstream("bad id token".to_string()))?;
        let mut tables = self.tables.lock().await;
        let user_id = tables
            .find_by_email(email)
            .ok_or_else(|| AppError::Upstream("user not found".to_string()))?;
        tables.open_session(user_id)
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity, AppError> {
        let tables = self.tables.lock().await;
        tables
            .sessions
            .get(access_token)
            .and_then(|id| tables.accounts.get(id))
            .map(|a| a.identity.clone())
            .ok_or_else(|| AppError::Upstream("invalid session".to_string()))
    }

    async fn send_otp(&self, email: &str, otp_type: OtpType) -> Result<(), AppError> {
        self.tables.lock().await.sent_otps.push((email.trim().to_lowercase(), otp_type));
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str, otp_type: OtpType) -> Result<ProviderSession, AppError> {
        let mut tables = self.tables.lock().await;
        let user_id = tables
            .find_by_email(email)
            .filter(|_| code == TEST_OTP)
            .ok_or_else(|| AppError::Upstream("token has expired or is invalid".to_string()))?;
        if otp_type == OtpType::Signup {
            tables.confirm(user_id);
        }
        tables.open_session(user_id)
    }

    async fn update_password(&self, session_token: &str, new_password: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let user_id = *tables
            .sessions
            .get(session_token)
            .ok_or_else(|| AppError::Upstream("invalid session".to_string()))?;
        if let Some(account) = tables.accounts.get_mut(&user_id) {
            account.password = new_password.to_string();
        }
        Ok(())
    }

    async fn verify_link(&self, token: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let user_id = tables
            .link_tokens
            .remove(token)
            .ok_or_else(|| AppError::Upstream("invalid link".to_string()))?;
        tables.confirm(user_id);
        Ok(())
    }

    async fn verify_token_hash(&self, _token_hash: &str) -> Result<(), AppError> {
        Err(AppError::Upstream("invalid token hash".to_string()))
    }

    async fn verify_raw_token(&self, _token: &str) -> Result<(), AppError> {
        Err(AppError::Upstream("invalid token".to_string()))
    }

    async fn admin_create_user(&self, new_identity: &NewIdentity) -> Result<Identity, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.find_by_email(&new_identity.email).is_some() {
            return Err(AppError::EmailAlreadyExists);
        }
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(new_identity.email.trim().to_lowercase()),
            email_confirmed_at: new_identity.email_confirm.then(Utc::now),
            user_metadata: new_identity.user_metadata.clone(),
        };
        tables.accounts.insert(
            identity.id,
            Account { identity: identity.clone(), password: new_identity.password.clone() },
        );
        Ok(identity)
    }

    async fn admin_get_user(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        Ok(self.tables.lock().await.accounts.get(&id).map(|a| a.identity.clone()))
    }

    fn admin_page_size(&self) -> u32 {
        self.admin_page_size.load(Ordering::SeqCst)
    }

    // Ordem estável por e-mail, como uma listagem paginada de verdade.
    async fn admin_list_users(&self, page: u32, per_page: u32) -> Result<Vec<Identity>, AppError> {
        let tables = self.tables.lock().await;
        let mut users: Vec<Identity> = tables.accounts.values().map(|a| a.identity.clone()).collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        let skip = (page.max(1) as usize - 1) * per_page as usize;
        Ok(users.into_iter().skip(skip).take(per_page as usize).collect())
    }

    async fn admin_delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.accounts.remove(&id);
        tables.sessions.retain(|_, user| *user != id);
        Ok(())
    }

    async fn admin_confirm_email(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.accounts.contains_key(&id) {
            return Err(AppError::Upstream("user not found".to_string()));
        }
        tables.confirm(id);
        Ok(())
    }

    async fn admin_generate_magic_link(&self, email: &str, _redirect_to: &str) -> Result<(), AppError> {
        self.tables.lock().await.magic_links.push(email.to_string());
        Ok(())
    }
}

// ============================================================================
// Storage e Google falsos
// ============================================================================

#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl FakeObjectStore {
    pub async fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().await.get(path).cloned()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.objects.lock().await.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn create_signed_url(&self, path: &str, expires_in: u64) -> Result<String, AppError> {
        Ok(format!("https://storage.test/object/sign/{}?expires_in={}", path, expires_in))
    }
}

/// Aceita tokens `google:<email>`; qualquer outro é inválido.
#[derive(Default)]
pub struct FakeGoogleVerifier;

#[async_trait]
impl GoogleTokenVerifier for FakeGoogleVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleClaims, AppError> {
        let email = id_token.strip_prefix(GOOGLE_TOKEN_PREFIX).ok_or(AppError::InvalidToken)?;
        Ok(GoogleClaims {
            sub: format!("google-{}", email),
            email: Some(email.to_string()),
            email_verified: true,
            given_name: Some("Grace".to_string()),
            family_name: Some("Hopper".to_string()),
            name: Some("Grace Hopper".to_string()),
        })
    }
}

// ============================================================================
// Montagem
// ============================================================================

/// Referências concretas aos falsos, para os testes inspecionarem o estado.
#[derive(Clone)]
pub struct TestBackends {
    pub store: Arc<InMemoryStore>,
    pub identity: Arc<FakeIdentityProvider>,
    pub storage: Arc<FakeObjectStore>,
}

impl TestBackends {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            identity: Arc::new(FakeIdentityProvider::new()),
            storage: Arc::new(FakeObjectStore::default()),
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            accounts: self.store.clone(),
            properties: self.store.clone(),
            technicians: self.store.clone(),
            work_orders: self.store.clone(),
            onboarding: self.store.clone(),
            profiles: self.store.clone(),
            identity: self.identity.clone(),
            storage: self.storage.clone(),
            google: Arc::new(FakeGoogleVerifier),
        }
    }
}

impl Default for TestBackends {
    fn default() -> Self {
        Self::new()
    }
}

pub fn test_app_state(settings: Settings) -> anyhow::Result<(AppState, TestBackends)> {
    let fakes = TestBackends::new();
    let state = AppState::from_backends(settings, fakes.backends())?;
    Ok((state, fakes))
}
