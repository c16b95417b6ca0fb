// src/services/profile_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    clients::ObjectStore,
    common::{
        error::AppError,
        validation::{is_placeholder, sanitize_filename, slugify},
    },
    db::{AccountRepository, ProfileRepository},
    models::{
        account::{AppUserUpsert, ONBOARDING_COMPLETED},
        profile::{
            CreateCategoryPayload, DocumentUploadResponse, NewOwner, NewServiceCategory, NewSubcontractor,
            NewSubcontractorService, OwnerOnboardingPayload, RoleOnboardingResult, ServiceCategory,
            SignedUrlResponse, SubcontractorOnboardingPayload, DEFAULT_SIGNED_URL_TTL, DOC_TYPE_PMA,
            ROLE_PROPERTY_MANAGER, ROLE_SUBCONTRACTOR,
        },
    },
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct ProfileService {
    accounts: Arc<dyn AccountRepository>,
    profiles: Arc<dyn ProfileRepository>,
    storage: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl ProfileService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        profiles: Arc<dyn ProfileRepository>,
        storage: Arc<dyn ObjectStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self { accounts, profiles, storage, max_upload_bytes }
    }

    async fn ensure_no_role_profile(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.profiles.has_role_profile(user_id).await? {
            return Err(AppError::RoleProfileAlreadyExists);
        }
        Ok(())
    }

    // Cria o app_user se ainda não existir.
    async fn mark_completed(&self, user_id: Uuid) -> Result<String, AppError> {
        let profile = self
            .accounts
            .upsert_app_user(
                user_id,
                &AppUserUpsert { onboarding_status: Some(ONBOARDING_COMPLETED.to_string()), ..Default::default() },
            )
            .await?;
        Ok(profile.onboarding_status)
    }

    // ========================================================================
    // Owner / Property manager
    // ========================================================================

    /// Gestor de imóveis precisa de um PMA já enviado; proprietário não.
    pub async fn onboard_owner(&self, user_id: Uuid, payload: &OwnerOnboardingPayload) -> Result<RoleOnboardingResult, AppError> {
        self.ensure_no_role_profile(user_id).await?;

        let pma_document_path = non_blank(payload.pma_document_url.as_deref());
        if payload.role == ROLE_PROPERTY_MANAGER && pma_document_path.is_none() {
            return Err(AppError::PmaDocumentRequired);
        }

        let owner = self
            .profiles
            .create_owner(&NewOwner {
                user_id,
                role: payload.role.clone(),
                company_name: non_blank(payload.company_name.as_deref()),
                phone: non_blank(payload.phone.as_deref()),
                business_registration_number: non_blank(payload.business_registration_number.as_deref()),
                tax_id: non_blank(payload.tax_id.as_deref()),
                portfolio_size: payload.portfolio_size,
                pma_document_path,
            })
            .await?;

        let onboarding_status = self.mark_completed(user_id).await?;
        tracing::info!("Perfil '{}' criado para {}", owner.role, user_id);

        Ok(RoleOnboardingResult {
            success: true,
            user_id,
            role: owner.role,
            onboarding_status,
            locations_total: 0,
            services_total: 0,
        })
    }

    // ========================================================================
    // Subcontractor
    // ========================================================================

    pub async fn onboard_subcontractor(
        &self,
        user_id: Uuid,
        payload: &SubcontractorOnboardingPayload,
    ) -> Result<RoleOnboardingResult, AppError> {
        self.ensure_no_role_profile(user_id).await?;

        // Categorias resolvidas antes de qualquer escrita
        let primary_service_category_id = match payload.primary_service_category_id.as_deref() {
            Some(value) if !is_placeholder(value) => Some(self.resolve_category(value).await?.id),
            _ => None,
        };

        let mut services = Vec::with_capacity(payload.services.len());
        for service in &payload.services {
            let category = self.resolve_category(&service.category_id).await?;
            services.push(NewSubcontractorService {
                category_id: category.id,
                description: non_blank(service.description.as_deref()),
            });
        }

        let subcontractor = NewSubcontractor {
            user_id,
            business_name: payload.business_name.trim().to_string(),
            phone: non_blank(payload.phone.as_deref()),
            license_number: non_blank(payload.license_number.as_deref()),
            insurance_provider: non_blank(payload.insurance_provider.as_deref()),
            service_radius_miles: payload.service_radius_miles,
            primary_service_category_id,
            years_in_business: payload.years_in_business,
        };
        self.profiles
            .create_subcontractor(&subcontractor, &payload.locations, &services)
            .await?;

        let onboarding_status = self.mark_completed(user_id).await?;

        Ok(RoleOnboardingResult {
            success: true,
            user_id,
            role: ROLE_SUBCONTRACTOR.to_string(),
            onboarding_status,
            locations_total: payload.locations.len(),
            services_total: services.len(),
        })
    }

    /// UUID -> por id; senão por slug; senão pelo nome exato.
    pub async fn resolve_category(&self, value: &str) -> Result<ServiceCategory, AppError> {
        let value = value.trim();
        let found = match Uuid::parse_str(value) {
            Ok(id) => self.profiles.find_category_by_id(id).await?,
            Err(_) => match self.profiles.find_category_by_slug(value).await? {
                Some(category) => Some(category),
                None => self.profiles.find_category_by_name(value).await?,
            },
        };
        found.ok_or_else(|| AppError::UnknownServiceCategory(value.to_string()))
    }

    // ========================================================================
    // Documentos
    // ========================================================================

    /// Caminho `<user_id>/<unix_millis>_<nome sanitizado>`: sem colisão, sem sobrescrita.
    pub async fn upload_pma(
        &self,
        user_id: Uuid,
        filename: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<DocumentUploadResponse, AppError> {
        if bytes.is_empty() {
            return Err(AppError::InvalidFile("empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::InvalidFile(format!("> {} bytes", self.max_upload_bytes)));
        }

        let original_filename = non_blank(Some(filename)).unwrap_or_else(|| "document".to_string());
        let path = format!(
            "{}/{}_{}",
            user_id,
            Utc::now().timestamp_millis(),
            sanitize_filename(&original_filename)
        );

        self.storage
            .upload(&path, bytes, content_type.unwrap_or(DEFAULT_CONTENT_TYPE))
            .await?;

        let document = self
            .profiles
            .create_document(user_id, DOC_TYPE_PMA, &path, &original_filename)
            .await?;

        let url = self.storage.create_signed_url(&path, DEFAULT_SIGNED_URL_TTL).await?;
        tracing::info!("📄 Documento {} enviado por {}", document.id, user_id);

        Ok(DocumentUploadResponse { document_id: document.id, path, url, doc_type: document.doc_type })
    }

    pub async fn signed_url(&self, path: &str, expires_in: Option<u64>) -> Result<SignedUrlResponse, AppError> {
        let expires_in = expires_in.unwrap_or(DEFAULT_SIGNED_URL_TTL);
        let url = self.storage.create_signed_url(path.trim(), expires_in).await?;
        Ok(SignedUrlResponse { url, expires_in })
    }

    // ========================================================================
    // Categorias
    // ========================================================================

    pub async fn list_categories(&self) -> Result<Vec<ServiceCategory>, AppError> {
        self.profiles.list_categories().await
    }

    /// Slug derivado do nome quando omitido. Slug repetido vira conflito no banco.
    pub async fn create_category(&self, payload: &CreateCategoryPayload) -> Result<ServiceCategory, AppError> {
        let name = payload.name.trim().to_string();
        let slug = match non_blank(payload.slug.as_deref()) {
            Some(slug) => slugify(&slug),
            None => slugify(&name),
        };
        if slug.is_empty() {
            let mut err = ValidationError::new("slug");
            err.message = Some("validation.required".into());
            let mut errors = ValidationErrors::new();
            errors.add("slug", err);
            return Err(AppError::ValidationError(errors));
        }

        self.profiles
            .create_category(&NewServiceCategory {
                name,
                slug,
                description: non_blank(payload.description.as_deref()),
                icon: non_blank(payload.icon.as_deref()),
            })
            .await
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
