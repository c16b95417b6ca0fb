// src/services/tenancy_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{common::error::AppError, db::AccountRepository};

/// A única consulta "qual é a empresa deste usuário?" usada por todos os recursos.
#[derive(Clone)]
pub struct TenantService {
    accounts: Arc<dyn AccountRepository>,
}

impl TenantService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Sem perfil ou sem empresa = `CompanyNotProvisioned`.
    pub async fn resolve_company(&self, user_id: Uuid) -> Result<Uuid, AppError> {
        self.accounts
            .find_app_user(user_id)
            .await?
            .and_then(|u| u.company_id)
            .ok_or(AppError::CompanyNotProvisioned)
    }
}
