// src/services/onboarding_service.rs

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use uuid::Uuid;

use crate::{
    clients::{Identity, IdentityProvider, NewIdentity},
    common::{
        error::AppError,
        validation::{
            clean_optional_uuid, format_time, is_placeholder, normalize_time, normalize_timezone,
            timezone_label, validate_password_strength,
        },
    },
    db::{AccountRepository, OnboardingRepository, PropertyRepository, TechnicianRepository},
    models::{
        account::{AppUserUpsert, Company, CompanySettings},
        onboarding::{
            AdminAccountPayload, EmergencyVendorSummary, NewEmergencyVendor, OnboardingPayload,
            OnboardingResponse, OnboardingStatusResponse, OnboardingSummary, OnboardingTechnicianPayload,
            PropertySummary, TechnicianSummary,
        },
        property::NewProperty,
        technician::{NewTechnician, DEFAULT_AVAILABILITY, DEFAULT_MERIT_PERCENT},
    },
};

const ADMIN_DEFAULT_FIRST_NAME: &str = "Company";
const ADMIN_DEFAULT_LAST_NAME: &str = "Admin";

/// Referência à propriedade padrão de um técnico, já classificada.
#[derive(Debug, PartialEq)]
enum PropertyRef {
    Unset,
    Existing(Uuid),
    // nome em minúsculas de uma propriedade desta mesma requisição
    ByName(String),
}

#[derive(Clone)]
pub struct OnboardingService {
    accounts: Arc<dyn AccountRepository>,
    properties: Arc<dyn PropertyRepository>,
    technicians: Arc<dyn TechnicianRepository>,
    onboarding: Arc<dyn OnboardingRepository>,
    identity: Arc<dyn IdentityProvider>,
    frontend_url: String,
}

impl OnboardingService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        properties: Arc<dyn PropertyRepository>,
        technicians: Arc<dyn TechnicianRepository>,
        onboarding: Arc<dyn OnboardingRepository>,
        identity: Arc<dyn IdentityProvider>,
        frontend_url: String,
    ) -> Self {
        Self { accounts, properties, technicians, onboarding, identity, frontend_url }
    }

    // Perfil -> empresa -> linha da empresa, cada falta com seu próprio erro.
    async fn load_company(&self, user_id: Uuid) -> Result<Company, AppError> {
        let app_user = self
            .accounts
            .find_app_user(user_id)
            .await?
            .ok_or(AppError::ProfileNotFound)?;
        let company_id = app_user.company_id.ok_or(AppError::CompanyNotProvisioned)?;
        self.accounts
            .find_company(company_id)
            .await?
            .ok_or(AppError::CompanyRecordMissing)
    }

    /// Onboarding inicial da empresa. Roda uma única vez: se já existir
    /// propriedade, técnico ou fornecedor, responde conflito.
    ///
    /// Toda a validação acontece antes da primeira escrita.
    pub async fn complete(&self, actor: &Identity, payload: &OnboardingPayload) -> Result<OnboardingResponse, AppError> {
        // 1. Pré-condições
        let company = self.load_company(actor.id).await?;
        if self.onboarding.company_has_records(company.id).await? {
            return Err(AppError::OnboardingAlreadyCompleted);
        }

        // 2. Normalização dos escalares
        let timezone = normalize_timezone(payload.timezone.as_deref(), &company.timezone)?;
        let work_hours_start = normalize_time(&payload.work_hours_start)?;
        let work_hours_end = normalize_time(&payload.work_hours_end)?;
        let company_name = payload
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(company.name.as_str())
            .to_string();

        // 3. Admin secundário (guarda contra auto-referência)
        let admin = payload
            .admin_account
            .as_ref()
            .filter(|a| !a.email.trim().eq_ignore_ascii_case(actor.email_or_empty().trim()));
        let existing_admin = match admin {
            Some(admin) => {
                validate_password_strength(&admin.password)?;
                self.existing_admin(company.id, &admin.email).await?
            }
            None => {
                if payload.admin_account.is_some() {
                    tracing::info!("Conta admin igual ao usuário atual; nada a provisionar");
                }
                None
            }
        };

        // 4. Referências dos técnicos
        let request_names: HashSet<String> =
            payload.properties.iter().map(|p| p.name.trim().to_lowercase()).collect();
        let mut tech_refs = Vec::with_capacity(payload.technicians.len());
        for tech in &payload.technicians {
            let user_id = clean_optional_uuid(tech.user_id.as_deref(), "technicians.user_id")?;
            let property_ref = classify_reference(tech.default_property.as_deref(), &request_names)?;
            if let PropertyRef::Existing(id) = property_ref {
                if self.properties.find(company.id, id).await?.is_none() {
                    return Err(AppError::PropertyNotInCompany(id.to_string()));
                }
            }
            tech_refs.push((user_id, property_ref));
        }

        // 5. Configurações da empresa
        let settings = CompanySettings {
            name: company_name.clone(),
            timezone: timezone.clone(),
            work_hours_start,
            work_hours_end,
            auto_assign: payload.auto_assign,
            intake: payload.intake_method.clone(),
            collect_pte: payload.collect_pte,
            collect_window: payload.collect_window,
            on_call_enabled: payload.on_call_enabled,
            on_call_rotation: payload.on_call_rotation.clone(),
        };
        self.accounts.update_company_settings(company.id, &settings).await?;

        let admin_user_created = match admin {
            Some(admin) => self.provision_admin(company.id, admin, existing_admin).await?,
            None => false,
        };

        // 6. Propriedades; o mapa nome -> id vem das linhas recém-inseridas
        let new_properties: Vec<NewProperty> = payload
            .properties
            .iter()
            .map(|p| NewProperty {
                name: p.name.trim().to_string(),
                address: p.address.trim().to_string(),
                notes: p.notes.clone(),
            })
            .collect();
        let created = self.properties.create_many(company.id, &new_properties).await?;
        let by_name: HashMap<String, Uuid> =
            created.iter().map(|p| (p.name.to_lowercase(), p.id)).collect();

        // 7. Técnicos
        let mut new_technicians = Vec::with_capacity(payload.technicians.len());
        for (tech, (user_id, property_ref)) in payload.technicians.iter().zip(tech_refs) {
            let default_property_id = match property_ref {
                PropertyRef::Unset => None,
                PropertyRef::Existing(id) => Some(id),
                PropertyRef::ByName(name) => Some(
                    *by_name
                        .get(&name)
                        .ok_or_else(|| AppError::UnknownPropertyReference(name.clone()))?,
                ),
            };
            new_technicians.push(technician_row(tech, user_id, default_property_id));
        }
        let technicians = self.technicians.create_many(company.id, &new_technicians).await?;

        // 8. Fornecedores de emergência
        let vendors: Vec<NewEmergencyVendor> = payload
            .emergency_vendors
            .iter()
            .map(|v| NewEmergencyVendor {
                category: v.category.clone(),
                name: v.name.trim().to_string(),
                phone: v.phone.clone(),
            })
            .collect();
        let vendors = self.onboarding.create_vendors(company.id, &vendors).await?;

        tracing::info!(
            "✅ Onboarding da empresa {}: {} propriedades, {} técnicos, {} fornecedores",
            company.id,
            created.len(),
            technicians.len(),
            vendors.len()
        );

        Ok(OnboardingResponse {
            success: true,
            company_id: company.id,
            summary: OnboardingSummary {
                company_name,
                timezone,
                work_hours_start: format_time(Some(work_hours_start)),
                work_hours_end: format_time(Some(work_hours_end)),
                auto_assign: payload.auto_assign,
                on_call_enabled: payload.on_call_enabled,
                on_call_rotation: payload.on_call_rotation.clone(),
                intake_method: payload.intake_method.clone(),
                collect_pte: payload.collect_pte,
                collect_window: payload.collect_window,
                properties_total: created.len(),
                technicians_total: technicians.len(),
                emergency_vendors_total: vendors.len(),
                admin_user_created,
            },
        })
    }

    /// Identidade já cadastrada com o e-mail do admin. Se ela já está ligada
    /// a outra empresa, conflito: um tenant não puxa usuários de outro.
    async fn existing_admin(&self, company_id: Uuid, email: &str) -> Result<Option<Identity>, AppError> {
        let email = email.trim().to_lowercase();
        let Some(identity) = self.identity.admin_find_by_email(&email).await? else {
            return Ok(None);
        };
        let current_company = self.accounts.find_app_user(identity.id).await?.and_then(|u| u.company_id);
        match current_company {
            Some(other) if other != company_id => Err(AppError::AdminInOtherCompany(email)),
            _ => Ok(Some(identity)),
        }
    }

    /// Cria (ou reaproveita `existing`) a identidade do admin e a liga à empresa.
    /// Retorna `true` só quando uma identidade nova foi criada.
    async fn provision_admin(
        &self,
        company_id: Uuid,
        admin: &AdminAccountPayload,
        existing: Option<Identity>,
    ) -> Result<bool, AppError> {
        let email = admin.email.trim().to_lowercase();
        let first_name = non_blank(admin.first_name.as_deref()).unwrap_or(ADMIN_DEFAULT_FIRST_NAME).to_string();
        let last_name = non_blank(admin.last_name.as_deref()).unwrap_or(ADMIN_DEFAULT_LAST_NAME).to_string();

        let (identity, created) = match existing {
            Some(existing) => (existing, false),
            None => {
                let identity = self
                    .identity
                    .admin_create_user(&NewIdentity {
                        email: email.clone(),
                        password: admin.password.clone(),
                        email_confirm: true,
                        user_metadata: serde_json::json!({
                            "first_name": first_name,
                            "last_name": last_name,
                            "company_id": company_id,
                        }),
                    })
                    .await?;
                (identity, true)
            }
        };

        self.accounts
            .upsert_app_user(
                identity.id,
                &AppUserUpsert {
                    company_id: Some(company_id),
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    is_active: Some(true),
                    onboarding_status: None,
                },
            )
            .await?;

        if created {
            if let Err(e) = self.identity.admin_generate_magic_link(&email, &self.frontend_url).await {
                tracing::warn!("Falha ao gerar magic link para o admin {}: {}", email, e);
            }
        }

        Ok(created)
    }

    /// Reconstrói as configurações e as listagens da empresa do usuário.
    pub async fn status(&self, user_id: Uuid) -> Result<OnboardingStatusResponse, AppError> {
        let company = self.load_company(user_id).await?;

        let properties = self.properties.list(company.id).await?;
        let technicians = self.technicians.list(company.id).await?;
        let vendors = self.onboarding.list_vendors(company.id).await?;

        let onboarding_completed = !properties.is_empty() || !technicians.is_empty() || !vendors.is_empty();

        Ok(OnboardingStatusResponse {
            company_id: company.id,
            timezone_label: timezone_label(&company.timezone),
            company_name: company.name,
            timezone: company.timezone,
            work_hours_start: format_time(company.work_hours_start),
            work_hours_end: format_time(company.work_hours_end),
            auto_assign: company.auto_assign,
            on_call_enabled: company.on_call_enabled,
            on_call_rotation: company.on_call_rotation,
            intake_method: company.intake,
            collect_pte: company.collect_pte,
            collect_window: company.collect_window,
            properties: properties
                .into_iter()
                .map(|p| PropertySummary { id: p.id, name: p.name, address: Some(p.address), notes: p.notes })
                .collect(),
            technicians: technicians
                .into_iter()
                .map(|t| TechnicianSummary {
                    id: t.id,
                    first_name: Some(t.first_name),
                    last_name: Some(t.last_name),
                    email: t.email,
                    phone: t.phone,
                    shift: t.shift,
                    default_property_id: t.default_property_id,
                    default_property_name: t.default_property_name,
                })
                .collect(),
            emergency_vendors: vendors
                .into_iter()
                .map(|v| EmergencyVendorSummary { id: v.id, category: v.category, name: v.name, phone: v.phone })
                .collect(),
            onboarding_completed,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Placeholder -> sem propriedade; UUID -> propriedade existente;
/// senão precisa casar (sem diferenciar maiúsculas) com um nome desta requisição.
fn classify_reference(value: Option<&str>, request_names: &HashSet<String>) -> Result<PropertyRef, AppError> {
    let Some(raw) = value else {
        return Ok(PropertyRef::Unset);
    };
    if is_placeholder(raw) {
        return Ok(PropertyRef::Unset);
    }
    if let Ok(id) = Uuid::parse_str(raw.trim()) {
        return Ok(PropertyRef::Existing(id));
    }
    let lowered = raw.trim().to_lowercase();
    if request_names.contains(&lowered) {
        Ok(PropertyRef::ByName(lowered))
    } else {
        Err(AppError::UnknownPropertyReference(raw.trim().to_string()))
    }
}

fn technician_row(tech: &OnboardingTechnicianPayload, user_id: Option<Uuid>, default_property_id: Option<Uuid>) -> NewTechnician {
    NewTechnician {
        user_id,
        first_name: tech.first_name.trim().to_string(),
        last_name: tech.last_name.trim().to_string(),
        phone: tech.phone.clone(),
        email: tech.email.clone(),
        default_property_id,
        shift: tech.shift.clone(),
        merit_percent: tech.merit_percent.unwrap_or(DEFAULT_MERIT_PERCENT),
        availability: DEFAULT_AVAILABILITY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|n| n.to_lowercase()).collect()
    }

    #[test]
    fn placeholders_mean_no_default_property() {
        let known = names(&["Maple Court"]);
        for value in [None, Some(""), Some("none"), Some("string"), Some("undefined")] {
            assert_eq!(classify_reference(value, &known).unwrap(), PropertyRef::Unset);
        }
    }

    #[test]
    fn names_match_request_properties_ignoring_case() {
        let known = names(&["Maple Court"]);
        assert_eq!(
            classify_reference(Some("  maple COURT "), &known).unwrap(),
            PropertyRef::ByName("maple court".into())
        );
    }

    #[test]
    fn uuid_references_are_checked_later_against_the_company() {
        let id = Uuid::new_v4();
        assert_eq!(
            classify_reference(Some(&id.to_string()), &HashSet::new()).unwrap(),
            PropertyRef::Existing(id)
        );
    }

    #[test]
    fn unknown_name_is_reported_back() {
        let err = classify_reference(Some("Oak Tower"), &names(&["Maple Court"])).unwrap_err();
        assert!(matches!(err, AppError::UnknownPropertyReference(v) if v == "Oak Tower"));
    }
}
