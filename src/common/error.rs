use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
// Ele NÃO vira resposta diretamente: passa antes pelo `to_api_error`,
// que traduz a mensagem para o idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Validação (entrada malformada) ---
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Senha não atende à política de segurança")]
    WeakPassword,

    #[error("Horário inválido: {0}")]
    InvalidTimeFormat(String),

    #[error("Fuso horário não suportado: {0}")]
    UnsupportedTimezone(String),

    #[error("UUID inválido para o campo {0}")]
    InvalidUuid(String),

    #[error("Referência de propriedade desconhecida: {0}")]
    UnknownPropertyReference(String),

    #[error("Propriedade {0} não pertence à empresa")]
    PropertyNotInCompany(String),

    #[error("Categoria de serviço não encontrada: {0}")]
    UnknownServiceCategory(String),

    #[error("Documento PMA obrigatório para property_manager")]
    PmaDocumentRequired,

    #[error("Nenhum campo para atualizar")]
    NoFieldsToUpdate,

    #[error("Unidade não pertence à propriedade selecionada")]
    UnitNotInProperty,

    #[error("Técnico não pertence à empresa")]
    TechnicianNotInCompany,

    #[error("Prioridade inválida: {0}")]
    InvalidPriority(String),

    #[error("Arquivo inválido: {0}")]
    InvalidFile(String),

    #[error("Token de verificação ausente")]
    MissingVerificationToken,

    // --- Autenticação ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("E-mail não verificado")]
    EmailNotVerified,

    // --- Pré-condições de conta ---
    #[error("Perfil de usuário não encontrado")]
    ProfileNotFound,

    #[error("Empresa não provisionada")]
    CompanyNotProvisioned,

    #[error("Registro da empresa ausente")]
    CompanyRecordMissing,

    // --- Autorização (sempre 404, nunca 403) ---
    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    // --- Conflitos ---
    #[error("Onboarding já concluído")]
    OnboardingAlreadyCompleted,

    #[error("Perfil de papel já existe para este usuário")]
    RoleProfileAlreadyExists,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Admin {0} pertence a outra empresa")]
    AdminInOtherCompany(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // --- Verificação de e-mail ---
    #[error("Falha na verificação de e-mail")]
    VerificationFailed,

    #[error("Muitas requisições")]
    RateLimited,

    // --- Serviços externos ---
    #[error("Falha no serviço externo: {0}")]
    Upstream(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que de fato vira resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,

            AppError::WeakPassword
            | AppError::InvalidTimeFormat(_)
            | AppError::UnsupportedTimezone(_)
            | AppError::InvalidUuid(_)
            | AppError::UnknownPropertyReference(_)
            | AppError::PropertyNotInCompany(_)
            | AppError::UnknownServiceCategory(_)
            | AppError::PmaDocumentRequired
            | AppError::UnitNotInProperty
            | AppError::TechnicianNotInCompany
            | AppError::InvalidPriority(_) => StatusCode::UNPROCESSABLE_ENTITY,

            AppError::NoFieldsToUpdate
            | AppError::InvalidFile(_)
            | AppError::MissingVerificationToken
            | AppError::ProfileNotFound
            | AppError::CompanyNotProvisioned
            | AppError::CompanyRecordMissing
            | AppError::VerificationFailed
            | AppError::Upstream(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::EmailNotVerified => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,

            AppError::OnboardingAlreadyCompleted
            | AppError::RoleProfileAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::AdminInOtherCompany(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,

            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave da mensagem no arquivo de tradução e os argumentos que ela interpola.
    fn message_key(&self) -> (&'static str, Vec<String>) {
        match self {
            AppError::ValidationError(_) => ("errors.validation", vec![]),
            AppError::WeakPassword => ("errors.weak_password", vec![]),
            AppError::InvalidTimeFormat(v) => ("errors.invalid_time", vec![v.clone()]),
            AppError::UnsupportedTimezone(v) => ("errors.unsupported_timezone", vec![v.clone()]),
            AppError::InvalidUuid(field) => ("errors.invalid_uuid", vec![field.clone()]),
            AppError::UnknownPropertyReference(v) => ("errors.unknown_property_reference", vec![v.clone()]),
            AppError::PropertyNotInCompany(v) => ("errors.property_not_in_company", vec![v.clone()]),
            AppError::UnknownServiceCategory(v) => ("errors.unknown_service_category", vec![v.clone()]),
            AppError::PmaDocumentRequired => ("errors.pma_required", vec![]),
            AppError::NoFieldsToUpdate => ("errors.no_fields_to_update", vec![]),
            AppError::UnitNotInProperty => ("errors.unit_not_in_property", vec![]),
            AppError::TechnicianNotInCompany => ("errors.technician_not_in_company", vec![]),
            AppError::InvalidPriority(v) => ("errors.invalid_priority", vec![v.clone()]),
            AppError::InvalidFile(v) => ("errors.invalid_file", vec![v.clone()]),
            AppError::MissingVerificationToken => ("errors.missing_verification_token", vec![]),
            AppError::InvalidCredentials => ("errors.invalid_credentials", vec![]),
            AppError::InvalidToken => ("errors.invalid_token", vec![]),
            AppError::EmailNotVerified => ("errors.email_not_verified", vec![]),
            AppError::ProfileNotFound => ("errors.profile_not_found", vec![]),
            AppError::CompanyNotProvisioned => ("errors.company_not_provisioned", vec![]),
            AppError::CompanyRecordMissing => ("errors.company_record_missing", vec![]),
            AppError::ResourceNotFound(what) => ("errors.not_found", vec![what.clone()]),
            AppError::OnboardingAlreadyCompleted => ("errors.onboarding_already_completed", vec![]),
            AppError::RoleProfileAlreadyExists => ("errors.role_profile_exists", vec![]),
            AppError::EmailAlreadyExists => ("errors.email_exists", vec![]),
            AppError::AdminInOtherCompany(email) => ("errors.admin_in_other_company", vec![email.clone()]),
            AppError::UniqueConstraintViolation(v) => ("errors.unique_violation", vec![v.clone()]),
            AppError::VerificationFailed => ("errors.verification_failed", vec![]),
            AppError::RateLimited => ("errors.rate_limited", vec![]),
            AppError::Upstream(_) => ("errors.upstream", vec![]),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::JwtError(_) => ("errors.internal", vec![]),
        }
    }

    /// Converte o erro de domínio na resposta HTTP traduzida.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let (key, args) = self.message_key();
        let error = store.translate(&locale.0, key, &args);

        let details = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut fields = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let message = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            Value::String(store.translate(&locale.0, &message, &[]))
                        })
                        .collect();
                    fields.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(fields))
            }
            // A mensagem do serviço externo vai junto para diagnóstico.
            AppError::Upstream(message) => {
                tracing::warn!("Falha em serviço externo: {}", message);
                Some(json!({ "upstream": message }))
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::JwtError(_) => {
                tracing::error!("Erro Interno do Servidor: {}", self);
                Some(json!({ "reason": self.to_string() }))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

/// Mapeia violação de unicidade do Postgres para o erro de conflito;
/// qualquer outro erro do banco segue como `DatabaseError`.
pub fn map_unique_violation(e: sqlx::Error, what: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what.to_string());
        }
    }
    AppError::DatabaseError(e)
}
