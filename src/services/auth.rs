// src/services/auth.rs

use std::sync::Arc;

use rand::{distr::Alphanumeric, Rng};
use serde_json::json;
use uuid::Uuid;

use crate::{
    clients::{identity::ADMIN_MAX_PAGES, GoogleTokenVerifier, Identity, IdentityProvider, NewIdentity, OtpType},
    common::{error::AppError, validation::validate_password_strength},
    db::{AccountRepository, OnboardingRepository},
    models::{
        account::AppUserUpsert,
        auth::{GoogleSigninResponse, MeResponse, SigninResponse, SignupPayload, TokenPairResponse, TokenType},
    },
    services::token_service::TokenService,
};

const PLACEHOLDER_PASSWORD_LEN: usize = 32;
const FALLBACK_COMPANY_NAME: &str = "My Company";

/// Resultado do cadastro; a mensagem é montada (e traduzida) no handler.
#[derive(Debug)]
pub struct SignupOutcome {
    pub user_id: Uuid,
    pub email: String,
    pub company_id: Uuid,
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    google: Arc<dyn GoogleTokenVerifier>,
    accounts: Arc<dyn AccountRepository>,
    onboarding: Arc<dyn OnboardingRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        google: Arc<dyn GoogleTokenVerifier>,
        accounts: Arc<dyn AccountRepository>,
        onboarding: Arc<dyn OnboardingRepository>,
        tokens: TokenService,
    ) -> Self {
        Self { identity, google, accounts, onboarding, tokens }
    }

    // ========================================================================
    // Cadastro
    // ========================================================================

    /// Identidade (não confirmada) -> empresa -> perfil -> código por e-mail.
    /// Se a empresa ou o perfil falharem, desfaz o que já foi criado.
    pub async fn signup(&self, payload: &SignupPayload) -> Result<SignupOutcome, AppError> {
        // 1. Política de senha, antes de qualquer chamada externa
        validate_password_strength(&payload.password)?;

        let email = payload.email.trim().to_lowercase();
        let first_name = payload.first_name.trim().to_string();
        let last_name = payload.last_name.trim().to_string();

        // 2. Identidade não confirmada
        let identity = self
            .identity
            .admin_create_user(&NewIdentity {
                email: email.clone(),
                password: payload.password.clone(),
                email_confirm: false,
                user_metadata: json!({ "first_name": first_name, "last_name": last_name }),
            })
            .await?;

        // 3. Empresa
        let company = match self.accounts.create_company(payload.company_name.trim()).await {
            Ok(company) => company,
            Err(e) => {
                self.undo_signup(identity.id, None).await;
                return Err(e);
            }
        };

        // 4. Perfil ligado à empresa
        let profile = AppUserUpsert {
            company_id: Some(company.id),
            first_name: Some(first_name),
            last_name: Some(last_name),
            is_active: Some(true),
            onboarding_status: None,
        };
        if let Err(e) = self.accounts.upsert_app_user(identity.id, &profile).await {
            self.undo_signup(identity.id, Some(company.id)).await;
            return Err(e);
        }

        // 5. Código de verificação. Falha aqui não derruba o cadastro: dá para reenviar.
        if let Err(e) = self.identity.send_otp(&email, OtpType::Signup).await {
            tracing::warn!("Falha ao enviar código de verificação para {}: {}", email, e);
        }

        tracing::info!("👤 Conta criada: usuário {} na empresa {}", identity.id, company.id);

        Ok(SignupOutcome { user_id: identity.id, email, company_id: company.id })
    }

    // Melhor esforço: uma queda entre as duas remoções pode deixar órfãos.
    async fn undo_signup(&self, user_id: Uuid, company_id: Option<Uuid>) {
        if let Some(company_id) = company_id {
            if let Err(e) = self.accounts.delete_company(company_id).await {
                tracing::warn!("Compensação: falha ao remover empresa {}: {}", company_id, e);
            }
        }
        if let Err(e) = self.identity.admin_delete_user(user_id).await {
            tracing::warn!("Compensação: falha ao remover identidade {}: {}", user_id, e);
        }
    }

    // ========================================================================
    // Login
    // ========================================================================

    pub async fn signin(&self, email: &str, password: &str) -> Result<SigninResponse, AppError> {
        let session = self
            .identity
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(|e| match e {
                AppError::Upstream(_) => AppError::InvalidCredentials,
                other => other,
            })?;

        let company_id = self
            .accounts
            .find_app_user(session.user.id)
            .await?
            .and_then(|u| u.company_id);

        self.session_response(&session.user, company_id).await
    }

    pub async fn google_signin(&self, id_token: &str) -> Result<GoogleSigninResponse, AppError> {
        // 1. Assinatura, emissor e audiência
        let claims = self.google.verify(id_token).await?;
        let email = claims
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or(AppError::InvalidToken)?;

        let (first_name, last_name) = split_name(
            claims.given_name.as_deref(),
            claims.family_name.as_deref(),
            claims.name.as_deref(),
        );

        // 2. Conta inexistente: provisiona com senha aleatória
        let mut is_new_user = false;
        if self.identity.admin_find_by_email(&email).await?.is_none() {
            self.identity
                .admin_create_user(&NewIdentity {
                    email: email.clone(),
                    password: random_password(),
                    email_confirm: claims.email_verified,
                    user_metadata: json!({
                        "first_name": first_name,
                        "last_name": last_name,
                        "provider": "google",
                    }),
                })
                .await?;
            is_new_user = true;
        }

        // 3. Troca o ID token por uma sessão do provedor
        let session = self
            .identity
            .sign_in_with_id_token("google", id_token)
            .await
            .map_err(|e| match e {
                AppError::Upstream(_) => AppError::InvalidToken,
                other => other,
            })?;
        let identity = session.user;

        // 4. Todo usuário autenticado resolve para exatamente uma empresa
        let existing = self.accounts.find_app_user(identity.id).await?;
        let company_id = match existing.as_ref().and_then(|u| u.company_id) {
            Some(id) => id,
            None => {
                let name = company_name_for(&first_name, &last_name);
                let company = self.accounts.create_company(&name).await?;
                tracing::info!("🏢 Empresa '{}' criada para login Google de {}", name, identity.id);
                company.id
            }
        };

        // 5. Preenche só nomes em branco
        let blank = |v: Option<&String>| v.is_none_or(|s| s.trim().is_empty());
        let upsert = AppUserUpsert {
            company_id: Some(company_id),
            first_name: blank(existing.as_ref().and_then(|u| u.first_name.as_ref()))
                .then(|| first_name.clone())
                .filter(|s| !s.is_empty()),
            last_name: blank(existing.as_ref().and_then(|u| u.last_name.as_ref()))
                .then(|| last_name.clone())
                .filter(|s| !s.is_empty()),
            is_active: None,
            onboarding_status: None,
        };
        self.accounts.upsert_app_user(identity.id, &upsert).await?;

        let session = self.session_response(&identity, Some(company_id)).await?;
        Ok(GoogleSigninResponse { session, is_new_user })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPairResponse, AppError> {
        let (user_id, _) = self.tokens.verify(refresh_token, TokenType::Refresh)?;

        // E-mail é opcional no novo access token.
        let email = if self.identity.has_admin_credential() {
            match self.identity.admin_get_user(user_id).await {
                Ok(found) => found.and_then(|u| u.email),
                Err(e) => {
                    tracing::warn!("Não foi possível enriquecer o token com o e-mail: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let pair = self.tokens.issue_pair(user_id, email.as_deref())?;
        Ok(TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Bearer token -> identidade. Aceita nosso access token e, em segundo lugar,
    /// um access token emitido pelo próprio provedor.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        match self.tokens.verify(token, TokenType::Access) {
            Ok((user_id, _)) => match self.identity.admin_get_user(user_id).await {
                Ok(Some(identity)) => Ok(identity),
                Ok(None) => Err(AppError::InvalidToken),
                Err(e) => {
                    tracing::warn!("Falha ao carregar identidade {}: {}", user_id, e);
                    Err(AppError::InvalidToken)
                }
            },
            Err(_) => self.identity.get_user(token).await.map_err(|_| AppError::InvalidToken),
        }
    }

    pub async fn me(&self, identity: Identity) -> Result<MeResponse, AppError> {
        let profile = self.accounts.find_app_user(identity.id).await?;
        Ok(MeResponse { identity, profile })
    }

    async fn session_response(&self, identity: &Identity, company_id: Option<Uuid>) -> Result<SigninResponse, AppError> {
        let email = identity.email_or_empty().to_string();
        let pair = self.tokens.issue_pair(identity.id, Some(&email).filter(|e| !e.is_empty()).map(String::as_str))?;

        // Sonda de existência, não flag em cache.
        let is_onboarded = match company_id {
            Some(id) => self.onboarding.company_has_records(id).await?,
            None => false,
        };

        Ok(SigninResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
            user_id: identity.id,
            email,
            email_confirmed: identity.email_confirmed(),
            company_id,
            is_onboarded,
        })
    }

    // ========================================================================
    // Verificação de e-mail e recuperação de senha
    // ========================================================================

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), AppError> {
        self.identity
            .verify_otp(email.trim(), code.trim(), OtpType::Signup)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::debug!("Código de verificação recusado: {}", e);
                AppError::VerificationFailed
            })
    }

    pub async fn resend_verification(&self, email: &str) -> Result<(), AppError> {
        self.identity.send_otp(email.trim(), OtpType::Signup).await
    }

    /// Link legado: tenta as estratégias em ordem, a primeira que der certo vence.
    pub async fn verify_link_token(&self, token: &str) -> Result<(), AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::MissingVerificationToken);
        }

        if self.identity.verify_link(token).await.is_ok() {
            return Ok(());
        }
        if self.identity.verify_token_hash(token).await.is_ok() {
            return Ok(());
        }
        if self.identity.verify_raw_token(token).await.is_ok() {
            return Ok(());
        }

        // Último recurso, só com credencial administrativa.
        if self.identity.has_admin_credential() {
            let per_page = self.identity.admin_page_size().max(1);
            for page in 1..=ADMIN_MAX_PAGES {
                let Ok(users) = self.identity.admin_list_users(page, per_page).await else {
                    break;
                };
                for user in users.iter().filter(|u| !u.email_confirmed()) {
                    if self.identity.admin_confirm_email(user.id).await.is_ok() {
                        tracing::warn!("Verificação por varredura administrativa confirmou {}", user.id);
                        return Ok(());
                    }
                }
                if users.len() < per_page as usize {
                    break;
                }
            }
        }

        Err(AppError::VerificationFailed)
    }

    /// Sempre responde OK para não revelar quais e-mails têm conta.
    pub async fn forgot_password(&self, email: &str) {
        if let Err(e) = self.identity.send_otp(email.trim(), OtpType::Recovery).await {
            tracing::warn!("Falha ao enviar código de recuperação: {}", e);
        }
    }

    pub async fn reset_password_with_otp(&self, email: &str, code: &str, new_password: &str) -> Result<(), AppError> {
        validate_password_strength(new_password)?;

        let session = self
            .identity
            .verify_otp(email.trim(), code.trim(), OtpType::Recovery)
            .await
            .map_err(|_| AppError::VerificationFailed)?;
        let session_token = session.access_token.ok_or(AppError::VerificationFailed)?;

        self.identity.update_password(&session_token, new_password).await
    }
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PLACEHOLDER_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Nome e sobrenome a partir dos campos do Google; cai para o nome completo.
fn split_name(given: Option<&str>, family: Option<&str>, full: Option<&str>) -> (String, String) {
    let given = given.map(str::trim).unwrap_or_default();
    let family = family.map(str::trim).unwrap_or_default();
    if !given.is_empty() || !family.is_empty() {
        return (given.to_string(), family.to_string());
    }
    let full = full.map(str::trim).unwrap_or_default();
    match full.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

fn company_name_for(first_name: &str, last_name: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        FALLBACK_COMPANY_NAME.to_string()
    } else {
        format!("{}'s Company", full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_names_fall_back_to_full_name() {
        assert_eq!(split_name(Some("Ana"), Some("Lima"), Some("X Y")), ("Ana".into(), "Lima".into()));
        assert_eq!(split_name(None, None, Some("Ana Maria Lima")), ("Ana".into(), "Maria Lima".into()));
        assert_eq!(split_name(None, None, None), (String::new(), String::new()));
    }

    #[test]
    fn company_name_uses_owner_name_or_fallback() {
        assert_eq!(company_name_for("Ana", "Lima"), "Ana Lima's Company");
        assert_eq!(company_name_for("", " "), "My Company");
    }

    #[test]
    fn placeholder_password_is_long_and_random() {
        let a = random_password();
        assert_eq!(a.len(), PLACEHOLDER_PASSWORD_LEN);
        assert_ne!(a, random_password());
    }
}
