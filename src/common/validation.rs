// src/common/validation.rs
//
// Regras de normalização compartilhadas pelos serviços: política de senha,
// horários de expediente, fusos horários e referências opcionais por UUID.

use chrono::NaiveTime;
use uuid::Uuid;

use crate::common::error::AppError;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 64;
const PASSWORD_SYMBOLS: &str = "@$!%*?&";

pub const DEFAULT_TIMEZONE: &str = "America/Detroit";

// (apelido legível, identificador canônico)
const TIMEZONE_ALIASES: &[(&str, &str)] = &[
    ("Eastern (Detroit)", "America/Detroit"),
    ("Central (Chicago)", "America/Chicago"),
    ("Mountain (Denver)", "America/Denver"),
    ("Pacific (LA)", "America/Los_Angeles"),
];

// Valores que o front-end manda quando o campo "não foi preenchido".
const PLACEHOLDER_VALUES: &[&str] = &["string", "null", "none", "undefined", "", "all"];

pub const PRIORITY_ROUTINE: &str = "routine";
pub const PRIORITY_EMERGENCY: &str = "emergency";

/// 8 a 64 caracteres, com minúscula, maiúscula, dígito e um símbolo de `@$!%*?&`.
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    let strong = (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if strong { Ok(()) } else { Err(AppError::WeakPassword) }
}

/// Aceita `HH:MM` ou `HH:MM:SS` (24h).
pub fn normalize_time(value: &str) -> Result<NaiveTime, AppError> {
    let candidate = value.trim();
    NaiveTime::parse_from_str(candidate, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(candidate, "%H:%M"))
        .map_err(|_| AppError::InvalidTimeFormat(value.to_string()))
}

/// Horários sempre voltam como `HH:MM`; ausente vira "00:00".
pub fn format_time(value: Option<NaiveTime>) -> String {
    value
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "00:00".to_string())
}

/// Resolve apelidos para o identificador canônico. Ausente mantém o `fallback`.
pub fn normalize_timezone(value: Option<&str>, fallback: &str) -> Result<String, AppError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(fallback.to_string());
    };

    if let Some((_, canonical)) = TIMEZONE_ALIASES.iter().find(|(alias, _)| *alias == raw) {
        return Ok(canonical.to_string());
    }
    if TIMEZONE_ALIASES.iter().any(|(_, canonical)| *canonical == raw) {
        return Ok(raw.to_string());
    }

    Err(AppError::UnsupportedTimezone(raw.to_string()))
}

pub fn timezone_label(timezone: &str) -> String {
    TIMEZONE_ALIASES
        .iter()
        .find(|(_, canonical)| *canonical == timezone)
        .map(|(alias, _)| alias.to_string())
        .unwrap_or_else(|| timezone.to_string())
}

pub fn is_placeholder(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&lowered.as_str())
}

pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim()).map_err(|_| AppError::InvalidUuid(field.to_string()))
}

/// Placeholders viram `None`; qualquer outro valor precisa ser um UUID.
pub fn clean_optional_uuid(value: Option<&str>, field: &str) -> Result<Option<Uuid>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if is_placeholder(v) => Ok(None),
        Some(v) => parse_uuid(v, field).map(Some),
    }
}

pub fn normalize_priority(value: &str) -> Result<String, AppError> {
    let lowered = value.trim().to_lowercase();
    match lowered.as_str() {
        PRIORITY_ROUTINE | PRIORITY_EMERGENCY => Ok(lowered),
        _ => Err(AppError::InvalidPriority(value.to_string())),
    }
}

/// "Heating & Cooling" -> "heating-cooling"
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Nome de arquivo seguro para o storage: só ASCII alfanumérico, `.`, `-` e `_`.
pub fn sanitize_filename(value: &str) -> String {
    let base = value.rsplit(['/', '\\']).next().unwrap_or(value).trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_passwords_missing_a_character_class() {
        for weak in ["short1!", "NOLOWER123!", "nouppercase123!", "NoDigits!!", "NoSymbol123"] {
            assert!(
                matches!(validate_password_strength(weak), Err(AppError::WeakPassword)),
                "{weak} deveria ser rejeitada"
            );
        }
        let too_long = format!("Aa1!{}", "x".repeat(61));
        assert!(validate_password_strength(&too_long).is_err());
    }

    #[test]
    fn accepts_strong_password() {
        assert!(validate_password_strength("Abcdef1!").is_ok());
        assert!(validate_password_strength("Sup3r&Secret").is_ok());
        assert!(validate_password_strength("nolowerUP123!").is_ok());
    }

    #[test]
    fn both_time_forms_store_the_same_value() {
        let short = normalize_time("09:00").unwrap();
        let long = normalize_time("09:00:00").unwrap();
        assert_eq!(short, long);
        assert_eq!(format_time(Some(short)), "09:00");
        assert_eq!(format_time(None), "00:00");
    }

    #[test]
    fn rejects_bad_times() {
        for bad in ["25:00", "9am", "", "12:61"] {
            assert!(matches!(normalize_time(bad), Err(AppError::InvalidTimeFormat(_))));
        }
    }

    #[test]
    fn timezone_aliases_resolve() {
        assert_eq!(normalize_timezone(Some("Pacific (LA)"), DEFAULT_TIMEZONE).unwrap(), "America/Los_Angeles");
        assert_eq!(normalize_timezone(Some("America/Chicago"), DEFAULT_TIMEZONE).unwrap(), "America/Chicago");
        assert_eq!(normalize_timezone(None, "America/Denver").unwrap(), "America/Denver");
        assert!(matches!(
            normalize_timezone(Some("Europe/Lisbon"), DEFAULT_TIMEZONE),
            Err(AppError::UnsupportedTimezone(_))
        ));
        assert_eq!(timezone_label("America/Detroit"), "Eastern (Detroit)");
        assert_eq!(timezone_label("UTC"), "UTC");
    }

    #[test]
    fn placeholders_are_absent_uuids() {
        for p in ["string", "NULL", " none ", "", "all", "undefined"] {
            assert_eq!(clean_optional_uuid(Some(p), "user_id").unwrap(), None);
        }
        let id = Uuid::new_v4();
        assert_eq!(clean_optional_uuid(Some(&id.to_string()), "user_id").unwrap(), Some(id));
        assert!(matches!(clean_optional_uuid(Some("abc"), "user_id"), Err(AppError::InvalidUuid(f)) if f == "user_id"));
    }

    #[test]
    fn priority_is_lowercased() {
        assert_eq!(normalize_priority("Emergency").unwrap(), "emergency");
        assert!(normalize_priority("urgent").is_err());
    }

    #[test]
    fn slug_and_filename() {
        assert_eq!(slugify("Heating & Cooling"), "heating-cooling");
        assert_eq!(slugify("  HVAC "), "hvac");
        assert_eq!(sanitize_filename("../my contract (v2).pdf"), "my_contract__v2_.pdf");
        assert_eq!(sanitize_filename("..."), "document");
    }
}
