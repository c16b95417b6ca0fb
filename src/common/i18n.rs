// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "en";

// Arquivos de tradução embutidos no binário.
const LOCALE_FILES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Dicionário de mensagens por idioma. Chaves planas, ex: "errors.invalid_token".
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in LOCALE_FILES {
            let table: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("arquivo de tradução inválido: {}", lang))?;
            messages.insert(lang.to_string(), table);
        }
        Ok(Self { messages })
    }

    /// Traduz a chave para o idioma pedido, caindo para o inglês e, por fim,
    /// para a própria chave. `{0}`, `{1}`... são substituídos pelos argumentos.
    pub fn translate(&self, lang: &str, key: &str, args: &[String]) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|table| table.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        args.iter()
            .enumerate()
            .fold(template, |acc, (i, arg)| acc.replace(&format!("{{{}}}", i), arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::load().unwrap();
        let pt = store.translate("pt", "errors.invalid_token", &[]);
        let en = store.translate("en", "errors.invalid_token", &[]);
        assert_ne!(pt, en);
        assert_eq!(store.translate("fr", "errors.invalid_token", &[]), en);
        assert_eq!(store.translate("en", "no.such.key", &[]), "no.such.key");
    }

    #[test]
    fn interpolates_arguments() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("en", "errors.unknown_service_category", &["hvac".to_string()]);
        assert!(msg.contains("hvac"));
    }
}
