// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LOCALE: &str = "en";

// Catálogos embutidos no binário
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Guarda as mensagens traduzidas, indexadas por idioma e chave.
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    /// Busca a mensagem no idioma pedido, cai para o inglês e, por fim, devolve a própria chave.
    pub fn translate(&self, locale: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(locale)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LOCALE).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.catalogs.contains_key(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_has_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        for (lang, catalog) in &store.catalogs {
            for key in en.keys() {
                assert!(catalog.contains_key(key), "'{}' sem a chave '{}'", lang, key);
            }
        }
    }

    #[test]
    fn translate_interpolates_params() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("pt", "username_taken", &[("username", "ana".into())]);
        assert_eq!(msg, "O usuário 'ana' já está em uso.");
    }

    #[test]
    fn translate_falls_back_to_english_then_key() {
        let store = I18nStore::load().unwrap();
        assert!(!store.supports("de"));
        assert_eq!(
            store.translate("de", "user_not_found", &[]),
            "User not found."
        );
        assert_eq!(store.translate("pt", "no_such_key", &[]), "no_such_key");
    }
}
