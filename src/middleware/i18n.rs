// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::DEFAULT_LOCALE;

// Idiomas com catálogo em locales/
const SUPPORTED_LOCALES: &[&str] = &["en", "pt"];

/// Idioma do cliente, vindo do Accept-Language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    /// Primeiro idioma suportado na ordem de preferência do header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| {
                accept_language::parse(raw)
                    .into_iter()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or_default().to_lowercase())
                    .find(|primary| SUPPORTED_LOCALES.contains(&primary.as_str()))
            })
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Locale(lang)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LOCALE.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn picks_primary_subtag() {
        assert_eq!(Locale::from_headers(&headers("pt-BR,pt;q=0.9")).0, "pt");
    }

    #[test]
    fn skips_unsupported_languages() {
        assert_eq!(Locale::from_headers(&headers("de-DE,pt;q=0.5")).0, "pt");
        assert_eq!(Locale::from_headers(&headers("fr")).0, "en");
    }

    #[test]
    fn missing_header_means_english() {
        assert_eq!(Locale::from_headers(&HeaderMap::new()), Locale::default());
    }
}
