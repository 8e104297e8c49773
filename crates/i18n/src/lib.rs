//! Localized strings for every user-facing message.
//!
//! Lookups go through [`Localizer::text`]: the requested language first, then
//! the configured default language, then a visible `[category.key]`
//! placeholder so a missing string never silently disappears.

mod catalog;
mod language;
mod prefs;

use std::sync::Arc;

pub use {
    catalog::Catalog,
    language::Language,
    prefs::LanguagePrefs,
};

/// Resolves `(category, key, language)` to text with `{name}` substitution.
#[derive(Clone)]
pub struct Localizer {
    default: Language,
    catalog: Arc<Catalog>,
}

impl Localizer {
    /// Localizer over the built-in catalog.
    #[must_use]
    pub fn new(default: Language) -> Self {
        Self {
            default,
            catalog: Arc::new(Catalog::builtin()),
        }
    }

    #[must_use]
    pub fn with_catalog(default: Language, catalog: Catalog) -> Self {
        Self {
            default,
            catalog: Arc::new(catalog),
        }
    }

    #[must_use]
    pub fn default_language(&self) -> Language {
        self.default
    }

    /// Look up a message and substitute `{name}` placeholders from `params`.
    ///
    /// Placeholders without a matching param are left as-is.
    #[must_use]
    pub fn text(
        &self,
        category: &str,
        key: &str,
        language: Language,
        params: &[(&str, &str)],
    ) -> String {
        let template = self
            .catalog
            .get(language, category, key)
            .or_else(|| self.catalog.get(self.default, category, key));

        let Some(template) = template else {
            tracing::debug!(category, key, %language, "missing translation");
            return format!("[{category}.{key}]");
        };

        substitute(template, params)
    }
}

/// Replace `{name}` placeholders in one pass, so substituted values are
/// never scanned again.
fn substitute(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let found = after.find('}').and_then(|close| {
            let name = &after[..close];
            params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, value)| (close, *value))
        });
        match found {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            },
            None => {
                out.push('{');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn sparse() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.insert(Language::Ru, "greet", "hello", "Привет, {name}!");
        catalog.insert(Language::En, "greet", "hello", "Hello, {name}!");
        catalog.insert(Language::Ru, "greet", "bye", "Пока");
        catalog
    }

    #[test]
    fn requested_language_wins() {
        let l10n = Localizer::with_catalog(Language::Ru, sparse());
        assert_eq!(
            l10n.text("greet", "hello", Language::En, &[("name", "Ann")]),
            "Hello, Ann!"
        );
    }

    #[test]
    fn falls_back_to_default_language() {
        let l10n = Localizer::with_catalog(Language::Ru, sparse());
        assert_eq!(l10n.text("greet", "bye", Language::Uz, &[]), "Пока");
    }

    #[test]
    fn missing_everywhere_yields_placeholder() {
        let l10n = Localizer::with_catalog(Language::Ru, sparse());
        assert_eq!(l10n.text("greet", "nope", Language::En, &[]), "[greet.nope]");
    }

    #[test]
    fn unknown_placeholders_are_left_intact() {
        let l10n = Localizer::with_catalog(Language::En, sparse());
        assert_eq!(
            l10n.text("greet", "hello", Language::En, &[("other", "x")]),
            "Hello, {name}!"
        );
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let mut catalog = Catalog::default();
        catalog.insert(Language::En, "error", "failed", "Failed at {start}: {error}");
        let l10n = Localizer::with_catalog(Language::En, catalog);
        assert_eq!(
            l10n.text("error", "failed", Language::En, &[
                ("error", "bad filter {start}"),
                ("start", "5"),
            ]),
            "Failed at 5: bad filter {start}"
        );
    }

    #[test]
    fn braces_without_a_param_survive() {
        assert_eq!(substitute("{a} {b {a}", &[("a", "1")]), "1 {b 1");
        assert_eq!(substitute("tail {", &[]), "tail {");
    }

    #[test]
    fn builtin_catalog_covers_every_language_for_core_prompts() {
        let l10n = Localizer::new(Language::Ru);
        for lang in Language::ALL {
            for key in ["operation", "format", "quality", "trim_start", "trim_end"] {
                let text = l10n.text("prompt", key, lang, &[]);
                assert!(!text.starts_with('['), "{lang}: prompt.{key} missing");
            }
        }
    }

    #[test]
    fn builtin_caption_substitutes_operation() {
        let l10n = Localizer::new(Language::Ru);
        let quality = l10n.text("quality", "medium", Language::En, &[]);
        let operation = l10n.text("describe", "compress", Language::En, &[(
            "quality", &quality,
        )]);
        let caption = l10n.text("caption", "video", Language::En, &[(
            "operation",
            &operation,
        )]);
        assert_eq!(caption, "Video after compression with medium quality");
    }
}
