use {dashmap::DashMap, reelsmith_common::Identity};

use crate::Language;

/// In-memory language preference per identity.
#[derive(Debug, Default)]
pub struct LanguagePrefs {
    by_identity: DashMap<Identity, Language>,
}

impl LanguagePrefs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferred language, seeding it from the platform hint on first contact.
    ///
    /// Unsupported or absent hints resolve to `default` without being stored,
    /// so a later hint can still seed the preference.
    pub fn resolve(&self, identity: Identity, hint: Option<&str>, default: Language) -> Language {
        if let Some(lang) = self.by_identity.get(&identity) {
            return *lang;
        }
        match hint.and_then(Language::from_code) {
            Some(lang) => *self.by_identity.entry(identity).or_insert(lang),
            None => default,
        }
    }

    #[must_use]
    pub fn get(&self, identity: Identity) -> Option<Language> {
        self.by_identity.get(&identity).map(|l| *l)
    }

    pub fn set(&self, identity: Identity, language: Language) {
        self.by_identity.insert(identity, language);
    }
}
