//! Per-user language preferences.
//!
//! Users start in Russian and may switch to English with the toggle on the
//! welcome message. Preferences live only in process memory.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use teloxide::types::UserId;

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    /// Language tag used for Fluent bundle lookup
    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    /// Parse a language tag such as `en`, `ru` or `en-US`
    pub fn parse(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or(code);
        match primary.to_ascii_lowercase().as_str() {
            "ru" => Some(Language::Ru),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// The other supported language, used by the welcome toggle button
    pub fn toggled(self) -> Self {
        match self {
            Language::Ru => Language::En,
            Language::En => Language::Ru,
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::Ru, Language::En]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Process-wide mapping from user to chosen language
#[derive(Debug, Default)]
pub struct LanguagePreferences {
    languages: RwLock<HashMap<UserId, Language>>,
}

impl LanguagePreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the user's language, replacing any previous choice
    pub fn set(&self, user_id: UserId, language: Language) {
        self.languages.write().insert(user_id, language);
        tracing::debug!(user_id = %user_id, language = %language, "User language updated");
    }

    /// Language previously chosen by the user, or Russian for unseen users
    pub fn get(&self, user_id: UserId) -> Language {
        self.languages
            .read()
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_user_defaults_to_russian() {
        let prefs = LanguagePreferences::new();
        assert_eq!(prefs.get(UserId(42)), Language::Ru);
    }

    #[test]
    fn test_set_overwrites_previous_language() {
        let prefs = LanguagePreferences::new();
        prefs.set(UserId(7), Language::En);
        assert_eq!(prefs.get(UserId(7)), Language::En);
        prefs.set(UserId(7), Language::Ru);
        assert_eq!(prefs.get(UserId(7)), Language::Ru);
        // Other users are unaffected
        assert_eq!(prefs.get(UserId(8)), Language::Ru);
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!(Language::parse("en"), Some(Language::En));
        assert_eq!(Language::parse("en-US"), Some(Language::En));
        assert_eq!(Language::parse("RU"), Some(Language::Ru));
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Language::Ru.toggled(), Language::En);
        assert_eq!(Language::En.toggled(), Language::Ru);
    }
}
