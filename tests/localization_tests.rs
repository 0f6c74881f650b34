//! # Localization Tests
//!
//! Message retrieval and formatting for both bundled languages.

use std::collections::HashMap;
use std::sync::Arc;
use support_relay_bot::language::Language;
use support_relay_bot::localization::{
    create_localization_manager, t_args_lang, t_lang, LocalizationManager,
};

const RU_MESSAGES: &str = include_str!("../locales/ru/main.ftl");
const EN_MESSAGES: &str = include_str!("../locales/en/main.ftl");

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> Arc<LocalizationManager> {
        create_localization_manager().expect("Failed to create localization manager")
    }

    fn message_keys(source: &str) -> Vec<&str> {
        source
            .lines()
            .filter(|line| !line.starts_with('#') && !line.starts_with(' '))
            .filter_map(|line| line.split_once(" = ").map(|(key, _)| key.trim()))
            .collect()
    }

    #[test]
    fn test_both_languages_have_the_same_keys() {
        let manager = setup_localization();
        let ru_keys = message_keys(RU_MESSAGES);
        let en_keys = message_keys(EN_MESSAGES);

        assert!(!en_keys.is_empty());
        assert_eq!(ru_keys, en_keys);
        for key in en_keys {
            for language in Language::all() {
                assert!(manager.has_message(key, language), "{} missing in {}", key, language);
            }
        }
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        assert_eq!(
            t_lang(&manager, "support-request-prompt", Language::En),
            "Please write your support message."
        );
        assert_eq!(
            t_lang(&manager, "support-request-prompt", Language::Ru),
            "Пожалуйста, напишите ваше сообщение в поддержку."
        );
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", Language::En, None);
        assert_eq!(message, "Missing translation: nonexistent-key");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("name", "Maria");
        let message =
            manager.get_message_in_language("welcome-greeting", Language::En, Some(&args));
        assert_eq!(message, "Hello Maria! Welcome to the Support Bot.");

        let message = t_args_lang(
            &manager,
            "welcome-greeting",
            &[("name", "Мария")],
            Language::Ru,
        );
        assert_eq!(message, "Привет Мария! Добро пожаловать в бот поддержки.");
    }

    #[test]
    fn test_get_message_missing_args() {
        let manager = setup_localization();

        // Formatting errors are tolerated; the placeable is rendered as its name
        let message = manager.get_message_in_language("welcome-greeting", Language::En, None);
        assert!(message.starts_with("Hello "));
    }

    #[test]
    fn test_placeables_are_not_isolated() {
        let manager = setup_localization();

        let message = t_args_lang(
            &manager,
            "order-title",
            &[("order_number", "A-17")],
            Language::En,
        );
        assert_eq!(message, "🛒 <b>Order A-17</b>");
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_languages_differ() {
        let manager = setup_localization();

        for key in ["support-intro", "about-text", "support-forwarded", "unknown-command"] {
            assert_ne!(
                t_lang(&manager, key, Language::En),
                t_lang(&manager, key, Language::Ru),
                "{} is not translated",
                key
            );
        }
    }
}
