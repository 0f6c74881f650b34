use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

use crate::language::Language;

const RU_MESSAGES: &str = include_str!("../locales/ru/main.ftl");
const EN_MESSAGES: &str = include_str!("../locales/en/main.ftl");

/// Localization manager for the support bot
pub struct LocalizationManager {
    bundles: HashMap<Language, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with the bundled `ru` and `en` messages
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (language, source) in [(Language::Ru, RU_MESSAGES), (Language::En, EN_MESSAGES)] {
            let bundle = Self::create_bundle(language, source)?;
            bundles.insert(language, bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(language: Language, source: &str) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = language.code().parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Messages are embedded in HTML, so no Unicode isolation marks around placeables
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            anyhow::anyhow!("Failed to parse {} messages: {:?}", language, errors)
        })?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate {} messages: {:?}", language, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: Language,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self.bundles.get(&language) {
            Some(bundle) => bundle,
            None => {
                // Fallback to Russian if language not found
                match self.bundles.get(&Language::default()) {
                    Some(bundle) => bundle,
                    None => return format!("Missing translation: {}", key),
                }
            }
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut errors = vec![];
        let value = match args {
            Some(args) => {
                let fluent_args = FluentArgs::from_iter(
                    args.iter().map(|(k, v)| (*k, FluentValue::from(*v))),
                );
                bundle.format_pattern(pattern, Some(&fluent_args), &mut errors)
            }
            None => bundle.format_pattern(pattern, None, &mut errors),
        };

        if !errors.is_empty() {
            tracing::debug!(
                key = %key,
                language = %language,
                errors = ?errors,
                "Message formatted with errors"
            );
        }

        value.into_owned()
    }

    /// Get a localized message with arguments in a specific language
    pub fn get_message_with_args_in_language(
        &self,
        key: &str,
        language: Language,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Check if a key exists for the given language
    pub fn has_message(&self, key: &str, language: Language) -> bool {
        self.bundles
            .get(&language)
            .is_some_and(|bundle| bundle.has_message(key))
    }
}

/// Create a shared localization manager
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}

/// Convenience function to get a localized message
pub fn t_lang(manager: &LocalizationManager, key: &str, language: Language) -> String {
    manager.get_message_in_language(key, language, None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(
    manager: &LocalizationManager,
    key: &str,
    args: &[(&str, &str)],
    language: Language,
) -> String {
    manager.get_message_with_args_in_language(key, language, args)
}
