use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use anyhow::{anyhow, Result};

/// Language used when a user's language is unknown or unsupported
pub const DEFAULT_LANGUAGE: &str = "en";

// Bundled Fluent resources, one per supported language
const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("fr", include_str!("../locales/fr/main.ftl")),
];

/// Localization manager for the vehicle number bot
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(code.to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Messages are embedded in HTML, no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("invalid {} resource: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("duplicate {} messages: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Languages with a loaded bundle
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// Map a Telegram language code (`fr`, `fr-CA`, `en_US`) onto a loaded bundle
    pub fn resolve_language<'a>(&'a self, language_code: Option<&str>) -> &'a str {
        let primary = language_code
            .and_then(|code| code.split(['-', '_']).next())
            .map(|code| code.to_lowercase());

        match primary {
            Some(code) => self
                .bundles
                .get_key_value(code.as_str())
                .map(|(key, _)| key.as_str())
                .unwrap_or(DEFAULT_LANGUAGE),
            None => DEFAULT_LANGUAGE,
        }
    }

    /// Get a localized message in a language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let language = self.resolve_language(Some(language));
        let lookup = |code: &str| {
            self.bundles
                .get(code)
                .and_then(|bundle| bundle.get_message(key).map(|msg| (bundle, msg)))
        };

        let (bundle, msg) = match lookup(language).or_else(|| lookup(DEFAULT_LANGUAGE)) {
            Some(found) => found,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)], language: &str) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: LazyLock<LocalizationManager> = LazyLock::new(|| {
    LocalizationManager::new().expect("Bundled locale resources should be valid")
});

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    &LOCALIZATION_MANAGER
}

/// Localized message for a Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    let manager = get_localization_manager();
    let language = manager.resolve_language(language_code);
    manager.get_message_in_language(key, language, None)
}

/// Localized message with arguments for a Telegram language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let manager = get_localization_manager();
    let language = manager.resolve_language(language_code);
    manager.get_message_with_args(key, args, language)
}
