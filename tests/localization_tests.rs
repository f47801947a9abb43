//! # Localization Tests
//!
//! Message retrieval, fallbacks and parity between the bundled languages.

use vehicle_numbers::localization::{t_args_lang, t_lang, LocalizationManager};
use std::collections::{BTreeSet, HashMap};

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    fn message_ids(source: &str) -> BTreeSet<String> {
        source
            .lines()
            .filter(|line| !line.starts_with('#') && !line.starts_with(' '))
            .filter_map(|line| line.split_once(" = ").map(|(id, _)| id.trim().to_string()))
            .collect()
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("help-commands", "en", None);
        assert!(message.contains("Commands"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("help-commands", "unsupported", None);
        // Should fall back to English
        assert!(message.contains("Commands"));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("count", "1,000");
        args.insert("series", "3");

        let message = manager.get_message_in_language("batch-complete", "en", Some(&args));
        assert!(message.contains("1,000"));
        assert!(message.contains("3 series"));
    }

    #[test]
    fn test_french_messages() {
        let message = t_lang("help-commands", Some("fr-FR"));
        assert!(message.contains("Commandes"));

        let message = t_args_lang("step-2-complete", &[("mid", "12")], Some("fr"));
        assert!(message.contains("Étape 2"));
        assert!(message.contains("<code>12</code>"));
    }

    #[test]
    fn test_languages_define_same_messages() {
        let english = message_ids(include_str!("../locales/en/main.ftl"));
        let french = message_ids(include_str!("../locales/fr/main.ftl"));
        assert!(!english.is_empty());
        assert_eq!(english, french);
    }

    #[test]
    fn test_every_english_message_resolves() {
        let manager = setup_localization();
        for id in message_ids(include_str!("../locales/en/main.ftl")) {
            let message = manager.get_message_in_language(&id, "en", None);
            assert!(!message.starts_with("Missing"), "{id} did not resolve");
        }
    }
}
