//! Human-readable names for the language codes the HUD supports.

/// Code to prompt-friendly name. Spanish targets the Mexican variant.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish (Mexican)"),
    ("ja", "Japanese"),
    ("de", "German"),
    ("ru", "Russian"),
];

/// Resolve a language code to its name, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map_or(code, |&(_, name)| name)
}
