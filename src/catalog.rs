//! Response languages and summarizer models offered to chat users.

use serde::Serialize;

/// A selectable response language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// Display name shown to users.
    pub name: &'static str,
    /// ISO 639-3 code sent as `responseLang`.
    pub code: &'static str,
}

impl Language {
    const fn new(name: &'static str, code: &'static str) -> Self {
        Self { name, code }
    }
}

/// A selectable summarizer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummarizerModel {
    /// Display name shown to users.
    pub name: &'static str,
    /// Summarizer prompt name sent as `summarizerPromptName`.
    pub prompt_name: &'static str,
}

/// Languages in the order they are offered; the first entry is the default.
pub const LANGUAGES: &[Language] = &[
    Language::new("English", "eng"),
    Language::new("German", "deu"),
    Language::new("French", "fra"),
    Language::new("Chinese", "zho"),
    Language::new("Korean", "kor"),
    Language::new("Arabic", "ara"),
    Language::new("Russian", "rus"),
    Language::new("Thai", "tha"),
    Language::new("Dutch", "nld"),
    Language::new("Italian", "ita"),
    Language::new("Portuguese", "por"),
    Language::new("Spanish", "spa"),
    Language::new("Japanese", "jpn"),
    Language::new("Polish", "pol"),
    Language::new("Turkish", "tur"),
    Language::new("Vietnamese", "vie"),
    Language::new("Indonesian", "ind"),
    Language::new("Czech", "ces"),
    Language::new("Ukrainian", "ukr"),
    Language::new("Greek", "ell"),
    Language::new("Hebrew", "heb"),
    Language::new("Farsi/Persian", "fas"),
    Language::new("Hindi", "hin"),
    Language::new("Urdu", "urd"),
    Language::new("Swedish", "swe"),
    Language::new("Bengali", "ben"),
    Language::new("Malay", "msa"),
    Language::new("Romanian", "ron"),
];

/// Summarizer models in the order they are offered; the first entry is the default.
pub const MODELS: &[SummarizerModel] = &[
    SummarizerModel {
        name: "GPT-3.5-Turbo",
        prompt_name: "vectara-summary-ext-v1.2.0",
    },
    SummarizerModel {
        name: "GPT-4-Turbo",
        prompt_name: "vectara-summary-ext-v1.3.0",
    },
];

/// Resolve a language by display name or code (case-insensitive). `auto` passes through.
pub fn resolve_language(input: &str) -> Option<&'static str> {
    let needle = input.trim();
    if needle.eq_ignore_ascii_case("auto") {
        return Some("auto");
    }
    LANGUAGES
        .iter()
        .find(|language| {
            language.name.eq_ignore_ascii_case(needle)
                || language.code.eq_ignore_ascii_case(needle)
        })
        .map(|language| language.code)
}

/// Resolve a summarizer by display name or prompt name (case-insensitive).
pub fn resolve_model(input: &str) -> Option<&'static str> {
    let needle = input.trim();
    MODELS
        .iter()
        .find(|model| {
            model.name.eq_ignore_ascii_case(needle)
                || model.prompt_name.eq_ignore_ascii_case(needle)
        })
        .map(|model| model.prompt_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_resolve_by_name_or_code() {
        assert_eq!(resolve_language("English"), Some("eng"));
        assert_eq!(resolve_language("farsi/persian"), Some("fas"));
        assert_eq!(resolve_language(" DEU "), Some("deu"));
        assert_eq!(resolve_language("auto"), Some("auto"));
        assert_eq!(resolve_language("Klingon"), None);
    }

    #[test]
    fn models_resolve_by_name_or_prompt() {
        assert_eq!(resolve_model("GPT-4-Turbo"), Some("vectara-summary-ext-v1.3.0"));
        assert_eq!(
            resolve_model("vectara-summary-ext-v1.2.0"),
            Some("vectara-summary-ext-v1.2.0")
        );
        assert_eq!(resolve_model("gpt-5"), None);
    }

    #[test]
    fn catalog_codes_are_unique() {
        let mut codes: Vec<_> = LANGUAGES.iter().map(|language| language.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), LANGUAGES.len());
        assert_eq!(LANGUAGES.len(), 28);
    }
}
