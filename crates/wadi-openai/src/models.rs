// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Friendly model name translation.
//!
//! Each backend family has a versioned alias table (client-facing name to
//! concrete backend model) and a set of prefix patterns. Names found in the
//! alias table are rewritten; names matching a prefix pass through
//! unchanged; anything else is rejected.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::RegexSet;
use strum::{Display, EnumString};

/// Bumped whenever an alias entry is added, removed or retargeted.
pub const ALIAS_TABLE_VERSION: u32 = 3;

/// Backend families that speak the OpenAI chat-completions protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    #[strum(serialize = "openai")]
    OpenAi,
    Groq,
}

impl Backend {
    /// Default API base URL for this backend.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Backend::OpenAi => "https://api.openai.com/v1",
            Backend::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Environment variable consulted when no API key is configured.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Backend::OpenAi => "OPENAI_API_KEY",
            Backend::Groq => "GROQ_API_KEY",
        }
    }
}

const OPENAI_ALIASES: &[(&str, &str)] = &[
    ("gpt-4", "gpt-4o"),
    ("gpt-4-turbo", "gpt-4o"),
    ("gpt-3.5", "gpt-4o-mini"),
];

const GROQ_ALIASES: &[(&str, &str)] = &[
    ("gpt-4", "llama-3.3-70b-versatile"),
    ("gpt-4o", "llama-3.3-70b-versatile"),
    ("gpt-4-turbo", "llama-3.3-70b-versatile"),
    ("gpt-4o-mini", "llama-3.1-8b-instant"),
    ("gpt-3.5-turbo", "llama-3.1-8b-instant"),
    ("gpt-3.5", "llama-3.1-8b-instant"),
];

const OPENAI_PATTERNS: &[&str] = &[r"^gpt-", r"^o[134](-|$)", r"^chatgpt-"];

const GROQ_PATTERNS: &[&str] = &[
    r"^llama",
    r"^mixtral-",
    r"^gemma",
    r"^qwen",
    r"^deepseek-",
    r"^meta-llama/",
];

static OPENAI_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(OPENAI_PATTERNS).unwrap_or_else(|_| RegexSet::empty())
});

static GROQ_SET: LazyLock<RegexSet> =
    LazyLock::new(|| RegexSet::new(GROQ_PATTERNS).unwrap_or_else(|_| RegexSet::empty()));

/// Alias table and pass-through patterns for one backend.
#[derive(Debug, Clone)]
pub struct ModelTable {
    backend: Backend,
    aliases: HashMap<&'static str, &'static str>,
    patterns: &'static RegexSet,
}

impl ModelTable {
    pub fn for_backend(backend: Backend) -> Self {
        let (aliases, patterns): (&[(&str, &str)], &'static RegexSet) = match backend {
            Backend::OpenAi => (OPENAI_ALIASES, &*OPENAI_SET),
            Backend::Groq => (GROQ_ALIASES, &*GROQ_SET),
        };
        Self {
            backend,
            aliases: aliases.iter().copied().collect(),
            patterns,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Resolve a friendly name to the concrete backend model.
    pub fn resolve(&self, model: &str) -> Option<String> {
        let model = model.trim();
        if model.is_empty() {
            return None;
        }
        if let Some(target) = self.aliases.get(model) {
            return Some((*target).to_string());
        }
        if self.patterns.is_match(model) {
            return Some(model.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn backend_parses_from_config_string() {
        assert_eq!(Backend::from_str("openai").unwrap(), Backend::OpenAi);
        assert_eq!(Backend::from_str("groq").unwrap(), Backend::Groq);
        assert!(Backend::from_str("anthropic").is_err());
        assert_eq!(Backend::OpenAi.to_string(), "openai");
    }

    #[test]
    fn groq_aliases_gpt_names() {
        let table = ModelTable::for_backend(Backend::Groq);
        assert_eq!(
            table.resolve("gpt-4").as_deref(),
            Some("llama-3.3-70b-versatile")
        );
        assert_eq!(
            table.resolve("gpt-3.5-turbo").as_deref(),
            Some("llama-3.1-8b-instant")
        );
    }

    #[test]
    fn groq_passes_native_models_through() {
        let table = ModelTable::for_backend(Backend::Groq);
        assert_eq!(
            table.resolve("mixtral-8x7b-32768").as_deref(),
            Some("mixtral-8x7b-32768")
        );
        assert_eq!(
            table.resolve("llama-3.1-8b-instant").as_deref(),
            Some("llama-3.1-8b-instant")
        );
    }

    #[test]
    fn groq_rejects_unknown_gpt_variants() {
        let table = ModelTable::for_backend(Backend::Groq);
        assert!(table.resolve("gpt-5-ultra").is_none());
    }

    #[test]
    fn openai_passes_prefixed_names_through() {
        let table = ModelTable::for_backend(Backend::OpenAi);
        assert_eq!(table.resolve("gpt-4o-mini").as_deref(), Some("gpt-4o-mini"));
        assert_eq!(table.resolve("o1-mini").as_deref(), Some("o1-mini"));
        assert_eq!(table.resolve("o3").as_deref(), Some("o3"));
        assert_eq!(table.resolve("gpt-4").as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn unrecognized_names_are_rejected() {
        let table = ModelTable::for_backend(Backend::OpenAi);
        assert!(table.resolve("claude-3-opus").is_none());
        assert!(table.resolve("").is_none());
        assert!(table.resolve("   ").is_none());
        assert!(table.resolve("omega").is_none());
    }
}
