//! Static persona registry, with an optional TOML override file.
//!
//! Personas are defined once at process start and never mutated. Session
//! selections are resolved against the registry by name; an unknown or
//! duplicated name is an invalid request, caught before any service call.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use orchestration::{DebateError, Persona};

/// The five built-in debate personas.
pub fn builtin_personas() -> Vec<Persona> {
    vec![
        Persona {
            name: "Financial Analyst".into(),
            system_prompt: "You are a meticulous and conservative Financial Analyst. Your goal \
                is to assess market risks, revenue stability, and long-term investment value. \
                Your language is professional and focused on metrics. You must provide clear, \
                quantitative summaries. You MUST critique the previous agent's response, \
                identifying gaps or risks, and augment the analysis based on your financial \
                expertise."
                .into(),
            search_enabled: true,
        },
        Persona {
            name: "Tech Futurist".into(),
            system_prompt: "You are an optimistic Tech Futurist. Your goal is to identify \
                disruptive innovation, emerging technologies, and potential paradigm shifts. \
                Your language is visionary and forward-looking. You must critique the previous \
                agent's response, focusing on its lack of forward-looking perspective, and \
                project potential technological implications."
                .into(),
            search_enabled: true,
        },
        Persona {
            name: "Philosopher".into(),
            system_prompt: "You are a deep-thinking Philosopher, specialized in ethics and \
                epistemology. Your goal is to analyze the discussion chain. You MUST critique \
                the preceding response by questioning its ethical, logical, or existential \
                assumptions, offering contrasting philosophical viewpoints on the core issue."
                .into(),
            search_enabled: false,
        },
        Persona {
            name: "Historical Context Expert".into(),
            system_prompt: "You are a meticulous Historical Context Expert. Your goal is to \
                find relevant historical precedents, analogies, and the timeline of events. \
                You MUST critique the preceding response by grounding its claims in historical \
                reality or providing a relevant historical analogy."
                .into(),
            search_enabled: true,
        },
        Persona {
            name: "Creative Writer".into(),
            system_prompt: "You are a highly imaginative Creative Writer. Your goal is to \
                generate a short narrative, poem, or fictional scenario that illustrates the \
                current stage of the debate. You MUST take the discussion's current conclusion \
                and express it in an evocative, descriptive, and fictional manner."
                .into(),
            search_enabled: false,
        },
    ]
}

#[derive(Debug, Deserialize)]
struct PersonaFile {
    #[serde(default)]
    personas: Vec<Persona>,
}

/// Build the registry: built-ins, with entries from the optional TOML file
/// merged over them by name (same name replaces, new name appends).
pub fn load_registry(personas_file: Option<&Path>) -> Result<Vec<Persona>> {
    let mut registry = builtin_personas();

    if let Some(path) = personas_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read personas file {}", path.display()))?;
        let file: PersonaFile = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse personas file {}", path.display()))?;

        for persona in file.personas {
            match registry.iter_mut().find(|p| p.name == persona.name) {
                Some(existing) => *existing = persona,
                None => registry.push(persona),
            }
        }
        info!(path = %path.display(), count = registry.len(), "Loaded persona registry");
    }

    Ok(registry)
}

/// Resolve an ordered name selection against the registry.
///
/// Order is preserved; unknown or repeated names are an `InvalidRequest`.
pub fn resolve(registry: &[Persona], names: &[String]) -> Result<Vec<Persona>, DebateError> {
    let mut selected: Vec<Persona> = Vec::with_capacity(names.len());
    for name in names {
        if selected.iter().any(|p| &p.name == name) {
            return Err(DebateError::InvalidRequest {
                reason: format!("persona '{name}' selected more than once"),
            });
        }
        let persona = registry
            .iter()
            .find(|p| &p.name == name)
            .ok_or_else(|| DebateError::InvalidRequest {
                reason: format!("unknown persona '{name}'"),
            })?;
        selected.push(persona.clone());
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_have_unique_names_and_prompts() {
        let personas = builtin_personas();
        assert_eq!(personas.len(), 5);
        for (i, p) in personas.iter().enumerate() {
            assert!(!p.system_prompt.is_empty());
            assert!(personas[i + 1..].iter().all(|q| q.name != p.name));
        }
    }

    #[test]
    fn test_builtin_search_flags() {
        let personas = builtin_personas();
        let flag = |name: &str| personas.iter().find(|p| p.name == name).unwrap().search_enabled;
        assert!(flag("Financial Analyst"));
        assert!(flag("Tech Futurist"));
        assert!(!flag("Philosopher"));
        assert!(flag("Historical Context Expert"));
        assert!(!flag("Creative Writer"));
    }

    #[test]
    fn test_resolve_preserves_selection_order() {
        let registry = builtin_personas();
        let names = vec!["Philosopher".to_string(), "Financial Analyst".to_string()];
        let selected = resolve(&registry, &names).unwrap();
        assert_eq!(selected[0].name, "Philosopher");
        assert_eq!(selected[1].name, "Financial Analyst");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = builtin_personas();
        let err = resolve(&registry, &["Astrologer".to_string()]).unwrap_err();
        assert!(matches!(err, DebateError::InvalidRequest { reason } if reason.contains("Astrologer")));
    }

    #[test]
    fn test_resolve_duplicate_name() {
        let registry = builtin_personas();
        let names = vec!["Philosopher".to_string(), "Philosopher".to_string()];
        let err = resolve(&registry, &names).unwrap_err();
        assert!(matches!(err, DebateError::InvalidRequest { .. }));
    }

    #[test]
    fn test_registry_file_merges_over_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("personas.toml");
        std::fs::write(
            &path,
            r#"
[[personas]]
name = "Philosopher"
system_prompt = "You are a stoic."
search_enabled = true

[[personas]]
name = "Economist"
system_prompt = "You are an economist."
"#,
        )
        .unwrap();

        let registry = load_registry(Some(&path)).unwrap();
        assert_eq!(registry.len(), 6);
        let philosopher = registry.iter().find(|p| p.name == "Philosopher").unwrap();
        assert_eq!(philosopher.system_prompt, "You are a stoic.");
        assert!(philosopher.search_enabled);
        assert!(registry.iter().any(|p| p.name == "Economist"));
    }

    #[test]
    fn test_registry_without_file_is_builtins() {
        let registry = load_registry(None).unwrap();
        assert_eq!(registry, builtin_personas());
    }
}
