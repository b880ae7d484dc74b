//! Built-in scenarios
//!
//! Compiled into the binary so the tool needs no files on disk. A name
//! passed to `run` or `show` is looked up here first, then treated as a
//! path.

use super::Scenario;
use crate::common::Result;

/// A named built-in scenario
pub struct Builtin {
    pub name: &'static str,
    pub summary: &'static str,
    yaml: &'static str,
}

impl Builtin {
    /// Parse the embedded YAML
    pub fn load(&self) -> Result<Scenario> {
        Scenario::from_yaml(self.yaml)
    }
}

/// All built-in scenarios, in the order `list` prints them
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "full",
        summary: "Every route group in one run: auth, profile, documents, comments, community, AI",
        yaml: include_str!("../../scenarios/full.yaml"),
    },
    Builtin {
        name: "auth",
        summary: "Registration, login, token refresh and logout",
        yaml: include_str!("../../scenarios/auth.yaml"),
    },
    Builtin {
        name: "documents",
        summary: "Document CRUD ending with delete verification",
        yaml: include_str!("../../scenarios/documents.yaml"),
    },
    Builtin {
        name: "avatar",
        summary: "Avatar upload over multipart and profile readback",
        yaml: include_str!("../../scenarios/avatar.yaml"),
    },
];

/// Look up a built-in by name
pub fn get(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_parse() {
        for builtin in BUILTINS {
            let scenario = builtin.load().unwrap();
            assert_eq!(scenario.name, builtin.name);
            assert!(!scenario.steps.is_empty(), "{} has no steps", builtin.name);
        }
    }

    #[test]
    fn test_builtin_names_unique() {
        for (i, a) in BUILTINS.iter().enumerate() {
            for b in &BUILTINS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_full_ends_with_delete_verification() {
        let scenario = get("full").unwrap().load().unwrap();
        let last = scenario.steps.last().unwrap();
        assert_eq!(last.expect, Some(crate::scenario::Expect::AnyOf(vec![404, 403])));
    }

    #[test]
    fn test_full_registers_with_random_identity() {
        let scenario = get("full").unwrap().load().unwrap();
        let register = &scenario.steps[0];
        let body = register.body.as_ref().unwrap().to_string();
        assert!(body.contains("{{username}}"));
        assert!(body.contains("{{email}}"));
    }

    #[test]
    fn test_unknown_builtin_is_none() {
        assert!(get("nope").is_none());
    }
}
