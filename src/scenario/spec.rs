//! Scenario definition types
//!
//! Defines the data structures for deserializing YAML scenarios: an ordered
//! list of HTTP steps, each with an expected status set and optional rules
//! for extracting response values into the run context. Path, query and
//! body strings may reference context variables with `{{name}}`.

use reqwest::Method;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario covers
    pub description: Option<String>,
    /// Fixed variables seeded into the run context before the first step
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// The sequence of HTTP steps to execute, in order
    pub steps: Vec<Step>,
}

/// A single HTTP step
#[derive(Deserialize, Debug)]
pub struct Step {
    /// Name shown in the report
    pub name: String,
    /// HTTP method (default: GET)
    #[serde(default = "default_method", deserialize_with = "deserialize_method")]
    pub method: Method,
    /// Request path relative to the base URL, e.g. `/documents/{{docId}}`
    pub path: String,
    /// Query parameters; values may contain placeholders
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// JSON body template; string leaves may contain placeholders
    pub body: Option<Value>,
    /// Single-file multipart body (mutually exclusive with `body`)
    pub multipart: Option<MultipartSpec>,
    /// Send the context's access token as a bearer Authorization header
    #[serde(default)]
    pub auth: bool,
    /// Variables that must be present before this step may run, in addition
    /// to whatever the templates reference
    #[serde(default)]
    pub requires: Vec<String>,
    /// Skip quietly when a prerequisite is absent instead of flagging it
    #[serde(default)]
    pub optional: bool,
    /// Expected status codes; omitted means any 2xx passes
    pub expect: Option<Expect>,
    /// Extraction rules: variable name mapped to candidate response paths
    #[serde(default)]
    pub extract: BTreeMap<String, Paths>,
}

fn default_method() -> Method {
    Method::GET
}

fn deserialize_method<'de, D>(deserializer: D) -> std::result::Result<Method, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| serde::de::Error::custom(format!("invalid HTTP method '{raw}'")))
}

/// Expected status codes for a step
///
/// Listing failure codes makes an expected failure the passing condition,
/// e.g. `expect: [404, 403]` after deleting a resource.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Expect {
    /// A single expected status code
    Code(u16),
    /// Any of these status codes
    AnyOf(Vec<u16>),
}

impl Expect {
    /// Whether the given status satisfies this expectation
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Expect::Code(code) => *code == status,
            Expect::AnyOf(codes) => codes.contains(&status),
        }
    }
}

/// Candidate response paths for one extracted variable
///
/// Accepts a single path or a list; with a list the first present path wins.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Paths {
    /// One path, subject to envelope expansion when bare
    One(String),
    /// Explicit candidates, used verbatim
    Candidates(Vec<String>),
}

impl Paths {
    /// The declared candidate paths, in order
    pub fn candidates(&self) -> &[String] {
        match self {
            Paths::One(path) => std::slice::from_ref(path),
            Paths::Candidates(paths) => paths,
        }
    }
}

/// Single-file multipart body
#[derive(Deserialize, Debug, Clone)]
pub struct MultipartSpec {
    /// Form field name the server expects
    #[serde(default = "default_part_field")]
    pub field: String,
    /// File name reported to the server
    #[serde(default = "default_part_file_name")]
    pub file_name: String,
    /// MIME type for the part
    pub content_type: Option<String>,
    /// Inline content; keeps built-in scenarios self-contained
    pub text: Option<String>,
    /// Read content from this file instead of `text`
    pub path: Option<PathBuf>,
}

fn default_part_field() -> String {
    "file".to_string()
}

fn default_part_file_name() -> String {
    "upload.bin".to_string()
}

impl Step {
    /// Whether the given status satisfies this step's expectation
    pub fn passes(&self, status: u16) -> bool {
        match &self.expect {
            Some(expect) => expect.matches(status),
            None => (200..300).contains(&status),
        }
    }
}

impl Scenario {
    /// Parse a scenario from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_yaml::from_str(yaml).map_err(|e| Error::ScenarioParse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Self::from_yaml(&content)
    }

    /// Reject definitions the runner cannot execute sensibly
    fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::ScenarioParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        for step in &self.steps {
            if step.body.is_some() && step.multipart.is_some() {
                return Err(Error::ScenarioParse(format!(
                    "step '{}' declares both body and multipart",
                    step.name
                )));
            }
            if let Some(part) = &step.multipart {
                if part.text.is_some() == part.path.is_some() {
                    return Err(Error::ScenarioParse(format!(
                        "step '{}' multipart needs exactly one of text or path",
                        step.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_step_defaults() {
        let scenario = Scenario::from_yaml(
            r#"
            name: ping
            steps:
              - name: health
                path: /health
            "#,
        )
        .unwrap();
        let step = &scenario.steps[0];
        assert_eq!(step.method, Method::GET);
        assert!(!step.auth);
        assert!(!step.optional);
        assert!(step.expect.is_none());
        assert!(step.extract.is_empty());
        assert!(step.passes(200));
        assert!(step.passes(204));
        assert!(!step.passes(404));
    }

    #[test]
    fn test_expect_list_and_single() {
        let scenario = Scenario::from_yaml(
            r#"
            name: deletes
            steps:
              - name: delete
                method: DELETE
                path: /documents/1
                expect: [200, 204]
              - name: verify gone
                path: /documents/1
                expect: [404, 403]
              - name: created
                method: POST
                path: /documents
                expect: 201
            "#,
        )
        .unwrap();
        assert!(scenario.steps[0].passes(204));
        assert!(scenario.steps[1].passes(403));
        assert!(!scenario.steps[1].passes(200));
        assert!(scenario.steps[2].passes(201));
        assert!(!scenario.steps[2].passes(200));
    }

    #[test]
    fn test_extract_single_and_candidate_list() {
        let scenario = Scenario::from_yaml(
            r#"
            name: extracts
            steps:
              - name: login
                method: POST
                path: /auth/login
                extract:
                  accessToken: accessToken
                  commentId: [data.id, data.0.id]
            "#,
        )
        .unwrap();
        let extract = &scenario.steps[0].extract;
        assert_eq!(extract["accessToken"].candidates(), ["accessToken"]);
        assert_eq!(extract["commentId"].candidates(), ["data.id", "data.0.id"]);
    }

    #[test]
    fn test_invalid_method_rejected() {
        let result = Scenario::from_yaml(
            r#"
            name: bad
            steps:
              - name: weird
                method: "GE T"
                path: /x
            "#,
        );
        assert!(matches!(result, Err(Error::ScenarioParse(_))));
    }

    #[test]
    fn test_body_and_multipart_conflict() {
        let result = Scenario::from_yaml(
            r#"
            name: conflict
            steps:
              - name: upload
                method: POST
                path: /users/me/avatar
                body: {a: 1}
                multipart:
                  text: hello
            "#,
        );
        assert!(matches!(result, Err(Error::ScenarioParse(_))));
    }

    #[test]
    fn test_empty_scenario_rejected() {
        let result = Scenario::from_yaml("name: empty\nsteps: []\n");
        assert!(matches!(result, Err(Error::ScenarioParse(_))));
    }
}
