//! Per-run variable store
//!
//! Holds the values later steps thread into their requests: the random
//! identity, scenario and config seeds, and everything extracted from earlier
//! responses. The store lives for one run and is discarded with it.

use rand::Rng;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::common::config::Envelope;

/// Context variable the bearer token is read from
pub const ACCESS_TOKEN: &str = "accessToken";

/// Mutable variable store for one scenario run
#[derive(Debug, Default)]
pub struct RunContext {
    vars: BTreeMap<String, Value>,
}

impl RunContext {
    /// Create a context seeded with a fresh random identity
    ///
    /// Registration steps use `{{username}}` / `{{email}}`; randomizing them
    /// keeps repeated runs against the same deployment from colliding.
    pub fn seeded() -> Self {
        let mut ctx = Self::default();
        let identity = Identity::fresh();
        ctx.set("username", Value::String(identity.username));
        ctx.set("email", Value::String(identity.email));
        ctx
    }

    /// Set a variable, overwriting any previous value
    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    /// Set a variable from a plain string
    pub fn set_str(&mut self, name: &str, value: &str) {
        self.set(name, Value::String(value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Bearer token for authenticated steps, if one is present
    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN).map(|value| match value {
            Value::String(token) => token.clone(),
            other => other.to_string(),
        })
    }

    /// Apply one extraction rule against a response body
    ///
    /// Candidate paths are tried in order and the first present, non-null
    /// value wins. A single bare path is expanded per the envelope
    /// convention; dotted paths and explicit candidate lists are used
    /// verbatim. Returns false (leaving any existing value untouched) when
    /// nothing matched.
    pub fn extract(
        &mut self,
        name: &str,
        declared: &[String],
        envelope: Envelope,
        body: &Value,
    ) -> bool {
        let expanded: Vec<String> = if declared.len() == 1 {
            expand(&declared[0], envelope)
        } else {
            declared.to_vec()
        };
        for path in &expanded {
            if let Some(value) = json_path(body, path) {
                if !value.is_null() {
                    self.set(name, value.clone());
                    return true;
                }
            }
        }
        false
    }

    /// Snapshot of the variable map, for logging and tests
    pub fn vars(&self) -> &BTreeMap<String, Value> {
        &self.vars
    }
}

/// Expand a declared extraction path into envelope-aware candidates
fn expand(path: &str, envelope: Envelope) -> Vec<String> {
    if path.contains('.') {
        return vec![path.to_string()];
    }
    match envelope {
        Envelope::Auto => vec![format!("data.{path}"), path.to_string()],
        Envelope::Data => vec![format!("data.{path}")],
        Envelope::Root => vec![path.to_string()],
    }
}

/// Look up a dotted path in a JSON value
///
/// Segments index objects by key and arrays by number, so `data.0.id` reads
/// the id of the first element of a `data` array.
pub fn json_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Fresh random identity for one run
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub email: String,
}

impl Identity {
    pub fn fresh() -> Self {
        let tag: u32 = rand::thread_rng().gen();
        let username = format!("user_{tag:08x}");
        let email = format!("{username}@example.com");
        Self { username, email }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_path_objects_and_arrays() {
        let body = json!({"data": {"user": {"id": 5}}, "items": [{"id": 1}, {"id": 2}]});
        assert_eq!(json_path(&body, "data.user.id"), Some(&json!(5)));
        assert_eq!(json_path(&body, "items.1.id"), Some(&json!(2)));
        assert_eq!(json_path(&body, "data.user.name"), None);
        assert_eq!(json_path(&body, "items.9.id"), None);
        assert_eq!(json_path(&body, "items.x"), None);
    }

    #[test]
    fn test_extract_auto_probes_data_then_root() {
        let mut ctx = RunContext::default();
        let enveloped = json!({"data": {"id": 42}});
        assert!(ctx.extract("docId", &["id".to_string()], Envelope::Auto, &enveloped));
        assert_eq!(ctx.get("docId"), Some(&json!(42)));

        let root = json!({"accessToken": "tok"});
        assert!(ctx.extract(
            "accessToken",
            &["accessToken".to_string()],
            Envelope::Auto,
            &root
        ));
        assert_eq!(ctx.get("accessToken"), Some(&json!("tok")));
    }

    #[test]
    fn test_extract_data_envelope_never_reads_root() {
        let mut ctx = RunContext::default();
        let root = json!({"id": 42});
        assert!(!ctx.extract("docId", &["id".to_string()], Envelope::Data, &root));
        assert!(!ctx.contains("docId"));
    }

    #[test]
    fn test_extract_dotted_path_used_verbatim() {
        let mut ctx = RunContext::default();
        let body = json!({"data": {"nested": {"id": 9}}});
        assert!(ctx.extract(
            "id",
            &["data.nested.id".to_string()],
            Envelope::Auto,
            &body
        ));
        assert_eq!(ctx.get("id"), Some(&json!(9)));
    }

    #[test]
    fn test_extract_candidate_list_first_present_wins() {
        let mut ctx = RunContext::default();
        let declared = vec!["data.id".to_string(), "data.0.id".to_string()];
        let list_body = json!({"data": [{"id": 7}]});
        assert!(ctx.extract("commentId", &declared, Envelope::Auto, &list_body));
        assert_eq!(ctx.get("commentId"), Some(&json!(7)));
    }

    #[test]
    fn test_extract_null_treated_as_absent() {
        let mut ctx = RunContext::default();
        ctx.set("docId", json!(1));
        let body = json!({"data": {"id": null}});
        assert!(!ctx.extract("docId", &["id".to_string()], Envelope::Auto, &body));
        // The previous value survives a miss
        assert_eq!(ctx.get("docId"), Some(&json!(1)));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let mut ctx = RunContext::default();
        let body = json!({"data": {"id": 42}});
        ctx.extract("docId", &["id".to_string()], Envelope::Auto, &body);
        let before = ctx.vars().clone();
        ctx.extract("docId", &["id".to_string()], Envelope::Auto, &body);
        assert_eq!(ctx.vars(), &before);
    }

    #[test]
    fn test_seeded_identities_differ_between_runs() {
        let a = Identity::fresh();
        let b = Identity::fresh();
        assert_ne!(a.username, b.username);
        assert!(a.email.starts_with(&a.username));
    }

    #[test]
    fn test_access_token_reads_string() {
        let mut ctx = RunContext::default();
        assert!(ctx.access_token().is_none());
        ctx.set_str(ACCESS_TOKEN, "abc123");
        assert_eq!(ctx.access_token().as_deref(), Some("abc123"));
    }
}
