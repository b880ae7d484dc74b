//! `{{name}}` placeholder rendering
//!
//! Paths, query values and JSON body strings may reference run context
//! variables. A string that is exactly one placeholder keeps the variable's
//! JSON type when substituted into a body, so extracted numeric ids round-trip
//! as numbers; anywhere else values are spliced in as text.

use serde_json::Value;

/// Render a string template, splicing in variable values as text
///
/// Returns the name of the first missing variable as the error.
pub fn render_str<F>(template: &str, lookup: &F) -> std::result::Result<String, String>
where
    F: Fn(&str) -> Option<Value>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match lookup(name) {
                    Some(value) => out.push_str(&scalar_string(&value)),
                    None => return Err(name.to_string()),
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unclosed braces are kept literally
                out.push_str(&rest[start..]);
                return Ok(out);
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Render every string leaf of a JSON body template
pub fn render_value<F>(value: &Value, lookup: &F) -> std::result::Result<Value, String>
where
    F: Fn(&str) -> Option<Value>,
{
    match value {
        Value::String(s) => match exact_placeholder(s) {
            Some(name) => lookup(name).ok_or_else(|| name.to_string()),
            None => render_str(s, lookup).map(Value::String),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, lookup))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, item)| Ok((key.clone(), render_value(item, lookup)?)))
            .collect::<std::result::Result<serde_json::Map<_, _>, String>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// List the variable names a template references, in order of appearance
pub fn scan(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if !name.is_empty() {
                    names.push(name.to_string());
                }
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    names
}

/// List the variable names referenced anywhere in a JSON template
pub fn scan_value(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect(value, &mut names);
    names
}

fn collect(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::String(s) => names.extend(scan(s)),
        Value::Array(items) => items.iter().for_each(|item| collect(item, names)),
        Value::Object(fields) => fields.values().for_each(|item| collect(item, names)),
        _ => {}
    }
}

/// The placeholder name if the string is exactly one `{{name}}`
fn exact_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains('{') || inner.contains('}') {
        return None;
    }
    Some(inner.trim())
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup<'a>(vars: &'a [(&'a str, Value)]) -> impl Fn(&str) -> Option<Value> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        }
    }

    #[test]
    fn test_render_str_interpolates() {
        let vars = [("docId", json!(42)), ("name", json!("plan"))];
        let rendered = render_str("/documents/{{docId}}?q={{name}}", &lookup(&vars)).unwrap();
        assert_eq!(rendered, "/documents/42?q=plan");
    }

    #[test]
    fn test_render_str_missing_var() {
        let vars = [("a", json!(1))];
        let err = render_str("/x/{{missing}}", &lookup(&vars)).unwrap_err();
        assert_eq!(err, "missing");
    }

    #[test]
    fn test_render_str_trims_inside_braces() {
        let vars = [("docId", json!(7))];
        assert_eq!(
            render_str("/d/{{ docId }}", &lookup(&vars)).unwrap(),
            "/d/7"
        );
    }

    #[test]
    fn test_unclosed_braces_kept_literal() {
        let vars = [];
        assert_eq!(
            render_str("/d/{{oops", &lookup(&vars)).unwrap(),
            "/d/{{oops"
        );
    }

    #[test]
    fn test_no_placeholders_passthrough() {
        let vars = [];
        assert_eq!(
            render_str("/auth/login", &lookup(&vars)).unwrap(),
            "/auth/login"
        );
    }

    #[test]
    fn test_render_value_keeps_type_for_exact_placeholder() {
        let vars = [("docId", json!(42))];
        let body = json!({"documentId": "{{docId}}", "label": "doc {{docId}}"});
        let rendered = render_value(&body, &lookup(&vars)).unwrap();
        assert_eq!(rendered, json!({"documentId": 42, "label": "doc 42"}));
    }

    #[test]
    fn test_render_value_walks_arrays_and_nested_objects() {
        let vars = [("tag", json!("rust")), ("n", json!(3))];
        let body = json!({"tags": ["{{tag}}", "fixed"], "meta": {"count": "{{n}}"}});
        let rendered = render_value(&body, &lookup(&vars)).unwrap();
        assert_eq!(rendered, json!({"tags": ["rust", "fixed"], "meta": {"count": 3}}));
    }

    #[test]
    fn test_render_value_missing_var_names_it() {
        let vars = [];
        let body = json!({"id": "{{docId}}"});
        assert_eq!(render_value(&body, &lookup(&vars)).unwrap_err(), "docId");
    }

    #[test]
    fn test_scan_lists_references_in_order() {
        assert_eq!(
            scan("/documents/{{docId}}/comments/{{commentId}}"),
            vec!["docId".to_string(), "commentId".to_string()]
        );
        assert!(scan("/auth/login").is_empty());
    }

    #[test]
    fn test_scan_value_walks_the_tree() {
        let body = json!({
            "username": "{{username}}",
            "nested": {"token": "{{refreshToken}}"},
            "tags": ["{{tag}}", "fixed"],
            "count": 3,
        });
        let names = scan_value(&body);
        assert!(names.contains(&"username".to_string()));
        assert!(names.contains(&"refreshToken".to_string()));
        assert!(names.contains(&"tag".to_string()));
        assert_eq!(names.len(), 3);
    }
}
