//! Template Substitution Engine.
//!
//! Resolves `{{name}}` placeholders inside strings, objects, and arrays
//! against a parameter value map. Templates are parsed once into a small
//! typed AST ([`StringTemplate`]) and evaluated per dispatch, instead of the
//! string-replace-and-reparse approach this engine replaces; the quoted vs
//! unquoted distinction for JSON bodies is decided from the neighboring
//! literal segments rather than by scanning the substituted text again.
//!
//! # Substitution rules
//!
//! - Plain strings (URLs, headers): every `{{key}}` is replaced by the string
//!   form of `params[key]`; array values are joined with `,`. Missing
//!   parameters leave the token verbatim so callers can detect it.
//! - String-shaped JSON bodies: a quoted `"{{key}}"` or unquoted `{{key}}`
//!   occurrence is replaced by the JSON encoding of the value, preserving
//!   types (numbers stay unquoted, strings/arrays are quoted/bracketed). The
//!   result is parsed as JSON, or passed through unparsed if that fails.
//! - Object-shaped bodies: leaf strings are substituted like plain strings.
//! - Filtering: fields whose final value is an unresolved placeholder token,
//!   null, or an empty list are dropped, so the model can leave optional
//!   parameters blank without producing invalid requests.

use crate::action::{BodyTemplate, HttpMethod, RequestTemplate};
use serde_json::{Map, Value};

/// A parameter value map, keyed by declared parameter name.
pub type ParamMap = Map<String, Value>;

/// A string template parsed into literal and placeholder segments.
#[derive(Debug, Clone, PartialEq)]
pub struct StringTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

impl StringTemplate {
    /// Parse a template. Parsing never fails: text without a matching
    /// `{{`/`}}` pair is kept as a literal.
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = input;

        while let Some(start) = rest.find("{{") {
            match rest[start + 2..].find("}}") {
                Some(offset) => {
                    let key = rest[start + 2..start + 2 + offset].trim();
                    if start > 0 {
                        segments.push(Segment::Literal(rest[..start].to_string()));
                    }
                    segments.push(Segment::Placeholder(key.to_string()));
                    rest = &rest[start + 2 + offset + 2..];
                }
                None => break,
            }
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Self { segments }
    }

    /// Placeholder names referenced by this template, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(key) => Some(key.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// First referenced parameter that is absent (or null) in `params`.
    pub fn first_missing<'a>(&'a self, params: &ParamMap) -> Option<&'a str> {
        self.placeholders()
            .find(|key| params.get(*key).filter(|v| !v.is_null()).is_none())
    }

    /// Substitute placeholders with the string form of each parameter value.
    ///
    /// Missing parameters re-emit the `{{key}}` token verbatim.
    pub fn render(&self, params: &ParamMap) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => {
                    match params.get(key).filter(|v| !v.is_null()) {
                        Some(value) => out.push_str(&display_value(value)),
                        None => {
                            out.push_str("{{");
                            out.push_str(key);
                            out.push_str("}}");
                        }
                    }
                }
            }
        }
        out
    }

    /// Substitute placeholders in a literal JSON document, preserving value
    /// types, then parse the result.
    ///
    /// A placeholder directly enclosed in double quotes consumes those quotes
    /// so that `"{{amount}}"` and `{{amount}}` both yield an unquoted number
    /// for numeric parameters. If the substituted text fails to parse as
    /// JSON it is passed through unparsed as a string value; otherwise the
    /// parsed value is pruned per the filtering rule.
    pub fn render_json(&self, params: &ParamMap) -> Value {
        let mut out = String::new();
        let mut skip_leading_quote = false;

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    let text = if skip_leading_quote {
                        text.strip_prefix('"').unwrap_or(text)
                    } else {
                        text.as_str()
                    };
                    skip_leading_quote = false;
                    out.push_str(text);
                }
                Segment::Placeholder(key) => {
                    let quoted = out.ends_with('"')
                        && matches!(
                            self.segments.get(index + 1),
                            Some(Segment::Literal(next)) if next.starts_with('"')
                        );
                    match params.get(key).filter(|v| !v.is_null()) {
                        Some(value) => {
                            let encoded = serde_json::to_string(value)
                                .unwrap_or_else(|_| value.to_string());
                            if quoted {
                                out.pop();
                                skip_leading_quote = true;
                            }
                            out.push_str(&encoded);
                        }
                        None => {
                            out.push_str("{{");
                            out.push_str(key);
                            out.push_str("}}");
                        }
                    }
                }
            }
        }

        match serde_json::from_str::<Value>(&out) {
            Ok(parsed) => prune(parsed),
            Err(_) => Value::String(out),
        }
    }
}

/// String form of a parameter value: strings as-is, arrays joined with `,`,
/// everything else via its JSON rendering.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Whether a string is exactly one unresolved placeholder token.
pub fn is_unresolved(text: &str) -> bool {
    text.starts_with("{{") && text.ends_with("}}") && text.len() > 4
}

/// Whether a string still contains any placeholder token.
pub fn has_placeholder(text: &str) -> bool {
    match text.find("{{") {
        Some(start) => text[start + 2..].contains("}}"),
        None => false,
    }
}

fn should_drop(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => is_unresolved(text),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Drop object fields whose value is an unresolved placeholder token, null,
/// or an empty list. Applied recursively to nested objects.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(key, value)| {
                    let value = prune(value);
                    if should_drop(&value) {
                        None
                    } else {
                        Some((key, value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune).collect()),
        other => other,
    }
}

/// Substitute an object-shaped body template and apply the filtering rule.
pub fn substitute_body(template: &Value, params: &ParamMap) -> Value {
    prune(substitute_value(template, params))
}

fn substitute_value(template: &Value, params: &ParamMap) -> Value {
    match template {
        Value::String(text) => Value::String(StringTemplate::parse(text).render(params)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_value(item, params))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), substitute_value(value, params)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Apply the filtering rule to a plain argument map (no substitution).
///
/// Used for client dispatch, where arguments are passed through as structured
/// data but placeholder-shaped and empty values must still be removed.
pub fn filter_args(args: &Value) -> Value {
    match args {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, value)| !should_drop(value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Interpret raw tool arguments as a parameter map. Non-object arguments
/// yield an empty map.
pub fn params_from_args(args: &Value) -> ParamMap {
    match args {
        Value::Object(map) => {
            let mut params = Map::new();
            for (key, value) in map {
                if !value.is_null() {
                    params.insert(key.clone(), value.clone());
                }
            }
            params
        }
        _ => Map::new(),
    }
}

/// A request template with all of its string templates parsed once.
#[derive(Debug, Clone)]
pub struct CompiledRequest {
    url: StringTemplate,
    method: HttpMethod,
    headers: Vec<(String, StringTemplate)>,
    body: Option<CompiledBody>,
}

#[derive(Debug, Clone)]
enum CompiledBody {
    Text(StringTemplate),
    Structured(Value),
}

/// A fully substituted request, ready to be issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl CompiledRequest {
    /// Parse every template in the request once.
    pub fn compile(request: &RequestTemplate) -> Self {
        let headers = request
            .headers
            .as_ref()
            .map(|headers| {
                headers
                    .iter()
                    .map(|(name, value)| (name.clone(), StringTemplate::parse(value)))
                    .collect()
            })
            .unwrap_or_default();

        let body = request.body.as_ref().map(|body| match body {
            BodyTemplate::Text(text) => CompiledBody::Text(StringTemplate::parse(text)),
            BodyTemplate::Structured(value) => CompiledBody::Structured(value.clone()),
        });

        Self {
            url: StringTemplate::parse(&request.url),
            method: request.method,
            headers,
            body,
        }
    }

    /// First URL or header parameter absent from `params`, if any.
    ///
    /// Bodies are not checked: a missing body parameter is dropped by the
    /// filtering rule, but an unresolved URL or header would produce an
    /// invalid request and must block dispatch.
    pub fn first_missing<'a>(&'a self, params: &ParamMap) -> Option<&'a str> {
        self.url.first_missing(params).or_else(|| {
            self.headers
                .iter()
                .find_map(|(_, template)| template.first_missing(params))
        })
    }

    /// Substitute every template against `params`.
    pub fn resolve(&self, params: &ParamMap) -> ResolvedRequest {
        let body = self.body.as_ref().map(|body| match body {
            CompiledBody::Text(template) => template.render_json(params),
            CompiledBody::Structured(template) => substitute_body(template, params),
        });

        ResolvedRequest {
            url: self.url.render(params),
            method: self.method,
            headers: self
                .headers
                .iter()
                .map(|(name, template)| (name.clone(), template.render(params)))
                .collect(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> ParamMap {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn renders_single_placeholder() {
        let template = StringTemplate::parse("https://api.x/{{city}}");
        let rendered = template.render(&params(&[("city", json!("Oslo"))]));
        assert_eq!(rendered, "https://api.x/Oslo");
    }

    #[test]
    fn renders_multiple_placeholders_independently() {
        let template = StringTemplate::parse("{{a}}-{{b}}-{{a}}");
        let rendered = template.render(&params(&[("a", json!("x")), ("b", json!(2))]));
        assert_eq!(rendered, "x-2-x");
    }

    #[test]
    fn joins_array_values_with_commas() {
        let template = StringTemplate::parse("ids={{ids}}");
        let rendered = template.render(&params(&[("ids", json!([1, 2, 3]))]));
        assert_eq!(rendered, "ids=1,2,3");
    }

    #[test]
    fn missing_parameter_keeps_token_verbatim() {
        let template = StringTemplate::parse("https://api.x/{{city}}");
        assert_eq!(template.render(&params(&[])), "https://api.x/{{city}}");
        assert_eq!(template.first_missing(&params(&[])), Some("city"));
    }

    #[test]
    fn null_parameter_counts_as_missing() {
        let template = StringTemplate::parse("{{city}}");
        assert_eq!(
            template.first_missing(&params(&[("city", Value::Null)])),
            Some("city")
        );
    }

    // Scenario: '{"amount": {{amount}}, "note": "{{note}}"}' with
    // {amount: 5, note: "hi"} parses with amount numeric and note quoted.
    #[test]
    fn json_body_preserves_types_for_quoted_and_unquoted_tokens() {
        let template =
            StringTemplate::parse(r#"{"amount": {{amount}}, "note": "{{note}}"}"#);
        let body = template.render_json(&params(&[("amount", json!(5)), ("note", json!("hi"))]));
        assert_eq!(body, json!({"amount": 5, "note": "hi"}));
    }

    #[test]
    fn json_body_quoted_token_accepts_non_string_values() {
        let template = StringTemplate::parse(r#"{"amount": "{{amount}}"}"#);
        let body = template.render_json(&params(&[("amount", json!(5))]));
        assert_eq!(body, json!({"amount": 5}));
    }

    #[test]
    fn json_body_encodes_arrays_and_strings_correctly() {
        let template = StringTemplate::parse(r#"{"tags": {{tags}}, "who": "{{who}}"}"#);
        let body = template.render_json(&params(&[
            ("tags", json!(["a", "b"])),
            ("who", json!("o\"brien")),
        ]));
        assert_eq!(body, json!({"tags": ["a", "b"], "who": "o\"brien"}));
    }

    #[test]
    fn json_body_drops_fields_left_unresolved() {
        let template =
            StringTemplate::parse(r#"{"amount": 1, "note": "{{note}}"}"#);
        let body = template.render_json(&params(&[]));
        assert_eq!(body, json!({"amount": 1}));
    }

    #[test]
    fn unparsable_substituted_body_passes_through_as_text() {
        let template = StringTemplate::parse(r#"{"amount": {{amount}}}"#);
        let body = template.render_json(&params(&[]));
        assert_eq!(body, json!(r#"{"amount": {{amount}}}"#));
    }

    #[test]
    fn object_body_substitutes_leaf_strings() {
        let body = substitute_body(
            &json!({"city": "{{city}}", "static": "fixed", "count": 3}),
            &params(&[("city", json!("Oslo"))]),
        );
        assert_eq!(body, json!({"city": "Oslo", "static": "fixed", "count": 3}));
    }

    #[test]
    fn object_body_drops_unresolved_null_and_empty_fields() {
        let body = substitute_body(
            &json!({
                "city": "{{city}}",
                "missing": "{{missing}}",
                "empty": [],
                "nothing": null,
            }),
            &params(&[("city", json!("Oslo"))]),
        );
        assert_eq!(body, json!({"city": "Oslo"}));
    }

    #[test]
    fn object_body_prunes_nested_objects() {
        let body = substitute_body(
            &json!({"outer": {"keep": "{{a}}", "drop": "{{b}}"}}),
            &params(&[("a", json!("x"))]),
        );
        assert_eq!(body, json!({"outer": {"keep": "x"}}));
    }

    #[test]
    fn filter_args_removes_placeholder_shaped_and_empty_values() {
        let filtered = filter_args(&json!({
            "keep": "value",
            "number": 7,
            "placeholder": "{{whatever}}",
            "empty": [],
            "nothing": null,
        }));
        assert_eq!(filtered, json!({"keep": "value", "number": 7}));
    }

    #[test]
    fn compiled_request_resolves_url_headers_and_body() {
        let request = RequestTemplate {
            url: "https://api.x/{{city}}".to_string(),
            method: HttpMethod::Post,
            headers: Some(
                [("Authorization".to_string(), "Bearer {{token}}".to_string())]
                    .into_iter()
                    .collect(),
            ),
            body: Some(BodyTemplate::Structured(json!({"city": "{{city}}"}))),
        };

        let compiled = CompiledRequest::compile(&request);
        let resolved = compiled.resolve(&params(&[
            ("city", json!("Oslo")),
            ("token", json!("t0k")),
        ]));

        assert_eq!(resolved.url, "https://api.x/Oslo");
        assert_eq!(resolved.method, HttpMethod::Post);
        assert_eq!(
            resolved.headers,
            vec![("Authorization".to_string(), "Bearer t0k".to_string())]
        );
        assert_eq!(resolved.body, Some(json!({"city": "Oslo"})));
    }

    #[test]
    fn compiled_request_reports_missing_url_and_header_parameters() {
        let request = RequestTemplate {
            url: "https://api.x/{{city}}".to_string(),
            method: HttpMethod::Get,
            headers: Some(
                [("X-Team".to_string(), "{{team}}".to_string())]
                    .into_iter()
                    .collect(),
            ),
            body: None,
        };

        let compiled = CompiledRequest::compile(&request);
        assert_eq!(compiled.first_missing(&params(&[])), Some("city"));
        assert_eq!(
            compiled.first_missing(&params(&[("city", json!("Oslo"))])),
            Some("team")
        );
        assert_eq!(
            compiled.first_missing(&params(&[
                ("city", json!("Oslo")),
                ("team", json!("ops"))
            ])),
            None
        );
    }

    proptest! {
        // Full substitution leaves no placeholder token behind.
        #[test]
        fn full_substitution_has_no_remaining_tokens(
            prefix in "[a-z /:.]{0,12}",
            key in "[a-z][a-z0-9_]{0,8}",
            value in "[A-Za-z0-9 ]{0,16}",
        ) {
            let template = StringTemplate::parse(&format!("{prefix}{{{{{key}}}}}"));
            let rendered = template.render(&params(&[(&key, json!(value))]));
            prop_assert!(!has_placeholder(&rendered));
        }

        // Filtered argument maps never contain placeholder tokens or empty
        // lists.
        #[test]
        fn filtered_args_contain_no_blank_values(
            keep in "[A-Za-z0-9]{1,12}",
            key in "[a-z]{1,8}",
        ) {
            let filtered = filter_args(&json!({
                "keep": keep,
                "ph": format!("{{{{{key}}}}}"),
                "empty": [],
            }));
            let object = filtered.as_object().unwrap();
            prop_assert_eq!(object.len(), 1);
            prop_assert!(object.contains_key("keep"));
        }
    }
}
