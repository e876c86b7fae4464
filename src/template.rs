//! `{variable}` placeholder extraction, argument parsing, and substitution.
//!
//! A placeholder is `{identifier}` with `identifier` matching
//! `[A-Za-z_][A-Za-z0-9_]*`. Substitution is a single literal pass: values
//! inserted for one placeholder are never scanned for further placeholders.
//!
//! ```text
//! query tokens:  greet  name=World  lang=en
//!                └─key┘ └──── assignments ────┘
//! template:      "Hello {name}, {greeting}"
//! required:      [name, greeting]   missing: [greeting]
//! expanded:      "Hello World, {greeting}"
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Required versus provided variables for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    /// Identifiers in the template, deduplicated, first-occurrence order.
    pub required_variables: Vec<String>,
    /// Name → value pairs parsed from the query.
    pub provided_variables: HashMap<String, String>,
    /// `required_variables` not present in `provided_variables`.
    pub missing_variables: Vec<String>,
    pub has_all_required_variables: bool,
}

/// Distinct placeholder identifiers in first-occurrence order.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    VARIABLE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Parse `name=value` assignments from `tokens[skip_count..]`.
///
/// A token counts only when its first `=` is neither the first nor the last
/// character. Anything else is skipped. Later assignments win.
pub fn parse_variable_arguments<S: AsRef<str>>(
    tokens: &[S],
    skip_count: usize,
) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    for token in tokens.iter().skip(skip_count) {
        if let Some((name, value)) = split_assignment(token.as_ref()) {
            variables.insert(name.to_string(), value.to_string());
        }
    }
    variables
}

/// Split a `name=value` token, or `None` if it is not an assignment.
pub fn split_assignment(token: &str) -> Option<(&str, &str)> {
    let idx = token.find('=')?;
    if idx == 0 || idx == token.len() - 1 {
        return None;
    }
    Some((&token[..idx], &token[idx + 1..]))
}

pub fn has_variables(text: &str) -> bool {
    VARIABLE_PATTERN.is_match(text)
}

/// Substitute known placeholders; unknown ones stay as written.
pub fn replace_variables(template: &str, variables: &HashMap<String, String>) -> String {
    if template.is_empty() || variables.is_empty() {
        return template.to_string();
    }
    VARIABLE_PATTERN
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn get_variable_info(template: &str, provided: &HashMap<String, String>) -> VariableInfo {
    let required_variables = extract_variables(template);
    let missing_variables: Vec<String> = required_variables
        .iter()
        .filter(|name| !provided.contains_key(name.as_str()))
        .cloned()
        .collect();

    VariableInfo {
        has_all_required_variables: missing_variables.is_empty(),
        required_variables,
        provided_variables: provided.clone(),
        missing_variables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_dedupes_in_first_occurrence_order() {
        assert_eq!(extract_variables("{a} text {b} {a}"), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_variables("").is_empty());
    }

    #[test]
    fn test_extract_ignores_invalid_identifiers() {
        assert_eq!(
            extract_variables("{1abc} {ok_1} {with space} {} {_x}"),
            vec!["ok_1", "_x"]
        );
    }

    #[test]
    fn test_extract_is_case_sensitive() {
        assert_eq!(extract_variables("{Name} {name}"), vec!["Name", "name"]);
    }

    #[test]
    fn test_parse_arguments_skips_keyword_and_bad_tokens() {
        let parsed = parse_variable_arguments(&["cmd", "a=1", "b=2", "bad"], 1);
        assert_eq!(parsed, vars(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_arguments_requires_interior_equals() {
        let parsed = parse_variable_arguments(&["=x", "y=", "=", "k=v=w"], 0);
        assert_eq!(parsed, vars(&[("k", "v=w")]));
    }

    #[test]
    fn test_parse_arguments_later_value_wins() {
        let parsed = parse_variable_arguments(&["a=1", "a=2"], 0);
        assert_eq!(parsed, vars(&[("a", "2")]));
    }

    #[test]
    fn test_parse_arguments_skip_beyond_len() {
        assert!(parse_variable_arguments(&["a=1"], 3).is_empty());
    }

    #[test]
    fn test_has_variables() {
        assert!(has_variables("ping {host}"));
        assert!(!has_variables("ping localhost"));
        assert!(!has_variables("{not valid}"));
        assert!(!has_variables(""));
    }

    #[test]
    fn test_replace_known_variable() {
        assert_eq!(
            replace_variables("Hello {name}", &vars(&[("name", "World")])),
            "Hello World"
        );
    }

    #[test]
    fn test_replace_with_empty_map_is_identity() {
        assert_eq!(replace_variables("Hi {x}", &HashMap::new()), "Hi {x}");
    }

    #[test]
    fn test_replace_leaves_unknown_placeholders() {
        assert_eq!(
            replace_variables("{a}-{b}-{a}", &vars(&[("a", "1")])),
            "1-{b}-1"
        );
    }

    #[test]
    fn test_replace_is_not_recursive() {
        let out = replace_variables("{a}", &vars(&[("a", "{b}"), ("b", "boom")]));
        assert_eq!(out, "{b}");
    }

    #[test]
    fn test_replace_across_newlines() {
        let out = replace_variables("line1 {x}\nline2 {x}", &vars(&[("x", "v")]));
        assert_eq!(out, "line1 v\nline2 v");
    }

    #[test]
    fn test_variable_info_missing() {
        let info = get_variable_info("kubectl -n {ns} logs {pod}", &vars(&[("pod", "web-1")]));
        assert_eq!(info.required_variables, vec!["ns", "pod"]);
        assert_eq!(info.missing_variables, vec!["ns"]);
        assert!(!info.has_all_required_variables);
        assert_eq!(info.provided_variables, vars(&[("pod", "web-1")]));
    }

    #[test]
    fn test_variable_info_no_placeholders_is_complete() {
        let info = get_variable_info("plain text", &HashMap::new());
        assert!(info.required_variables.is_empty());
        assert!(info.has_all_required_variables);
    }
}
