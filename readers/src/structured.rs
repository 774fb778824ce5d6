//! JSON and YAML documents rendered as compact text.

/// Reformat as compact JSON.
pub(crate) fn json_to_text(source: &str) -> Result<String, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(source)?;
    serde_json::to_string(&value)
}

/// Compact JSON when the document maps onto it, YAML flow text otherwise.
pub(crate) fn yaml_to_text(source: &str) -> Result<String, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(source)?;
    match serde_json::to_string(&value) {
        Ok(json) => Ok(json),
        // Non-string keys such as sequences have no JSON form.
        Err(_) => serde_yaml::to_string(&value).map(|yaml| yaml.trim_end().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_compacted() {
        let source = "{\n  \"title\": \"Paper\",\n  \"pages\": [1, 2]\n}";
        let text = json_to_text(source).unwrap();
        assert!(!text.contains('\n'));
        assert!(!text.contains(": "));
        let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed, serde_json::json!({"title": "Paper", "pages": [1, 2]}));
    }

    #[test]
    fn yaml_becomes_json() {
        let text = yaml_to_text("title: Paper\nauthors:\n  - Kim\n  - Lee\n").unwrap();
        assert_eq!(text, r#"{"title":"Paper","authors":["Kim","Lee"]}"#);
    }

    #[test]
    fn malformed_yaml_is_error() {
        assert!(yaml_to_text("key: [unclosed").is_err());
    }
}
