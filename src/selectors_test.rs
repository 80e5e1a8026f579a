use super::*;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_default_table_has_every_family() {
    let table = SelectorTable::default();
    assert!(!table.profile_name.is_empty());
    assert!(!table.login_markup.is_empty());
    assert!(!table.login_prompts.is_empty());
    assert!(!table.guest_markers.is_empty());
    assert!(!table.activity_tabs.is_empty());
    assert!(!table.search_input.is_empty());
    assert!(!table.post_containers.is_empty());
    assert!(!table.see_more.is_empty());
    assert!(!table.paragraph_containers.is_empty());
    assert!(!table.paragraphs.is_empty());
    assert!(!table.text_fallbacks.is_empty());
    assert!(!table.dates.is_empty());
    assert!(!table.reactions.is_empty());
    assert!(!table.permalinks.is_empty());
}

#[test]
fn test_login_prompts_are_text_locators() {
    let table = SelectorTable::default();
    assert_eq!(
        table.login_prompts,
        vec![Probe::text("Sign in"), Probe::text("Join now")]
    );
}

#[test]
fn test_probe_display() {
    assert_eq!(Probe::css("h1").to_string(), "h1");
    assert_eq!(
        Probe::css_with_text("button", "see more").to_string(),
        "button:has-text(\"see more\")"
    );
    assert_eq!(Probe::text("Sign in").to_string(), "text=\"Sign in\"");
}

#[test]
fn test_probe_json_shape() {
    let json = serde_json::to_value(Probe::css_with_text("span", "ago")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "locator": {"kind": "css", "value": "span"},
            "text_contains": "ago"
        })
    );

    let json = serde_json::to_value(Probe::text("Join now")).unwrap();
    assert!(json.get("text_contains").is_none());
}

#[test]
fn test_partial_override_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"dates": [{{"locator": {{"kind": "css", "value": ".post-date"}}}}]}}"#
    )
    .unwrap();

    let table = SelectorTable::from_json_file(file.path()).unwrap();
    assert_eq!(table.dates, vec![Probe::css(".post-date")]);
    assert_eq!(table.reactions, SelectorTable::default().reactions);
}

#[test]
fn test_invalid_override_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    let err = SelectorTable::from_json_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid selector table"));
}
