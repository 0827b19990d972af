use auricle_template::{substitute, TemplateVars};
use proptest::prelude::*;

fn table(entries: Vec<(&str, Vec<&str>)>) -> TemplateVars {
    entries.into_iter().collect()
}

#[test]
fn single_value_reference() {
    assert_eq!(substitute("@{title}", &table(vec![("title", vec!["A"])])), "A");
}

#[test]
fn custom_separator_join() {
    let vars = table(vec![("tags", vec!["a", "b", "c"])]);
    assert_eq!(substitute("@{tags,-}", &vars), "a-b-c");
}

#[test]
fn default_separator_join() {
    let vars = table(vec![("artist", vec!["X", "Y"])]);
    assert_eq!(substitute("@{artist} - live", &vars), "X, Y - live");
}

#[test]
fn positional_index() {
    let vars = table(vec![("tags", vec!["a", "b"])]);
    assert_eq!(substitute("@{tags:1}", &vars), "b");
    assert_eq!(substitute("@{tags:5}", &vars), "");
}

#[test]
fn missing_variable_renders_nothing() {
    assert_eq!(substitute("@{missing}", &TemplateVars::new()), "");
    assert_eq!(substitute("[@{missing:0}]", &TemplateVars::new()), "[]");
}

#[test]
fn escaped_reference_is_literal() {
    assert_eq!(substitute("\\@{x}", &TemplateVars::new()), "@{x}");
}

#[test]
fn empty_value_list() {
    let vars = table(vec![("genre", vec![])]);
    assert_eq!(substitute("<@{genre}>", &vars), "<>");
    assert_eq!(substitute("<@{genre:0}>", &vars), "<>");
}

#[test]
fn substituted_text_is_not_rescanned() {
    let vars = table(vec![("a", vec!["@{b}"]), ("b", vec!["nope"])]);
    assert_eq!(substitute("@{a}", &vars), "@{b}");
}

#[test]
fn values_are_copied_byte_for_byte() {
    let vars = table(vec![("title", vec!["naïve \\ @{x} 日本"])]);
    assert_eq!(substitute("@{title}", &vars), "naïve \\ @{x} 日本");
}

#[test]
fn mixed_template() {
    let vars = table(vec![
        ("artist", vec!["Foo", "Bar"]),
        ("title", vec!["Song"]),
        ("track-number", vec!["3"]),
    ]);
    assert_eq!(
        substitute("@{track-number} @{artist, & } - @{title} \\@home", &vars),
        "3 Foo & Bar - Song @home"
    );
}

fn escape_all(s: &str) -> String {
    s.chars().flat_map(|c| ['\\', c]).collect()
}

proptest! {
    #[test]
    fn reference_free_templates_pass_through(template in "[^@\\\\]*") {
        prop_assert_eq!(substitute(&template, &TemplateVars::new()), template);
    }

    #[test]
    fn fully_escaped_text_round_trips(text in "\\PC*") {
        prop_assert_eq!(substitute(&escape_all(&text), &TemplateVars::new()), text);
    }

    #[test]
    fn arbitrary_templates_never_panic(template in "\\PC*", value in "\\PC*") {
        let vars = table(vec![("a", vec![value.as_str(), "b"])]);
        let _ = substitute(&template, &vars);
    }
}
