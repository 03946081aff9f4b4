use cinder_core::{Component, HostTree};
use cinder_testing::RenderTestRule;

use crate::app::todo_app;

fn mounted() -> RenderTestRule {
    let mut rule = RenderTestRule::new();
    rule.set_content(Component::new(todo_app)).expect("mount todo app");
    rule
}

fn add(rule: &RenderTestRule, text: &str) {
    assert!(rule.input("draft", text).expect("input"));
    assert!(rule.click("add").expect("add"));
}

#[test]
fn starts_empty_with_a_status_line() {
    let rule = mounted();
    assert!(rule.find_by_tag("li").is_empty());
    assert_eq!(rule.text_of("status").as_deref(), Some("0 items left"));
    assert_eq!(rule.find_by_tag("h1").len(), 1);
}

#[test]
fn added_todos_render_as_rows() {
    let rule = mounted();
    add(&rule, "one");
    add(&rule, "  two  ");
    add(&rule, "   ");

    let rows = rule.find_by_tag("li");
    assert_eq!(rows.len(), 2);
    assert_eq!(rule.text_of("todo-1").as_deref(), Some("twox"));
    assert_eq!(rule.text_of("status").as_deref(), Some("2 items left"));
}

#[test]
fn toggling_marks_the_row_done() {
    let rule = mounted();
    add(&rule, "one");
    let row = rule.find_by_id("todo-0").unwrap();
    assert_eq!(
        rule.tree().attribute(row, "class").unwrap().as_deref(),
        Some("todo")
    );

    assert!(rule.click("toggle-0").unwrap());
    let tree = rule.tree();
    assert_eq!(tree.attribute(row, "class").unwrap().as_deref(), Some("todo done"));
    let checkbox = tree.find_by_attribute(row, "id", "toggle-0").unwrap();
    assert_eq!(
        tree.attribute(checkbox, "checked").unwrap().as_deref(),
        Some("checked")
    );
    let span = tree.find_by_tag(row, "span")[0];
    assert_eq!(
        tree.attribute(span, "style").unwrap().as_deref(),
        Some("text-decoration: line-through;")
    );
    drop(tree);
    assert_eq!(rule.text_of("status").as_deref(), Some("0 items left"));
}

#[test]
fn removing_keeps_the_remaining_rows_in_order() {
    let rule = mounted();
    for text in ["a", "b", "c"] {
        add(&rule, text);
    }
    assert!(rule.click("remove-1").unwrap());
    let texts: Vec<String> = ["todo-0", "todo-1"]
        .iter()
        .filter_map(|id| rule.text_of(id))
        .collect();
    assert_eq!(texts, vec!["ax", "cx"]);
    assert!(rule.find_by_id("todo-2").is_none());
}

#[test]
fn status_color_follows_the_remaining_count() {
    let rule = mounted();
    let status = rule.find_by_id("status").unwrap();
    let done_class = rule.tree().attribute(status, "class").unwrap().unwrap();

    add(&rule, "one");
    let busy_class = rule.tree().attribute(status, "class").unwrap().unwrap();
    assert_ne!(done_class, busy_class);
    assert!(rule
        .style_rules()
        .contains(&format!(".{busy_class}{{color: gray}}")));
    assert!(rule
        .style_rules()
        .contains(&format!(".{done_class}{{color: green}}")));
}
