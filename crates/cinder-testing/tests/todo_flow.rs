use cinder_core::{template, Component, Error, Handler, HostTree, NodeId, Props, Scope, Value};
use cinder_testing::RenderTestRule;

fn todo_app(cx: &mut Scope<'_>, _: &Props) -> Result<Vec<NodeId>, Error> {
    let (items, set_items) = cx.use_state(Vec::<String>::new());
    let (draft, set_draft) = cx.use_state(String::new());

    let mut rows = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let remove = {
            let (items, set_items) = (items.clone(), set_items.clone());
            Handler::new(move |_| {
                let mut next = items.clone();
                next.remove(i);
                set_items.set(next)
            })
        };
        rows.extend(template!(
            cx,
            ["<li id=", ">", "<button id=", " onclick=", ">x</button></li>"],
            format!("item-{i}"),
            item.as_str(),
            format!("remove-{i}"),
            remove
        )?);
    }

    let edit = {
        let set_draft = set_draft.clone();
        Handler::new(move |event| set_draft.set(event.value.to_string()))
    };
    let add = {
        let draft = draft.clone();
        Handler::new(move |_| {
            if draft.is_empty() {
                return Ok(());
            }
            let mut next = items.clone();
            next.push(draft.clone());
            set_items.set(next)?;
            set_draft.set(String::new())
        })
    };
    template!(
        cx,
        [
            "<div><input id=\"draft\" value=",
            " oninput=",
            " /><button id=\"add\" onclick=",
            ">Add</button><ul>",
            "</ul></div>"
        ],
        draft,
        edit,
        add,
        rows
    )
}

fn draft_value(rule: &RenderTestRule) -> Option<String> {
    let input = rule.find_by_id("draft")?;
    let value = rule.tree().property(input, "value").ok()??;
    value.as_str().map(str::to_owned)
}

#[test]
fn adding_and_removing_items() {
    let mut rule = RenderTestRule::new();
    rule.set_content(Component::new(todo_app)).unwrap();
    assert_eq!(
        rule.markup().unwrap(),
        r#"<div><input id="draft"><button id="add">Add</button><ul></ul></div>"#
    );

    for text in ["milk", "eggs"] {
        assert!(rule.input("draft", text).unwrap());
        assert!(rule.click("add").unwrap());
    }
    assert_eq!(
        rule.markup().unwrap(),
        concat!(
            r#"<div><input id="draft"><button id="add">Add</button><ul>"#,
            r#"<li id="item-0">milk<button id="remove-0">x</button></li>"#,
            r#"<li id="item-1">eggs<button id="remove-1">x</button></li>"#,
            "</ul></div>"
        )
    );

    let first_row = rule.find_by_id("item-0").unwrap();
    assert!(rule.click("remove-0").unwrap());
    assert_eq!(
        rule.markup().unwrap(),
        concat!(
            r#"<div><input id="draft"><button id="add">Add</button><ul>"#,
            r#"<li id="item-0">eggs<button id="remove-0">x</button></li>"#,
            "</ul></div>"
        )
    );
    assert_eq!(rule.find_by_id("item-0"), Some(first_row));
}

#[test]
fn empty_draft_is_not_added() {
    let mut rule = RenderTestRule::new();
    rule.set_content(Component::new(todo_app)).unwrap();
    rule.reset_mutations();
    assert!(rule.click("add").unwrap());
    assert_eq!(rule.mutation_count(), 0);
    assert!(rule.find_by_id("item-0").is_none());
}

#[test]
fn value_binding_is_a_live_property() {
    let mut rule = RenderTestRule::new();
    rule.set_content(Component::new(todo_app)).unwrap();
    let input = rule.find_by_id("draft").unwrap();
    assert_eq!(draft_value(&rule).as_deref(), Some(""));

    assert!(rule.dispatch(input, "input", Value::from("bread")).unwrap());
    assert_eq!(draft_value(&rule).as_deref(), Some("bread"));
    assert_eq!(
        rule.tree().attribute(input, "value").unwrap(),
        None,
        "value never becomes an attribute"
    );

    rule.click("add").unwrap();
    assert_eq!(draft_value(&rule).as_deref(), Some(""));
    assert_eq!(rule.text_of("item-0").as_deref(), Some("breadx"));
}
