use crate::fixture::Fixture;
use crate::style::{class_name, rules, with_class};
use crate::{
    styled, styled_component, template, Component, Css, Error, NodeId, PropOrigin, Props, Scope,
    Value,
};

fn props_with_class(class: Value) -> Props {
    let mut props = Props::new();
    props.set("class", class, PropOrigin::Named);
    props
}

#[test]
fn css_keeps_numbers_and_truthy_interpolations() {
    let css = Css::new("margin: ")
        .value(0)
        .text("px; color: ")
        .dynamic(|props| props.value("color"))
        .text(";")
        .value(false);
    let mut props = Props::new();
    assert_eq!(css.render(&props), "margin: 0px; color: ;");
    props.set("color", "teal".into(), PropOrigin::Named);
    assert_eq!(css.render(&props), "margin: 0px; color: teal;");
}

#[test]
fn class_names_are_registered_once_per_css_text() {
    let first = class_name("color: red;");
    let again = class_name("color: red;");
    let other = class_name("color: blue;");
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert!(first.starts_with("cinder-"));
    assert!(rules().contains(&format!(".{first}{{color: red;}}")));
}

#[test]
fn generated_class_merges_with_existing_class_prop() {
    let css = Css::new("padding: 1px;");
    let name = class_name("padding: 1px;");

    let plain = with_class(&Props::new(), &css);
    assert_eq!(plain.str("class"), Some(name.as_str()));

    let falsy = with_class(&props_with_class(Value::from("")), &css);
    assert_eq!(falsy.str("class"), Some(name.as_str()));

    let text = with_class(&props_with_class(Value::from("wide")), &css);
    assert_eq!(text.str("class"), Some(format!("wide {name}").as_str()));

    let list = with_class(&props_with_class(Value::list([Value::from("a")])), &css);
    assert_eq!(list.value("class").to_string(), format!("{name},a"));

    let map = with_class(
        &props_with_class(Value::map([("on", Value::from(false))])),
        &css,
    );
    let merged = map.value("class");
    let entries = merged.as_map().unwrap();
    assert_eq!(
        entries.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![name.as_str(), "on"]
    );
    assert_eq!(entries[&name].as_bool(), Some(true));
}

#[test]
fn styled_element_receives_props_and_generated_class() {
    fn app(cx: &mut Scope<'_>, _: &Props) -> Result<Vec<NodeId>, Error> {
        let button = styled(
            "button",
            Css::new("color: ").dynamic(|props| props.value("tone")),
        );
        template!(cx, ["<", " tone=\"red\" id=\"go\">Go</>"], button)
    }
    let fixture = Fixture::mount(Component::new(app)).unwrap();
    let name = class_name("color: red");
    assert_eq!(
        fixture.markup(),
        format!(r#"<button tone="red" id="go" class="{name}">Go</button>"#)
    );
}

#[test]
fn styled_component_passes_the_class_prop_through() {
    fn badge(cx: &mut Scope<'_>, props: &Props) -> Result<Vec<NodeId>, Error> {
        template!(cx, ["<span class=", ">!</span>"], props.value("class"))
    }
    let css = Css::new("font-weight: bold;");
    let name = class_name("font-weight: bold;");
    let wrapped = styled_component(Component::new(badge), css);
    let fixture = Fixture::mount(wrapped).unwrap();
    assert_eq!(fixture.markup(), format!(r#"<span class="{name}">!</span>"#));
}
