//! CSS text built from props, and components that carry a generated class.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;
use crate::component::Component;
use crate::props::{PropOrigin, Props};
use crate::skeleton::Skeleton;
use crate::value::Value;

type DynamicCss = dyn Fn(&Props) -> Value;

#[derive(Clone)]
enum Interpolation {
    Static(Value),
    Dynamic(Rc<DynamicCss>),
}

/// Literal CSS interleaved with interpolations that may read props.
///
/// ```
/// use cinder_core::{Css, Props};
///
/// let css = Css::new("color: ")
///     .value("red")
///     .text("; margin: ")
///     .dynamic(|props| props.value("margin"))
///     .text("px;");
/// assert_eq!(css.render(&Props::new()), "color: red; margin: px;");
/// ```
#[derive(Clone, Default)]
pub struct Css {
    parts: Vec<String>,
    interpolations: Vec<Interpolation>,
}

impl Css {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            parts: vec![text.into()],
            interpolations: Vec::new(),
        }
    }

    /// Appends literal text.
    pub fn text(mut self, text: &str) -> Self {
        match self.parts.last_mut() {
            Some(last) => last.push_str(text),
            None => self.parts.push(text.to_string()),
        }
        self
    }

    pub fn value(self, value: impl Into<Value>) -> Self {
        self.interpolate(Interpolation::Static(value.into()))
    }

    pub fn dynamic(self, f: impl Fn(&Props) -> Value + 'static) -> Self {
        self.interpolate(Interpolation::Dynamic(Rc::new(f)))
    }

    fn interpolate(mut self, interpolation: Interpolation) -> Self {
        if self.parts.is_empty() {
            self.parts.push(String::new());
        }
        self.interpolations.push(interpolation);
        self.parts.push(String::new());
        self
    }

    /// CSS text for `props`. Interpolations are kept when truthy or numeric.
    pub fn render(&self, props: &Props) -> String {
        let mut css = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if let Some(interpolation) = i.checked_sub(1).and_then(|j| self.interpolations.get(j)) {
                let value = match interpolation {
                    Interpolation::Static(value) => value.clone(),
                    Interpolation::Dynamic(f) => f(props),
                };
                if value.is_renderable() {
                    css.push_str(&value.to_string());
                }
            }
            css.push_str(part);
        }
        css
    }
}

impl fmt::Debug for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Css")
            .field("parts", &self.parts)
            .field("interpolations", &self.interpolations.len())
            .finish()
    }
}

thread_local! {
    static STYLE_SHEET: RefCell<OrderedMap<String>> = RefCell::new(OrderedMap::default());
}

/// Class name registered for `css`, allocating `cinder-<n>` on first sight.
pub fn class_name(css: &str) -> String {
    STYLE_SHEET.with(|sheet| {
        let mut sheet = sheet.borrow_mut();
        if let Some(existing) = sheet.get(css) {
            return existing.clone();
        }
        let name = format!("cinder-{}", sheet.len());
        log::debug!("registered style class {name}");
        sheet.insert(css.to_string(), name.clone());
        name
    })
}

/// Every registered rule, in registration order.
pub fn rules() -> Vec<String> {
    STYLE_SHEET.with(|sheet| {
        sheet
            .borrow()
            .iter()
            .map(|(css, name)| format!(".{name}{{{css}}}"))
            .collect()
    })
}

/// `props` with the class generated for `css` merged into `class`.
pub fn with_class(props: &Props, css: &Css) -> Props {
    let name = class_name(&css.render(props));
    let merged = match props.get("class") {
        Some(existing) if !existing.is_truthy() => Value::from(name),
        None => Value::from(name),
        Some(Value::List(tokens)) => Value::list(
            std::iter::once(Value::from(name)).chain(tokens.iter().cloned()),
        ),
        Some(Value::Map(entries)) => {
            let mut map = OrderedMap::default();
            map.insert(name, Value::from(true));
            for (token, enabled) in entries.iter() {
                map.insert(token.clone(), enabled.clone());
            }
            Value::from(map)
        }
        Some(existing) => Value::from(format!("{existing} {name}")),
    };
    let mut props = props.clone();
    let origin = props.origin("class").unwrap_or(PropOrigin::Named);
    props.set("class", merged, origin);
    props
}

/// Component rendering a `<tag>` that receives every prop as an attribute,
/// plus the class generated for `css`.
pub fn styled(tag: &str, css: Css) -> Component {
    let skeleton = Skeleton::intern(vec![format!("<{tag} "), format!("></{tag}>")]);
    Component::from_closure(move |cx, props| {
        let props = with_class(props, &css);
        cx.template(skeleton, vec![props.to_value()])
    })
}

/// Wraps `component` so that it receives the class generated for `css`.
pub fn styled_component(component: Component, css: Css) -> Component {
    Component::from_closure(move |cx, props| {
        let props = with_class(props, &css);
        component.call(cx, &props)
    })
}
