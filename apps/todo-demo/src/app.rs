use cinder_core::{
    styled, styled_component, template, Component, Css, Error, Handler, NodeId, Props, Scope,
    StateSetter, Value,
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Todo {
    pub text: String,
    pub done: bool,
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

thread_local! {
    static HEADING: Component = styled("h1", Css::new("font-size: 1.5em; margin: 0;"));
    static STATUS: Component = styled_component(
        Component::new(status_line),
        Css::new("color: ").dynamic(|props| {
            if props.number("remaining") == Some(0.0) {
                Value::from("green")
            } else {
                Value::from("gray")
            }
        }),
    );
}

fn heading() -> Component {
    HEADING.with(Component::clone)
}

fn status() -> Component {
    STATUS.with(Component::clone)
}

/// Handler that writes an edited copy of `todos`.
fn edited(
    todos: &[Todo],
    set_todos: &StateSetter<Vec<Todo>>,
    edit: impl Fn(&mut Vec<Todo>) + 'static,
) -> Handler {
    let (todos, set_todos) = (todos.to_vec(), set_todos.clone());
    Handler::new(move |_| {
        let mut next = todos.clone();
        edit(&mut next);
        set_todos.set(next)
    })
}

/// Root component: an input, the list of todos and a status line.
pub fn todo_app(cx: &mut Scope<'_>, _: &Props) -> Result<Vec<NodeId>, Error> {
    let (todos, set_todos) = cx.use_state(Vec::<Todo>::new());
    let (draft, set_draft) = cx.use_state(String::new());

    let mut rows = Vec::new();
    for (index, todo) in todos.iter().enumerate() {
        let toggle = edited(&todos, &set_todos, move |todos| {
            todos[index].done = !todos[index].done;
        });
        let remove = edited(&todos, &set_todos, move |todos| {
            todos.remove(index);
        });
        rows.extend(template!(
            cx,
            ["<", " index=", " text=", " done=", " on-toggle=", " on-remove=", " />"],
            Component::new(todo_item),
            index,
            todo.text.as_str(),
            todo.done,
            toggle,
            remove
        )?);
    }

    let edit = {
        let set_draft = set_draft.clone();
        Handler::new(move |event| set_draft.set(event.value.to_string()))
    };
    let add = {
        let (todos, draft) = (todos.clone(), draft.clone());
        Handler::new(move |_| {
            let text = draft.trim();
            if text.is_empty() {
                return Ok(());
            }
            log::debug!("adding todo {text:?}");
            let mut next = todos.clone();
            next.push(Todo::new(text));
            set_todos.set(next)?;
            set_draft.set(String::new())
        })
    };
    let remaining = todos.iter().filter(|todo| !todo.done).count();

    template!(
        cx,
        [
            "<div class=\"todo-app\"><",
            ">Todos</><input id=\"draft\" value=",
            " oninput=",
            " /><button id=\"add\" onclick=",
            ">Add</button><ul>",
            "</ul><",
            " remaining=",
            " /></div>"
        ],
        heading(),
        draft,
        edit,
        add,
        rows,
        status(),
        remaining
    )
}

fn todo_item(cx: &mut Scope<'_>, props: &Props) -> Result<Vec<NodeId>, Error> {
    let index = props.value("index");
    let done = props.value("done");
    let decoration = if done.is_truthy() { "line-through" } else { "none" };
    template!(
        cx,
        [
            "<li id=",
            " class=",
            "><input type=\"checkbox\" id=",
            " checked=",
            " onclick=",
            " /><span style=",
            ">",
            "</span><button id=",
            " onclick=",
            ">x</button></li>"
        ],
        format!("todo-{index}"),
        Value::map([("todo", Value::from(true)), ("done", done.clone())]),
        format!("toggle-{index}"),
        done,
        props.value("onToggle"),
        Value::map([("text-decoration", Value::from(decoration))]),
        props.value("text"),
        format!("remove-{index}"),
        props.value("onRemove")
    )
}

fn status_line(cx: &mut Scope<'_>, props: &Props) -> Result<Vec<NodeId>, Error> {
    let remaining = props.number("remaining").unwrap_or_default();
    let label = if remaining == 1.0 { "item left" } else { "items left" };
    template!(
        cx,
        ["<footer id=\"status\" class=", ">", " ", "</footer>"],
        props.value("class"),
        props.value("remaining"),
        label
    )
}
