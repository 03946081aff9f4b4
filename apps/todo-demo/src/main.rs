use std::rc::Rc;

use anyhow::{Context, Result};
use cinder_core::{
    attach, dispatch_event, style, Component, ConcreteTreeHost, HostTree, MemoryTree, NodeId,
    TreeHost, Value,
};
use todo_demo::app::todo_app;

fn main() -> Result<()> {
    #[cfg(feature = "logging")]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("=== cinder todo demo ===");
    println!("Set RUST_LOG=cinder_core=debug to watch call sites compile and patch.");
    println!();

    let host = Rc::new(ConcreteTreeHost::new(MemoryTree::new()));
    let container = host.borrow_typed().create_element("main");
    let shared: Rc<dyn TreeHost> = host.clone();
    let root = attach(Rc::clone(&shared), container, Component::new(todo_app))?;
    log::info!("mounted {} root node(s)", root.nodes().len());

    let find = |id: &str| -> Result<NodeId> {
        host.borrow_typed()
            .find_by_attribute(container, "id", id)
            .with_context(|| format!("no element with id {id}"))
    };
    let send = |id: &str, kind: &str, value: Value| -> Result<()> {
        let target = find(id)?;
        if !dispatch_event(&shared, target, kind, value)? {
            log::warn!("{id} has no {kind} handler");
        }
        Ok(())
    };

    for text in ["write the parser", "wire the binder", "ship it"] {
        send("draft", "input", Value::from(text))?;
        send("add", "click", Value::Null)?;
    }
    send("toggle-0", "click", Value::Null)?;
    send("remove-1", "click", Value::Null)?;

    let tree = host.borrow_typed();
    log::info!("{} host mutations in total", tree.mutation_count());
    println!("{}", tree.outer_markup(container)?);
    println!();
    for rule in style::rules() {
        println!("{rule}");
    }
    println!();
    print!("{}", tree.dump_tree(Some(container)));
    Ok(())
}
