//! One-time compilation of a skeleton into a static tree and a slot table.
//!
//! Arguments are spliced into the concatenated skeleton as markers whose form
//! depends on the lexical position:
//!
//! * right after `<`: a placeholder element carrying the argument marker, later
//!   bound as a component;
//! * right after `</`: the placeholder element name, closing such an element;
//! * anywhere else: `U+FFFE <index> U+FFFE`, recognised as a whole attribute
//!   name (spread), a whole attribute value (named binding) or inline content.
//!
//! The marked markup goes through the host's markup parser, then a walk
//! builds a fresh tree in which every node owning a binding carries the slot id
//! attribute and every inline content marker became a placeholder element.
//! Literal markup using one of the reserved marker names is rejected, so a
//! skeleton can never forge a slot.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::collections::map::HashMap;
use crate::error::TemplateError;
use crate::markers::{
    content_marker, parse_whole_marker, placeholder_close, ARG_ATTR, CONTENT_TAG,
    PLACEHOLDER_TAG, SENTINEL, SHORTHAND_CLOSE, SLOT_ATTR,
};
use crate::markup::{parse_fragment, MarkupElement, MarkupNode};
use crate::skeleton::{Skeleton, SkeletonKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// The node only carries attribute bindings.
    Bare,
    /// The node is replaced by an instance of the component in `arg`.
    Component { arg: usize },
    /// The node is replaced by the flattened content of `arg`.
    Content { arg: usize },
}

/// Attribute or prop fed by one argument. An empty name is a spread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub name: String,
    pub arg: usize,
}

impl AttributeBinding {
    pub fn is_spread(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub kind: SlotKind,
    /// Argument index of the component whose placeholder is the immediate
    /// parent of this node.
    pub owner: Option<usize>,
    pub attributes: SmallVec<[AttributeBinding; 2]>,
}

#[derive(Debug)]
pub struct PrecompiledTemplate {
    tree: Vec<MarkupNode>,
    slots: Vec<SlotDescriptor>,
    arg_count: usize,
}

impl PrecompiledTemplate {
    /// The static prototype tree, instantiated on every first use.
    pub fn tree(&self) -> &[MarkupNode] {
        &self.tree
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }

    pub fn slot(&self, id: usize) -> Option<&SlotDescriptor> {
        self.slots.get(id)
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }
}

thread_local! {
    static TEMPLATE_CACHE: RefCell<HashMap<SkeletonKey, Rc<PrecompiledTemplate>>> =
        RefCell::new(HashMap::default());
}

/// Compiled form of `skeleton`, memoized by call-site identity. Entries live
/// for the rest of the thread.
pub fn precompiled(skeleton: &'static Skeleton) -> Result<Rc<PrecompiledTemplate>, TemplateError> {
    let key = skeleton.key();
    if let Some(hit) = TEMPLATE_CACHE.with(|cache| cache.borrow().get(&key).cloned()) {
        return Ok(hit);
    }
    let compiled = Rc::new(precompile(skeleton.parts())?);
    log::debug!(
        "precompiled {:?}: {} slots, {} arguments",
        key,
        compiled.slots.len(),
        compiled.arg_count
    );
    TEMPLATE_CACHE.with(|cache| cache.borrow_mut().insert(key, Rc::clone(&compiled)));
    Ok(compiled)
}

/// Compiles literal segments. Pure: argument values are never observed.
pub fn precompile(parts: &[&str]) -> Result<PrecompiledTemplate, TemplateError> {
    let markup = marked_markup(parts)?;
    let mut compiler = Compiler { slots: Vec::new() };
    let tree = compiler.walk(parse_fragment(&markup), None)?;
    Ok(PrecompiledTemplate {
        tree,
        slots: compiler.slots,
        arg_count: parts.len().saturating_sub(1),
    })
}

fn marked_markup(parts: &[&str]) -> Result<String, TemplateError> {
    let close = placeholder_close();
    let mut html = String::new();
    for (segment, part) in parts.iter().enumerate() {
        if segment > 0 {
            let arg = segment - 1;
            if html.ends_with("</") {
                html.push_str(PLACEHOLDER_TAG);
            } else if html.ends_with('<') {
                let _ = write!(
                    html,
                    "{PLACEHOLDER_TAG} {ARG_ATTR}=\"{}\"",
                    content_marker(arg)
                );
            } else {
                html.push_str(&content_marker(arg));
            }
        }
        if part.contains(SENTINEL) {
            return Err(TemplateError::ReservedCharacter { segment });
        }
        html.push_str(&part.replace(SHORTHAND_CLOSE, &close));
    }
    Ok(html)
}

struct Compiler {
    slots: Vec<SlotDescriptor>,
}

impl Compiler {
    fn walk(
        &mut self,
        nodes: Vec<MarkupNode>,
        owner: Option<usize>,
    ) -> Result<Vec<MarkupNode>, TemplateError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                MarkupNode::Element(element) => out.push(self.element(element, owner)?),
                MarkupNode::Text(text) => self.text(&text, owner, &mut out),
                comment @ MarkupNode::Comment(_) => out.push(comment),
            }
        }
        Ok(out)
    }

    fn element(
        &mut self,
        element: MarkupElement,
        owner: Option<usize>,
    ) -> Result<MarkupNode, TemplateError> {
        let MarkupElement {
            tag,
            attributes,
            children,
        } = element;

        if tag == CONTENT_TAG {
            return Err(TemplateError::ReservedName { name: tag });
        }
        if let Some((name, _)) = attributes
            .iter()
            .find(|(name, _)| name == SLOT_ATTR || (name == ARG_ATTR && tag != PLACEHOLDER_TAG))
        {
            return Err(TemplateError::ReservedName { name: name.clone() });
        }
        let component = if tag == PLACEHOLDER_TAG {
            let arg = attributes
                .iter()
                .find(|(name, _)| name == ARG_ATTR)
                .and_then(|(_, value)| parse_whole_marker(value))
                .ok_or_else(|| TemplateError::ReservedName { name: tag.clone() })?;
            Some(arg)
        } else {
            None
        };

        let close = placeholder_close();
        let mut kept = Vec::with_capacity(attributes.len());
        let mut bindings: SmallVec<[AttributeBinding; 2]> = SmallVec::new();
        for (name, value) in attributes {
            if component.is_some() && name == ARG_ATTR {
                continue;
            }
            let value = value.replace(&close, SHORTHAND_CLOSE);
            if let Some(arg) = parse_whole_marker(&name) {
                if value.contains(SENTINEL) {
                    return Err(TemplateError::PartialAttribute { name });
                }
                bindings.push(AttributeBinding {
                    name: String::new(),
                    arg,
                });
            } else if name.contains(SENTINEL) {
                return Err(TemplateError::PartialAttribute { name });
            } else if let Some(arg) = parse_whole_marker(&value) {
                bindings.push(AttributeBinding { name, arg });
            } else if value.contains(SENTINEL) {
                return Err(TemplateError::PartialAttribute { name });
            } else {
                kept.push((name, value));
            }
        }

        if component.is_some() || !bindings.is_empty() {
            let id = self.slots.len();
            self.slots.push(SlotDescriptor {
                kind: match component {
                    Some(arg) => SlotKind::Component { arg },
                    None => SlotKind::Bare,
                },
                owner: component.and(owner),
                attributes: bindings,
            });
            kept.push((SLOT_ATTR.to_string(), id.to_string()));
        }

        let children = self.walk(children, component)?;
        Ok(MarkupNode::Element(MarkupElement {
            tag,
            attributes: kept,
            children,
        }))
    }

    fn text(&mut self, text: &str, owner: Option<usize>, out: &mut Vec<MarkupNode>) {
        let text = text.replace(&placeholder_close(), SHORTHAND_CLOSE);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !text.contains(SENTINEL) {
            out.push(MarkupNode::Text(text.to_string()));
            return;
        }
        for (i, piece) in text.split(SENTINEL).enumerate() {
            if i % 2 == 0 {
                if !piece.is_empty() {
                    out.push(MarkupNode::Text(piece.to_string()));
                }
                continue;
            }
            let Ok(arg) = piece.parse::<usize>() else {
                out.push(MarkupNode::Text(piece.to_string()));
                continue;
            };
            let id = self.slots.len();
            self.slots.push(SlotDescriptor {
                kind: SlotKind::Content { arg },
                owner,
                attributes: SmallVec::new(),
            });
            out.push(MarkupNode::Element(MarkupElement {
                tag: CONTENT_TAG.to_string(),
                attributes: vec![(SLOT_ATTR.to_string(), id.to_string())],
                children: Vec::new(),
            }));
        }
    }
}
