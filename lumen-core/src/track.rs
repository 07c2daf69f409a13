//! Node tracks — the reconciliation state machine.
//!
//! One track per dynamically-bound node. A track knows the node's bound
//! attributes, its optional property binding, its directives (ordered:
//! `if` first, `repeat` second, others in document order) and the anchor
//! currently rendered on the node's behalf: the node itself, a placeholder
//! comment when a directive suppressed it, or a marker comment plus an
//! ordered clone list when `repeat` expanded it. The marker keeps the DOM
//! position recoverable when the clone list is empty.
//!
//! `update` runs the full cycle for one node and completes before
//! returning; no two node updates interleave.

use indexmap::IndexMap;
use lumen_dom::NodeRef;
use lumen_expr::{Snippet, extract_executables, substitute};
use serde_json::Value;

use crate::component::camel_case;
use crate::context::{Context, effective_context};
use crate::directives::{DirectiveRegistry, DirectiveScope, RenderOutput};
use crate::error::{DirectiveError, Error};
use crate::meta::MetaStore;
use crate::scope::RenderScope;

#[derive(Debug, Clone)]
pub struct BoundAttribute {
    pub name: String,
    pub raw: String,
    pub snippets: Vec<Snippet>,
}

/// Which node-level property a single binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTarget {
    /// Text node payload.
    NodeValue,
    /// Textarea value.
    Value,
    /// Style/script text content.
    TextContent,
}

#[derive(Debug, Clone)]
pub struct BoundProperty {
    pub target: PropertyTarget,
    pub raw: String,
    pub snippets: Vec<Snippet>,
}

#[derive(Debug, Clone)]
pub struct DirectiveBinding {
    pub name: String,
    pub raw: String,
    pub prop: Option<String>,
}

#[derive(Debug)]
pub enum Anchor {
    /// The original node is in the DOM, unmodified structurally.
    Original,
    /// A directive suppressed the node; the comment holds its position.
    Placeholder(NodeRef),
    /// A directive multiplied the node; the marker comment precedes the
    /// clones and holds the position when the list is empty.
    Expanded { marker: NodeRef, nodes: Vec<NodeRef> },
}

pub struct NodeTrack {
    pub node: NodeRef,
    pub attributes: Vec<BoundAttribute>,
    pub property: Option<BoundProperty>,
    pub directives: Vec<DirectiveBinding>,
    pub anchor: Anchor,
}

/// Mutable engine state one update cycle runs against. Fields are disjoint
/// borrows of the component's internals.
pub struct UpdateCx<'a> {
    pub registry: &'a DirectiveRegistry,
    pub meta: &'a mut MetaStore,
    pub refs: &'a mut IndexMap<String, NodeRef>,
    pub props: &'a IndexMap<String, Value>,
    pub component_context: &'a Context,
    pub errors: &'a mut Vec<Error>,
    /// Directive-introduced nodes the component must track recursively.
    pub added: &'a mut Vec<NodeRef>,
    /// Nodes no longer rendered; the component untracks them recursively.
    pub removed: &'a mut Vec<NodeRef>,
    /// Attribute bindings routed through property setters, applied by the
    /// component after this cycle (dirty-checked there).
    pub prop_writes: &'a mut Vec<(String, Value)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    Updated,
    /// The node was externally removed; the component drops the track and
    /// clears metadata recursively.
    Destroyed,
}

enum Decision {
    Keep,
    Suppress,
    Expand(Vec<NodeRef>),
}

fn directive_rank(name: &str) -> u8 {
    match name {
        "if" => 0,
        "repeat" => 1,
        _ => 2,
    }
}

impl NodeTrack {
    /// Inspect a node's bindings. Nodes with none are empty: never tracked,
    /// only recursed into.
    pub fn build(node: &NodeRef, registry: &DirectiveRegistry) -> Option<NodeTrack> {
        if node.is_text() {
            let raw = node.node_value().unwrap_or_default();
            let snippets = extract_executables(&raw);
            if snippets.is_empty() {
                return None;
            }
            return Some(NodeTrack {
                node: node.clone(),
                attributes: Vec::new(),
                property: Some(BoundProperty {
                    target: PropertyTarget::NodeValue,
                    raw,
                    snippets,
                }),
                directives: Vec::new(),
                anchor: Anchor::Original,
            });
        }
        if !node.is_element() {
            return None;
        }

        let mut attributes = Vec::new();
        let mut directives = Vec::new();
        for attr in node.attributes() {
            if attr.name.len() > 2 && attr.name.starts_with("on") {
                continue; // event binding, compiled by the host
            }
            if let Some((name, prop)) = registry.match_attribute(&attr.name) {
                directives.push(DirectiveBinding {
                    name,
                    raw: attr.value.clone().unwrap_or_default(),
                    prop,
                });
                continue;
            }
            let Some(raw) = attr.value else { continue };
            let snippets = extract_executables(&raw);
            if !snippets.is_empty() {
                attributes.push(BoundAttribute {
                    name: attr.name,
                    raw,
                    snippets,
                });
            }
        }
        // Marker props carry directive arguments without attribute escaping.
        for (name, assignment) in node.props() {
            if let Some((directive, prop)) = registry.match_attribute(&name) {
                directives.push(DirectiveBinding {
                    name: directive,
                    raw: assignment.value,
                    prop: prop.or(assignment.prop),
                });
            }
        }
        directives.sort_by_key(|d| directive_rank(&d.name));

        let property = property_binding_for(node);
        if attributes.is_empty() && property.is_none() && directives.is_empty() {
            return None;
        }
        Some(NodeTrack {
            node: node.clone(),
            attributes,
            property,
            directives,
            anchor: Anchor::Original,
        })
    }

    /// One full update cycle for this node.
    pub fn update(&mut self, cx: &mut UpdateCx<'_>) -> UpdateResult {
        let id = self.node.id();

        // 1. Externally removed while clean → destroy.
        if cx.meta.is_tracked(id)
            && !cx.meta.is_shadowed(id)
            && self.node.parent().is_none()
            && matches!(self.anchor, Anchor::Original)
        {
            return UpdateResult::Destroyed;
        }

        // Under a shadowed ancestor the whole subtree is detached, retained
        // only for reuse; it re-renders when the ancestor is restored.
        if under_shadowed_ancestor(&self.node, cx.meta) {
            return UpdateResult::Updated;
        }

        // 2. Directives, in order. The first output that differs from the
        // original node decides the anchor; later directives are skipped.
        // Failures are caught per-directive and reported, then the chain
        // continues.
        let prev_clones: Vec<NodeRef> = match &self.anchor {
            Anchor::Expanded { nodes, .. } => nodes.clone(),
            _ => Vec::new(),
        };
        let mut decision = Decision::Keep;
        for binding in &self.directives {
            let Some(handler) = cx.registry.get(&binding.name) else {
                let node_source = cx.meta.source_markup(&self.node);
                cx.errors.push(Error::Directive {
                    directive: binding.name.clone(),
                    node_source,
                    source: DirectiveError::Other("unknown directive".to_string()),
                });
                continue;
            };
            let outcome = {
                let mut scope = DirectiveScope {
                    node: &self.node,
                    meta: &mut *cx.meta,
                    refs: &mut *cx.refs,
                    props: cx.props,
                    component_context: cx.component_context,
                    prev_clones: prev_clones.clone(),
                };
                handler
                    .parse_value(&binding.raw, binding.prop.as_deref())
                    .and_then(|payload| handler.render(&payload, &self.node, &mut scope))
            };
            match outcome {
                Ok(RenderOutput::Keep) => {}
                Ok(RenderOutput::Suppress) => {
                    decision = Decision::Suppress;
                    break;
                }
                Ok(RenderOutput::Fragment(nodes)) => {
                    decision = Decision::Expand(nodes);
                    break;
                }
                Err(source) => {
                    let node_source = cx.meta.source_markup(&self.node);
                    cx.errors.push(Error::Directive {
                        directive: binding.name.clone(),
                        node_source,
                        source,
                    });
                }
            }
        }

        // 3. Only when no directive changed the anchor: re-render the
        // property binding and every bound attribute.
        if matches!(decision, Decision::Keep) {
            self.render_bindings(cx);
        }

        // 4. Swap anchors.
        match decision {
            Decision::Keep => self.restore_original(cx),
            Decision::Suppress => self.suppress(cx),
            Decision::Expand(nodes) => self.expand(nodes, cx),
        }
        UpdateResult::Updated
    }

    /// Substitute current evaluations into the original literal text; write
    /// only when the computed value differs from the live one, so unchanged
    /// inputs cause zero DOM writes.
    fn render_bindings(&self, cx: &mut UpdateCx<'_>) {
        let scope = RenderScope {
            node_context: effective_context(&self.node, cx.meta),
            component_context: cx.component_context,
            props: cx.props,
        };

        if let Some(binding) = &self.property {
            match substitute(&binding.raw, &binding.snippets, &scope) {
                Ok(rendered) => {
                    let current = match binding.target {
                        PropertyTarget::NodeValue => self.node.node_value().unwrap_or_default(),
                        _ => self.node.text_content(),
                    };
                    if current != rendered {
                        match binding.target {
                            PropertyTarget::NodeValue => self.node.set_node_value(rendered),
                            _ => self.node.set_text_content(rendered),
                        }
                    }
                }
                Err(source) => cx.errors.push(Error::Evaluation {
                    node_source: binding.raw.clone(),
                    source,
                }),
            }
        }

        for attr in &self.attributes {
            match substitute(&attr.raw, &attr.snippets, &scope) {
                Ok(rendered) => {
                    let property = camel_case(&attr.name);
                    if cx.props.contains_key(&property) {
                        // Route through the property setter, JSON-coerced
                        // when the substituted string parses.
                        let coerced = serde_json::from_str(&rendered)
                            .unwrap_or(Value::String(rendered));
                        cx.prop_writes.push((property, coerced));
                    } else {
                        let current = self.node.get_attribute(&attr.name).flatten();
                        if current.as_deref() != Some(rendered.as_str()) {
                            self.node.set_attribute(&attr.name, rendered);
                        }
                    }
                }
                Err(source) => cx.errors.push(Error::Evaluation {
                    node_source: attr.raw.clone(),
                    source,
                }),
            }
        }
    }

    /// Nodes currently in the DOM on this track's behalf.
    fn anchor_nodes(&self) -> Vec<NodeRef> {
        match &self.anchor {
            Anchor::Original => vec![self.node.clone()],
            Anchor::Placeholder(comment) => vec![comment.clone()],
            Anchor::Expanded { marker, nodes } => {
                let mut out = vec![marker.clone()];
                out.extend(nodes.iter().cloned());
                out
            }
        }
    }

    fn restore_original(&mut self, cx: &mut UpdateCx<'_>) {
        if matches!(self.anchor, Anchor::Original) {
            return;
        }
        let old = self.anchor_nodes();
        self.splice(&old, &[self.node.clone()], cx);
        cx.meta.set_shadowed(&self.node, false);
        self.anchor = Anchor::Original;
    }

    fn suppress(&mut self, cx: &mut UpdateCx<'_>) {
        if matches!(self.anchor, Anchor::Placeholder(_)) {
            return;
        }
        let placeholder = NodeRef::comment("");
        let old = self.anchor_nodes();
        self.splice(&old, &[placeholder.clone()], cx);
        cx.meta.set_shadowed(&self.node, true);
        self.anchor = Anchor::Placeholder(placeholder);
    }

    fn expand(&mut self, nodes: Vec<NodeRef>, cx: &mut UpdateCx<'_>) {
        let marker = match &self.anchor {
            Anchor::Expanded { marker, .. } => marker.clone(),
            _ => NodeRef::comment(""),
        };
        let old = self.anchor_nodes();
        let mut new = vec![marker.clone()];
        new.extend(nodes.iter().cloned());
        self.splice(&old, &new, cx);
        cx.meta.set_shadowed(&self.node, true);
        self.anchor = Anchor::Expanded { marker, nodes };
    }

    /// Replace the old anchor representation with the new one: a temporary
    /// marker goes in before the old anchor, the new output is inserted
    /// after it in order, old nodes absent from the new output come out.
    /// The suppressed original is detached but retained (shadowed), never
    /// destroyed here.
    fn splice(&self, old: &[NodeRef], new: &[NodeRef], cx: &mut UpdateCx<'_>) {
        if old == new {
            return;
        }
        let Some(first) = old.first() else { return };
        let Some(parent) = first.parent() else { return };

        let temp = NodeRef::comment("");
        parent.insert_before(&temp, first);
        let mut cursor = temp.clone();
        for node in new {
            let fresh = !old.contains(node) && *node != self.node && !node.is_comment();
            parent.insert_after(node, &cursor);
            cursor = node.clone();
            if fresh {
                cx.added.push(node.clone());
            }
        }
        for node in old {
            if new.contains(node) {
                continue;
            }
            node.detach();
            if *node == self.node || node.is_comment() {
                continue; // shadowed original / positional comments
            }
            cx.removed.push(node.clone());
        }
        temp.detach();
    }
}

fn under_shadowed_ancestor(node: &NodeRef, meta: &MetaStore) -> bool {
    let mut cursor = node.parent();
    while let Some(parent) = cursor {
        if meta.is_shadowed(parent.id()) {
            return true;
        }
        cursor = parent.parent();
    }
    false
}

/// Elements whose text is excluded from recursive descent but tracked as a
/// single property binding on the carrier element.
fn property_binding_for(node: &NodeRef) -> Option<BoundProperty> {
    let tag = node.tag()?;
    let target = match tag.as_str() {
        "textarea" => PropertyTarget::Value,
        "style" | "script" => PropertyTarget::TextContent,
        _ => return None,
    };
    let raw = node.text_content();
    let snippets = extract_executables(&raw);
    if snippets.is_empty() {
        return None;
    }
    Some(BoundProperty {
        target,
        raw,
        snippets,
    })
}
