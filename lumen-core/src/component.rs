//! Component host.
//!
//! A `Component` is a cheap handle over shared instance state, the way a
//! host element is in the DOM. The template materializes once on first
//! mount; every later mount only re-runs `force_update` across existing
//! tracks. Property, attribute and context writes are dirty-checked and
//! re-render synchronously while mounted; while unmounted they apply
//! without rendering until the next mount.
//!
//! User code runs only through the hook trait and registered event
//! handlers, and both are invoked with no internal borrow held, so a hook
//! may freely mutate the component that called it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use lumen_dom::{NodeId, NodeRef};
use lumen_expr::{Expr, ExprError, Scope, eval_expression, extract_executables, parse_expression};
use lumen_markup::parse_markup;
use serde_json::Value;

use crate::context::{Context, effective_context};
use crate::directives::DirectiveRegistry;
use crate::error::{Error, ParseError};
use crate::meta::MetaStore;
use crate::track::{NodeTrack, UpdateCx, UpdateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMode {
    Open,
    Closed,
    None,
}

impl ShadowMode {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input {
            "open" => Ok(ShadowMode::Open),
            "closed" => Ok(ShadowMode::Closed),
            "none" => Ok(ShadowMode::None),
            other => Err(ParseError::InvalidShadowMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Constructed,
    Mounted,
    Unmounted,
    Adopted,
    Destroyed,
}

/// Read-only configuration consumed at construction time.
pub struct ComponentConfig {
    pub tag: String,
    pub template: String,
    pub style: Option<String>,
    pub shadow_mode: ShadowMode,
    pub delegates_focus: bool,
    pub observed_attributes: Vec<String>,
    pub context: Context,
}

impl ComponentConfig {
    pub fn new(tag: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            template: template.into(),
            style: None,
            shadow_mode: ShadowMode::Open,
            delegates_focus: false,
            observed_attributes: Vec::new(),
            context: Context::new(),
        }
    }
}

pub type HookResult = Result<(), Box<dyn std::error::Error>>;

/// The integration points external code overrides. `error` is the sole
/// recovery point; unoverridden it logs.
pub trait Hooks {
    fn mounted(&mut self, _component: &Component) -> HookResult {
        Ok(())
    }
    fn destroyed(&mut self, _component: &Component) -> HookResult {
        Ok(())
    }
    fn updated(
        &mut self,
        _component: &Component,
        _name: &str,
        _old: &Value,
        _new: &Value,
    ) -> HookResult {
        Ok(())
    }
    fn adopted(&mut self, _component: &Component) -> HookResult {
        Ok(())
    }
    fn error(&mut self, component: &Component, error: &Error) {
        log::error!("[{}] {error}", component.tag());
    }
}

pub type Handler = Rc<dyn Fn(&Component, &[Value]) -> Value>;

struct EventBinding {
    node: NodeRef,
    event: String,
    raw: String,
    expr: Expr,
}

/// Hook and subscriber invocations deferred until no internal borrow is
/// held.
enum Effect {
    Mounted,
    Destroyed,
    Adopted,
    Updated { name: String, old: Value, new: Value },
    Report(Error),
    NotifyContext { key: String, value: Value },
}

struct Inner {
    config: ComponentConfig,
    registry: Rc<DirectiveRegistry>,
    phase: LifecyclePhase,
    mounted: bool,
    parsed: bool,
    root: NodeRef,
    props: IndexMap<String, Value>,
    context: Context,
    subscribers: Vec<Rc<dyn Fn(&str, &Value)>>,
    parent: Option<Weak<RefCell<Inner>>>,
    trackers: IndexMap<NodeId, NodeTrack>,
    meta: MetaStore,
    refs: IndexMap<String, NodeRef>,
    events: Vec<EventBinding>,
    handlers: IndexMap<String, Handler>,
    hooks: Option<Box<dyn Hooks>>,
}

#[derive(Clone)]
pub struct Component {
    inner: Rc<RefCell<Inner>>,
}

impl Component {
    pub fn new(config: ComponentConfig) -> Result<Self, ParseError> {
        Self::with_registry(config, Rc::new(DirectiveRegistry::standard()))
    }

    /// Construct with an explicit directive registry. Configuration is
    /// validated here; a violation is fatal to construction.
    pub fn with_registry(
        config: ComponentConfig,
        registry: Rc<DirectiveRegistry>,
    ) -> Result<Self, ParseError> {
        for attribute in &config.observed_attributes {
            validate_observed_attribute(attribute)?;
        }
        let context = config.context.clone();
        let root = NodeRef::element(&config.tag);
        Ok(Component {
            inner: Rc::new(RefCell::new(Inner {
                config,
                registry,
                phase: LifecyclePhase::Constructed,
                mounted: false,
                parsed: false,
                root,
                props: IndexMap::new(),
                context,
                subscribers: Vec::new(),
                parent: None,
                trackers: IndexMap::new(),
                meta: MetaStore::new(),
                refs: IndexMap::new(),
                events: Vec::new(),
                handlers: IndexMap::new(),
                hooks: None,
            })),
        })
    }

    pub fn with_hooks(self, hooks: Box<dyn Hooks>) -> Self {
        self.inner.borrow_mut().hooks = Some(hooks);
        self
    }

    /// Link to the nearest ancestor component: context resolution walks the
    /// parent chain, and the child re-renders when an ancestor context
    /// changes.
    pub fn with_parent(self, parent: &Component) -> Self {
        self.inner.borrow_mut().parent = Some(Rc::downgrade(&parent.inner));
        let weak = Rc::downgrade(&self.inner);
        parent
            .inner
            .borrow_mut()
            .subscribers
            .push(Rc::new(move |_key, _value| {
                if let Some(inner) = weak.upgrade() {
                    Component { inner }.force_update();
                }
            }));
        self
    }

    pub fn register_handler(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&Component, &[Value]) -> Value + 'static,
    ) {
        self.inner
            .borrow_mut()
            .handlers
            .insert(name.into(), Rc::new(handler));
    }

    pub fn tag(&self) -> String {
        self.inner.borrow().config.tag.clone()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.inner.borrow().phase
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().mounted
    }

    pub fn shadow_mode(&self) -> ShadowMode {
        self.inner.borrow().config.shadow_mode
    }

    pub fn delegates_focus(&self) -> bool {
        self.inner.borrow().config.delegates_focus
    }

    /// The host element owning the rendered content.
    pub fn root(&self) -> NodeRef {
        self.inner.borrow().root.clone()
    }

    pub fn get_ref(&self, name: &str) -> Option<NodeRef> {
        self.inner.borrow().refs.get(name).cloned()
    }

    /// Number of live node tracks.
    pub fn track_count(&self) -> usize {
        self.inner.borrow().trackers.len()
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        self.inner.borrow().props.get(name).cloned()
    }

    /// Context lookup through the component chain (own context first).
    pub fn get_context(&self, key: &str) -> Option<Value> {
        let inner = self.inner.borrow();
        if let Some(value) = inner.context.get(key) {
            return Some(value.clone());
        }
        let mut parent = inner.parent.clone();
        drop(inner);
        while let Some(weak) = parent {
            let Some(rc) = weak.upgrade() else { break };
            let link = rc.borrow();
            if let Some(value) = link.context.get(key) {
                return Some(value.clone());
            }
            parent = link.parent.clone();
        }
        None
    }

    pub fn mount(&self) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            inner.mount()
        };
        self.drain(effects);
    }

    pub fn unmount(&self) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            inner.unmount()
        };
        self.drain(effects);
    }

    /// Cross-document adoption: nothing re-renders, the hook just fires.
    pub fn adopt(&self) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            inner.phase = LifecyclePhase::Adopted;
            vec![Effect::Adopted]
        };
        self.drain(effects);
    }

    /// Permanent teardown: unmounts if needed, then drops all tracks,
    /// metadata, events, refs and subscribers.
    pub fn destroy(&self) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            let mut effects = Vec::new();
            if inner.mounted {
                effects = inner.unmount();
            }
            inner.trackers.clear();
            let root = inner.root.clone();
            inner.meta.clear_subtree(&root);
            inner.events.clear();
            inner.refs.clear();
            inner.subscribers.clear();
            inner.phase = LifecyclePhase::Destroyed;
            effects
        };
        self.drain(effects);
    }

    /// Dirty-checked property write; re-renders and fires the update hook
    /// while mounted.
    pub fn set_property(&self, name: impl Into<String>, value: Value) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            let mut effects = Vec::new();
            inner.set_property(name.into(), value, &mut effects);
            effects
        };
        self.drain(effects);
    }

    /// Host attribute write. Observed attributes JSON-coerce (raw-string
    /// fallback) into the matching camelCased property.
    pub fn set_attribute(&self, name: &str, raw: &str) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            inner.attribute_changed(name, raw)
        };
        self.drain(effects);
    }

    /// Merge into the component context; while mounted, re-render and
    /// notify context subscribers synchronously.
    pub fn update_context(&self, key: impl Into<String>, value: Value) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            inner.update_context(key.into(), value)
        };
        self.drain(effects);
    }

    /// Set a context override on one node and re-render every tracker bound
    /// under it.
    pub fn update_node_context(&self, node: &NodeRef, key: impl Into<String>, value: Value) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            inner.update_node_context(node, &key.into(), value)
        };
        self.drain(effects);
    }

    /// Re-render every track.
    pub fn force_update(&self) {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            let mut effects = Vec::new();
            if inner.mounted {
                inner.force_update(&mut effects);
            }
            effects
        };
        self.drain(effects);
    }

    /// Deliver an event to the compiled `on<event>` binding of a node. The
    /// handler expression sees `$event` in scope; named calls dispatch to
    /// registered handlers, which receive this component and may mutate it.
    pub fn dispatch_event(&self, node: &NodeRef, event: &str, detail: Value) {
        let prepared = {
            let inner = self.inner.borrow();
            inner
                .events
                .iter()
                .find(|b| b.node == *node && b.event == event)
                .map(|b| {
                    (
                        b.expr.clone(),
                        b.raw.clone(),
                        effective_context(node, &inner.meta),
                        inner.merged_component_context(),
                        inner.props.clone(),
                        inner.handlers.clone(),
                    )
                })
        };
        let Some((expr, raw, node_context, component_context, props, handlers)) = prepared else {
            return;
        };
        let scope = DispatchScope {
            detail,
            node_context,
            component_context,
            props,
            handlers,
            component: self.clone(),
        };
        if let Err(source) = eval_expression(&expr, &scope) {
            self.report(Error::Evaluation {
                node_source: raw,
                source,
            });
        }
    }

    /// Route an error through the error hook; without hooks it logs.
    pub(crate) fn report(&self, error: Error) {
        let hooks = self.inner.borrow_mut().hooks.take();
        match hooks {
            Some(mut hooks) => {
                hooks.error(self, &error);
                self.inner.borrow_mut().hooks = Some(hooks);
            }
            None => log::error!("[{}] {error}", self.tag()),
        }
    }

    fn call_hook(
        &self,
        phase: &'static str,
        f: impl FnOnce(&mut dyn Hooks, &Component) -> HookResult,
    ) {
        let hooks = self.inner.borrow_mut().hooks.take();
        let Some(mut hooks) = hooks else { return };
        let result = f(hooks.as_mut(), self);
        self.inner.borrow_mut().hooks = Some(hooks);
        if let Err(err) = result {
            self.report(Error::Lifecycle {
                phase,
                message: err.to_string(),
            });
        }
    }

    fn drain(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Report(error) => self.report(error),
                Effect::Mounted => self.call_hook("mount", |h, c| h.mounted(c)),
                Effect::Destroyed => self.call_hook("destroy", |h, c| h.destroyed(c)),
                Effect::Adopted => self.call_hook("adopt", |h, c| h.adopted(c)),
                Effect::Updated { name, old, new } => {
                    self.call_hook("update", |h, c| h.updated(c, &name, &old, &new))
                }
                Effect::NotifyContext { key, value } => {
                    let subscribers = self.inner.borrow().subscribers.clone();
                    for subscriber in subscribers {
                        subscriber(&key, &value);
                    }
                }
            }
        }
    }
}

impl Inner {
    fn mount(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.parsed {
            let mut markup = String::new();
            if let Some(style) = &self.config.style {
                markup.push_str("<style>");
                markup.push_str(style);
                markup.push_str("</style>");
            }
            markup.push_str(&self.config.template);
            let fragment = parse_markup(&markup);
            for child in fragment.children() {
                self.root.append_child(&child);
            }
            for child in self.root.children() {
                self.track_subtree(&child, &mut effects);
            }
            self.parsed = true;
        }
        self.mounted = true;
        self.phase = LifecyclePhase::Mounted;
        self.force_update(&mut effects);
        effects.push(Effect::Mounted);
        effects
    }

    fn unmount(&mut self) -> Vec<Effect> {
        self.mounted = false;
        self.phase = LifecyclePhase::Unmounted;
        vec![Effect::Destroyed]
    }

    fn set_property(&mut self, name: String, value: Value, effects: &mut Vec<Effect>) {
        let old = self.props.get(&name).cloned().unwrap_or(Value::Null);
        if old == value {
            return;
        }
        self.props.insert(name.clone(), value.clone());
        if self.mounted {
            self.force_update(effects);
            effects.push(Effect::Updated {
                name,
                old,
                new: value,
            });
        }
    }

    fn attribute_changed(&mut self, name: &str, raw: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.root.set_attribute(name, raw);
        if self.config.observed_attributes.iter().any(|a| a == name) {
            let value =
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            self.set_property(camel_case(name), value, &mut effects);
        }
        effects
    }

    fn update_context(&mut self, key: String, value: Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.context.insert(key.clone(), value.clone());
        if self.mounted {
            self.force_update(&mut effects);
            effects.push(Effect::NotifyContext { key, value });
        }
        effects
    }

    fn update_node_context(&mut self, node: &NodeRef, key: &str, value: Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.meta.set_context_value(node, key, value);
        if self.mounted {
            let merged = self.merged_component_context();
            let mut ids = vec![node.id()];
            ids.extend(node.descendants().iter().map(NodeRef::id));
            for id in ids {
                if self.trackers.contains_key(&id) {
                    self.update_tracker(id, &merged, &mut effects);
                }
            }
        }
        effects
    }

    /// Component context chain merged root-first, so nearer contexts win.
    fn merged_component_context(&self) -> Context {
        let mut chain = vec![self.context.clone()];
        let mut parent = self.parent.clone();
        while let Some(weak) = parent {
            let Some(rc) = weak.upgrade() else { break };
            let link = rc.borrow();
            chain.push(link.context.clone());
            parent = link.parent.clone();
        }
        let mut merged = Context::new();
        for context in chain.iter().rev() {
            for (key, value) in context {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    fn force_update(&mut self, effects: &mut Vec<Effect>) {
        if !self.parsed {
            return;
        }
        let merged = self.merged_component_context();
        let ids: Vec<NodeId> = self.trackers.keys().copied().collect();
        for id in ids {
            self.update_tracker(id, &merged, effects);
        }
    }

    fn update_tracker(&mut self, id: NodeId, merged: &Context, effects: &mut Vec<Effect>) {
        let registry = self.registry.clone();
        let mut errors = Vec::new();
        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut prop_writes = Vec::new();

        let result = {
            let Some(track) = self.trackers.get_mut(&id) else {
                return;
            };
            let mut cx = UpdateCx {
                registry: &registry,
                meta: &mut self.meta,
                refs: &mut self.refs,
                props: &self.props,
                component_context: merged,
                errors: &mut errors,
                added: &mut added,
                removed: &mut removed,
                prop_writes: &mut prop_writes,
            };
            track.update(&mut cx)
        };
        for error in errors {
            effects.push(Effect::Report(error));
        }

        if result == UpdateResult::Destroyed {
            if let Some(node) = self.trackers.get(&id).map(|t| t.node.clone()) {
                self.untrack_subtree(&node);
            }
            return;
        }
        for node in removed {
            self.untrack_subtree(&node);
        }
        for node in added {
            self.track_subtree(&node, effects);
            let mut new_ids = vec![node.id()];
            new_ids.extend(node.descendants().iter().map(NodeRef::id));
            for new_id in new_ids {
                if self.trackers.contains_key(&new_id) {
                    self.update_tracker(new_id, merged, effects);
                }
            }
        }
        for (name, value) in prop_writes {
            self.set_property(name, value, effects);
        }
    }

    /// Create tracks and compile event bindings for a node and its
    /// descendants. Text under textarea/style/script is not descended into;
    /// comments are skipped entirely.
    fn track_subtree(&mut self, node: &NodeRef, effects: &mut Vec<Effect>) {
        self.track_node(node, effects);
        if node.is_element() {
            let tag = node.tag().unwrap_or_default();
            if matches!(tag.as_str(), "textarea" | "style" | "script") {
                return;
            }
        } else if !node.is_fragment() {
            return;
        }
        for child in node.children() {
            self.track_subtree(&child, effects);
        }
    }

    fn track_node(&mut self, node: &NodeRef, effects: &mut Vec<Effect>) {
        if self.trackers.contains_key(&node.id()) {
            return;
        }
        if node.is_element() {
            for attr in node.attributes() {
                if attr.name.len() > 2 && attr.name.starts_with("on") {
                    let raw = attr.value.clone().unwrap_or_default();
                    match compile_event(&raw) {
                        Ok(expr) => self.events.push(EventBinding {
                            node: node.clone(),
                            event: attr.name[2..].to_string(),
                            raw,
                            expr,
                        }),
                        Err(source) => effects.push(Effect::Report(Error::Evaluation {
                            node_source: node.outer_html(),
                            source,
                        })),
                    }
                }
            }
        }
        if let Some(track) = NodeTrack::build(node, &self.registry) {
            self.meta.set_tracked(node);
            self.trackers.insert(node.id(), track);
        }
    }

    /// Untrack a node and all descendants: tracks, metadata, event bindings
    /// and refs all go.
    fn untrack_subtree(&mut self, node: &NodeRef) {
        let mut ids = vec![node.id()];
        ids.extend(node.descendants().iter().map(NodeRef::id));
        for id in &ids {
            self.trackers.shift_remove(id);
            self.meta.clear(*id);
        }
        self.events.retain(|b| !ids.contains(&b.node.id()));
        self.refs.retain(|_, n| !ids.contains(&n.id()));
    }
}

/// `on*` values compile once: a brace snippet's expression, or the whole
/// value as one expression.
fn compile_event(raw: &str) -> Result<Expr, ExprError> {
    let snippets = extract_executables(raw);
    let source = snippets
        .first()
        .map(|s| s.executable.clone())
        .unwrap_or_else(|| raw.trim().to_string());
    parse_expression(&source)
}

struct DispatchScope {
    detail: Value,
    node_context: Context,
    component_context: Context,
    props: IndexMap<String, Value>,
    handlers: IndexMap<String, Handler>,
    component: Component,
}

impl Scope for DispatchScope {
    fn lookup(&self, name: &str) -> Option<Value> {
        if name == "$event" {
            return Some(self.detail.clone());
        }
        self.node_context
            .get(name)
            .or_else(|| self.component_context.get(name))
            .or_else(|| self.props.get(name))
            .cloned()
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, ExprError> {
        match self.handlers.get(name) {
            Some(handler) => Ok(handler(&self.component, args)),
            None => Err(ExprError::NotCallable(name.to_string())),
        }
    }
}

fn validate_observed_attribute(name: &str) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$');
    if valid_head && valid_tail {
        Ok(())
    } else {
        Err(ParseError::InvalidObservedAttribute(name.to_string()))
    }
}

/// kebab-case / snake_case → camelCase, for attribute-to-property routing.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '-' || ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_conversion() {
        assert_eq!(camel_case("user-name"), "userName");
        assert_eq!(camel_case("plain"), "plain");
        assert_eq!(camel_case("a-b-c"), "aBC");
    }

    #[test]
    fn shadow_mode_validation() {
        assert_eq!(ShadowMode::parse("open").unwrap(), ShadowMode::Open);
        assert!(matches!(
            ShadowMode::parse("shut"),
            Err(ParseError::InvalidShadowMode(_))
        ));
    }

    #[test]
    fn observed_attribute_validation() {
        assert!(validate_observed_attribute("user-name").is_ok());
        assert!(validate_observed_attribute("1bad").is_err());
        assert!(validate_observed_attribute("").is_err());
    }
}
