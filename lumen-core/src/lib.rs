//! lumen-core: directives, node tracks and the component host.
//!
//! The engine parses a component's template once into a live fragment,
//! creates a track per dynamically-bound node, and re-renders exactly the
//! bindings whose evaluations changed — synchronously, on every property,
//! attribute or context mutation while mounted.

pub mod component;
pub mod context;
pub mod directives;
pub mod error;
pub mod meta;
pub mod scope;
pub mod track;

pub use component::{
    Component, ComponentConfig, Handler, HookResult, Hooks, LifecyclePhase, ShadowMode,
};
pub use context::{Context, effective_context, merge};
pub use directives::{
    AttrDirective, Directive, DirectiveRegistry, DirectiveScope, IfDirective, RefDirective,
    RenderOutput, RepeatDirective,
};
pub use error::{DirectiveError, Error, ParseError};
pub use meta::{MetaStore, NodeMeta};
pub use track::{Anchor, BoundAttribute, BoundProperty, NodeTrack, PropertyTarget, UpdateCx};
