use lumen_core::{Component, ComponentConfig};
use lumen_dom::NodeRef;
use serde_json::json;

fn find_tag(root: &NodeRef, tag: &str) -> Vec<NodeRef> {
    root.descendants()
        .into_iter()
        .filter(|n| n.tag().as_deref() == Some(tag))
        .collect()
}

#[test]
fn falsy_if_suppresses_behind_a_placeholder() {
    let config = ComponentConfig::new("x-if", r#"<p if="{show}">secret</p>"#);
    let component = Component::new(config).unwrap();
    component.set_property("show", json!(false));
    component.mount();

    assert!(find_tag(&component.root(), "p").is_empty());
    let children = component.root().children();
    assert_eq!(children.len(), 1);
    assert!(children[0].is_comment());
}

#[test]
fn restored_node_keeps_its_identity() {
    let config = ComponentConfig::new("x-toggle", r#"<p if="{show}">secret</p>"#);
    let component = Component::new(config).unwrap();
    component.set_property("show", json!(true));
    component.mount();

    let p = find_tag(&component.root(), "p").remove(0);
    component.set_property("show", json!(false));
    assert!(find_tag(&component.root(), "p").is_empty());

    component.set_property("show", json!(true));
    let restored = find_tag(&component.root(), "p").remove(0);
    assert_eq!(restored, p);
    assert_eq!(restored.text_content(), "secret");
}

#[test]
fn bare_expression_condition() {
    let config = ComponentConfig::new("x-bare", r#"<p if="count > 1">many</p>"#);
    let component = Component::new(config).unwrap();
    component.set_property("count", json!(1));
    component.mount();
    assert!(find_tag(&component.root(), "p").is_empty());

    component.set_property("count", json!(2));
    assert_eq!(find_tag(&component.root(), "p").len(), 1);
}

#[test]
fn falsy_if_wins_over_repeat_on_the_same_node() {
    let config = ComponentConfig::new("x-both", r#"<li repeat="{n}" if="{show}">row</li>"#);
    let component = Component::new(config).unwrap();
    component.set_property("n", json!(5));
    component.set_property("show", json!(false));
    component.mount();

    // `if` evaluates first regardless of attribute order
    assert!(find_tag(&component.root(), "li").is_empty());

    component.set_property("show", json!(true));
    assert_eq!(find_tag(&component.root(), "li").len(), 5);

    component.set_property("show", json!(false));
    assert!(find_tag(&component.root(), "li").is_empty());
}

#[test]
fn sibling_nodes_are_undisturbed_by_anchor_swaps() {
    let config = ComponentConfig::new(
        "x-sib",
        r#"<i>before</i><p if="{show}">mid</p><b>after</b>"#,
    );
    let component = Component::new(config).unwrap();
    component.set_property("show", json!(true));
    component.mount();
    let shown = r#"<i>before</i><p if="{show}">mid</p><b>after</b>"#;
    assert_eq!(component.root().inner_html(), shown);

    component.set_property("show", json!(false));
    assert_eq!(
        component.root().inner_html(),
        "<i>before</i><!----><b>after</b>"
    );

    component.set_property("show", json!(true));
    assert_eq!(component.root().inner_html(), shown);
}

#[test]
fn marker_prop_feeds_a_directive() {
    // `:if="..."` assigns the directive argument as a structured prop
    let config = ComponentConfig::new("x-marker", r#"<p :if="{show}">via prop</p>"#);
    let component = Component::new(config).unwrap();
    component.set_property("show", json!(false));
    component.mount();
    assert!(find_tag(&component.root(), "p").is_empty());

    component.set_property("show", json!(true));
    assert_eq!(find_tag(&component.root(), "p").len(), 1);
}
