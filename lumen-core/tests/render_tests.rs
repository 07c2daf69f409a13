use lumen_core::{Component, ComponentConfig};
use serde_json::json;

#[test]
fn binding_free_template_is_passthrough() {
    let config = ComponentConfig::new("x-static", r#"<div class="wrap"><span>hi</span> there</div>"#);
    let component = Component::new(config).unwrap();
    component.mount();
    assert_eq!(
        component.root().inner_html(),
        r#"<div class="wrap"><span>hi</span> there</div>"#
    );
    assert_eq!(component.track_count(), 0);
}

#[test]
fn text_substitution_preserves_surrounding_whitespace() {
    let component = Component::new(ComponentConfig::new("x-text", "{x} {y}")).unwrap();
    component.set_property("x", json!("X"));
    component.set_property("y", json!("Y"));
    component.mount();
    assert_eq!(component.root().inner_html(), "X Y");

    component.set_property("x", json!("Z"));
    assert_eq!(component.root().inner_html(), "Z Y");
}

#[test]
fn rerender_with_unchanged_inputs_keeps_node_identity() {
    let component = Component::new(ComponentConfig::new("x-stable", "<p>{v}</p>")).unwrap();
    component.set_property("v", json!("same"));
    component.mount();

    let p = component.root().first_child().unwrap();
    let text = p.first_child().unwrap();
    component.force_update();
    component.force_update();
    assert_eq!(component.root().first_child().unwrap(), p);
    assert_eq!(p.first_child().unwrap(), text);
    assert_eq!(text.node_value().as_deref(), Some("same"));
}

#[test]
fn writing_the_same_property_value_is_a_noop() {
    let component = Component::new(ComponentConfig::new("x-noop", "{v}")).unwrap();
    component.set_property("v", json!(1));
    component.mount();
    let text = component.root().first_child().unwrap();

    component.set_property("v", json!(1));
    assert_eq!(component.root().first_child().unwrap(), text);
    assert_eq!(text.node_value().as_deref(), Some("1"));
}

#[test]
fn unrelated_attributes_stay_untouched() {
    let config = ComponentConfig::new("x-attrs", r#"<div id="static" title="{t}"></div>"#);
    let component = Component::new(config).unwrap();
    component.set_property("t", json!("one"));
    component.mount();

    let div = component.root().first_child().unwrap();
    assert_eq!(div.get_attribute("title").flatten().as_deref(), Some("one"));
    component.set_property("t", json!("two"));
    assert_eq!(div.get_attribute("title").flatten().as_deref(), Some("two"));
    assert_eq!(div.get_attribute("id").flatten().as_deref(), Some("static"));
}

#[test]
fn textarea_text_is_a_single_property_binding() {
    let component =
        Component::new(ComponentConfig::new("x-area", "<textarea>{msg}</textarea>")).unwrap();
    component.set_property("msg", json!("draft"));
    component.mount();

    let area = component.root().first_child().unwrap();
    assert_eq!(area.text_content(), "draft");
    // the carrier element is tracked, not its text child
    assert_eq!(component.track_count(), 1);

    component.set_property("msg", json!("final"));
    assert_eq!(area.text_content(), "final");
}

#[test]
fn style_config_renders_into_a_style_element() {
    let mut config = ComponentConfig::new("x-styled", "<p>body</p>");
    config.style = Some("p { margin: 0; }".to_string());
    let component = Component::new(config).unwrap();
    component.mount();
    assert_eq!(
        component.root().inner_html(),
        "<style>p { margin: 0; }</style><p>body</p>"
    );
}
