use lumen_markup::parse_markup;

#[test]
fn well_formed_markup_round_trips() {
    let source = r#"<div class="wrap"><span>hello</span> world<br><img src="x.png"></div>"#;
    assert_eq!(parse_markup(source).outer_html(), source);
}

#[test]
fn explicit_self_closing_tag() {
    let frag = parse_markup("<widget-item/><p>after</p>");
    let kids = frag.children();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[0].tag().as_deref(), Some("widget-item"));
    assert_eq!(kids[0].child_count(), 0);
    assert_eq!(kids[1].tag().as_deref(), Some("p"));
}

#[test]
fn comments_become_comment_nodes() {
    let frag = parse_markup("a<!-- note -->b");
    let kids = frag.children();
    assert_eq!(kids.len(), 3);
    assert!(kids[1].is_comment());
    assert_eq!(kids[1].node_value().as_deref(), Some(" note "));
}

#[test]
fn attribute_value_shapes() {
    let frag = parse_markup(r#"<input disabled value="" name=field>"#);
    let input = frag.first_child().unwrap();
    // no `=` → null value
    assert_eq!(input.get_attribute("disabled"), Some(None));
    // `=""` → empty string
    assert_eq!(input.get_attribute("value"), Some(Some(String::new())));
    // unquoted
    assert_eq!(
        input.get_attribute("name"),
        Some(Some("field".to_string()))
    );
}

#[test]
fn unmatched_close_pops_without_failing() {
    // the stray </section> closes nothing; the stray </em> pops <b>
    let frag = parse_markup("</section><b>x</em>y");
    assert_eq!(frag.outer_html(), "<b>x</b>y");
}

#[test]
fn unclosed_tags_close_at_end_of_input() {
    let frag = parse_markup("<ul><li>one<li>two");
    // children attach as written; the implicit close just ends the scope
    assert_eq!(frag.outer_html(), "<ul><li>one<li>two</li></li></ul>");
}

#[test]
fn raw_text_content_is_not_parsed() {
    let frag = parse_markup("<script>if (a < b) { go(); }</script>");
    let script = frag.first_child().unwrap();
    assert_eq!(script.child_count(), 1);
    assert_eq!(script.text_content(), "if (a < b) { go(); }");

    let frag = parse_markup("<textarea><div>not an element</div></textarea>");
    let ta = frag.first_child().unwrap();
    assert_eq!(ta.text_content(), "<div>not an element</div>");
    assert_eq!(ta.child_count(), 1);
}

#[test]
fn marker_attribute_assigns_structured_prop() {
    let frag = parse_markup(r#"<ul :repeat.items="a, b, c" id="list"></ul>"#);
    let ul = frag.first_child().unwrap();
    let prop = ul.get_prop("repeat").unwrap();
    assert_eq!(prop.value, "a, b, c");
    assert_eq!(prop.prop.as_deref(), Some("items"));
    assert!(!ul.has_attribute(":repeat.items"));
    assert!(ul.has_attribute("id"));
}

#[test]
fn lone_angle_bracket_is_text() {
    let frag = parse_markup("a < b");
    assert_eq!(frag.text_content(), "a < b");
}

#[test]
fn text_whitespace_is_preserved_verbatim() {
    let frag = parse_markup("<p>  two  words  </p>");
    assert_eq!(frag.first_child().unwrap().text_content(), "  two  words  ");
}
