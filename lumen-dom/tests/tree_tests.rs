use lumen_dom::NodeRef;

#[test]
fn reparenting_detaches_from_the_old_parent() {
    let a = NodeRef::element("div");
    let b = NodeRef::element("div");
    let child = NodeRef::element("span");

    a.append_child(&child);
    b.append_child(&child);
    assert_eq!(a.child_count(), 0);
    assert_eq!(child.parent(), Some(b));
}

#[test]
fn contains_walks_the_ancestor_chain() {
    let root = NodeRef::element("div");
    let mid = NodeRef::element("ul");
    let leaf = NodeRef::text("x");
    root.append_child(&mid);
    mid.append_child(&leaf);

    assert!(root.contains(&leaf));
    assert!(root.contains(&root));
    assert!(!mid.contains(&root));
}

#[test]
fn descendants_are_preorder() {
    let root = NodeRef::element("div");
    let first = NodeRef::element("a");
    let second = NodeRef::element("b");
    let nested = NodeRef::text("t");
    root.append_child(&first);
    first.append_child(&nested);
    root.append_child(&second);

    assert_eq!(root.descendants(), vec![first, nested, second]);
}

#[test]
fn deep_clone_creates_fresh_identities() {
    let root = NodeRef::element("div");
    root.set_attribute("class", "a");
    root.append_child(&NodeRef::text("x"));

    let clone = root.deep_clone();
    assert_ne!(clone, root);
    assert_ne!(clone.id(), root.id());
    assert!(clone.parent().is_none());
    assert_eq!(clone.outer_html(), root.outer_html());
    assert_ne!(clone.first_child().unwrap(), root.first_child().unwrap());
}

#[test]
fn text_content_concatenates_descendant_text() {
    let root = NodeRef::element("p");
    root.append_child(&NodeRef::text("a"));
    let em = NodeRef::element("em");
    em.append_child(&NodeRef::text("b"));
    root.append_child(&em);
    root.append_child(&NodeRef::comment("ignored"));

    assert_eq!(root.text_content(), "ab");
}
