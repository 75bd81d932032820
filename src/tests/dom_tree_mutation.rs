use super::*;

#[test]
fn append_child_moves_node_and_indexes_its_id() -> Result<()> {
    let mut page = Page::from_html("<div id='a'></div><div id='b'></div>")?;
    let a = page.by_id("a").ok_or_else(|| Error::SelectorNotFound("#a".into()))?;
    let b = page.by_id("b").ok_or_else(|| Error::SelectorNotFound("#b".into()))?;

    let child = page.dom_mut().create_detached_element("span");
    page.dom_mut().set_attr(child, "id", "late")?;
    assert_eq!(page.by_id("late"), None);

    page.dom_mut().append_child(a, child)?;
    assert_eq!(page.by_id("late"), Some(child));
    assert_eq!(page.dom().parent(child), Some(a));

    page.dom_mut().append_child(b, child)?;
    assert_eq!(page.dom().parent(child), Some(b));
    assert!(page.dom().children(a).is_empty());
    assert_eq!(page.dom().children(b), &[child]);
    Ok(())
}

#[test]
fn append_child_rejects_cycles_and_text_parents() -> Result<()> {
    let mut page = Page::from_html("<div id='outer'><div id='inner'></div></div>")?;
    let outer = page.by_id("outer").ok_or_else(|| Error::SelectorNotFound("#outer".into()))?;
    let inner = page.by_id("inner").ok_or_else(|| Error::SelectorNotFound("#inner".into()))?;

    match page.dom_mut().append_child(inner, outer) {
        Err(Error::Dom(message)) => assert!(message.contains("cycle"), "{message}"),
        other => panic!("expected cycle error, got: {other:?}"),
    }

    let text = page.dom_mut().create_detached_text("t");
    let span = page.dom_mut().create_detached_element("span");
    assert!(matches!(
        page.dom_mut().append_child(text, span),
        Err(Error::Dom(_))
    ));
    Ok(())
}

#[test]
fn remove_child_requires_direct_parent() -> Result<()> {
    let mut page = Page::from_html("<ul id='list'><li id='one'>1</li></ul><p id='other'></p>")?;
    let one = page.by_id("one").ok_or_else(|| Error::SelectorNotFound("#one".into()))?;
    let other = page.by_id("other").ok_or_else(|| Error::SelectorNotFound("#other".into()))?;

    assert!(matches!(
        page.dom_mut().remove_child(other, one),
        Err(Error::Dom(_))
    ));

    page.dom_mut().remove_node(one)?;
    assert_eq!(page.by_id("one"), None);
    assert!(!page.dom().is_connected(one));

    // Detached nodes are left alone.
    page.dom_mut().remove_node(one)?;
    assert_eq!(page.dom().text_content(one), "1");

    let root = page.document();
    assert!(matches!(page.dom_mut().remove_node(root), Err(Error::Dom(_))));
    Ok(())
}

#[test]
fn set_text_content_replaces_children_and_drops_nested_ids() -> Result<()> {
    let mut page = Page::from_html("<div id='box'><span id='nested'>a</span>b</div>")?;
    let node = page.by_id("box").ok_or_else(|| Error::SelectorNotFound("#box".into()))?;
    page.assert_text("#box", "ab")?;

    page.dom_mut().set_text_content(node, "fresh")?;
    page.assert_text("#box", "fresh")?;
    assert_eq!(page.dom().children(node).len(), 1);
    assert_eq!(page.by_id("nested"), None);

    page.dom_mut().set_text_content(node, "")?;
    assert!(page.dom().children(node).is_empty());
    Ok(())
}

#[test]
fn class_tokens_are_deduplicated_and_removed_cleanly() -> Result<()> {
    let mut page = Page::from_html("<p id='msg' class='note hidden'></p>")?;
    let msg = page.by_id("msg").ok_or_else(|| Error::SelectorNotFound("#msg".into()))?;

    page.dom_mut().class_add(msg, "hidden")?;
    assert_eq!(page.dom().attr(msg, "class").as_deref(), Some("note hidden"));

    page.dom_mut().class_set(msg, "hidden", false)?;
    assert!(!page.dom().has_class(msg, "hidden"));
    page.dom_mut().class_remove(msg, "note")?;
    assert_eq!(page.dom().attr(msg, "class"), None);
    Ok(())
}

#[test]
fn first_element_wins_for_duplicate_ids() -> Result<()> {
    let page = Page::from_html("<p id='dup'>first</p><p id='dup'>second</p>")?;
    page.assert_text("#dup", "first")?;
    Ok(())
}

#[test]
fn dump_node_orders_attributes_and_skips_void_end_tags() -> Result<()> {
    let page = Page::from_html("<form id='f' class='c'><input name='item' id='i'></form>")?;
    assert_eq!(
        page.dump_dom("#f")?,
        r#"<form class="c" id="f"><input id="i" name="item"></form>"#
    );
    Ok(())
}

#[test]
fn remove_attr_unindexes_ids_and_clears_live_flags() -> Result<()> {
    let mut page = Page::from_html(
        "<p id='dup'>first</p><p id='dup'>second</p>\
         <input id='box' type='checkbox' checked disabled>",
    )?;
    let first = page.by_id("dup").ok_or_else(|| Error::SelectorNotFound("#dup".into()))?;
    let boxed = page.by_id("box").ok_or_else(|| Error::SelectorNotFound("#box".into()))?;

    page.dom_mut().remove_attr(first, "ID")?;
    assert_eq!(page.dom().attr(first, "id"), None);
    page.assert_text("#dup", "second")?;

    assert!(page.dom().checked(boxed));
    assert!(page.dom().disabled(boxed));
    page.dom_mut().remove_attr(boxed, "checked")?;
    page.dom_mut().remove_attr(boxed, "disabled")?;
    assert!(!page.dom().checked(boxed));
    assert!(!page.dom().disabled(boxed));

    // Missing attributes are a no-op.
    page.dom_mut().remove_attr(boxed, "title")?;
    let text = page.dom_mut().create_detached_text("t");
    assert!(matches!(page.dom_mut().remove_attr(text, "id"), Err(Error::Dom(_))));
    Ok(())
}

#[test]
fn id_index_tracks_document_order_across_mutations() -> Result<()> {
    let mut page = Page::from_html("<div id='a'></div><div id='b'><p id='dup'>late</p></div>")?;
    let a = page.by_id("a").ok_or_else(|| Error::SelectorNotFound("#a".into()))?;
    let late = page.by_id("dup").ok_or_else(|| Error::SelectorNotFound("#dup".into()))?;

    // An earlier duplicate takes over the id.
    let early = page.dom_mut().create_detached_element("p");
    page.dom_mut().set_attr(early, "id", "dup")?;
    page.dom_mut().append_child(a, early)?;
    assert_eq!(page.by_id("dup"), Some(early));

    // A later duplicate does not.
    let b = page.by_id("b").ok_or_else(|| Error::SelectorNotFound("#b".into()))?;
    let later = page.dom_mut().create_detached_element("p");
    page.dom_mut().set_attr(later, "id", "dup")?;
    page.dom_mut().append_child(b, later)?;
    assert_eq!(page.by_id("dup"), Some(early));

    // Removing the holder falls back to the next one in document order.
    page.dom_mut().remove_node(early)?;
    assert_eq!(page.by_id("dup"), Some(late));

    // Renaming moves the entry and exposes the next holder.
    page.dom_mut().set_attr(late, "id", "renamed")?;
    assert_eq!(page.by_id("renamed"), Some(late));
    assert_eq!(page.by_id("dup"), Some(later));

    page.dom_mut().remove_node(later)?;
    assert_eq!(page.by_id("dup"), None);
    Ok(())
}
