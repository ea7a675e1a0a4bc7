// src/label/parse.rs
//! SPL markup to [`LabeledTree`].
//!
//! Elements are matched by local name so the HL7 v3 default namespace does not
//! matter. `section`, `list`, `item` and `paragraph` become tree nodes; every
//! other element is transparent and its recognised descendants are hoisted
//! into the enclosing node.

use roxmltree::{Document, Node as XmlNode, ParsingOptions};

use crate::label::tree::{Item, LabeledTree, List, Node, Section, SectionCode};
use crate::utils::error::LabelError;
use crate::utils::text::normalize_whitespace;

const STRUCTURAL: &[&str] = &["section", "list", "paragraph"];

/// Parses an SPL XML document into a [`LabeledTree`].
pub fn parse_label(xml: &str) -> Result<LabeledTree, LabelError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    if root.tag_name().name() != "document" {
        return Err(LabelError::NotALabel(root.tag_name().name().to_string()));
    }

    let body = root
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "structuredBody")
        .unwrap_or(root);

    let tree = LabeledTree {
        set_id: child_element(root, "setId").and_then(|n| n.attribute("root")).map(str::to_string),
        title: child_element(root, "title").map(text_of).map(|t| normalize_whitespace(&t)).filter(|t| !t.is_empty()),
        effective_time: child_element(root, "effectiveTime").and_then(|n| n.attribute("value")).map(str::to_string),
        version: child_element(root, "versionNumber").and_then(|n| n.attribute("value")).map(str::to_string),
        children: convert_children(body),
    };

    tracing::debug!(
        "Parsed label {:?}: {} top-level nodes, {} sections",
        tree.set_id,
        tree.children.len(),
        tree.sections().len()
    );
    Ok(tree)
}

fn child_element<'a, 'i>(node: XmlNode<'a, 'i>, name: &str) -> Option<XmlNode<'a, 'i>> {
    node.children().find(|c| c.is_element() && c.tag_name().name() == name)
}

/// Concatenated text of all descendant text nodes.
fn text_of(node: XmlNode) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn has_structural_descendant(node: XmlNode) -> bool {
    node.descendants()
        .skip(1)
        .any(|n| n.is_element() && STRUCTURAL.contains(&n.tag_name().name()))
}

fn convert_children(parent: XmlNode) -> Vec<Node> {
    let mut out = Vec::new();
    for child in parent.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "section" => out.push(Node::Section(convert_section(child))),
            "list" => out.push(Node::List(convert_list(child))),
            "paragraph" => out.push(Node::Paragraph(text_of(child))),
            // Consumed by the enclosing section.
            "title" | "code" => {}
            _ => out.extend(convert_children(child)),
        }
    }
    out
}

fn convert_section(node: XmlNode) -> Section {
    let title = child_element(node, "title")
        .map(text_of)
        .map(|t| normalize_whitespace(&t))
        .filter(|t| !t.is_empty());

    let code = child_element(node, "code").map(|c| SectionCode {
        code: c.attribute("code").unwrap_or_default().to_string(),
        display_name: c.attribute("displayName").map(normalize_whitespace),
    });

    Section { title, code, children: convert_children(node) }
}

fn convert_list(node: XmlNode) -> List {
    let items = node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "item")
        .map(convert_item)
        .collect();
    List { items }
}

/// Loose text and inline markup directly inside an item become one implicit
/// paragraph, flushed whenever a structural child interrupts it.
fn convert_item(node: XmlNode) -> Item {
    let mut children = Vec::new();
    let mut loose = String::new();

    let flush = |loose: &mut String, children: &mut Vec<Node>| {
        if !loose.trim().is_empty() {
            children.push(Node::Paragraph(std::mem::take(loose)));
        } else {
            loose.clear();
        }
    };

    for child in node.children() {
        if child.is_text() {
            loose.push_str(child.text().unwrap_or_default());
            continue;
        }
        if !child.is_element() {
            continue;
        }
        match child.tag_name().name() {
            "paragraph" => {
                flush(&mut loose, &mut children);
                children.push(Node::Paragraph(text_of(child)));
            }
            "list" => {
                flush(&mut loose, &mut children);
                children.push(Node::List(convert_list(child)));
            }
            "section" => {
                flush(&mut loose, &mut children);
                children.push(Node::Section(convert_section(child)));
            }
            _ if has_structural_descendant(child) => {
                flush(&mut loose, &mut children);
                children.extend(convert_children(child));
            }
            _ => loose.push_str(&text_of(child)),
        }
    }
    flush(&mut loose, &mut children);

    Item { children }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SPL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<document xmlns="urn:hl7-org:v3">
  <setId root="b4bd2c2b-1b8b-4c53-a6bd-3e7e4dbd1b27"/>
  <versionNumber value="7"/>
  <effectiveTime value="20230115"/>
  <title>ASPIRIN <content>tablet</content></title>
  <component>
    <structuredBody>
      <component>
        <section>
          <code code="55106-9" displayName="ACTIVE INGREDIENT"/>
          <title>Active ingredient (in each tablet)</title>
          <text>
            <list>
              <item><paragraph>Aspirin </paragraph><paragraph> 325 mg</paragraph></item>
            </list>
          </text>
        </section>
      </component>
      <component>
        <section>
          <title>Inactive
              ingredients</title>
          <text>
            <paragraph>corn starch, <content styleCode="bold">hypromellose</content>, powdered cellulose</paragraph>
          </text>
        </section>
      </component>
    </structuredBody>
  </component>
</document>"#;

    #[test]
    fn test_parse_header_metadata() {
        let tree = parse_label(SAMPLE_SPL).expect("parse failed");
        assert_eq!(tree.set_id.as_deref(), Some("b4bd2c2b-1b8b-4c53-a6bd-3e7e4dbd1b27"));
        assert_eq!(tree.version.as_deref(), Some("7"));
        assert_eq!(tree.effective_time.as_deref(), Some("20230115"));
        assert_eq!(tree.title.as_deref(), Some("ASPIRIN tablet"));
    }

    #[test]
    fn test_parse_sections_lists_and_paragraphs() {
        let tree = parse_label(SAMPLE_SPL).expect("parse failed");
        let sections = tree.sections();
        assert_eq!(sections.len(), 2);

        assert_eq!(sections[0].effective_label(), "ACTIVE INGREDIENT");
        match &sections[0].children[0] {
            Node::List(list) => {
                assert_eq!(list.items.len(), 1);
                let paragraphs: Vec<_> = list.items[0].paragraphs().collect();
                assert_eq!(paragraphs, vec!["Aspirin ", " 325 mg"]);
            }
            other => panic!("expected list, got {:?}", other),
        }

        assert_eq!(sections[1].effective_label(), "Inactive ingredients");
        assert_eq!(
            sections[1].children,
            vec![Node::Paragraph("corn starch, hypromellose, powdered cellulose".to_string())]
        );
    }

    #[test]
    fn test_item_loose_text_becomes_paragraph() {
        let xml = r#"<document><section><title>INACTIVE INGREDIENTS</title>
            <text><list>
              <item><content>Lactose</content> monohydrate</item>
              <item>Talc<list><item>nested</item></list></item>
            </list></text></section></document>"#;
        let tree = parse_label(xml).expect("parse failed");
        let section = tree.sections()[0];
        let Node::List(list) = &section.children[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items[0].children, vec![Node::Paragraph("Lactose monohydrate".to_string())]);
        assert_eq!(list.items[1].children[0], Node::Paragraph("Talc".to_string()));
        assert!(matches!(list.items[1].children[1], Node::List(_)));
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        let err = parse_label("<document><section></document>").unwrap_err();
        assert!(matches!(err, LabelError::Xml(_)));
    }

    #[test]
    fn test_non_label_root_is_rejected() {
        let err = parse_label("<html><body/></html>").unwrap_err();
        assert!(matches!(err, LabelError::NotALabel(name) if name == "html"));
    }
}
