// src/label/tree.rs
use serde::Serialize;

/// An enumerated section code with its human-readable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionCode {
    pub code: String,
    pub display_name: Option<String>,
}

/// A titled subtree of a label document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub title: Option<String>,
    pub code: Option<SectionCode>,
    pub children: Vec<Node>,
}

impl Section {
    /// The code's display name if present, else the title, else empty.
    pub fn effective_label(&self) -> &str {
        let display = self
            .code
            .as_ref()
            .and_then(|c| c.display_name.as_deref())
            .filter(|name| !name.trim().is_empty());

        display.or(self.title.as_deref()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct List {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    pub children: Vec<Node>,
}

impl Item {
    /// Text of the item's direct paragraph children, in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|node| match node {
            Node::Paragraph(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Section(Section),
    List(List),
    Paragraph(String),
}

/// A label document as nested sections, lists and paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledTree {
    pub set_id: Option<String>,
    pub title: Option<String>,
    pub effective_time: Option<String>,
    pub version: Option<String>,
    pub children: Vec<Node>,
}

impl LabeledTree {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children, ..Default::default() }
    }

    /// Every section in document order, nested sections included.
    pub fn sections(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        collect_sections(&self.children, &mut out);
        out
    }
}

fn collect_sections<'a>(nodes: &'a [Node], out: &mut Vec<&'a Section>) {
    for node in nodes {
        match node {
            Node::Section(section) => {
                out.push(section);
                collect_sections(&section.children, out);
            }
            Node::List(list) => {
                for item in &list.items {
                    collect_sections(&item.children, out);
                }
            }
            Node::Paragraph(_) => {}
        }
    }
}

/// Every list item below `nodes`, depth first, in document order.
pub fn items_in(nodes: &[Node]) -> Vec<&Item> {
    let mut out = Vec::new();
    collect_items(nodes, &mut out);
    out
}

fn collect_items<'a>(nodes: &'a [Node], out: &mut Vec<&'a Item>) {
    for node in nodes {
        match node {
            Node::Section(section) => collect_items(&section.children, out),
            Node::List(list) => {
                for item in &list.items {
                    out.push(item);
                    collect_items(&item.children, out);
                }
            }
            Node::Paragraph(_) => {}
        }
    }
}

/// Every paragraph text below `nodes`, in document order.
pub fn paragraphs_in(nodes: &[Node]) -> Vec<&str> {
    let mut out = Vec::new();
    collect_paragraphs(nodes, &mut out);
    out
}

fn collect_paragraphs<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Section(section) => collect_paragraphs(&section.children, out),
            Node::List(list) => {
                for item in &list.items {
                    collect_paragraphs(&item.children, out);
                }
            }
            Node::Paragraph(text) => out.push(text),
        }
    }
}
