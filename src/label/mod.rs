// src/label/mod.rs
pub mod parse;
pub mod tree;

pub use parse::parse_label;
pub use tree::{Item, LabeledTree, List, Node, Section, SectionCode};
