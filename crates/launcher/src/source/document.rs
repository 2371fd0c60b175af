//! Parsed source document tree.

use std::path::Path;

use crate::model::{ImportDescriptor, Item, ItemGroup, Source, Style};

use super::path::resolve_import_path;

/// The root of a parsed source file, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocument {
    pub nodes: Vec<SourceNode>,
}

/// One node of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceNode {
    Link(Item),
    LinkGroup(GroupNode),
    /// One `<import>` element; its paths are kept exactly as written.
    ImportGroup(Vec<ImportDescriptor>),
}

/// A `<group>` element. Children are links and nested groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupNode {
    pub tags: Vec<String>,
    pub style: Style,
    pub children: Vec<SourceNode>,
}

impl SourceDocument {
    /// Flattens the tree into the group list consumed by the catalog.
    ///
    /// Group 0 is the implicit global group for top-level links; every
    /// `<group>` appends one more group in document order, pointing at its
    /// enclosing group. Import paths are resolved against `file`.
    pub fn into_source(self, file: &Path) -> Source {
        let mut groups = vec![ItemGroup::default()];
        let mut imports = Vec::new();
        flatten_nodes(self.nodes, 0, file, &mut groups, &mut imports);

        Source {
            file: file.to_path_buf(),
            groups,
            imports,
        }
    }

    /// Number of links anywhere in the document.
    pub fn link_count(&self) -> usize {
        count_links(&self.nodes)
    }
}

fn flatten_nodes(
    nodes: Vec<SourceNode>,
    group_index: usize,
    file: &Path,
    groups: &mut Vec<ItemGroup>,
    imports: &mut Vec<ImportDescriptor>,
) {
    for node in nodes {
        match node {
            SourceNode::Link(item) => groups[group_index].items.push(item),
            SourceNode::LinkGroup(group) => {
                let index = groups.len();
                groups.push(ItemGroup {
                    parent: Some(group_index),
                    tags: group.tags,
                    style: group.style,
                    items: Vec::new(),
                });
                flatten_nodes(group.children, index, file, groups, imports);
            }
            SourceNode::ImportGroup(descriptors) => {
                imports.extend(descriptors.into_iter().map(|descriptor| ImportDescriptor {
                    path: resolve_import_path(file, &descriptor.path),
                    mime_type: descriptor.mime_type,
                }));
            }
        }
    }
}

fn count_links(nodes: &[SourceNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            SourceNode::Link(_) => 1,
            SourceNode::LinkGroup(group) => count_links(&group.children),
            SourceNode::ImportGroup(_) => 0,
        })
        .sum()
}
