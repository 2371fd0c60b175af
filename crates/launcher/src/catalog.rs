//! Flattened, row-addressable view over every loaded item group.
//!
//! Groups live in an arena and refer to their parent by [`GroupId`]; rows
//! are `(group, item)` index pairs. A catalog belongs to exactly one
//! [`Epoch`] and is replaced wholesale on reset.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::model::{Epoch, Item, Source, Style};

/// Index of a group in the catalog arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One row of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogRow {
    pub group: GroupId,
    pub item: usize,
}

#[derive(Debug, Clone)]
pub struct CatalogGroup {
    pub parent: Option<GroupId>,
    pub tags: Vec<String>,
    pub style: Style,
    pub items: Vec<Item>,
    pub source: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ItemCatalog {
    epoch: Epoch,
    groups: Vec<CatalogGroup>,
    rows: Vec<CatalogRow>,
    sources: Vec<PathBuf>,
}

impl ItemCatalog {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            groups: Vec::new(),
            rows: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Appends every group of `source` and one row per item.
    ///
    /// Parent indices are rebased onto the arena. A parent that does not
    /// precede its child is dropped so the groups always form a forest.
    /// Returns the number of rows added.
    pub fn merge(&mut self, source: Source) -> usize {
        let offset = self.groups.len();
        let rows_before = self.rows.len();

        for (local, group) in source.groups.into_iter().enumerate() {
            let id = GroupId(offset + local);
            let parent = group
                .parent
                .filter(|parent| *parent < local)
                .map(|parent| GroupId(offset + parent));

            self.rows
                .extend((0..group.items.len()).map(|item| CatalogRow { group: id, item }));
            self.groups.push(CatalogGroup {
                parent,
                tags: group.tags,
                style: group.style,
                items: group.items,
                source: source.file.clone(),
            });
        }
        self.sources.push(source.file);

        self.rows.len() - rows_before
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Files merged into this catalog, in merge order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> CoreResult<CatalogRow> {
        self.rows
            .get(index)
            .copied()
            .ok_or(CoreError::RowOutOfRange {
                index,
                count: self.rows.len(),
            })
    }

    pub fn group(&self, id: GroupId) -> Option<&CatalogGroup> {
        self.groups.get(id.0)
    }

    pub fn item(&self, index: usize) -> CoreResult<&Item> {
        let row = self.row(index)?;
        self.groups
            .get(row.group.0)
            .and_then(|group| group.items.get(row.item))
            .ok_or_else(|| CoreError::Internal(format!("row {index} points outside the arena")))
    }

    pub fn name(&self, index: usize) -> CoreResult<&str> {
        Ok(self.item(index)?.name.as_str())
    }

    /// The raw, unresolved link template of a row.
    pub fn link(&self, index: usize) -> CoreResult<&str> {
        Ok(self.item(index)?.link.as_str())
    }

    /// Path of the source file the row was loaded from.
    pub fn source_of(&self, index: usize) -> CoreResult<&Path> {
        let row = self.row(index)?;
        self.groups
            .get(row.group.0)
            .map(|group| group.source.as_path())
            .ok_or_else(|| CoreError::Internal(format!("row {index} points outside the arena")))
    }

    /// Item tags first, then each enclosing group's tags walking outward.
    /// Later duplicates are dropped.
    pub fn effective_tags(&self, index: usize) -> CoreResult<Vec<String>> {
        let row = self.row(index)?;
        let mut tags: Vec<String> = Vec::new();
        let mut push = |tag: &String| {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        };

        self.item(index)?.tags.iter().for_each(&mut push);
        for group in self.ancestors(row.group) {
            group.tags.iter().for_each(&mut push);
        }
        Ok(tags)
    }

    /// The item's own style, else the nearest styled enclosing group.
    pub fn effective_style(&self, index: usize) -> CoreResult<Style> {
        let row = self.row(index)?;
        let item = self.item(index)?;
        if !item.style.is_none() {
            return Ok(item.style);
        }
        Ok(self
            .ancestors(row.group)
            .map(|group| group.style)
            .find(|style| !style.is_none())
            .unwrap_or_default())
    }

    /// The group itself followed by its parents up to the root.
    fn ancestors(&self, start: GroupId) -> impl Iterator<Item = &CatalogGroup> + '_ {
        let mut next = Some(start);
        std::iter::from_fn(move || {
            let group = self.groups.get(next?.0)?;
            next = group.parent;
            Some(group)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemGroup, Rgb};

    fn item(name: &str, tags: &[&str]) -> Item {
        Item {
            name: name.to_string(),
            link: format!("https://{name}.example"),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            ..Item::default()
        }
    }

    fn color(red: u8) -> Style {
        Style::Color(Rgb {
            red,
            green: 0,
            blue: 0,
        })
    }

    fn source(file: &str) -> Source {
        Source {
            file: PathBuf::from(file),
            groups: vec![
                ItemGroup {
                    parent: None,
                    tags: Vec::new(),
                    style: Style::None,
                    items: vec![item("top", &["t"])],
                },
                ItemGroup {
                    parent: Some(0),
                    tags: vec!["outer".to_string(), "shared".to_string()],
                    style: color(1),
                    items: vec![item("a", &["shared"])],
                },
                ItemGroup {
                    parent: Some(1),
                    tags: vec!["inner".to_string(), "outer".to_string()],
                    style: Style::None,
                    items: vec![item("b", &[]), item("c", &[])],
                },
            ],
            imports: Vec::new(),
        }
    }

    #[test]
    fn merge_appends_rows_for_every_item() {
        let mut catalog = ItemCatalog::new(Epoch::new());
        assert!(catalog.is_empty());

        assert_eq!(catalog.merge(source("/one.xml")), 4);
        assert_eq!(catalog.merge(source("/two.xml")), 4);
        assert_eq!(catalog.row_count(), 8);
        assert_eq!(catalog.group_count(), 6);

        let names = (0..catalog.row_count())
            .map(|index| catalog.name(index).expect("name").to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["top", "a", "b", "c", "top", "a", "b", "c"]);

        let second = catalog.row(5).expect("row");
        assert_eq!(second.group.index(), 4);
        assert_eq!(
            catalog.group(second.group).and_then(|group| group.parent),
            Some(GroupId(3))
        );
        assert_eq!(catalog.source_of(5).expect("source"), Path::new("/two.xml"));
        assert_eq!(
            catalog.sources(),
            &[PathBuf::from("/one.xml"), PathBuf::from("/two.xml")]
        );
    }

    #[test]
    fn effective_tags_walk_outward_without_duplicates() {
        let mut catalog = ItemCatalog::new(Epoch::new());
        catalog.merge(source("/one.xml"));

        assert_eq!(catalog.effective_tags(0).expect("tags"), vec!["t"]);
        assert_eq!(
            catalog.effective_tags(1).expect("tags"),
            vec!["shared", "outer"]
        );
        assert_eq!(
            catalog.effective_tags(2).expect("tags"),
            vec!["inner", "outer", "shared"]
        );
    }

    #[test]
    fn effective_style_falls_back_to_ancestors() {
        let mut catalog = ItemCatalog::new(Epoch::new());
        let mut styled = source("/one.xml");
        styled.groups[2].items[1].style = color(9);
        catalog.merge(styled);

        assert_eq!(catalog.effective_style(0).expect("style"), Style::None);
        assert_eq!(catalog.effective_style(1).expect("style"), color(1));
        assert_eq!(catalog.effective_style(2).expect("style"), color(1));
        assert_eq!(catalog.effective_style(3).expect("style"), color(9));
    }

    #[test]
    fn out_of_range_rows_are_errors() {
        let mut catalog = ItemCatalog::new(Epoch::new());
        catalog.merge(source("/one.xml"));

        assert!(matches!(
            catalog.row(4),
            Err(CoreError::RowOutOfRange { index: 4, count: 4 })
        ));
        assert!(catalog.effective_tags(99).is_err());
        assert!(catalog.link(99).is_err());
        assert_eq!(catalog.link(0).expect("link"), "https://top.example");
    }

    #[test]
    fn forward_parent_references_are_dropped() {
        let mut catalog = ItemCatalog::new(Epoch::new());
        catalog.merge(Source {
            file: PathBuf::from("/odd.xml"),
            groups: vec![ItemGroup {
                parent: Some(0),
                tags: vec!["self".to_string()],
                style: Style::None,
                items: vec![item("x", &[])],
            }],
            imports: Vec::new(),
        });

        assert_eq!(catalog.row(0).expect("row").group, GroupId(0));
        assert_eq!(catalog.group(GroupId(0)).and_then(|g| g.parent), None);
        assert_eq!(catalog.effective_tags(0).expect("tags"), vec!["self"]);
    }
}
