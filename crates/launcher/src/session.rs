//! Query state bound to the catalog: filtering, link resolution and opening.

use std::sync::Arc;

use moka::sync::Cache;
use search::{
    CompiledExpression, LinkArity, LinkTemplate, SearchExpressionCompiler, SearchExpressionMatcher,
};

use crate::catalog::ItemCatalog;
use crate::error::{CoreError, CoreResult};

/// Hands a resolved link to whatever actually launches it.
pub trait LinkOpener: Send + Sync {
    fn open(&self, link: &str) -> CoreResult<()>;
}

/// Compiled expressions keyed by the raw query string.
#[derive(Debug, Clone)]
pub struct ExpressionCache {
    cache: Cache<String, Arc<CompiledExpression>>,
}

impl ExpressionCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries.max(1)).build();
        Self { cache }
    }

    pub fn get_or_compile(&self, raw_query: &str) -> Arc<CompiledExpression> {
        self.cache.get_with(raw_query.to_string(), || {
            Arc::new(SearchExpressionCompiler::compile(raw_query))
        })
    }
}

pub struct QuerySession {
    cache: ExpressionCache,
    query: String,
    matcher: SearchExpressionMatcher,
    last_error: Option<CoreError>,
}

impl QuerySession {
    pub fn new(cache: ExpressionCache) -> Self {
        Self {
            matcher: SearchExpressionMatcher::from_expression(cache.get_or_compile("")),
            cache,
            query: String::new(),
            last_error: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Recompiles (or reuses) the expression for `raw_query`. A new query
    /// clears the previous error.
    pub fn set_query(&mut self, raw_query: &str) {
        if raw_query == self.query {
            return;
        }
        self.query = raw_query.to_string();
        self.matcher =
            SearchExpressionMatcher::from_expression(self.cache.get_or_compile(raw_query));
        self.last_error = None;
    }

    pub fn matcher(&self) -> &SearchExpressionMatcher {
        &self.matcher
    }

    pub fn parameters(&self) -> &[String] {
        self.matcher.parameters()
    }

    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    /// Indices of matching rows, sorted by name without regard to case.
    /// Rows with equal names keep catalog order.
    pub fn filter(&self, catalog: &ItemCatalog) -> Vec<usize> {
        let mut matches = (0..catalog.row_count())
            .filter_map(|index| {
                let item = catalog.item(index).ok()?;
                let tags = catalog.effective_tags(index).ok()?;
                self.matcher
                    .matches(&item.name, &tags)
                    .then(|| (item.name.to_lowercase(), index))
            })
            .collect::<Vec<_>>();
        matches.sort_by(|left, right| left.0.cmp(&right.0));
        matches.into_iter().map(|(_, index)| index).collect()
    }

    pub fn arity(&self, catalog: &ItemCatalog, row: usize) -> CoreResult<LinkArity> {
        let template = LinkTemplate::new(catalog.link(row)?);
        Ok(template.arity(self.parameters().len()))
    }

    /// The row's link with the query parameters substituted.
    pub fn resolve(&self, catalog: &ItemCatalog, row: usize) -> CoreResult<String> {
        let template = LinkTemplate::new(catalog.link(row)?);
        Ok(template.resolve_checked(self.parameters())?)
    }

    /// Resolves the row's link and hands it to `opener`.
    pub fn open(
        &mut self,
        catalog: &ItemCatalog,
        row: usize,
        opener: &dyn LinkOpener,
    ) -> CoreResult<String> {
        let result = self
            .resolve(catalog, row)
            .and_then(|link| opener.open(&link).map(|()| link));

        match &result {
            Ok(link) => {
                tracing::info!(row, link = %link, "opened link");
                self.last_error = None;
            }
            Err(error) => {
                tracing::warn!(row, "cannot open link: {error}");
                self.last_error = Some(error.clone());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use search::LinkError;

    use super::*;
    use crate::model::{Epoch, Item, ItemGroup, Source, Style};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, link: &str) -> CoreResult<()> {
            if self.fail {
                return Err(CoreError::LinkOpen {
                    link: link.to_string(),
                    message: "refused".to_string(),
                });
            }
            self.opened
                .lock()
                .map_err(|_| CoreError::Internal("poisoned".to_string()))?
                .push(link.to_string());
            Ok(())
        }
    }

    fn item(name: &str, link: &str, tags: &[&str]) -> Item {
        Item {
            name: name.to_string(),
            link: link.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            ..Item::default()
        }
    }

    fn catalog() -> ItemCatalog {
        let mut catalog = ItemCatalog::new(Epoch::new());
        catalog.merge(Source {
            file: PathBuf::from("/links.xml"),
            groups: vec![
                ItemGroup {
                    parent: None,
                    tags: Vec::new(),
                    style: Style::None,
                    items: vec![
                        item("beta", "https://beta.example", &[]),
                        item("GitHub", "https://github.com/{0}", &["code"]),
                    ],
                },
                ItemGroup {
                    parent: Some(0),
                    tags: vec!["work".to_string()],
                    style: Style::None,
                    items: vec![
                        item("Alpha", "https://alpha.example/{*}", &[]),
                        item("alphabet", "https://alphabet.example", &[]),
                    ],
                },
            ],
            imports: Vec::new(),
        });
        catalog
    }

    fn names(catalog: &ItemCatalog, rows: &[usize]) -> Vec<String> {
        rows.iter()
            .map(|row| catalog.name(*row).expect("name").to_string())
            .collect()
    }

    #[test]
    fn empty_query_lists_everything_sorted_by_name() {
        let catalog = catalog();
        let session = QuerySession::new(ExpressionCache::new(16));
        assert_eq!(
            names(&catalog, &session.filter(&catalog)),
            vec!["Alpha", "alphabet", "beta", "GitHub"]
        );
    }

    #[test]
    fn filter_uses_inherited_tags() {
        let catalog = catalog();
        let mut session = QuerySession::new(ExpressionCache::new(16));

        session.set_query("@work");
        assert_eq!(
            names(&catalog, &session.filter(&catalog)),
            vec!["Alpha", "alphabet"]
        );

        session.set_query("al and not @work");
        assert!(session.filter(&catalog).is_empty());

        session.set_query("be or @code");
        assert_eq!(
            names(&catalog, &session.filter(&catalog)),
            vec!["beta", "GitHub"]
        );
    }

    #[test]
    fn resolves_links_with_query_parameters() {
        let catalog = catalog();
        let mut session = QuerySession::new(ExpressionCache::new(16));
        session.set_query("git rust-lang");

        let rows = session.filter(&catalog);
        assert_eq!(names(&catalog, &rows), vec!["GitHub"]);
        assert_eq!(session.parameters(), ["rust-lang".to_string()]);
        assert_eq!(session.arity(&catalog, rows[0]).expect("arity"), LinkArity::Sufficient);
        assert_eq!(
            session.resolve(&catalog, rows[0]).expect("resolve"),
            "https://github.com/rust-lang"
        );

        session.set_query("alpha a b c");
        let alpha = session.filter(&catalog)[0];
        assert_eq!(
            session.resolve(&catalog, alpha).expect("resolve"),
            "https://alpha.example/a b c"
        );
    }

    #[test]
    fn open_records_and_clears_errors() {
        let catalog = catalog();
        let mut session = QuerySession::new(ExpressionCache::new(16));
        let opener = RecordingOpener::default();

        session.set_query("git");
        let github = session.filter(&catalog)[0];
        let error = session.open(&catalog, github, &opener).unwrap_err();
        assert!(matches!(
            error,
            CoreError::Link(LinkError::Insufficient {
                required: 1,
                supplied: 0
            })
        ));
        assert!(session.last_error().is_some());

        session.set_query("git tokio-rs");
        assert!(session.last_error().is_none());
        let link = session.open(&catalog, github, &opener).expect("open");
        assert_eq!(link, "https://github.com/tokio-rs");
        assert_eq!(
            *opener.opened.lock().expect("lock"),
            vec!["https://github.com/tokio-rs".to_string()]
        );

        let failing = RecordingOpener {
            fail: true,
            ..RecordingOpener::default()
        };
        assert!(matches!(
            session.open(&catalog, github, &failing),
            Err(CoreError::LinkOpen { .. })
        ));
        assert!(matches!(session.last_error(), Some(CoreError::LinkOpen { .. })));

        session.open(&catalog, github, &opener).expect("open again");
        assert!(session.last_error().is_none());

        assert!(matches!(
            session.open(&catalog, 99, &opener),
            Err(CoreError::RowOutOfRange { .. })
        ));
    }

    #[test]
    fn expression_cache_reuses_compiled_queries() {
        let cache = ExpressionCache::new(16);
        let first = cache.get_or_compile(":git repo");
        let second = cache.get_or_compile(":git repo");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.parameters(), ["repo".to_string()]);
    }
}
