//! Data table component.
//!
//! List pages fetch every record from the backend and hand them to
//! [`TableState::build`], which applies the search box, the active sort,
//! an optional select filter and pagination from the query string. Templates
//! render `state.rows` themselves and use the header, pagination and link
//! helpers for the chrome.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Rows per page when the query does not say.
pub const DEFAULT_PER_PAGE: usize = 20;

/// Largest page size accepted from the query string.
pub const MAX_PER_PAGE: usize = 100;

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Unique key, passed to [`TableRow::cell`] and used as `?sort=`.
    pub key: &'static str,
    /// Header label.
    pub label: &'static str,
    pub sortable: bool,
}

impl TableColumn {
    /// A sortable column.
    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
        }
    }

    /// A plain column.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
        }
    }
}

/// A select box filtering one column by exact value.
#[derive(Debug, Clone)]
pub struct TableFilter {
    pub key: &'static str,
    pub label: &'static str,
    /// `(value, label)` pairs; value is compared to [`TableRow::cell`].
    pub options: Vec<(String, String)>,
}

/// Configuration for a data table.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    /// Path the table lives at; links are built against it.
    pub base_path: String,
    pub columns: Vec<TableColumn>,
    pub filter: Option<TableFilter>,
    pub search_placeholder: String,
    pub empty_title: String,
    /// Sort applied when the query names none.
    pub default_sort: Option<(&'static str, SortDir)>,
}

impl DataTableConfig {
    #[must_use]
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
            columns: Vec::new(),
            filter: None,
            search_placeholder: "Buscar...".to_string(),
            empty_title: "No hay registros".to_string(),
            default_sort: None,
        }
    }

    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    #[must_use]
    pub fn empty_state(mut self, title: &str) -> Self {
        self.empty_title = title.to_string();
        self
    }

    #[must_use]
    pub const fn default_sort(mut self, key: &'static str, dir: SortDir) -> Self {
        self.default_sort = Some((key, dir));
        self
    }

    fn sortable_column(&self, key: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.key == key && c.sortable)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Value a column sorts by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortValue {
    Number(Decimal),
    Text(String),
    /// Missing values sort after everything else in ascending order.
    Empty,
}

impl SortValue {
    /// Text compared case-insensitively.
    #[must_use]
    pub fn text(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value.trim().to_lowercase())
        }
    }

    #[must_use]
    pub fn number(value: impl Into<Decimal>) -> Self {
        Self::Number(value.into())
    }

    /// Numbers sort numerically, so `"9"` comes before `"10"`.
    #[must_use]
    pub fn from_display(value: &str) -> Self {
        value
            .trim()
            .parse::<Decimal>()
            .map_or_else(|_| Self::text(value), Self::Number)
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) | (Self::Text(_) | Self::Number(_), Self::Empty) => {
                Ordering::Less
            }
            (Self::Text(_), Self::Number(_)) | (Self::Empty, Self::Text(_) | Self::Number(_)) => {
                Ordering::Greater
            }
            (Self::Empty, Self::Empty) => Ordering::Equal,
        }
    }
}

/// A record shown in a data table.
pub trait TableRow {
    /// Value of a column. Filters compare it exactly, so status-like columns
    /// return their wire value here.
    fn cell(&self, key: &str) -> String;

    /// Text shown in the column, which is what the search box matches.
    /// Defaults to [`TableRow::cell`]; override where the page renders a
    /// label instead of the raw value.
    fn search_text(&self, key: &str) -> String {
        self.cell(key)
    }

    /// Value used when sorting by a column. Defaults to the displayed text,
    /// read as a number when it parses as one.
    fn sort_value(&self, key: &str) -> SortValue {
        SortValue::from_display(&self.cell(key))
    }
}

/// Table parameters from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<SortDir>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
    /// Value for the configured [`TableFilter`].
    #[serde(default)]
    pub filter: Option<String>,
}

/// Column header ready for rendering.
#[derive(Debug, Clone)]
pub struct HeaderView {
    pub label: &'static str,
    /// Link toggling the sort; `None` for unsortable columns.
    pub link: Option<String>,
    /// `"asc"`/`"desc"` on the active column.
    pub active: Option<&'static str>,
}

/// Filter option ready for rendering.
#[derive(Debug, Clone)]
pub struct FilterChoice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One page of rows plus everything the template needs around it.
#[derive(Debug, Clone)]
pub struct TableState<T> {
    /// Rows on the current page.
    pub rows: Vec<T>,
    /// Rows matching search and filter, across all pages.
    pub total: usize,
    /// 1-based current page.
    pub page: usize,
    pub pages: usize,
    pub per_page: usize,
    pub search: String,
    pub filter_value: String,
    pub sort: Option<(&'static str, SortDir)>,
    pub config: DataTableConfig,
}

impl<T: TableRow> TableState<T> {
    /// Search, filter, sort and paginate `rows`.
    #[must_use]
    pub fn build(rows: Vec<T>, config: &DataTableConfig, query: &TableQuery) -> Self {
        let search = query.q.as_deref().unwrap_or_default().trim().to_string();
        let needle = search.to_lowercase();
        let filter_value = query
            .filter
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let mut rows: Vec<T> = rows
            .into_iter()
            .filter(|row| {
                needle.is_empty()
                    || config
                        .columns
                        .iter()
                        .any(|c| row.search_text(c.key).to_lowercase().contains(&needle))
            })
            .filter(|row| match &config.filter {
                Some(filter) if !filter_value.is_empty() => row.cell(filter.key) == filter_value,
                _ => true,
            })
            .collect();

        let sort = query
            .sort
            .as_deref()
            .and_then(|key| config.sortable_column(key))
            .map(|c| (c.key, query.dir.unwrap_or_default()))
            .or(config.default_sort);

        if let Some((key, dir)) = sort {
            // `sort_by` is stable, so ties keep the backend's order.
            rows.sort_by(|a, b| {
                let ordering = a.sort_value(key).compare(&b.sort_value(key));
                match dir {
                    SortDir::Asc => ordering,
                    SortDir::Desc => ordering.reverse(),
                }
            });
        }

        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let total = rows.len();
        let pages = total.div_ceil(per_page).max(1);
        let page = query.page.unwrap_or(1).clamp(1, pages);

        let rows = rows
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Self {
            rows,
            total,
            page,
            pages,
            per_page,
            search,
            filter_value,
            sort,
            config: config.clone(),
        }
    }
}

impl<T> TableState<T> {
    /// Build a link to this table keeping search, filter and page size.
    fn link(&self, sort: Option<(&str, SortDir)>, page: usize) -> String {
        let mut params = url::form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            params.append_pair("q", &self.search);
        }
        if !self.filter_value.is_empty() {
            params.append_pair("filter", &self.filter_value);
        }
        if let Some((key, dir)) = sort {
            params.append_pair("sort", key);
            params.append_pair("dir", dir.as_str());
        }
        if page > 1 {
            params.append_pair("page", &page.to_string());
        }
        if self.per_page != DEFAULT_PER_PAGE {
            params.append_pair("per_page", &self.per_page.to_string());
        }
        let query = params.finish();
        if query.is_empty() {
            self.config.base_path.clone()
        } else {
            format!("{}?{query}", self.config.base_path)
        }
    }

    /// Link that sorts by `column`: ascending, or reversed if it is already
    /// the active sort. Goes back to the first page.
    #[must_use]
    pub fn sort_link(&self, column: &str) -> String {
        let dir = match self.sort {
            Some((key, dir)) if key == column => dir.reversed(),
            _ => SortDir::Asc,
        };
        self.link(Some((column, dir)), 1)
    }

    /// Link to another page with the current sort.
    #[must_use]
    pub fn page_link(&self, page: usize) -> String {
        self.link(self.sort, page.clamp(1, self.pages))
    }

    #[must_use]
    pub fn headers(&self) -> Vec<HeaderView> {
        self.config
            .columns
            .iter()
            .map(|c| HeaderView {
                label: c.label,
                link: c.sortable.then(|| self.sort_link(c.key)),
                active: self
                    .sort
                    .filter(|(key, _)| *key == c.key)
                    .map(|(_, dir)| dir.as_str()),
            })
            .collect()
    }

    #[must_use]
    pub fn filter_choices(&self) -> Vec<FilterChoice> {
        self.config
            .filter
            .iter()
            .flat_map(|f| f.options.iter())
            .map(|(value, label)| FilterChoice {
                value: value.clone(),
                label: label.clone(),
                selected: *value == self.filter_value,
            })
            .collect()
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }

    #[must_use]
    pub fn prev_link(&self) -> String {
        self.page_link(self.page.saturating_sub(1))
    }

    #[must_use]
    pub fn next_link(&self) -> String {
        self.page_link(self.page + 1)
    }

    /// "Mostrando 21–40 de 95".
    #[must_use]
    pub fn summary(&self) -> String {
        if self.total == 0 {
            return "Sin resultados".to_string();
        }
        let first = (self.page - 1) * self.per_page + 1;
        let last = (first + self.rows.len()).saturating_sub(1);
        format!("Mostrando {first}-{last} de {}", self.total)
    }
}
