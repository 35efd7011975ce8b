use std::cmp::Ordering;
use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;

/// Sort key used for records that have no value for the sorted field.
pub const MISSING_SORT_KEY: f64 = -1.0;

/// Order applied when sorting switches to a new field.
pub const DEFAULT_SORT_ORDER: SortOrder = SortOrder::Ascending;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Status,
    Client,
    Health,
    Source,
    Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Client,
    Status,
    Created,
    Health,
    Score,
    Sent,
    OpenRate,
    ReplyRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
}

impl SortKey<'_> {
    pub fn missing() -> Self {
        SortKey::Number(MISSING_SORT_KEY)
    }

    pub fn from_option(value: Option<f64>) -> Self {
        SortKey::Number(value.unwrap_or(MISSING_SORT_KEY))
    }

    /// Numbers sort before text, so coerced missing keys stay lowest.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

/// Case folding shared by filters, search and text sorting.
fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

fn compare_text(a: &str, b: &str) -> Ordering {
    fold_case(a)
        .cmp(&fold_case(b))
        .then_with(|| a.cmp(b))
}

/// A row that can be shown in a filtered, sortable table.
pub trait TableRecord {
    /// Fields this table can be sorted by.
    const SORT_FIELDS: &'static [SortField];

    /// Fields the free-text search looks at.
    fn search_fields(&self) -> Vec<&str>;

    /// Value compared against an active filter. `None` never matches.
    fn filter_value(&self, field: FilterField) -> Option<&str>;

    fn sort_key(&self, field: SortField) -> SortKey<'_>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub search: String,
    pub filters: BTreeMap<FilterField, String>,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_field: None,
            sort_order: DEFAULT_SORT_ORDER,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self.page = 1;
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self.page = 1;
        self
    }

    /// Sets a filter. An empty value or `all` clears it instead.
    pub fn with_filter(mut self, field: FilterField, value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            self.filters.remove(&field);
        } else {
            self.filters.insert(field, trimmed.to_string());
        }
        self.page = 1;
        self
    }

    pub fn clear_filter(mut self, field: FilterField) -> Self {
        self.filters.remove(&field);
        self.page = 1;
        self
    }

    /// Clicking the active column flips its order; a new column starts at the default order.
    pub fn toggle_sort(mut self, field: SortField) -> Self {
        if self.sort_field == Some(field) {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_field = Some(field);
            self.sort_order = DEFAULT_SORT_ORDER;
        }
        self
    }

    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = Some(field);
        self.sort_order = order;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn matches<T: TableRecord>(&self, record: &T) -> bool {
        let filters_match = self.filters.iter().all(|(field, wanted)| {
            record
                .filter_value(*field)
                .is_some_and(|value| fold_case(value) == fold_case(wanted))
        });
        if !filters_match {
            return false;
        }

        let query = fold_case(self.search.trim());
        query.is_empty()
            || record
                .search_fields()
                .iter()
                .any(|field| fold_case(field).contains(&query))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<'a, T> {
    pub rows: Vec<&'a T>,
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

pub fn filter_records<'a, T: TableRecord>(records: &'a [T], state: &ViewState) -> Vec<&'a T> {
    records.iter().filter(|record| state.matches(*record)).collect()
}

pub fn sort_records<T: TableRecord>(rows: &mut [&T], state: &ViewState) {
    let Some(field) = state.sort_field else {
        return;
    };

    rows.sort_by(|a, b| {
        let ordering = a.sort_key(field).compare(&b.sort_key(field));
        match state.sort_order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

pub fn validate_sort<T: TableRecord>(field: SortField) -> anyhow::Result<()> {
    if T::SORT_FIELDS.contains(&field) {
        Ok(())
    } else {
        anyhow::bail!("this table cannot be sorted by {field:?}")
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

pub fn apply_view_state<'a, T: TableRecord>(records: &'a [T], state: &ViewState) -> Page<'a, T> {
    let mut rows = filter_records(records, state);
    sort_records(&mut rows, state);

    let page_size = state.page_size.max(1);
    let page = state.page.max(1);
    let total_count = rows.len();
    let start = (page - 1).saturating_mul(page_size).min(total_count);
    let end = page.saturating_mul(page_size).min(total_count);

    Page {
        rows: rows[start..end].to_vec(),
        page,
        page_size,
        total_count,
        total_pages: total_pages(total_count, page_size),
    }
}
