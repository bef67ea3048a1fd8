// 📄 Paginator - fixed-size pages over an already filtered result set
// Out-of-range pages are empty, never an error

use crate::error::{QueryError, QueryResult};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 10;

/// What to do with `per_page=0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroPerPage {
    /// Accept it: zero pages, no items.
    #[default]
    Empty,
    /// Treat it like any other non-positive value.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize, policy: ZeroPerPage) -> QueryResult<Self> {
        if page < 1 {
            return Err(QueryError::invalid_page("page", "must be at least 1"));
        }
        if per_page == 0 && policy == ZeroPerPage::Reject {
            return Err(QueryError::invalid_page("per_page", "must be at least 1"));
        }
        Ok(Self { page, per_page })
    }

    /// Read `page`/`per_page` from query parameters, falling back to 1 and 10.
    pub fn from_params(params: &HashMap<String, String>, policy: ZeroPerPage) -> QueryResult<Self> {
        let page = parse_param(params, "page", DEFAULT_PAGE)?;
        let per_page = parse_param(params, "per_page", DEFAULT_PER_PAGE)?;
        Self::new(page, per_page, policy)
    }

    /// Half-open `[start, end)` window over the rows, saturating on overflow.
    pub fn window(&self) -> (usize, usize) {
        let start = (self.page - 1).saturating_mul(self.per_page);
        (start, start.saturating_add(self.per_page))
    }
}

fn parse_param(params: &HashMap<String, String>, name: &str, default: usize) -> QueryResult<usize> {
    // `?page=` behaves like an absent parameter, same as the filters
    let Some(raw) = params.get(name).filter(|raw| !raw.trim().is_empty()) else {
        return Ok(default);
    };

    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| QueryError::invalid_page(name, format!("{:?} is not an integer", raw)))?;

    usize::try_from(value)
        .map_err(|_| QueryError::invalid_page(name, format!("{} must not be negative", value)))
}

/// One page of results plus the metadata needed to walk the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
            per_page: self.per_page,
        }
    }
}

pub fn total_pages(total_items: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        total_items.div_ceil(per_page)
    }
}

pub fn paginate<T>(rows: Vec<T>, request: PageRequest) -> Page<T> {
    let total_items = rows.len();
    let (start, end) = request.window();

    let items = rows
        .into_iter()
        .skip(start)
        .take(end - start)
        .collect();

    Page {
        items,
        total_items,
        total_pages: total_pages(total_items, request.per_page),
        current_page: request.page,
        per_page: request.per_page,
    }
}
