//! Offset pagination helpers shared by the catalog and comment listings.
//!
//! Page numbers are 1-based. A missing or non-numeric `?page=` parameter
//! resolves to the first page; a numeric parameter outside the valid range
//! (below one or beyond the end) resolves to the last non-empty page.

pub const PAGE_SIZE: u32 = 2;

/// A page position requested via the raw `?page=` query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    First,
    Last,
    Number(u32),
}

/// Parse a raw `?page=` query value. Non-numeric input asks for the first
/// page; a numeric value below one is out of range and lands on the last.
pub fn parse_page_param(raw: Option<&str>) -> PageRequest {
    match raw.map(str::trim) {
        None | Some("") => PageRequest::First,
        Some(value) => match value.parse::<i64>() {
            Ok(number) if number < 1 => PageRequest::Last,
            Ok(number) => PageRequest::Number(u32::try_from(number).unwrap_or(u32::MAX)),
            Err(_) => PageRequest::First,
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: u32,
}

impl Paginator {
    pub fn new(page_size: u32) -> Self {
        debug_assert!(page_size > 0);
        Self { page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages holding `total` items; an empty collection still has
    /// one (empty) page, matching the original application's paginator.
    pub fn total_pages(&self, total: u64) -> u32 {
        let size = u64::from(self.page_size);
        let pages = total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve a requested position into `1..=total_pages(total)`.
    pub fn clamp_page(&self, requested: PageRequest, total: u64) -> u32 {
        let last = self.total_pages(total);
        match requested {
            PageRequest::First => 1,
            PageRequest::Last => last,
            PageRequest::Number(number) => number.min(last),
        }
    }

    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One resolved page of items plus the surrounding page numbers.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn previous_number(&self) -> u32 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> u32 {
        self.number.saturating_add(1).min(self.total_pages)
    }
}
