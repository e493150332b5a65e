//! Client-side paging over an already-fetched list.
//!
//! [`Pagination`] stores only the requested page and size; every
//! [`Pagination::view`] re-derives page counts from the list it is given and
//! clamps the page into range, so a view can never index past the list.

use std::fmt;
use std::str::FromStr;

use cinedex_config::defaults::{PAGE_SIZE, PAGE_SIZES};

/// One of the supported page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(usize);

impl PageSize {
    /// Every supported size, ascending.
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        PAGE_SIZES.into_iter().filter_map(Self::new)
    }

    /// Accept `value` when it is a supported size.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        if PAGE_SIZES.contains(&value) {
            usize::try_from(value).ok().map(Self)
        } else {
            None
        }
    }

    /// Number of items per page.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::new(PAGE_SIZE).unwrap_or(Self(12))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| {
                let allowed: Vec<String> = PAGE_SIZES.iter().map(ToString::to_string).collect();
                format!("page size must be one of {}", allowed.join(", "))
            })
    }
}

/// Page-window state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: PageSize,
    current_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

/// Window over a list, derived by [`Pagination::view`].
#[derive(Debug, PartialEq)]
pub struct PaginationView<'a, T> {
    /// 1-based page shown; always within `1..=total_pages`.
    pub current_page: usize,
    /// Items per page.
    pub page_size: PageSize,
    /// `max(1, ceil(total_items / page_size))`.
    pub total_pages: usize,
    /// Length of the underlying list.
    pub total_items: usize,
    /// Items on the current page.
    pub items: &'a [T],
}

impl<T> PaginationView<'_, T> {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// 1-based position of the first item shown, or 0 for an empty list.
    #[must_use]
    pub const fn first_position(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.current_page - 1) * self.page_size.get() + 1
        }
    }

    /// 1-based position of the last item shown, or 0 for an empty list.
    #[must_use]
    pub const fn last_position(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_position() + self.items.len() - 1
        }
    }
}

/// `max(1, ceil(total_items / page_size))`.
#[must_use]
pub const fn total_pages(total_items: usize, page_size: PageSize) -> usize {
    let pages = total_items.div_ceil(page_size.get());
    if pages == 0 { 1 } else { pages }
}

impl Pagination {
    /// Start at page 1 with `page_size`.
    #[must_use]
    pub const fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            current_page: 1,
        }
    }

    /// Current page size.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Requested page, before clamping.
    #[must_use]
    pub const fn requested_page(&self) -> usize {
        self.current_page
    }

    /// Derive the window over `items`.
    #[must_use]
    pub fn view<'a, T>(&self, items: &'a [T]) -> PaginationView<'a, T> {
        let total_items = items.len();
        let total_pages = total_pages(total_items, self.page_size);
        let current_page = self.current_page.clamp(1, total_pages);
        let start = ((current_page - 1) * self.page_size.get()).min(total_items);
        let end = (start + self.page_size.get()).min(total_items);
        PaginationView {
            current_page,
            page_size: self.page_size,
            total_pages,
            total_items,
            items: &items[start..end],
        }
    }

    /// Jump to `page`, clamped into `1..=total_pages`.
    /// Returns whether the page changed.
    pub fn go_to_page(&mut self, page: usize, total_items: usize) -> bool {
        let pages = total_pages(total_items, self.page_size);
        let current = self.current_page.clamp(1, pages);
        self.current_page = page.clamp(1, pages);
        self.current_page != current
    }

    /// Advance one page unless already on the last.
    pub fn next(&mut self, total_items: usize) -> bool {
        let pages = total_pages(total_items, self.page_size);
        let current = self.current_page.clamp(1, pages);
        if current < pages {
            self.current_page = current + 1;
            true
        } else {
            false
        }
    }

    /// Step back one page unless already on the first.
    pub fn previous(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Change the size and return to page 1.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    /// Return to page 1.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }
}
