use std::ops::Range;

pub const USER_PAGE_SIZE: usize = 50;
pub const TRANSACTION_PAGE_SIZE: usize = 3;

pub fn page_count(item_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    item_count.div_ceil(page_size)
}

/// Half-open index range of `page` (1-based). Pages outside
/// `1..=page_count` yield an empty range.
pub fn page_range(item_count: usize, page_size: usize, page: usize) -> Range<usize> {
    if page == 0 || page > page_count(item_count, page_size) {
        return 0..0;
    }
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(item_count);
    start..end
}

pub fn page_slice<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    &items[page_range(items.len(), page_size, page)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            current: 1,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, item_count: usize) -> usize {
        page_count(item_count, self.page_size)
    }

    /// Move to `page` if it exists; out-of-range requests are ignored.
    pub fn set_page(&mut self, page: usize, item_count: usize) -> bool {
        if page >= 1 && page <= self.total_pages(item_count) {
            self.current = page;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self, item_count: usize) -> bool {
        self.set_page(self.current + 1, item_count)
    }

    pub fn prev(&mut self, item_count: usize) -> bool {
        self.current > 1 && self.set_page(self.current - 1, item_count)
    }

    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        page_slice(items, self.page_size, self.current)
    }
}
