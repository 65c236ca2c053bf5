use std::num::IntErrorKind;

use serde::Serialize;

pub const PAGE_SIZE: usize = 10;

/// Slice of an ordered sequence to load for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            per_page: PAGE_SIZE,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// An empty sequence still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Resolves a raw `?page=` value. Garbage falls back to the first page,
    /// out-of-range numbers clamp to the last one.
    pub fn window(&self, raw: Option<&str>) -> PageWindow {
        let number = self.resolve_number(raw);
        PageWindow {
            number,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    fn resolve_number(&self, raw: Option<&str>) -> usize {
        let last = self.num_pages();
        let Some(raw) = raw else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 && (n as u64) <= last as u64 => n as usize,
            Ok(_) => last,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => last,
                _ => 1,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Wraps items already loaded for `window`.
    pub fn new(items: Vec<T>, window: PageWindow, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        Self {
            items,
            number: window.number,
            num_pages,
            total: paginator.total(),
            has_next: window.number < num_pages,
            has_previous: window.number > 1,
        }
    }
}
