// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{DEFAULT_CATALOG_SIZE, DEFAULT_PAGE_SIZE};

const PAGE_WINDOW_DELTA: usize = 2;
const PAGE_WINDOW_MAX_FLAT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabel {
    Page(usize),
    Gap,
}

/// Offset/limit window over a catalog of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    offset: usize,
    limit: usize,
    total: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, DEFAULT_CATALOG_SIZE)
    }
}

impl Pager {
    pub fn new(offset: usize, limit: usize, total: usize) -> Self {
        let mut pager = Self {
            offset: 0,
            limit: limit.max(1),
            total,
        };
        pager.offset = pager.clamp_offset(offset);
        pager
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub fn clamp_offset(&self, requested: usize) -> usize {
        requested.min(self.total.saturating_sub(self.limit))
    }

    pub fn current_page(&self) -> usize {
        self.offset / self.limit + 1
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit)
    }

    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn has_next(&self) -> bool {
        self.offset + self.limit < self.total
    }

    pub fn with_offset(self, offset: usize) -> Self {
        Self::new(offset, self.limit, self.total)
    }

    pub fn first(self) -> Self {
        self.with_offset(0)
    }

    pub fn prev(self) -> Self {
        self.with_offset(self.offset.saturating_sub(self.limit))
    }

    pub fn next(self) -> Self {
        self.with_offset(self.offset + self.limit)
    }

    pub fn last(self) -> Self {
        self.with_offset(self.total_pages().saturating_sub(1) * self.limit)
    }

    pub fn go_to_page(self, page: usize) -> Self {
        self.with_offset(page.saturating_sub(1) * self.limit)
    }

    pub fn page_numbers(&self) -> Vec<PageLabel> {
        let total_pages = self.total_pages();
        let current = self.current_page();
        let delta = PAGE_WINDOW_DELTA;

        if total_pages <= PAGE_WINDOW_MAX_FLAT {
            return (1..=total_pages).map(PageLabel::Page).collect();
        }

        let mut labels = Vec::new();
        if current <= delta + 3 {
            labels.extend((1..=delta + 3).map(PageLabel::Page));
            labels.push(PageLabel::Gap);
            labels.push(PageLabel::Page(total_pages));
        } else if current >= total_pages - delta - 2 {
            labels.push(PageLabel::Page(1));
            labels.push(PageLabel::Gap);
            labels.extend((total_pages - delta - 2..=total_pages).map(PageLabel::Page));
        } else {
            labels.push(PageLabel::Page(1));
            labels.push(PageLabel::Gap);
            labels.extend((current - delta..=current + delta).map(PageLabel::Page));
            labels.push(PageLabel::Gap);
            labels.push(PageLabel::Page(total_pages));
        }
        labels
    }

    pub fn range_label(&self) -> String {
        let end = (self.offset + self.limit).min(self.total);
        format!(
            "[{}] - [{}] of [{}]",
            self.offset + 1,
            end,
            group_thousands(self.total)
        )
    }
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
