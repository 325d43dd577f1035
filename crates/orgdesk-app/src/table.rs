// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::listing::{Comparator, SortDirection};

pub const ROWS_PER_PAGE_OPTIONS: [usize; 3] = [5, 10, 25];
pub const DEFAULT_ROWS_PER_PAGE: usize = 5;

/// UI-only table state: paging, sort column, and row selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub page: usize,
    pub rows_per_page: usize,
    pub order_by: String,
    pub order: SortDirection,
    pub selected: BTreeSet<String>,
}

impl TableState {
    pub fn new(order_by: &str, rows_per_page: usize) -> Self {
        let rows_per_page = if ROWS_PER_PAGE_OPTIONS.contains(&rows_per_page) {
            rows_per_page
        } else {
            DEFAULT_ROWS_PER_PAGE
        };
        Self {
            page: 0,
            rows_per_page,
            order_by: order_by.to_owned(),
            order: SortDirection::Asc,
            selected: BTreeSet::new(),
        }
    }

    pub fn comparator(&self) -> Comparator {
        Comparator::new(self.order_by.clone(), self.order)
    }

    /// Same column while ascending flips to descending; anything else sorts
    /// ascending on `field`.
    pub fn sort(&mut self, field: &str) {
        let flip = self.order_by == field && self.order == SortDirection::Asc;
        self.order = if flip {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.order_by = field.to_owned();
    }

    pub fn select_all(&mut self, checked: bool, all_ids: impl IntoIterator<Item = String>) {
        self.selected = if checked {
            all_ids.into_iter().collect()
        } else {
            BTreeSet::new()
        };
    }

    pub fn toggle_select(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_owned());
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// No bounds check; callers clamp when they need to.
    pub fn change_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn change_rows_per_page(&mut self, rows_per_page: usize) {
        self.rows_per_page = rows_per_page;
        self.page = 0;
    }

    pub fn cycle_rows_per_page(&mut self) {
        let index = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|option| *option == self.rows_per_page)
            .map_or(0, |index| (index + 1) % ROWS_PER_PAGE_OPTIONS.len());
        self.change_rows_per_page(ROWS_PER_PAGE_OPTIONS[index]);
    }

    pub fn reset_page(&mut self) {
        self.page = 0;
    }

    pub fn page_count(&self, total: usize) -> usize {
        if self.rows_per_page == 0 {
            return 0;
        }
        total.div_ceil(self.rows_per_page)
    }

    pub fn next_page(&mut self, total: usize) -> bool {
        if self.page + 1 >= self.page_count(total) {
            return false;
        }
        self.change_page(self.page + 1);
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.change_page(self.page - 1);
        true
    }
}
