// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::listing::{apply_filter, empty_rows};
use crate::model::{Collection, Column, EntityKind, Listable};
use crate::table::TableState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<String>,
    pub selected: bool,
}

#[derive(Debug, Clone)]
struct PendingDelete<T> {
    index: usize,
    item: T,
}

/// One entity list screen: the fetched collection plus the table state the
/// user drives it with.
#[derive(Debug, Clone)]
pub struct ListPage<T: Listable> {
    items: Vec<T>,
    load_state: LoadState,
    table: TableState,
    query: String,
    cursor: usize,
    pending_delete: Option<PendingDelete<T>>,
}

impl<T: Listable> ListPage<T> {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            items: Vec::new(),
            load_state: LoadState::Loading,
            table: TableState::new(T::KIND.display_field(), rows_per_page),
            query: String::new(),
            cursor: 0,
            pending_delete: None,
        }
    }

    pub fn load(&mut self, items: Vec<T>) {
        self.items = items;
        self.load_state = LoadState::Ready;
        self.pending_delete = None;
        self.clamp_cursor();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filtered(&self) -> Vec<&T> {
        apply_filter(&self.items, &self.table.comparator(), &self.query)
    }

    /// The rows for the current page.
    pub fn visible(&self) -> Vec<&T> {
        let start = self.table.page.saturating_mul(self.table.rows_per_page);
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.table.rows_per_page)
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.row_id() == id)
    }

    /// Removes the row right away; the caller settles it with
    /// [`Self::commit_delete`] or [`Self::rollback_delete`].
    pub fn begin_delete(&mut self, id: &str) -> bool {
        if self.pending_delete.is_some() {
            return false;
        }
        let Some(index) = self.items.iter().position(|item| item.row_id() == id) else {
            return false;
        };
        let item = self.items.remove(index);
        self.table.selected.remove(id);
        self.pending_delete = Some(PendingDelete { index, item });
        self.clamp_cursor();
        true
    }

    pub fn commit_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn rollback_delete(&mut self) {
        if let Some(pending) = self.pending_delete.take() {
            let index = pending.index.min(self.items.len());
            self.items.insert(index, pending.item);
        }
    }

    fn clamp_cursor(&mut self) {
        let visible = self.visible().len();
        self.cursor = self.cursor.min(visible.saturating_sub(1));
    }
}

/// Object-safe face of [`ListPage`] so one screen type can host any entity.
pub trait ListView {
    fn kind(&self) -> EntityKind;
    fn columns(&self) -> &'static [Column];
    fn load_state(&self) -> &LoadState;
    fn fail(&mut self, message: String);
    fn table(&self) -> &TableState;
    fn query(&self) -> &str;
    fn set_query(&mut self, query: String);
    fn total_count(&self) -> usize;
    fn filtered_count(&self) -> usize;
    fn all_ids(&self) -> Vec<String>;
    fn visible_rows(&self) -> Vec<RowView>;
    fn empty_rows(&self) -> usize;
    fn not_found(&self) -> bool;
    fn cursor(&self) -> usize;
    fn move_cursor(&mut self, delta: isize);
    fn focused_id(&self) -> Option<String>;
    fn sort_by_column(&mut self, column: usize) -> Option<&'static str>;
    fn toggle_focused(&mut self);
    fn toggle_all(&mut self);
    fn next_page(&mut self) -> bool;
    fn prev_page(&mut self) -> bool;
    fn cycle_rows_per_page(&mut self);
    fn begin_delete(&mut self, id: &str) -> bool;
    fn commit_delete(&mut self);
    fn rollback_delete(&mut self);
}

impl<T: Listable> ListView for ListPage<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn columns(&self) -> &'static [Column] {
        T::columns()
    }

    fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    fn fail(&mut self, message: String) {
        self.items.clear();
        self.load_state = LoadState::Failed(message);
    }

    fn table(&self) -> &TableState {
        &self.table
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn set_query(&mut self, query: String) {
        if self.query != query {
            self.query = query;
            self.table.reset_page();
            self.cursor = 0;
        }
    }

    fn total_count(&self) -> usize {
        self.items.len()
    }

    fn filtered_count(&self) -> usize {
        self.filtered().len()
    }

    fn all_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.row_id().to_owned())
            .collect()
    }

    fn visible_rows(&self) -> Vec<RowView> {
        self.visible()
            .into_iter()
            .map(|item| RowView {
                id: item.row_id().to_owned(),
                cells: T::columns()
                    .iter()
                    .map(|column| item.field(column.key).display())
                    .collect(),
                selected: self.table.is_selected(item.row_id()),
            })
            .collect()
    }

    // Padded against the full collection size, not the filtered one.
    fn empty_rows(&self) -> usize {
        empty_rows(self.table.page, self.table.rows_per_page, self.items.len())
    }

    fn not_found(&self) -> bool {
        !self.query.is_empty() && self.filtered().is_empty()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn move_cursor(&mut self, delta: isize) {
        let visible = self.visible().len();
        if visible == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, visible as isize - 1);
        self.cursor = next as usize;
    }

    fn focused_id(&self) -> Option<String> {
        self.visible()
            .get(self.cursor)
            .map(|item| item.row_id().to_owned())
    }

    fn sort_by_column(&mut self, column: usize) -> Option<&'static str> {
        let column = T::columns().get(column)?;
        self.table.sort(column.key);
        Some(column.label)
    }

    fn toggle_focused(&mut self) {
        if let Some(id) = self.focused_id() {
            self.table.toggle_select(&id);
        }
    }

    // Covers the whole collection, whatever the filter shows.
    fn toggle_all(&mut self) {
        let ids = self.all_ids();
        let checked = !ids.iter().all(|id| self.table.is_selected(id)) || ids.is_empty();
        self.table.select_all(checked, ids);
    }

    fn next_page(&mut self) -> bool {
        let total = self.filtered_count();
        let moved = self.table.next_page(total);
        if moved {
            self.cursor = 0;
        }
        moved
    }

    fn prev_page(&mut self) -> bool {
        let moved = self.table.prev_page();
        if moved {
            self.cursor = 0;
        }
        moved
    }

    fn cycle_rows_per_page(&mut self) {
        self.table.cycle_rows_per_page();
        self.cursor = 0;
    }

    fn begin_delete(&mut self, id: &str) -> bool {
        ListPage::begin_delete(self, id)
    }

    fn commit_delete(&mut self) {
        ListPage::commit_delete(self);
    }

    fn rollback_delete(&mut self) {
        ListPage::rollback_delete(self);
    }
}

impl Collection {
    pub fn into_list_view(self, rows_per_page: usize) -> Box<dyn ListView> {
        fn page<T: Listable + 'static>(items: Vec<T>, rows_per_page: usize) -> Box<dyn ListView> {
            let mut page = ListPage::new(rows_per_page);
            page.load(items);
            Box::new(page)
        }

        match self {
            Self::Companies(rows) => page(rows, rows_per_page),
            Self::Branches(rows) => page(rows, rows_per_page),
            Self::Departments(rows) => page(rows, rows_per_page),
            Self::Employees(rows) => page(rows, rows_per_page),
            Self::Roles(rows) => page(rows, rows_per_page),
            Self::Users(rows) => page(rows, rows_per_page),
        }
    }
}

/// A list screen that has not loaded yet, for the given kind.
pub fn loading_view(kind: EntityKind, rows_per_page: usize) -> Box<dyn ListView> {
    match kind {
        EntityKind::Company => Box::new(ListPage::<crate::Company>::new(rows_per_page)),
        EntityKind::Branch => Box::new(ListPage::<crate::Branch>::new(rows_per_page)),
        EntityKind::Department => Box::new(ListPage::<crate::Department>::new(rows_per_page)),
        EntityKind::Employee => Box::new(ListPage::<crate::Employee>::new(rows_per_page)),
        EntityKind::Role => Box::new(ListPage::<crate::Role>::new(rows_per_page)),
        EntityKind::User => Box::new(ListPage::<crate::User>::new(rows_per_page)),
    }
}
