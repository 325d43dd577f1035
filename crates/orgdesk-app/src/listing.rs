// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::model::Listable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

/// A single cell value as seen by sorting and filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: &str) -> Self {
        Self::Text(value.to_owned())
    }

    pub fn display(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Number(value) => format_number(*value),
            Self::Text(value) => value.clone(),
        }
    }

    /// Missing sorts before anything defined. Mixed number/text pairs
    /// compare by the number's textual form.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Less,
            (_, Self::Missing) => Ordering::Greater,
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(left), Self::Text(right)) => format_number(*left).as_str().cmp(right),
            (Self::Text(left), Self::Number(right)) => left.as_str().cmp(&format_number(*right)),
        }
    }
}

impl From<Option<&str>> for FieldValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, Self::text)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Missing, |value| Self::Number(value as f64))
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    key: String,
    direction: SortDirection,
}

impl Comparator {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn compare<T: Listable>(&self, left: &T, right: &T) -> Ordering {
        let ordering = left.field(&self.key).cmp_value(&right.field(&self.key));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Sorts `items` and keeps those whose display field contains `query`,
/// ignoring case. An empty query keeps everything.
pub fn apply_filter<'a, T: Listable>(
    items: &'a [T],
    comparator: &Comparator,
    query: &str,
) -> Vec<&'a T> {
    let mut sorted = items.iter().collect::<Vec<_>>();
    sorted.sort_by(|left, right| comparator.compare(*left, *right));
    if query.is_empty() {
        return sorted;
    }

    let needle = query.to_lowercase();
    let display_field = T::KIND.display_field();
    sorted
        .into_iter()
        .filter(|item| match item.field(display_field) {
            FieldValue::Missing => false,
            value => value.display().to_lowercase().contains(&needle),
        })
        .collect()
}

/// Blank rows needed to keep the final page at full height.
pub fn empty_rows(page: usize, rows_per_page: usize, total: usize) -> usize {
    if total == 0 || rows_per_page == 0 {
        return 0;
    }
    let last_page = (total - 1) / rows_per_page;
    if page != last_page {
        return 0;
    }
    rows_per_page.saturating_sub(total - page * rows_per_page)
}
