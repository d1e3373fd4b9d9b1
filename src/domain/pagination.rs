//! Page slicing for tabular price data.

use crate::domain::error::PlotterError;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::ops::Index;

pub const DEFAULT_PAGE_SIZE: usize = 24;

/// One CSV row keyed by header name, in file column order.
///
/// Serializes as a JSON object whose keys follow the header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, keeping its original position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Index<&str> for Record {
    type Output = String;

    /// Panics when the column does not exist, like map indexing.
    fn index(&self, key: &str) -> &String {
        match self.cells.iter().find(|(k, _)| k == key) {
            Some((_, v)) => v,
            None => panic!("no column named {key:?}"),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub data: Vec<Record>,
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size)
}

/// Slices `rows` into the 1-based `page`.
///
/// An empty table has zero pages, so every page number is invalid for it.
pub fn paginate(rows: Vec<Record>, page: usize, page_size: usize) -> Result<Page, PlotterError> {
    if page_size == 0 {
        return Err(PlotterError::validation("page size must be positive"));
    }
    let total_items = rows.len();
    let total_pages = total_pages(total_items, page_size);
    if page < 1 || page > total_pages {
        return Err(PlotterError::InvalidPage { page, total_pages });
    }
    let data = rows
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Ok(Page {
        page,
        page_size,
        total_items,
        total_pages,
        data,
    })
}
