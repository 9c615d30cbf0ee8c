use crate::store::{format_timestamp, StudentRecord};
use serde_json::Value;
use std::collections::BTreeSet;

pub const PAGE_SIZE: usize = 50;

pub const CSV_HEADER: [&str; 11] = [
    "id",
    "name",
    "class",
    "section",
    "class_teacher",
    "phone",
    "year",
    "fee_paid",
    "fee_balance",
    "photo",
    "created_at",
];

/// Year selector value meaning "no year filter".
const ALL_YEARS: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseFilter {
    pub class: Option<String>,
    pub section: Option<String>,
    pub year: Option<String>,
    pub name: Option<String>,
}

impl BrowseFilter {
    /// Numbers are accepted as their decimal text, the same as on create.
    pub fn from_params(params: &Value) -> Self {
        let opt = |key: &str| {
            let raw = match params.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            Some(raw).filter(|s| !s.is_empty())
        };
        Self {
            class: opt("class"),
            section: opt("section"),
            year: opt("year").filter(|y| y != ALL_YEARS),
            name: opt("name"),
        }
    }

    pub fn matches(&self, record: &StudentRecord) -> bool {
        contains_ci(&record.class, self.class.as_deref())
            && contains_ci(&record.section, self.section.as_deref())
            && self.year.as_deref().map_or(true, |y| record.year == y)
            && contains_ci(&record.name, self.name.as_deref())
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

pub fn filter<'a>(records: &'a [StudentRecord], f: &BrowseFilter) -> Vec<&'a StudentRecord> {
    records.iter().filter(|r| f.matches(r)).collect()
}

pub fn year_options(records: &[StudentRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.year.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Never less than one, so page 1 is always addressable.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size).max(1)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page {requested} is out of range (1..={total_pages})")]
    OutOfRange {
        requested: usize,
        total_pages: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: &'a [T],
}

pub fn paginate<T>(items: &[T], page_size: usize, page_number: usize) -> Result<Page<'_, T>, PageError> {
    let total = total_pages(items.len(), page_size);
    if page_number < 1 || page_number > total {
        return Err(PageError::OutOfRange {
            requested: page_number,
            total_pages: total,
        });
    }
    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(items.len());
    Ok(Page {
        number: page_number,
        total_pages: total,
        total_items: items.len(),
        items: &items[start.min(end)..end],
    })
}

pub fn csv_file_name(page_number: usize) -> String {
    format!("students_page_{}.csv", page_number)
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn export_csv(records: &[&StudentRecord]) -> String {
    let mut csv = CSV_HEADER.join(",");
    csv.push('\n');
    for r in records {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            r.id,
            csv_quote(&r.name),
            csv_quote(&r.class),
            csv_quote(&r.section),
            csv_quote(&r.class_teacher),
            csv_quote(&r.phone),
            csv_quote(&r.year),
            r.fee_paid,
            r.fee_balance,
            csv_quote(&r.photo),
            csv_quote(&format_timestamp(&r.created_at)),
        ));
    }
    csv
}
