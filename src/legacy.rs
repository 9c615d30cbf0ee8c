//! Import from the database written by the older single-file office app
//! (`data/students.db`, photos under `assets/photos/{name}_{file}`).

use crate::db::table_has_column;
use crate::photos::{legacy_file_name, PhotoArchive, PhotoError, StoredPhoto};
use crate::store::{self, StudentFields};
use anyhow::{anyhow, Context};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyStudentRow {
    pub name: String,
    pub class: String,
    pub section: String,
    pub class_teacher: String,
    pub phone: String,
    pub year: String,
    pub fee_paid: i64,
    pub fee_balance: i64,
    pub photo: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyImportSummary {
    pub imported: usize,
    pub photos_copied: usize,
    pub photos_missing: usize,
    pub timestamps_defaulted: usize,
}

fn value_text(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.trim().to_string(),
        Value::Blob(b) => String::from_utf8_lossy(&b).trim().to_string(),
    }
}

fn value_amount(v: Value) -> i64 {
    let n = match v {
        Value::Integer(i) => i,
        Value::Real(f) => f as i64,
        Value::Text(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        Value::Null | Value::Blob(_) => 0,
    };
    n.max(0)
}

pub fn read_legacy_students(path: &Path) -> anyhow::Result<Vec<LegacyStudentRow>> {
    if !path.is_file() {
        return Err(anyhow!(
            "legacy database not found: {}",
            path.to_string_lossy()
        ));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open legacy database {}", path.to_string_lossy()))?;
    if !table_has_column(&conn, "students", "timestamp")? {
        return Err(anyhow!(
            "{} is not a legacy office database (students.timestamp missing)",
            path.to_string_lossy()
        ));
    }

    let mut stmt = conn.prepare(
        "SELECT name, class, section, class_teacher, phone, year,
                fee_paid, fee_balance, photo, timestamp
         FROM students
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(LegacyStudentRow {
                name: value_text(r.get(0)?),
                class: value_text(r.get(1)?),
                section: value_text(r.get(2)?),
                class_teacher: value_text(r.get(3)?),
                phone: value_text(r.get(4)?),
                year: value_text(r.get(5)?),
                fee_paid: value_amount(r.get(6)?),
                fee_balance: value_amount(r.get(7)?),
                photo: value_text(r.get(8)?),
                timestamp: value_text(r.get(9)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Copies every legacy row into `conn` in one transaction. Photos copied
/// into the archive are removed again if the import fails.
pub fn import_legacy_db(
    conn: &Connection,
    archive: &PhotoArchive,
    legacy_db: &Path,
    photos_dir: Option<&Path>,
) -> anyhow::Result<LegacyImportSummary> {
    let rows = read_legacy_students(legacy_db)?;
    let mut stored: Vec<StoredPhoto> = Vec::new();

    let result = import_rows(conn, archive, &rows, photos_dir, &mut stored);
    if result.is_err() {
        for s in &stored {
            archive.discard(s);
        }
    }
    result
}

fn import_rows(
    conn: &Connection,
    archive: &PhotoArchive,
    rows: &[LegacyStudentRow],
    photos_dir: Option<&Path>,
    stored: &mut Vec<StoredPhoto>,
) -> anyhow::Result<LegacyImportSummary> {
    let mut summary = LegacyImportSummary::default();
    let tx = conn
        .unchecked_transaction()
        .context("failed to start import transaction")?;

    for row in rows {
        let mut photo_key = None;
        if let (Some(dir), false) = (photos_dir, row.photo.is_empty()) {
            let src = dir.join(legacy_file_name(&row.name, &row.photo));
            if src.is_file() {
                let bytes = std::fs::read(&src)
                    .with_context(|| format!("failed to read {}", src.to_string_lossy()))?;
                match archive.store(&row.name, &row.photo, &bytes) {
                    Ok(s) => {
                        photo_key = Some(s.key.clone());
                        summary.photos_copied += 1;
                        stored.push(s);
                    }
                    Err(e @ (PhotoError::UnsupportedType(_) | PhotoError::Empty)) => {
                        tracing::warn!(student = %row.name, error = %e, "legacy photo skipped");
                        summary.photos_missing += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                summary.photos_missing += 1;
            }
        }

        let created_at = match store::parse_timestamp(&row.timestamp) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(
                    student = %row.name,
                    timestamp = %row.timestamp,
                    error = %e,
                    "legacy timestamp unreadable, using import time"
                );
                summary.timestamps_defaulted += 1;
                store::now()
            }
        };

        let fields = StudentFields {
            name: row.name.clone(),
            class: row.class.clone(),
            section: row.section.clone(),
            class_teacher: row.class_teacher.clone(),
            phone: row.phone.clone(),
            year: row.year.clone(),
            fee_paid: row.fee_paid,
            fee_balance: row.fee_balance,
            photo: row.photo.clone(),
            photo_key,
        };
        store::insert(&tx, &fields, created_at)?;
        summary.imported += 1;
    }

    tx.commit().context("failed to commit import")?;
    Ok(summary)
}
