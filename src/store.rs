use chrono::{Local, NaiveDateTime, SubsecRound};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Serialize, Serializer};

/// Storage format for `created_at`, shared with databases written by the
/// older office app.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const PARSE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const SELECT_COLUMNS: &str = "id, name, class, section, class_teacher, phone, year,
     fee_paid, fee_balance, photo, photo_key, created_at";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("student {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

/// Every mutable column of a student row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFields {
    pub name: String,
    pub class: String,
    pub section: String,
    pub class_teacher: String,
    pub phone: String,
    pub year: String,
    pub fee_paid: i64,
    pub fee_balance: i64,
    pub photo: String,
    pub photo_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: i64,
    pub name: String,
    pub class: String,
    pub section: String,
    pub class_teacher: String,
    pub phone: String,
    pub year: String,
    pub fee_paid: i64,
    pub fee_balance: i64,
    pub photo: String,
    pub photo_key: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    let mut last_err = None;
    for fmt in PARSE_FORMATS {
        match NaiveDateTime::parse_from_str(raw, fmt) {
            Ok(ts) => return Ok(ts),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT),
    }
}

/// Local wall-clock time at the precision the database keeps.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    let created_raw: String = row.get(11)?;
    let created_at = parse_timestamp(&created_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;
    Ok(StudentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        class: row.get(2)?,
        section: row.get(3)?,
        class_teacher: row.get(4)?,
        phone: row.get(5)?,
        year: row.get(6)?,
        fee_paid: row.get(7)?,
        fee_balance: row.get(8)?,
        photo: row.get(9)?,
        photo_key: row.get(10)?,
        created_at,
    })
}

pub fn create(conn: &Connection, fields: &StudentFields) -> Result<i64, StoreError> {
    insert(conn, fields, now())
}

pub fn insert(
    conn: &Connection,
    fields: &StudentFields,
    created_at: NaiveDateTime,
) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO students(
           name,
           class,
           section,
           class_teacher,
           phone,
           year,
           fee_paid,
           fee_balance,
           photo,
           photo_key,
           created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            fields.name,
            fields.class,
            fields.section,
            fields.class_teacher,
            fields.phone,
            fields.year,
            fields.fee_paid,
            fields.fee_balance,
            fields.photo,
            fields.photo_key,
            format_timestamp(&created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_all(conn: &Connection) -> Result<Vec<StudentRecord>, StoreError> {
    let sql = format!("SELECT {} FROM students ORDER BY id", SELECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, id: i64) -> Result<StudentRecord, StoreError> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", SELECT_COLUMNS);
    conn.query_row(&sql, [id], row_to_record)
        .optional()?
        .ok_or(StoreError::NotFound(id))
}

/// Overwrites every mutable column and resets `created_at`. Last write wins.
pub fn update(conn: &Connection, id: i64, fields: &StudentFields) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE students
         SET name = ?, class = ?, section = ?, class_teacher = ?, phone = ?, year = ?,
             fee_paid = ?, fee_balance = ?, photo = ?, photo_key = ?, created_at = ?
         WHERE id = ?",
        params![
            fields.name,
            fields.class,
            fields.section,
            fields.class_teacher,
            fields.phone,
            fields.year,
            fields.fee_paid,
            fields.fee_balance,
            fields.photo,
            fields.photo_key,
            format_timestamp(&now()),
            id,
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn mem_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::init_schema(&conn).expect("init schema");
        conn
    }

    fn fields_of(r: &StudentRecord) -> StudentFields {
        StudentFields {
            name: r.name.clone(),
            class: r.class.clone(),
            section: r.section.clone(),
            class_teacher: r.class_teacher.clone(),
            phone: r.phone.clone(),
            year: r.year.clone(),
            fee_paid: r.fee_paid,
            fee_balance: r.fee_balance,
            photo: r.photo.clone(),
            photo_key: r.photo_key.clone(),
        }
    }

    fn fields(name: &str, class: &str, fee_paid: i64) -> StudentFields {
        StudentFields {
            name: name.to_string(),
            class: class.to_string(),
            section: "A".to_string(),
            class_teacher: "Mrs. Rao".to_string(),
            phone: "98450 12345".to_string(),
            year: "2024".to_string(),
            fee_paid,
            fee_balance: 500,
            photo: String::new(),
            photo_key: None,
        }
    }

    #[test]
    fn create_then_list_preserves_fields() {
        let conn = mem_db();
        create(&conn, &fields("Asha Nair", "5A", 100)).expect("create first");
        let before = list_all(&conn).expect("list").len();

        let input = fields("Ravi, \"Junior\" Kumar", "6B", 2500);
        let id = create(&conn, &input).expect("create second");
        let all = list_all(&conn).expect("list");
        assert_eq!(all.len(), before + 1);

        let stored = all.iter().find(|r| r.id == id).expect("created row");
        assert_eq!(fields_of(stored), input);
    }

    #[test]
    fn update_touches_only_target_row() {
        let conn = mem_db();
        let a = create(&conn, &fields("Asha", "5A", 100)).expect("create a");
        let b = create(&conn, &fields("Bela", "5B", 200)).expect("create b");
        let before_a = get(&conn, a).expect("get a");

        let mut patch = fields("Bela Shah", "6A", 900);
        patch.photo = "bela.png".to_string();
        patch.photo_key = Some("Bela_Shah_0011223344556677_bela.png".to_string());
        update(&conn, b, &patch).expect("update b");

        assert_eq!(get(&conn, a).expect("get a"), before_a);
        let after_b = get(&conn, b).expect("get b");
        assert_eq!(fields_of(&after_b), patch);
    }

    #[test]
    fn update_missing_id_reports_not_found_and_changes_nothing() {
        let conn = mem_db();
        create(&conn, &fields("Asha", "5A", 100)).expect("create");
        let before = list_all(&conn).expect("list");

        let res = update(&conn, 9999, &fields("Ghost", "1A", 0));
        assert!(matches!(res, Err(StoreError::NotFound(9999))));
        assert_eq!(list_all(&conn).expect("list"), before);
    }

    #[test]
    fn get_missing_id_is_not_found() {
        let conn = mem_db();
        assert!(matches!(get(&conn, 7), Err(StoreError::NotFound(7))));
    }

    #[test]
    fn insert_keeps_explicit_timestamp() {
        let conn = mem_db();
        let ts = parse_timestamp("2023-03-14 09:26:53.589793").expect("parse ts");
        let id = insert(&conn, &fields("Asha", "5A", 100), ts).expect("insert");
        assert_eq!(get(&conn, id).expect("get").created_at, ts);
    }

    #[test]
    fn parse_timestamp_accepts_known_shapes() {
        assert!(parse_timestamp("2024-06-01 08:00:00.123456").is_ok());
        assert!(parse_timestamp("2024-06-01 08:00:00").is_ok());
        assert!(parse_timestamp("2024-06-01T08:00:00.5").is_ok());
        assert!(parse_timestamp("June 1st").is_err());
    }
}
