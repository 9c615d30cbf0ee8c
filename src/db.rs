use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "school.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            class TEXT NOT NULL,
            section TEXT NOT NULL DEFAULT '',
            class_teacher TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            year TEXT NOT NULL,
            fee_paid INTEGER NOT NULL DEFAULT 0,
            fee_balance INTEGER NOT NULL DEFAULT 0,
            photo TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // Workspaces created before blob keys were recorded lack photo_key.
    ensure_students_photo_key(conn)?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_year ON students(year)",
        [],
    )?;
    Ok(())
}

fn ensure_students_photo_key(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "photo_key")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN photo_key TEXT", [])?;
    Ok(())
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
