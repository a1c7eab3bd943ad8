pub const CREATE_DOCUMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
  uid        TEXT PRIMARY KEY,
  body       TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#;

pub const SELECT_DOCUMENT: &str = "SELECT body FROM documents WHERE uid = ?1";

pub const UPSERT_DOCUMENT: &str = "INSERT INTO documents (uid, body, updated_at)
 VALUES (?1, ?2, ?3)
 ON CONFLICT(uid)
 DO UPDATE SET body=excluded.body, updated_at=excluded.updated_at";

pub fn schema_statements() -> Vec<&'static str> {
    vec![CREATE_DOCUMENTS]
}
