/*!
Database interaction module.

The SQLite database this opens is meant to have the following tables. There
are no foreign keys between them.

```sql
CREATE TABLE faculty (
    FID     INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    title   TEXT NOT NULL,
    school  TEXT NOT NULL,
    email   TEXT NOT NULL,
    bio     TEXT NOT NULL,
    image   TEXT NOT NULL,  /* filename under the Faculty upload dir */
    link    TEXT NOT NULL,
    role    TEXT NOT NULL   /* one of { 'pi', 'copi' } */
);

CREATE TABLE jpl (
    RID      INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL,
    title    TEXT NOT NULL,
    location TEXT NOT NULL,
    email    TEXT NOT NULL,
    bio      TEXT NOT NULL,
    image    TEXT NOT NULL
);

CREATE TABLE students (
    SID          INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    student_tier TEXT NOT NULL,
    image        TEXT NOT NULL,
    school       TEXT NOT NULL,
    email        TEXT NOT NULL
);

CREATE TABLE admin (
    AID           INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL  /* hex SHA3-512, unsalted */
);
```

Every public `Store` method opens its own connection, runs one statement,
and drops the connection. SQLite itself serializes writers.
*/
use std::path::{Path, PathBuf};

use rusqlite::Connection;

mod admin;
mod faculty;
mod researchers;
mod students;

static SCHEMA: &[(&str, &str)] = &[
    (
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'faculty'",
        "CREATE TABLE faculty (
            FID     INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL,
            title   TEXT NOT NULL,
            school  TEXT NOT NULL,
            email   TEXT NOT NULL,
            bio     TEXT NOT NULL,
            image   TEXT NOT NULL,
            link    TEXT NOT NULL,
            role    TEXT NOT NULL
        )",
    ),

    (
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'jpl'",
        "CREATE TABLE jpl (
            RID      INTEGER PRIMARY KEY AUTOINCREMENT,
            name     TEXT NOT NULL,
            title    TEXT NOT NULL,
            location TEXT NOT NULL,
            email    TEXT NOT NULL,
            bio      TEXT NOT NULL,
            image    TEXT NOT NULL
        )",
    ),

    (
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'students'",
        "CREATE TABLE students (
            SID          INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            student_tier TEXT NOT NULL,
            image        TEXT NOT NULL,
            school       TEXT NOT NULL,
            email        TEXT NOT NULL
        )",
    ),

    (
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'admin'",
        "CREATE TABLE admin (
            AID           INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL
        )",
    ),
];

#[derive(Debug, PartialEq)]
pub struct DbError(String);

impl DbError {
    /// Prepend some contextual `annotation` for the error.
    fn annotate(self, annotation: &str) -> Self {
        let s = format!("{}: {}", annotation, &self.0);
        Self(s)
    }

    pub fn display(&self) -> &str { &self.0 }
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> DbError {
        DbError(format!("Data DB: {}", &e))
    }
}

impl From<String> for DbError {
    fn from(s: String) -> DbError { DbError(s) }
}

fn connect(path: &Path) -> Result<Connection, DbError> {
    log::trace!("connect( {} ) called.", path.display());

    match Connection::open(path) {
        Ok(conn) => {
            log::trace!("    ...connection successful.");
            Ok(conn)
        },
        Err(e) => {
            let dberr = DbError::from(e);
            log::trace!("    ...connection failed: {:?}", &dberr);
            Err(dberr.annotate("Unable to connect"))
        },
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    pub fn new<P: Into<PathBuf>>(db_path: P) -> Self {
        let db_path = db_path.into();
        log::trace!("Store::new( {} ) called.", db_path.display());

        Self { db_path }
    }

    pub fn path(&self) -> &Path { &self.db_path }

    /**
    Open a fresh connection and run `f` against it on the blocking pool.

    The connection is closed when `f` returns.
    */
    async fn run<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
    {
        let path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&path)?;
            f(&conn)
        }).await
            .map_err(|e| DbError(format!("Data DB task failed: {}", &e)))?
    }

    pub async fn ensure_db_schema(&self) -> Result<(), DbError> {
        log::trace!("Store::ensure_db_schema() called.");

        self.run(|conn| {
            for (test_stmt, create_stmt) in SCHEMA.iter() {
                let exists = conn.prepare(test_stmt)?.exists([])?;
                if !exists {
                    log::info!(
                        "{:?} returned no results; attempting to insert table.",
                        test_stmt
                    );
                    conn.execute(create_stmt, [])
                        .map_err(|e| DbError::from(e)
                            .annotate("Unable to create table"))?;
                }
            }
            Ok(())
        }).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    use tempfile::TempDir;

    /// A schema'd store in a fresh temporary directory. Keep the `TempDir`
    /// alive for as long as the store is used.
    pub async fn test_store() -> (TempDir, Store) {
        ensure_logging();
        let dir = tempfile::tempdir().unwrap();
        let db = Store::new(dir.path().join("impact_test.db"));
        db.ensure_db_schema().await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn create_store() {
        let (_dir, db) = test_store().await;

        // Running it again against existing tables should be a no-op.
        db.ensure_db_schema().await.unwrap();

        let conn = connect(db.path()).unwrap();
        for table in ["faculty", "jpl", "students", "admin"] {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0)
            ).unwrap();
            assert_eq!(n, 1, "table {} missing", table);
        }
    }

    #[tokio::test]
    async fn unopenable_path() {
        ensure_logging();
        let dir = tempfile::tempdir().unwrap();
        let db = Store::new(dir.path().join("no/such/dir/impact.db"));
        let e = db.ensure_db_schema().await.unwrap_err();
        assert!(e.display().starts_with("Unable to connect"));
    }
}
