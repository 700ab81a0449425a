/*!
`Store` methods for the `admin` credential table.

Credentials are only ever inserted out-of-band (the `add_admin` binary, or
the default admin from the config file); the web interface only reads them.
*/
use rusqlite::{params, OptionalExtension, Row};

use super::{Store, DbError};
use crate::profile::AdminCredential;

fn admin_from_row(row: &Row) -> rusqlite::Result<AdminCredential> {
    Ok(AdminCredential {
        id: row.get("AID")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
    })
}

impl Store {
    pub async fn get_admin_by_username(
        &self,
        username: &str
    ) -> Result<Option<AdminCredential>, DbError> {
        log::trace!("Store::get_admin_by_username( {:?} ) called.", username);

        let username = username.to_owned();
        self.run(move |conn| {
            let a = conn.query_row(
                "SELECT * FROM admin WHERE username = ?1",
                [&username],
                admin_from_row
            ).optional()?;
            Ok(a)
        }).await
    }

    /// `password_hash` should already be the hex digest; see
    /// `auth::hash_password()`.
    pub async fn insert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<i64, DbError> {
        log::trace!("Store::insert_admin( {:?}, [ hash ] ) called.", username);

        let uname = username.to_owned();
        let hash = password_hash.to_owned();
        let id = self.run(move |conn| {
            conn.execute(
                "INSERT INTO admin (username, password_hash) VALUES (?1, ?2)",
                params![uname, hash],
            ).map_err(|e| DbError::from(e).annotate("Unable to insert admin"))?;
            Ok(conn.last_insert_rowid())
        }).await?;

        log::info!("Inserted admin {:?} as AID {}.", username, &id);
        Ok(id)
    }

    pub async fn count_admins(&self) -> Result<i64, DbError> {
        log::trace!("Store::count_admins() called.");

        self.run(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM admin", [], |row| row.get(0))?;
            Ok(n)
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_store;

    #[tokio::test]
    async fn insert_and_find_admin() {
        let (_dir, db) = test_store().await;
        assert_eq!(db.count_admins().await.unwrap(), 0);

        let id = db.insert_admin("root", "abc123").await.unwrap();
        assert_eq!(db.count_admins().await.unwrap(), 1);

        let a = db.get_admin_by_username("root").await.unwrap().unwrap();
        assert_eq!((a.id, a.username.as_str(), a.password_hash.as_str()), (id, "root", "abc123"));

        assert!(db.get_admin_by_username("Root").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_fails() {
        let (_dir, db) = test_store().await;

        db.insert_admin("root", "abc123").await.unwrap();
        let e = db.insert_admin("root", "def456").await.unwrap_err();
        assert!(e.display().starts_with("Unable to insert admin"));
        assert_eq!(db.count_admins().await.unwrap(), 1);
    }
}
