/*!
Admin authentication: password checks against the `admin` table and the
session flag that marks a browser as logged in.
*/
use sha3::{Digest, Sha3_512};
use tower_sessions::Session;

use crate::store::{DbError, Store};

/// Session key holding `true` once an admin has logged in.
pub const SESSION_AUTH_KEY: &str = "authenticated";
/// Session key holding the logged-in admin's `AID`.
pub const SESSION_ADMIN_KEY: &str = "admin_id";

#[derive(Debug, PartialEq)]
pub enum AuthResult {
    /// Carries the admin's id.
    Ok(i64),
    BadPassword,
    NoSuchUser,
}

/// Lowercase hex SHA3-512 digest of `password`. No salt.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha3_512::digest(password.as_bytes()))
}

pub async fn check_password(
    store: &Store,
    username: &str,
    password: &str,
) -> Result<AuthResult, DbError> {
    log::trace!("check_password( {:?}, [ password ] ) called.", username);

    let admin = match store.get_admin_by_username(username).await? {
        Some(a) => a,
        None => { return Ok(AuthResult::NoSuchUser); },
    };

    if hash_password(password).eq_ignore_ascii_case(admin.password_hash.trim()) {
        Ok(AuthResult::Ok(admin.id))
    } else {
        Ok(AuthResult::BadPassword)
    }
}

/// Mark `session` as belonging to admin `admin_id`. The session id is
/// cycled first so a pre-login id can't be reused.
pub async fn log_in(
    session: &Session,
    admin_id: i64
) -> Result<(), tower_sessions::session::Error> {
    log::trace!("log_in( [ session ], {} ) called.", &admin_id);

    session.cycle_id().await?;
    session.insert(SESSION_AUTH_KEY, true).await?;
    session.insert(SESSION_ADMIN_KEY, admin_id).await?;
    Ok(())
}

pub async fn log_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    log::trace!("log_out( [ session ] ) called.");
    session.flush().await
}

pub async fn is_authenticated(
    session: &Session
) -> Result<bool, tower_sessions::session::Error> {
    let flag: Option<bool> = session.get(SESSION_AUTH_KEY).await?;
    Ok(flag.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_store;

    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    #[test]
    fn hash_is_hex_sha3_512() {
        let h = hash_password("password");
        assert_eq!(h.len(), 128);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(h, hex::encode(Sha3_512::digest(b"password")));
        assert_ne!(h, hash_password("Password"));

        assert_eq!(
            hash_password(""),
            "a69f73cca23a9ac5c8b567dc185a756e97c982164fe25859e0d1dcc1475c80a6\
             15b2123af1f5f94c11e3e9402c3ac558f500199d95b6d3e301758586281dcd26"
        );
    }

    #[tokio::test]
    async fn check_password_outcomes() {
        let (_dir, db) = test_store().await;
        let id = db.insert_admin("admin", &hash_password("password")).await.unwrap();

        assert_eq!(
            check_password(&db, "admin", "password").await.unwrap(),
            AuthResult::Ok(id)
        );
        assert_eq!(
            check_password(&db, "admin", "passw0rd").await.unwrap(),
            AuthResult::BadPassword
        );
        assert_eq!(
            check_password(&db, "nobody", "password").await.unwrap(),
            AuthResult::NoSuchUser
        );
    }

    #[tokio::test]
    async fn session_flag_lifecycle() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        assert!(!is_authenticated(&session).await.unwrap());
        log_in(&session, 7).await.unwrap();
        assert!(is_authenticated(&session).await.unwrap());
        let id: Option<i64> = session.get(SESSION_ADMIN_KEY).await.unwrap();
        assert_eq!(id, Some(7));

        log_out(&session).await.unwrap();
        assert!(!is_authenticated(&session).await.unwrap());
    }
}
