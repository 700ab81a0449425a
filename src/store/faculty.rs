/*!
`Store` methods for the `faculty` table.
*/
use rusqlite::{
    params, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};

use super::{Store, DbError};
use crate::profile::{Faculty, FacultyFields, FacultyRole};

impl FromSql for FacultyRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for FacultyRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

fn faculty_from_row(row: &Row) -> rusqlite::Result<Faculty> {
    Ok(Faculty {
        id: row.get("FID")?,
        name: row.get("name")?,
        title: row.get("title")?,
        school: row.get("school")?,
        email: row.get("email")?,
        bio: row.get("bio")?,
        image: row.get("image")?,
        link: row.get("link")?,
        role: row.get("role")?,
    })
}

impl Store {
    /// All faculty, in insertion order.
    pub async fn get_faculty(&self) -> Result<Vec<Faculty>, DbError> {
        log::trace!("Store::get_faculty() called.");

        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM faculty ORDER BY FID")?;
            let faculty = stmt.query_map([], faculty_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(faculty)
        }).await
    }

    pub async fn get_faculty_member(&self, id: i64) -> Result<Option<Faculty>, DbError> {
        log::trace!("Store::get_faculty_member( {} ) called.", &id);

        self.run(move |conn| {
            let f = conn.query_row(
                "SELECT * FROM faculty WHERE FID = ?1",
                [id],
                faculty_from_row
            ).optional()?;
            Ok(f)
        }).await
    }

    /// Insert a new faculty member whose photo has already been written as
    /// `image`. Returns the new row's id.
    pub async fn insert_faculty(
        &self,
        fields: &FacultyFields,
        image: &str,
    ) -> Result<i64, DbError> {
        log::trace!("Store::insert_faculty( {:?}, {:?} ) called.", &fields.name, image);

        let f = fields.clone();
        let image = image.to_owned();
        let id = self.run(move |conn| {
            conn.execute(
                "INSERT INTO faculty (name, title, school, email, bio, image, link, role)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![f.name, f.title, f.school, f.email, f.bio, image, f.link, f.role],
            )?;
            Ok(conn.last_insert_rowid())
        }).await?;

        log::info!("Inserted faculty member {:?} as FID {}.", &fields.name, &id);
        Ok(id)
    }

    /**
    Overwrite faculty member `id`'s fields. The photo is only replaced when
    `image` is `Some`.

    Returns `false` if there is no such faculty member.
    */
    pub async fn update_faculty(
        &self,
        id: i64,
        fields: &FacultyFields,
        image: Option<&str>,
    ) -> Result<bool, DbError> {
        log::trace!(
            "Store::update_faculty( {}, {:?}, {:?} ) called.",
            &id, &fields.name, &image
        );

        let f = fields.clone();
        let image = image.map(|s| s.to_owned());
        let n = self.run(move |conn| {
            let n = conn.execute(
                "UPDATE faculty SET
                    name = ?1, title = ?2, school = ?3, email = ?4, bio = ?5,
                    image = COALESCE(?6, image), link = ?7, role = ?8
                    WHERE FID = ?9",
                params![f.name, f.title, f.school, f.email, f.bio, image, f.link, f.role, id],
            )?;
            Ok(n)
        }).await?;

        Ok(n > 0)
    }

    /// Returns `false` if there was no such faculty member to delete.
    pub async fn delete_faculty(&self, id: i64) -> Result<bool, DbError> {
        log::trace!("Store::delete_faculty( {} ) called.", &id);

        let n = self.run(move |conn| {
            Ok(conn.execute("DELETE FROM faculty WHERE FID = ?1", [id])?)
        }).await?;

        match n {
            0 => Ok(false),
            1 => {
                log::info!("Deleted faculty member FID {}.", &id);
                Ok(true)
            },
            n => {
                log::warn!("Deleting single faculty FID {} affected {} rows.", &id, &n);
                Ok(true)
            },
        }
    }
}
