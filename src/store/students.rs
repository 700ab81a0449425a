/*!
`Store` methods for the `students` table.

The tier column is `student_tier` in the database and `tier` everywhere
else.
*/
use rusqlite::{params, OptionalExtension, Row};

use super::{Store, DbError};
use crate::profile::{Student, StudentFields};

fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get("SID")?,
        name: row.get("name")?,
        tier: row.get("student_tier")?,
        image: row.get("image")?,
        school: row.get("school")?,
        email: row.get("email")?,
    })
}

impl Store {
    pub async fn get_students(&self) -> Result<Vec<Student>, DbError> {
        log::trace!("Store::get_students() called.");

        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM students ORDER BY SID")?;
            let students = stmt.query_map([], student_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(students)
        }).await
    }

    pub async fn get_students_by_school(
        &self,
        school: &str
    ) -> Result<Vec<Student>, DbError> {
        log::trace!("Store::get_students_by_school( {:?} ) called.", school);

        let school = school.to_owned();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM students WHERE school = ?1 ORDER BY SID"
            )?;
            let students = stmt.query_map([&school], student_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(students)
        }).await
    }

    /// Distinct schools with at least one student, alphabetically.
    pub async fn get_student_schools(&self) -> Result<Vec<String>, DbError> {
        log::trace!("Store::get_student_schools() called.");

        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT school FROM students ORDER BY school"
            )?;
            let schools = stmt.query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(schools)
        }).await
    }

    pub async fn get_student(&self, id: i64) -> Result<Option<Student>, DbError> {
        log::trace!("Store::get_student( {} ) called.", &id);

        self.run(move |conn| {
            let s = conn.query_row(
                "SELECT * FROM students WHERE SID = ?1",
                [id],
                student_from_row
            ).optional()?;
            Ok(s)
        }).await
    }

    pub async fn insert_student(
        &self,
        fields: &StudentFields,
        image: &str,
    ) -> Result<i64, DbError> {
        log::trace!("Store::insert_student( {:?}, {:?} ) called.", &fields.name, image);

        let s = fields.clone();
        let image = image.to_owned();
        let id = self.run(move |conn| {
            conn.execute(
                "INSERT INTO students (name, student_tier, image, school, email)
                    VALUES (?1, ?2, ?3, ?4, ?5)",
                params![s.name, s.tier, image, s.school, s.email],
            )?;
            Ok(conn.last_insert_rowid())
        }).await?;

        log::info!("Inserted student {:?} as SID {}.", &fields.name, &id);
        Ok(id)
    }

    pub async fn update_student(
        &self,
        id: i64,
        fields: &StudentFields,
        image: Option<&str>,
    ) -> Result<bool, DbError> {
        log::trace!(
            "Store::update_student( {}, {:?}, {:?} ) called.",
            &id, &fields.name, &image
        );

        let s = fields.clone();
        let image = image.map(|s| s.to_owned());
        let n = self.run(move |conn| {
            let n = conn.execute(
                "UPDATE students SET
                    name = ?1, student_tier = ?2, image = COALESCE(?3, image),
                    school = ?4, email = ?5
                    WHERE SID = ?6",
                params![s.name, s.tier, image, s.school, s.email, id],
            )?;
            Ok(n)
        }).await?;

        Ok(n > 0)
    }

    pub async fn delete_student(&self, id: i64) -> Result<bool, DbError> {
        log::trace!("Store::delete_student( {} ) called.", &id);

        let n = self.run(move |conn| {
            Ok(conn.execute("DELETE FROM students WHERE SID = ?1", [id])?)
        }).await?;

        if n > 0 {
            log::info!("Deleted student SID {}.", &id);
        }
        Ok(n > 0)
    }
}
