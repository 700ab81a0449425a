/*!
`Store` methods for the `jpl` table of JPL researchers.
*/
use rusqlite::{params, OptionalExtension, Row};

use super::{Store, DbError};
use crate::profile::{Researcher, ResearcherFields};

fn researcher_from_row(row: &Row) -> rusqlite::Result<Researcher> {
    Ok(Researcher {
        id: row.get("RID")?,
        name: row.get("name")?,
        title: row.get("title")?,
        location: row.get("location")?,
        email: row.get("email")?,
        bio: row.get("bio")?,
        image: row.get("image")?,
    })
}

impl Store {
    pub async fn get_researchers(&self) -> Result<Vec<Researcher>, DbError> {
        log::trace!("Store::get_researchers() called.");

        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM jpl ORDER BY RID")?;
            let researchers = stmt.query_map([], researcher_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(researchers)
        }).await
    }

    pub async fn get_researcher(&self, id: i64) -> Result<Option<Researcher>, DbError> {
        log::trace!("Store::get_researcher( {} ) called.", &id);

        self.run(move |conn| {
            let r = conn.query_row(
                "SELECT * FROM jpl WHERE RID = ?1",
                [id],
                researcher_from_row
            ).optional()?;
            Ok(r)
        }).await
    }

    pub async fn insert_researcher(
        &self,
        fields: &ResearcherFields,
        image: &str,
    ) -> Result<i64, DbError> {
        log::trace!("Store::insert_researcher( {:?}, {:?} ) called.", &fields.name, image);

        let r = fields.clone();
        let image = image.to_owned();
        let id = self.run(move |conn| {
            conn.execute(
                "INSERT INTO jpl (name, title, location, email, bio, image)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![r.name, r.title, r.location, r.email, r.bio, image],
            )?;
            Ok(conn.last_insert_rowid())
        }).await?;

        log::info!("Inserted JPL researcher {:?} as RID {}.", &fields.name, &id);
        Ok(id)
    }

    pub async fn update_researcher(
        &self,
        id: i64,
        fields: &ResearcherFields,
        image: Option<&str>,
    ) -> Result<bool, DbError> {
        log::trace!(
            "Store::update_researcher( {}, {:?}, {:?} ) called.",
            &id, &fields.name, &image
        );

        let r = fields.clone();
        let image = image.map(|s| s.to_owned());
        let n = self.run(move |conn| {
            let n = conn.execute(
                "UPDATE jpl SET
                    name = ?1, title = ?2, location = ?3, email = ?4, bio = ?5,
                    image = COALESCE(?6, image)
                    WHERE RID = ?7",
                params![r.name, r.title, r.location, r.email, r.bio, image, id],
            )?;
            Ok(n)
        }).await?;

        Ok(n > 0)
    }

    pub async fn delete_researcher(&self, id: i64) -> Result<bool, DbError> {
        log::trace!("Store::delete_researcher( {} ) called.", &id);

        let n = self.run(move |conn| {
            Ok(conn.execute("DELETE FROM jpl WHERE RID = ?1", [id])?)
        }).await?;

        if n > 0 {
            log::info!("Deleted JPL researcher RID {}.", &id);
        }
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_store;

    fn fields(name: &str) -> ResearcherFields {
        ResearcherFields {
            name: name.to_owned(),
            title: "Research Technologist".to_owned(),
            location: "Pasadena, CA".to_owned(),
            email: "someone@jpl.example.gov".to_owned(),
            bio: "Builds instruments.".to_owned(),
        }
    }

    #[tokio::test]
    async fn researcher_lifecycle() {
        let (_dir, db) = test_store().await;

        let id = db.insert_researcher(&fields("Hal"), "Hal.jpg").await.unwrap();
        let other = db.insert_researcher(&fields("Ida"), "Ida.jpg").await.unwrap();

        let r = db.get_researcher(id).await.unwrap().unwrap();
        assert_eq!(r.location, "Pasadena, CA");
        assert_eq!(r.image, "Hal.jpg");

        let mut moved = fields("Hal");
        moved.location = "Remote".to_owned();
        assert!(db.update_researcher(id, &moved, None).await.unwrap());
        let r = db.get_researcher(id).await.unwrap().unwrap();
        assert_eq!(r.location, "Remote");
        assert_eq!(r.image, "Hal.jpg");

        assert!(db.delete_researcher(id).await.unwrap());
        let left = db.get_researchers().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, other);
    }
}
