/*!
The public listing pages.
*/
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::Glob,
    device::DeviceClass,
    render::{current_year, render_fragments, title_font_size, Page},
};
use super::*;

pub async fn home(State(glob): State<Arc<Glob>>) -> Response {
    log::trace!("public::home() called.");

    let data = json!({ "current_year": current_year() });
    serve_template(&glob.templates, StatusCode::OK, "index", &data)
}

pub async fn faculty(
    State(glob): State<Arc<Glob>>,
    device: DeviceClass,
) -> Response {
    log::trace!("public::faculty( {:?} ) called.", &device);

    let members = match glob.store.get_faculty().await {
        Ok(v) => v,
        Err(e) => {
            log::error!("Error retrieving faculty from data DB: {}", &e);
            return html_500();
        },
    };

    let cards = match render_fragments(&glob.templates, "faculty_card", &members, device) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Error rendering faculty fragments: {}", &e);
            return html_500();
        },
    };

    let data = json!({
        "cards": cards,
        "title_font_size": title_font_size(Page::Faculty, device),
        "current_year": current_year(),
    });

    serve_template(&glob.templates, StatusCode::OK, "faculty", &data)
}

pub async fn researchers(
    State(glob): State<Arc<Glob>>,
    device: DeviceClass,
) -> Response {
    log::trace!("public::researchers( {:?} ) called.", &device);

    let researchers = match glob.store.get_researchers().await {
        Ok(v) => v,
        Err(e) => {
            log::error!("Error retrieving JPL researchers from data DB: {}", &e);
            return html_500();
        },
    };

    let cards = match render_fragments(&glob.templates, "researcher_card", &researchers, device) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Error rendering JPL researcher fragments: {}", &e);
            return html_500();
        },
    };

    let data = json!({
        "cards": cards,
        "title_font_size": title_font_size(Page::Researchers, device),
        "current_year": current_year(),
    });

    serve_template(&glob.templates, StatusCode::OK, "jpl_researchers", &data)
}

#[derive(Debug, Deserialize)]
pub struct StudentsQuery {
    school: Option<String>,
}

#[derive(Debug, Serialize)]
struct SchoolGroup {
    school: String,
    /// `school`, percent-encoded for the `?school=` filter link.
    school_param: String,
    cards: String,
}

/// Students, one section per school. `?school=X` shows just that school.
pub async fn students(
    State(glob): State<Arc<Glob>>,
    device: DeviceClass,
    Query(q): Query<StudentsQuery>,
) -> Response {
    log::trace!("public::students( {:?}, {:?} ) called.", &device, &q);

    let schools = match q.school {
        Some(school) => vec![school],
        None => match glob.store.get_student_schools().await {
            Ok(v) => v,
            Err(e) => {
                log::error!("Error retrieving student schools from data DB: {}", &e);
                return html_500();
            },
        },
    };

    let mut groups: Vec<SchoolGroup> = Vec::with_capacity(schools.len());
    for school in schools.into_iter() {
        let students = match glob.store.get_students_by_school(&school).await {
            Ok(v) => v,
            Err(e) => {
                log::error!("Error retrieving {:?} students from data DB: {}", &school, &e);
                return html_500();
            },
        };
        let cards = match render_fragments(&glob.templates, "student_card", &students, device) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Error rendering student fragments: {}", &e);
                return html_500();
            },
        };
        let school_param = urlencoding::encode(&school).into_owned();
        groups.push(SchoolGroup { school, school_param, cards });
    }

    let data = json!({
        "groups": groups,
        "title_font_size": title_font_size(Page::Students, device),
        "current_year": current_year(),
    });

    serve_template(&glob.templates, StatusCode::OK, "students", &data)
}
