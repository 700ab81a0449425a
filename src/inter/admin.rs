/*!
Subcrate for interoperation with Admin users: logging in and out, and the
add/edit/delete profile panel.

Everything here except the login and logout handlers sits behind
`require_admin()`.
*/
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::{
    auth, auth::AuthResult,
    config::Glob,
    profile::{ProfileFields, ProfileType},
    render::current_year,
    store::DbError,
    upload::{self, UploadedFile},
};
use super::*;

/// Name of the file input on the add/edit forms.
const PHOTO_FIELD: &str = "photo";

/// Data type to read the form data from a login request.
#[derive(Deserialize, Debug)]
pub struct LoginData {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct TypeQuery {
    #[serde(rename = "profileType")]
    pub profile_type: ProfileType,
}

#[derive(Deserialize, Debug)]
pub struct ProfileRef {
    #[serde(rename = "profileType")]
    pub profile_type: ProfileType,
    pub id: i64,
}

/// A decoded multipart add/edit form.
#[derive(Debug, Default)]
struct Submission {
    fields: HashMap<String, String>,
    photo: Option<UploadedFile>,
}

impl Submission {
    fn take_profile_type(&mut self) -> Result<ProfileType, String> {
        match self.fields.remove("profileType") {
            Some(s) => s.parse(),
            None => Err("Form is missing the \"profileType\" field.".to_owned()),
        }
    }

    fn take_id(&mut self) -> Result<i64, String> {
        match self.fields.remove("id") {
            Some(s) => s.trim().parse()
                .map_err(|e| format!("Unable to parse id {:?}: {}", &s, &e)),
            None => Err("Form is missing the \"id\" field.".to_owned()),
        }
    }
}

/**
Read every field of a multipart form.

A file input left empty still arrives as a part with a blank filename and no
content; that counts as no photo.
*/
async fn read_submission(mut multipart: Multipart) -> Result<Submission, String> {
    let mut sub = Submission::default();

    while let Some(field) = multipart.next_field().await
        .map_err(|e| format!("Malformed multipart body: {}", &e))?
    {
        let name = match field.name() {
            Some(name) => name.to_owned(),
            None => { continue; },
        };

        if name == PHOTO_FIELD {
            let file_name = field.file_name().unwrap_or("").to_owned();
            let bytes = field.bytes().await
                .map_err(|e| format!("Error reading uploaded photo: {}", &e))?;
            if !file_name.is_empty() && !bytes.is_empty() {
                sub.photo = Some(UploadedFile { file_name, bytes });
            }
        } else {
            let text = field.text().await
                .map_err(|e| format!("Error reading form field {:?}: {}", &name, &e))?;
            sub.fields.insert(name, text);
        }
    }

    Ok(sub)
}

/**
Store `photo` for a `ptype` profile.

On `Err` the request is finished and the carried `Response` should be
returned as is: a redirect back to the dashboard if the upload was
rejected, or a 500 if writing it failed.
*/
async fn ingest_or_respond(
    glob: &Glob,
    ptype: ProfileType,
    display_name: &str,
    photo: &UploadedFile,
) -> Result<String, Response> {
    match upload::ingest_photo(&glob.upload_root, ptype, display_name, photo).await {
        Ok(file_name) => Ok(file_name),
        Err(e) if e.is_rejection() => {
            log::warn!("Rejected {} photo upload for {:?}: {}", &ptype, display_name, &e);
            Err(Redirect::to("/admin").into_response())
        },
        Err(e) => {
            log::error!("Error storing {} photo for {:?}: {}", &ptype, display_name, &e);
            Err(html_500())
        },
    }
}

pub async fn login_page(
    session: Session,
    State(glob): State<Arc<Glob>>,
) -> Response {
    log::trace!("admin::login_page() called.");

    match auth::is_authenticated(&session).await {
        Ok(true) => { return Redirect::to("/admin").into_response(); },
        Ok(false) => {},
        Err(e) => {
            log::error!("Error reading session: {}", &e);
            return html_500();
        },
    }

    let data = json!({ "current_year": current_year() });
    serve_template(&glob.templates, StatusCode::OK, "admin_login", &data)
}

pub async fn login(
    session: Session,
    State(glob): State<Arc<Glob>>,
    Form(form): Form<LoginData>,
) -> Response {
    log::trace!("admin::login( {:?}, [ password ] ) called.", &form.username);

    let auth_response = auth::check_password(
        &glob.store,
        &form.username,
        &form.password
    ).await;

    let admin_id = match auth_response {
        Err(e) => {
            log::error!(
                "Error: auth::check_password( {:?}, [ password ] ): {}",
                &form.username, &e
            );
            return html_500();
        },
        Ok(AuthResult::Ok(id)) => id,
        Ok(x) => {
            log::info!("Failed admin login for {:?}: {:?}", &form.username, &x);
            return respond_bad_password(&glob.templates);
        },
    };

    if let Err(e) = auth::log_in(&session, admin_id).await {
        log::error!("Error setting session for admin {}: {}", &admin_id, &e);
        return html_500();
    }

    log::info!("Admin {:?} (AID {}) logged in.", &form.username, &admin_id);
    Redirect::to("/admin").into_response()
}

pub async fn logout(session: Session) -> Response {
    log::trace!("admin::logout() called.");

    if let Err(e) = auth::log_out(&session).await {
        log::error!("Error clearing session: {}", &e);
        return html_500();
    }

    Redirect::to("/").into_response()
}

pub async fn dashboard(State(glob): State<Arc<Glob>>) -> Response {
    log::trace!("admin::dashboard() called.");

    let (faculty, researchers, students) = match tokio::try_join!(
        glob.store.get_faculty(),
        glob.store.get_researchers(),
        glob.store.get_students(),
    ) {
        Ok(x) => x,
        Err(e) => {
            log::error!("Error retrieving profiles for admin dashboard: {}", &e);
            return html_500();
        },
    };

    let data = json!({
        "faculty": faculty,
        "researchers": researchers,
        "students": students,
        "current_year": current_year(),
    });

    serve_template(&glob.templates, StatusCode::OK, "admin", &data)
}

fn form_data(ptype: ProfileType, action: &str, record: Value) -> Value {
    json!({
        "action": action,
        "profile_type": ptype,
        "label": ptype.label(),
        "is_faculty": ptype == ProfileType::Faculty,
        "is_researcher": ptype == ProfileType::Researcher,
        "is_student": ptype == ProfileType::Student,
        "is_copi": record.get("role").and_then(Value::as_str) == Some("copi"),
        "record": record,
        "current_year": current_year(),
    })
}

pub async fn add_form(
    State(glob): State<Arc<Glob>>,
    Query(q): Query<TypeQuery>,
) -> Response {
    log::trace!("admin::add_form( {:?} ) called.", &q);

    let data = form_data(q.profile_type, "/addProfile", Value::Null);
    serve_template(&glob.templates, StatusCode::OK, "profile_form", &data)
}

pub async fn add_profile(
    State(glob): State<Arc<Glob>>,
    multipart: Multipart,
) -> Response {
    log::trace!("admin::add_profile( [ multipart ] ) called.");

    let mut sub = match read_submission(multipart).await {
        Ok(sub) => sub,
        Err(e) => { return respond_bad_request(e); },
    };
    let ptype = match sub.take_profile_type() {
        Ok(p) => p,
        Err(e) => { return respond_bad_request(e); },
    };
    let photo = sub.photo.take();
    let fields = match ProfileFields::from_form(ptype, sub.fields) {
        Ok(f) => f,
        Err(e) => { return respond_bad_request(e); },
    };

    let photo = match photo {
        Some(p) => p,
        None => {
            log::warn!("New {} {:?} submitted without a photo; not added.", &ptype, fields.name());
            return Redirect::to("/admin").into_response();
        },
    };
    let image = match ingest_or_respond(&glob, ptype, fields.name(), &photo).await {
        Ok(name) => name,
        Err(response) => { return response; },
    };

    let res = match &fields {
        ProfileFields::Faculty(f) => glob.store.insert_faculty(f, &image).await,
        ProfileFields::Researcher(r) => glob.store.insert_researcher(r, &image).await,
        ProfileFields::Student(s) => glob.store.insert_student(s, &image).await,
    };

    match res {
        Ok(_) => Redirect::to("/admin").into_response(),
        Err(e) => {
            log::error!("Error inserting {} {:?}: {}", &ptype, fields.name(), &e);
            html_500()
        },
    }
}

/// The `ptype` record with primary key `id`, as template data.
async fn find_record(
    glob: &Glob,
    ptype: ProfileType,
    id: i64,
) -> Result<Option<Value>, DbError> {
    match ptype {
        ProfileType::Faculty => glob.store.get_faculty_member(id).await
            .map(|r| r.map(|r| json!(r))),
        ProfileType::Researcher => glob.store.get_researcher(id).await
            .map(|r| r.map(|r| json!(r))),
        ProfileType::Student => glob.store.get_student(id).await
            .map(|r| r.map(|r| json!(r))),
    }
}

pub async fn edit_form(
    State(glob): State<Arc<Glob>>,
    Query(q): Query<ProfileRef>,
) -> Response {
    log::trace!("admin::edit_form( {:?} ) called.", &q);

    let record = match find_record(&glob, q.profile_type, q.id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return respond_bad_request(
                format!("There is no {} with id {}.", &q.profile_type, &q.id)
            );
        },
        Err(e) => {
            log::error!("Error retrieving {} {}: {}", &q.profile_type, &q.id, &e);
            return html_500();
        },
    };

    let data = form_data(q.profile_type, "/editProfile", record);
    serve_template(&glob.templates, StatusCode::OK, "profile_form", &data)
}

/// Like `add_profile()`, but the photo is optional; without one the
/// existing photo is kept. A rejected photo leaves the record untouched,
/// and an unknown id is refused before any photo is stored.
pub async fn edit_profile(
    State(glob): State<Arc<Glob>>,
    multipart: Multipart,
) -> Response {
    log::trace!("admin::edit_profile( [ multipart ] ) called.");

    let mut sub = match read_submission(multipart).await {
        Ok(sub) => sub,
        Err(e) => { return respond_bad_request(e); },
    };
    let (ptype, id) = match (sub.take_profile_type(), sub.take_id()) {
        (Ok(p), Ok(id)) => (p, id),
        (Err(e), _) | (_, Err(e)) => { return respond_bad_request(e); },
    };
    let photo = sub.photo.take();
    let fields = match ProfileFields::from_form(ptype, sub.fields) {
        Ok(f) => f,
        Err(e) => { return respond_bad_request(e); },
    };

    // Check before storing anything, so a bad id can't clobber a live photo.
    match find_record(&glob, ptype, id).await {
        Ok(Some(_)) => {},
        Ok(None) => {
            return respond_bad_request(format!("There is no {} with id {}.", &ptype, &id));
        },
        Err(e) => {
            log::error!("Error retrieving {} {}: {}", &ptype, &id, &e);
            return html_500();
        },
    }

    let image = match photo {
        None => None,
        Some(photo) => match ingest_or_respond(&glob, ptype, fields.name(), &photo).await {
            Ok(name) => Some(name),
            Err(response) => { return response; },
        },
    };

    let res = match &fields {
        ProfileFields::Faculty(f) =>
            glob.store.update_faculty(id, f, image.as_deref()).await,
        ProfileFields::Researcher(r) =>
            glob.store.update_researcher(id, r, image.as_deref()).await,
        ProfileFields::Student(s) =>
            glob.store.update_student(id, s, image.as_deref()).await,
    };

    match res {
        Ok(true) => {
            log::info!("Updated {} {} ({:?}).", &ptype, &id, fields.name());
            Redirect::to("/admin").into_response()
        },
        Ok(false) => respond_bad_request(
            format!("There is no {} with id {}.", &ptype, &id)
        ),
        Err(e) => {
            log::error!("Error updating {} {}: {}", &ptype, &id, &e);
            html_500()
        },
    }
}

pub async fn delete_profile(
    State(glob): State<Arc<Glob>>,
    Form(target): Form<ProfileRef>,
) -> Response {
    log::trace!("admin::delete_profile( {:?} ) called.", &target);

    let res = match target.profile_type {
        ProfileType::Faculty => glob.store.delete_faculty(target.id).await,
        ProfileType::Researcher => glob.store.delete_researcher(target.id).await,
        ProfileType::Student => glob.store.delete_student(target.id).await,
    };

    match res {
        Ok(true) => Redirect::to("/admin").into_response(),
        Ok(false) => respond_bad_request(
            format!("There is no {} with id {}.", &target.profile_type, &target.id)
        ),
        Err(e) => {
            log::error!("Error deleting {} {}: {}", &target.profile_type, &target.id, &e);
            html_500()
        },
    }
}
