/*!
Interoperation between the client (browser) and server.

(Not the application and the database; that's covered by `store`.)
*/
use std::{
    fmt::Debug,
    sync::Arc,
};

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::{auth, config::Glob, render::current_year};

pub mod admin;
pub mod public;

static HTML_500: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Impact | Error</title>
<link rel="stylesheet" href="/static/site.css">
</head>
<body>
<h1>Internal Server Error</h1>
<p>(Error 500)</p>
<p>Something went wrong on our end. No further or more
helpful information is available about the problem.</p>
</body>
</html>"#;

/// Shown on any failed login, whichever of the two fields was wrong.
pub static BAD_LOGIN_MESSAGE: &str = "Incorrect username or password.";

/**
Return an HTML response in the case of an unrecoverable* error.

(*"Unrecoverable" from the perspective of fielding the current request,
not from the perspective of the program crashing.)
*/
pub fn html_500() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(HTML_500)
    ).into_response()
}

pub fn serve_template<S>(
    templates: &Handlebars,
    code: StatusCode,
    template_name: &str,
    data: &S,
) -> Response
where
    S: Serialize + Debug
{
    log::trace!("serve_template( {}, {:?}, ... ) called.", &code, template_name);

    match templates.render(template_name, data) {
        Ok(response_body) => (
            code,
            Html(response_body)
        ).into_response(),
        Err(e) => {
            log::error!(
                "Error rendering template {:?} with data {:?}:\n{}",
                template_name, data, &e
            );
            html_500()
        },
    }
}

pub fn respond_bad_password(templates: &Handlebars) -> Response {
    log::trace!("respond_bad_password() called.");

    let data = json!({
        "error_message": BAD_LOGIN_MESSAGE,
        "current_year": current_year(),
    });

    serve_template(
        templates,
        StatusCode::UNAUTHORIZED,
        "admin_login",
        &data,
    )
}

pub fn respond_bad_request(msg: String) -> Response {
    log::trace!("respond_bad_request( {:?} ) called.", &msg);

    (
        StatusCode::BAD_REQUEST,
        msg
    ).into_response()
}

/// Middleware guarding the admin routes: anyone without the session flag
/// gets sent to the login page.
pub async fn require_admin(
    session: Session,
    req: Request,
    next: Next,
) -> Response {
    match auth::is_authenticated(&session).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            log::trace!("Unauthenticated request for {}; redirecting to login.", req.uri());
            Redirect::to("/adminLogin").into_response()
        },
        Err(e) => {
            log::error!("Error reading session for {}: {}", req.uri(), &e);
            html_500()
        },
    }
}

/// Assemble the whole site.
pub fn router(glob: Arc<Glob>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(
            time::Duration::minutes(glob.session_minutes)
        ));

    let gated = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/addProfile", get(admin::add_form).post(admin::add_profile))
        .route("/editProfile", get(admin::edit_form).post(admin::edit_profile))
        .route("/deleteProfile", post(admin::delete_profile))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(public::home))
        .route("/faculty", get(public::faculty))
        .route("/jplResearchers", get(public::researchers))
        .route("/students", get(public::students))
        .route("/adminLogin", get(admin::login_page).post(admin::login))
        .route("/adminLogout", get(admin::logout))
        .merge(gated)
        .nest_service("/static", ServeDir::new(&glob.static_dir))
        .nest_service("/images", ServeDir::new(&glob.upload_root))
        .layer(DefaultBodyLimit::max(glob.max_upload_bytes))
        .layer(session_layer)
        .with_state(glob)
}
