/*!
Turning records into HTML.

Each listing page is built from one fragment per record, rendered with a
per-type card template and concatenated in query order. The page template
then embeds the concatenated fragments unescaped (`{{{cards}}}`); all record
fields were already HTML-escaped by Handlebars when the fragments were
rendered, so free text like bios can't inject markup.
*/
use std::path::Path;

use handlebars::{Handlebars, RenderError};
use serde::Serialize;

use crate::device::DeviceClass;

/// Every template the site uses. Each lives in `<template_dir>/<name>.html`.
pub static TEMPLATE_NAMES: &[&str] = &[
    "header",
    "footer",
    "index",
    "faculty",
    "jpl_researchers",
    "students",
    "admin",
    "admin_login",
    "profile_form",
    "faculty_card",
    "researcher_card",
    "student_card",
];

/// The listing pages whose heading size depends on the device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Page {
    Faculty,
    Researchers,
    Students,
}

/**
Load and register all templates from `template_dir`.

Fails on the first template that is missing or doesn't parse, so a broken
deploy is caught at startup rather than on first request.
*/
pub fn load_templates<P: AsRef<Path>>(template_dir: P) -> Result<Handlebars<'static>, String> {
    let template_dir = template_dir.as_ref();
    log::trace!("load_templates( {} ) called.", template_dir.display());

    let mut h = Handlebars::new();
    #[cfg(debug_assertions)]
    h.set_dev_mode(true);

    for name in TEMPLATE_NAMES.iter() {
        let path = template_dir.join(format!("{}.html", name));
        h.register_template_file(name, &path)
            .map_err(|e| format!(
                "Error registering template {}: {}",
                path.display(), &e
            ))?;
    }

    log::info!(
        "Registered {} templates from {}.",
        TEMPLATE_NAMES.len(), template_dir.display()
    );
    Ok(h)
}

/// Width and height of profile photos on the faculty and JPL pages.
pub fn photo_size(device: DeviceClass) -> &'static str {
    if device.is_mobile() { "250px" } else { "400px" }
}

pub fn title_font_size(page: Page, device: DeviceClass) -> &'static str {
    match (page, device.is_mobile()) {
        (Page::Researchers, true) => "45px",
        (_, true) => "65px",
        (_, false) => "105px",
    }
}

/// For the footer.
pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

#[derive(Serialize)]
struct Fragment<'a, T: Serialize> {
    #[serde(flatten)]
    record: &'a T,
    width: &'a str,
    height: &'a str,
}

/**
Render `template` once per record and concatenate the results in order.

The record's fields are available to the template by name, along with
`width` and `height` for the photo, sized for `device`.
*/
pub fn render_fragments<T: Serialize>(
    templates: &Handlebars,
    template: &str,
    records: &[T],
    device: DeviceClass,
) -> Result<String, RenderError> {
    log::trace!(
        "render_fragments( [ templates ], {:?}, [ {} records ], {:?} ) called.",
        template, records.len(), &device
    );

    let size = photo_size(device);
    let mut assembled = String::new();
    for record in records.iter() {
        let frag = Fragment { record, width: size, height: size };
        assembled.push_str(&templates.render(template, &frag)?);
    }

    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Faculty, FacultyRole, Student};
    use crate::tests::ensure_logging;

    fn templates() -> Handlebars<'static> {
        ensure_logging();
        load_templates(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")).unwrap()
    }

    fn faculty(id: i64, name: &str, bio: &str) -> Faculty {
        Faculty {
            id,
            name: name.to_owned(),
            title: "Professor".to_owned(),
            school: "FSU".to_owned(),
            email: "prof@example.edu".to_owned(),
            bio: bio.to_owned(),
            image: format!("{}.jpg", name),
            link: "https://example.edu".to_owned(),
            role: FacultyRole::Pi,
        }
    }

    #[test]
    fn sizes_follow_device() {
        assert_eq!(photo_size(DeviceClass::Mobile), "250px");
        assert_eq!(photo_size(DeviceClass::Desktop), "400px");
        assert_eq!(photo_size(DeviceClass::Unknown), "400px");

        assert_eq!(title_font_size(Page::Faculty, DeviceClass::Mobile), "65px");
        assert_eq!(title_font_size(Page::Researchers, DeviceClass::Mobile), "45px");
        assert_eq!(title_font_size(Page::Students, DeviceClass::Desktop), "105px");
    }

    #[test]
    fn missing_template_dir() {
        ensure_logging();
        assert!(load_templates("/definitely/not/a/template/dir").is_err());
    }

    #[test]
    fn fragments_in_order_and_sized() {
        let h = templates();
        let members = vec![
            faculty(1, "Alpha", "First."),
            faculty(2, "Beta", "Second."),
        ];

        let mobile = render_fragments(&h, "faculty_card", &members, DeviceClass::Mobile).unwrap();
        let a = mobile.find("Alpha").unwrap();
        let b = mobile.find("Beta").unwrap();
        assert!(a < b);
        assert!(mobile.contains(r#"width="250px""#));
        assert!(mobile.contains("Faculty/Alpha.jpg"));
        assert!(mobile.contains("https://example.edu"));

        let desktop = render_fragments(&h, "faculty_card", &members, DeviceClass::Desktop).unwrap();
        assert!(desktop.contains(r#"height="400px""#));
        assert!(!desktop.contains("250px"));

        let none: Vec<Faculty> = Vec::new();
        assert_eq!(render_fragments(&h, "faculty_card", &none, DeviceClass::Desktop).unwrap(), "");
    }

    #[test]
    fn free_text_is_escaped() {
        let h = templates();
        let members = vec![faculty(1, "<b>Eve</b>", "<script>alert(1)</script>")];

        let html = render_fragments(&h, "faculty_card", &members, DeviceClass::Desktop).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>Eve</b>"));
    }

    #[test]
    fn student_fragments() {
        let h = templates();
        let students = vec![Student {
            id: 3,
            name: "Gus".to_owned(),
            tier: "Undergraduate".to_owned(),
            image: "Gus.png".to_owned(),
            school: "NCCU".to_owned(),
            email: "gus@example.edu".to_owned(),
        }];

        let html = render_fragments(&h, "student_card", &students, DeviceClass::Mobile).unwrap();
        assert!(html.contains("Gus"));
        assert!(html.contains("Undergraduate"));
        assert!(html.contains("Students/Gus.png"));
    }
}
