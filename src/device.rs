/*!
Classifying the requesting browser as mobile or desktop, which controls image
and heading sizes on the listing pages.

The class is worked out once per request by the `DeviceClass` extractor and
then passed along explicitly.
*/
use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

const MOBILE_MARKERS: &[&str] = &["android", "iphone", "ipad"];
const DESKTOP_MARKERS: &[&str] = &["windows", "macos", "macintosh"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
    Unknown,
}

impl DeviceClass {
    /// Case-insensitive substring match against a small fixed vocabulary.
    /// Mobile markers win over desktop ones.
    pub fn from_user_agent(user_agent: &str) -> DeviceClass {
        let ua = user_agent.to_ascii_lowercase();

        if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Mobile
        } else if DESKTOP_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Desktop
        } else {
            DeviceClass::Unknown
        }
    }

    pub fn is_mobile(self) -> bool { self == DeviceClass::Mobile }
}

impl<S: Send + Sync> FromRequestParts<S> for DeviceClass {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S
    ) -> Result<Self, Self::Rejection> {
        let ua = parts.headers.get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let class = DeviceClass::from_user_agent(ua);
        log::trace!("User agent {:?} classified as {:?}.", ua, &class);
        Ok(class)
    }
}
