//! One-shot transient notifications ("flash" messages).
//!
//! The guard and the form handlers occasionally need to tell the user
//! something across a redirect: access denied, logged out, application
//! received. The message rides in a short-lived cookie attached to the
//! redirect response and is cleared by the first page that renders it, so it
//! displays exactly once.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

const FLASH_COOKIE: &str = "portal_flash";

/// Severity tag for a transient notification. Drives styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Severity::Info),
            "success" => Some(Severity::Success),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

/// Flash
///
/// A fire-and-forget notification with a title, description and severity tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Flash {
    pub fn info(title: &str, description: &str) -> Self {
        Self::new(Severity::Info, title, description)
    }

    pub fn success(title: &str, description: &str) -> Self {
        Self::new(Severity::Success, title, description)
    }

    pub fn error(title: &str, description: &str) -> Self {
        Self::new(Severity::Error, title, description)
    }

    fn new(severity: Severity, title: &str, description: &str) -> Self {
        Self {
            severity,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    // Flash content is always a server-authored constant, never user input,
    // so a plain delimited encoding is cookie-safe without an escaping layer.
    fn encode(&self) -> String {
        format!("{}|{}|{}", self.severity.as_str(), self.title, self.description)
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, '|');
        let severity = Severity::parse(parts.next()?)?;
        let title = parts.next()?.to_string();
        let description = parts.next()?.to_string();
        Some(Self {
            severity,
            title,
            description,
        })
    }
}

/// set
///
/// Attaches a flash to an outgoing cookie jar. The cookie is session-scoped
/// and HttpOnly is deliberately off: the value is rendered back into the page,
/// not a credential.
pub fn set(jar: CookieJar, flash: &Flash) -> CookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(5));
    jar.add(cookie)
}

/// take
///
/// Reads and clears the pending flash, if any. Returns the updated jar (with
/// the removal queued) together with the decoded message. Malformed cookie
/// values are dropped silently.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| Flash::decode(cookie.value()));

    if jar.get(FLASH_COOKIE).is_some() {
        let removal = Cookie::build((FLASH_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(Duration::ZERO);
        (jar.add(removal), flash)
    } else {
        (jar, None)
    }
}
