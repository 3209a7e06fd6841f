//! Command handlers and the display helpers they share.

pub mod approve;
pub mod delete;
pub mod init;
pub mod list;
pub mod report;
pub mod show;
pub mod status;
pub mod submit;
pub mod task;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use rusqlite::Connection;
use serde::Serialize;
use techdash::engine::resolver::RequestResolver;
use techdash::{Request, RequestStatus};

/// Colours `text` with the status's `color_hint`.
pub fn paint(status: RequestStatus, text: &str) -> ColoredString {
    match status.color_hint() {
        "green" => text.green(),
        "red" => text.red(),
        "yellow" => text.yellow(),
        "orange" => text.truecolor(255, 140, 0),
        _ => text.dimmed(),
    }
}

pub fn status_badge(status: RequestStatus) -> ColoredString {
    paint(status, &status.to_string())
}

/// Hours shown to one decimal place, as on the original dashboard.
pub fn fmt_hours(hours: f64) -> String {
    format!("{hours:.1}")
}

/// Resolves a request reference, logging fuzzy matches.
pub fn resolve(conn: &Connection, query: &str, strict: bool) -> Result<Request> {
    let resolver = if strict {
        RequestResolver::strict(conn)
    } else {
        RequestResolver::new(conn)
    };
    let result = resolver.resolve(query)?;
    if result.confidence < 1.0 {
        tracing::info!(
            query,
            request_id = result.request.id,
            confidence = result.confidence,
            "resolved by fuzzy match"
        );
    }
    Ok(result.request)
}

/// A request plus its derived hour figures, for `--json` output.
#[derive(Serialize)]
pub struct RequestView<'a> {
    #[serde(flatten)]
    pub request: &'a Request,
    pub approved_hours: f64,
    pub requested_hours: f64,
}

impl<'a> RequestView<'a> {
    pub fn new(request: &'a Request) -> Self {
        Self {
            request,
            approved_hours: request.approved_hours(),
            requested_hours: request.requested_hours(),
        }
    }
}
