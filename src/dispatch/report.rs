//! Handler results and the response they accumulate into.

use std::path::PathBuf;

use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::dispatch::context::SharedState;

/// Final payload candidate a handler proposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBody {
    /// In-memory body.
    Output(Bytes),
    /// File streamed from disk.
    File(PathBuf),
}

/// What one handler did with the request.
///
/// `complete = true` stops the chain; everything else is merged into the
/// accumulating response and the chain moves on.
#[derive(Debug, Default)]
pub struct Report {
    pub complete: bool,
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Option<ReportBody>,
    /// Entries added to the request's shared state for later handlers.
    pub shared: SharedState,
}

impl Report {
    /// Nothing to contribute; let the next handler try.
    pub fn decline() -> Self {
        Self::default()
    }

    /// Final in-memory response.
    pub fn output(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::default()
            .with_status(status)
            .with_header(CONTENT_TYPE, content_type)
            .with_body(ReportBody::Output(body.into()))
            .completed()
    }

    /// Final response streamed from `path`.
    pub fn file(content_type: &str, path: impl Into<PathBuf>) -> Self {
        Self::default()
            .with_status(StatusCode::OK)
            .with_header(CONTENT_TYPE, content_type)
            .with_body(ReportBody::File(path.into()))
            .completed()
    }

    pub fn completed(mut self) -> Self {
        self.complete = true;
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a header. Values that are not valid header text are dropped.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: ReportBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_shared<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.shared.insert(value);
        self
    }

    pub fn output_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            Some(ReportBody::Output(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn filepath(&self) -> Option<&PathBuf> {
        match &self.body {
            Some(ReportBody::File(path)) => Some(path),
            _ => None,
        }
    }
}

/// Response accumulated across the chain.
#[derive(Debug, Default)]
pub struct ResponseDraft {
    pub complete: bool,
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Option<ReportBody>,
}

impl ResponseDraft {
    /// Fold one report in and hand back its shared-state contributions.
    pub fn merge(&mut self, report: Report) -> SharedState {
        merge_headers(&mut self.headers, report.headers);
        if report.status.is_some() {
            self.status = report.status;
        }
        if report.body.is_some() {
            self.body = report.body;
        }
        self.complete |= report.complete;
        report.shared
    }
}

/// Merge `incoming` into `target`: equal names are overwritten, except
/// `Set-Cookie`. Cookies are appended as separate header fields and never
/// joined into one value, since a joined value cannot be split back apart
/// (`Expires` dates contain commas).
pub fn merge_headers(target: &mut HeaderMap, incoming: HeaderMap) {
    let mut current: Option<HeaderName> = None;
    for (name, value) in incoming {
        match name {
            Some(name) => {
                if name == SET_COOKIE {
                    target.append(&name, value);
                } else {
                    target.insert(&name, value);
                }
                current = Some(name);
            }
            // further values of the header seen last
            None => {
                if let Some(name) = &current {
                    target.append(name, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CACHE_CONTROL;

    fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
        headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn plain_headers_are_overwritten() {
        let mut draft = ResponseDraft::default();
        draft.merge(Report::decline().with_header(HeaderName::from_static("x-foo"), "1"));
        draft.merge(Report::decline().with_header(HeaderName::from_static("x-foo"), "2"));
        assert_eq!(values(&draft.headers, "x-foo"), vec!["2"]);
    }

    #[test]
    fn cookies_accumulate() {
        let mut draft = ResponseDraft::default();
        draft.merge(Report::decline().with_header(SET_COOKIE, "a=1"));
        draft.merge(Report::decline().with_header(SET_COOKIE, "b=2"));
        assert_eq!(values(&draft.headers, "set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn multi_valued_header_in_one_report_survives() {
        let mut draft = ResponseDraft::default();
        draft.merge(Report::decline().with_header(CACHE_CONTROL, "old"));
        draft.merge(
            Report::decline()
                .with_header(CACHE_CONTROL, "no-cache")
                .with_header(CACHE_CONTROL, "no-store"),
        );
        assert_eq!(values(&draft.headers, "cache-control"), vec!["no-cache", "no-store"]);
    }

    #[test]
    fn latest_body_and_status_win() {
        let mut draft = ResponseDraft::default();
        draft.merge(Report::decline().with_body(ReportBody::Output(Bytes::from_static(b"a"))));
        draft.merge(Report::file("text/css", "/srv/site.css"));
        assert!(draft.complete);
        assert_eq!(draft.status, Some(StatusCode::OK));
        assert_eq!(draft.body, Some(ReportBody::File(PathBuf::from("/srv/site.css"))));
    }

    #[test]
    fn accessors_match_body_kind() {
        let report = Report::output(StatusCode::CREATED, "text/plain", "done");
        assert_eq!(report.output_bytes().map(|b| &b[..]), Some(&b"done"[..]));
        assert!(report.filepath().is_none());
        assert_eq!(report.status, Some(StatusCode::CREATED));
    }
}
