//! Access log line rendering
//!
//! `combined` and `common` follow the Apache/Nginx layouts; `json` emits one
//! object per line.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::AccessLogFormat;

/// One served request, captured after the response is built
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

fn serialize_time<S: serde::Serializer>(
    time: &DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339())
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn format(&self, format: AccessLogFormat) -> String {
        match format {
            AccessLogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            AccessLogFormat::Common => self.format_common(),
            AccessLogFormat::Json => serde_json::to_string(self)
                .unwrap_or_else(|e| format!(r#"{{"error":"unserializable access entry: {e}"}}"#)),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        let query = self
            .query
            .as_ref()
            .map(|q| format!("?{q}"))
            .unwrap_or_default();
        format!(
            "{} - - [{}] \"{} {}{} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            query,
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "POST".to_string(),
            "/items".to_string(),
        );
        entry.query = Some("dry=1".to_string());
        entry.status = 201;
        entry.body_bytes = 8;
        entry.referer = Some("https://example.com".to_string());
        entry.user_agent = Some("curl/8.5".to_string());
        entry.request_time_us = 420;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = sample_entry().format(AccessLogFormat::Combined);
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"POST /items?dry=1 HTTP/1.1\" 201 8"));
        assert!(log.ends_with("\"https://example.com\" \"curl/8.5\""));
    }

    #[test]
    fn test_format_common_omits_headers() {
        let log = sample_entry().format(AccessLogFormat::Common);
        assert!(log.contains("\"POST /items?dry=1 HTTP/1.1\" 201 8"));
        assert!(!log.contains("curl/8.5"));
    }

    #[test]
    fn test_format_json() {
        let log = sample_entry().format(AccessLogFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["status"], 201);
        assert_eq!(value["query"], "dry=1");
        assert_eq!(value["request_time_us"], 420);
    }

    #[test]
    fn test_missing_headers_render_as_dash() {
        let entry = AccessLogEntry::new("::1".to_string(), "GET".to_string(), "/".to_string());
        let log = entry.format(AccessLogFormat::Combined);
        assert!(log.ends_with("\"-\" \"-\""));
    }
}
