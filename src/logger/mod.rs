//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Per-request diagnostics and access logging
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{AccessLogFormat, Config, LogLevel};
use hyper::Method;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Lines above the configured level are dropped; `Info` before `init`
fn enabled(level: LogLevel) -> bool {
    let max = writer::get().map_or(LogLevel::Info, writer::LogWriter::level);
    level <= max
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info("======================================");
    write_info("Item server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    match config.server.workers {
        Some(workers) => write_info(&format!("Worker threads: {workers}")),
        None => write_info("Worker threads: CPU cores"),
    }
    if let Some(max) = config.performance.max_connections {
        write_info(&format!("Max connections: {max}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

/// Diagnostic line written for every request before it is dispatched
pub fn log_request(method: &Method, path: &str) {
    if enabled(LogLevel::Info) {
        write_info(&request_line(method, path));
    }
}

fn request_line(method: &Method, path: &str) -> String {
    format!("Received request: {method} {path}")
}

pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    if let Some(w) = writer::get() {
        w.write_access(&entry.format(format));
    } else {
        println!("{}", entry.format(format));
    }
}

pub fn log_shutdown(active_connections: usize) {
    log_info(&format!(
        "Shutdown requested, {active_connections} connection(s) still active"
    ));
}
