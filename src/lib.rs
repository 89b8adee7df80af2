//! Exports reports from a Gizmo facility-management server into a Google
//! Sheets spreadsheet.

pub mod apis;
pub mod config;
pub mod duration;
pub mod format;
pub mod request_args;
pub mod tools;
