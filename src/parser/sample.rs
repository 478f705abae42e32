//! Built-in sample log.
//!
//! A contact update that fires its before-update trigger twice (once
//! recursively through a nested DML), hits a duplicate-detection exception,
//! then runs the after-update trigger with two queries.

pub const SAMPLE_LOG: &str = include_str!("sample_contact_update.log");

/// File name reported for documents built from the sample
pub const SAMPLE_SOURCE_NAME: &str = "sample_contact_update.log";
