//! JSON-file-backed persistence

pub mod jsonstore;
pub mod prefs;
