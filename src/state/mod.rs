//! State module for tracking crawl progress
//!
//! `RequestState` tracks each frontier request from discovery to its
//! terminal outcome; it is persisted so interrupted runs can resume.

mod request_state;

pub use request_state::RequestState;
