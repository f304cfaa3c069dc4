//! Live-session accounting and day-bucketed statistics for Discord voice
//! channels. Voice-state transitions flow through [`tracker`], which keeps
//! per-user session markers open in [`db`] and folds elapsed durations into
//! all-time and per-day aggregates on close; [`report`] merges stored totals
//! with still-open sessions so reads are accurate to the second.

pub mod activity;
pub mod cli;
pub mod config;
pub mod dayspan;
pub mod db;
pub mod ingest;
pub mod report;
pub mod timeutil;
pub mod tracker;
