pub mod config;
pub mod error;
pub mod export;
pub mod ipc;
pub mod schedule;
pub mod store;
pub mod timetable;
