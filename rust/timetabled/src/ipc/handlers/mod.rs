pub mod core;
pub mod export;
pub mod roster;
pub mod setup;
pub mod timetables;
