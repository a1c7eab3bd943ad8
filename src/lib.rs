pub mod analyzer;
pub mod api;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod session;
pub mod store;
pub mod timetable;
