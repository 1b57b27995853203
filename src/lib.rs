#![forbid(unsafe_code)]

pub mod api;
pub mod backup;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod formats;
pub mod keys;
pub mod kv;
pub mod logging;
pub mod reader;
pub mod shelf;
