pub mod add;
pub mod catalog;
pub mod common;
pub mod completions;
pub mod config;
pub mod init;
pub mod list;
pub mod remove;
pub mod search;
pub mod show;
pub mod toggle;
