// ABOUTME: Library module for mysql-backup-monitor
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod export;
pub mod mysql;
pub mod progress;
pub mod utils;
