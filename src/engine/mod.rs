//! Core engine modules for slipway.

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod grouping;
pub mod locks;
pub mod overdue;
pub mod reconcile;
pub mod repo;
pub mod scheduler;
pub mod segments;
pub mod types;
