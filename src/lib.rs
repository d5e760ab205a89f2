//! Business-day scheduling with idempotent delay propagation.

pub mod engine;
