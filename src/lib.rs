//! Bookkeeping for small farms: products, costs and sales, kept locally and
//! synced to a table backend, with profit reports over a period.

pub mod config;
pub mod db;
pub mod gateway;
pub mod models;
pub mod report;
pub mod server;
pub mod session;
pub mod store;
pub mod sync;
