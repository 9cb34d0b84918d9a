//! Daily bar sources for the price history pipeline.
//!
//! A [`providers::DataProvider`] turns a symbol into a [`models::bar::DailySeries`];
//! [`providers::alpha_vantage`] is the REST implementation used in production.

pub mod models;
pub mod providers;
