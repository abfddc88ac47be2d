//! Loanbook Backend Library
//!
//! Loan delinquency classification and portfolio statistics for the loan
//! back office, plus the HTTP surface the dashboards call.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod loan;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
