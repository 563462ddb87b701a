//! Yahoo Finance data adapter

mod client;
mod models;
mod parser;

pub use client::YahooFinanceClient;
pub use models::*;
