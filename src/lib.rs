pub mod backtester;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod models;
pub mod param_utils;
pub mod performance;
pub mod report;
pub mod strategy;
