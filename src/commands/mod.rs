pub mod backtest;
pub mod show_data;
