pub mod candle;
pub mod config;
pub mod indicators;
pub mod reference;
pub mod sweep;
