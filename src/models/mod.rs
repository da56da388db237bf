pub mod alert;
pub mod candle;
pub mod health;
pub mod scan;
pub mod timeframe;
