pub mod bybit;
pub mod exchange;
pub mod scan_state;
pub mod scanner;
pub mod telegram;
