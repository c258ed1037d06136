pub mod rest;

pub use rest::BinanceFeed;
