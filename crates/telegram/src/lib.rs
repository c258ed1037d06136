pub mod alert;

pub use alert::{parse_recipient, TelegramAlerter};
