//! Data models for Globe

mod country;
mod currency;

pub use country::Country;
pub use currency::Currency;
