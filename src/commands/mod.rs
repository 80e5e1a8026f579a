pub mod config;
pub mod discover;
pub mod login;
pub mod profile;
pub mod scrape;
pub mod serve;
pub mod utils;
pub mod version;
