pub mod cli;
pub mod cloud_providers;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod spot;
pub mod utils;
