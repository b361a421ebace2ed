pub mod config;
pub mod models;
pub mod router;
pub mod services;
pub mod session;
pub mod tabbar;
pub mod utils;
