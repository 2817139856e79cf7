pub mod app;
pub mod configs;
pub mod errors;
pub mod handles;
pub mod services;

pub use app::run;
