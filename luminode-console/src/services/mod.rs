pub mod command_service;
pub mod subscriber_service;
