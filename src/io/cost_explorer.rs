pub mod client;
pub mod dtos;
