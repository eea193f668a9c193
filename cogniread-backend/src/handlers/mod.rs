pub mod dto;
pub mod embed;
pub mod health;
pub mod ingest;
pub mod tasks;

pub mod utils;
