pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod queries;
pub mod schema;
pub mod seed;
