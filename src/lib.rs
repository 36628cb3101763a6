pub mod compare;
pub mod config;
pub mod errors;
pub mod logo;
pub mod mapping;
pub mod merge;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod sources;
