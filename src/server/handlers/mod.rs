pub mod config;
pub mod documents;
pub mod health;
pub mod index;
pub mod query;
pub mod summarize;
pub mod upload;
