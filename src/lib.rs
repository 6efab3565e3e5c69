pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod index;
pub mod pipeline;
pub mod scanner;
pub mod search;
pub mod server;
pub mod vocabulary;
