pub mod chunking;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod summarizer;
pub mod validation;
