pub mod ast;
pub mod cli;
pub mod config;
pub mod context;
pub mod inliner;
pub mod logger;
