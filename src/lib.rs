pub mod cli;
pub mod commands;
pub mod curate;
pub mod store;
pub mod utils;
