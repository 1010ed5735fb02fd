pub mod commands;
pub mod config;
pub mod drawing_cache;
pub mod env;
pub mod ui_manager;

#[cfg(test)]
mod tests;
