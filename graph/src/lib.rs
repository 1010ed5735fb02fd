pub mod clipboard;
pub mod connection_manager;
pub mod document;
pub mod elements;
pub mod evaluation;
pub mod group;
pub mod merge;
pub mod node;
pub mod node_collection;
pub mod node_lib;
pub mod node_manager;
pub mod prelude;
pub mod slot;
pub mod undo;
pub mod value;
pub mod value_cache;

#[cfg(test)]
mod tests;
