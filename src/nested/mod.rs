//! Key-path access into nested TOML tables and arrays.
//!
//! Independent of [`crate::store`]: these are plain functions over
//! [`toml::Value`] trees. Path components address table keys or decimal
//! array indices.

mod error;
mod path_ops;


pub use error::PathError;
pub use path_ops::{
    extract, get_at, get_by_path, insert_at, insert_by_path, path_matches, split_path,
};
