use serde::de::DeserializeOwned;
use toml::{Value, map::Map};

use super::PathError;

const CONTAINER: &str = "table or array";

/// Splits a dot-separated path into components. The empty string is the
/// empty path.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Checks if a dotted path matches a pattern
///
/// A `*` segment matches any single segment; the pattern `"*"` on its own
/// matches every path.
///
/// # Examples
/// * `"server.port"` matches `"server.port"`
/// * `"server.port"` matches `"server.*"`
/// * `"server.port"` does not match `"server"`
pub fn path_matches(path: &str, pattern: &str) -> bool {
    const WILDCARD: &str = "*";

    if pattern == WILDCARD {
        return true;
    }

    let path_parts = split_path(path);
    let pattern_parts = split_path(pattern);

    path_parts.len() == pattern_parts.len()
        && path_parts
            .iter()
            .zip(pattern_parts.iter())
            .all(|(path_part, pattern_part)| {
                *pattern_part == WILDCARD || path_part == pattern_part
            })
}

/// Borrows the value at `path`. The empty path yields `root`.
///
/// # Errors
/// * `PathError::NotFound` - If a key is absent or an index is out of bounds
/// * `PathError::TypeMismatch` - If an intermediate node cannot be navigated
pub fn get_at<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, PathError> {
    let mut current = root;

    for (i, key) in path.iter().enumerate() {
        current = navigate_step(current, key, &path[..=i])?;
    }

    Ok(current)
}

/// Returns a copy of the value at a dot-separated path.
///
/// # Errors
/// See [`get_at`].
pub fn get_by_path(root: &Value, path: &str) -> Result<Value, PathError> {
    get_at(root, &split_path(path)).cloned()
}

/// Writes `new_value` at `path`, creating missing intermediate tables.
///
/// Array elements can be replaced but not appended.
///
/// # Arguments
/// * `root` - The root TOML value to modify
/// * `path` - Path components, table keys or array indices
/// * `new_value` - The value to insert at the path
///
/// # Errors
/// * `PathError::EmptyPath` - If `path` has no components
/// * `PathError::NotFound` - If an array index is out of bounds
/// * `PathError::TypeMismatch` - If an intermediate node is not a container
pub fn insert_at(root: &mut Value, path: &[&str], new_value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(PathError::EmptyPath);
    };

    let mut current = root;
    for (i, key) in parents.iter().enumerate() {
        current = navigate_step_mut(current, key, &path[..=i])?;
    }

    insert_value(current, last, new_value, path)
}

/// Dot-separated form of [`insert_at`].
///
/// # Errors
/// See [`insert_at`].
pub fn insert_by_path(root: &mut Value, path: &str, new_value: Value) -> Result<(), PathError> {
    insert_at(root, &split_path(path), new_value)
}

/// Deserializes the value at `path` into `T`.
///
/// # Arguments
/// * `root` - The root TOML value to read from
/// * `path` - Dot-separated path (e.g., "general.ports.0")
///
/// # Errors
/// * `PathError::TypeMismatch` - If the value cannot be deserialized into `T`
/// * Any error from [`get_at`]
pub fn extract<T>(root: &Value, path: &str) -> Result<T, PathError>
where
    T: DeserializeOwned,
{
    let value = get_by_path(root, path)?;
    let actual = value.type_str();

    T::deserialize(value).map_err(|_| PathError::TypeMismatch {
        path: path.to_string(),
        expected: std::any::type_name::<T>(),
        actual,
    })
}

fn parse_index(key: &str, path_so_far: &[&str], array: &Value) -> Result<usize, PathError> {
    key.parse::<usize>()
        .map_err(|_| PathError::type_mismatch(parent_of(path_so_far), "table", array))
}

fn parent_of<'p, 'a>(path_so_far: &'p [&'a str]) -> &'p [&'a str] {
    path_so_far.split_last().map_or(path_so_far, |(_, parent)| parent)
}

fn navigate_step<'a>(
    current: &'a Value,
    key: &str,
    path_so_far: &[&str],
) -> Result<&'a Value, PathError> {
    match current {
        Value::Table(table) => table
            .get(key)
            .ok_or_else(|| PathError::not_found(path_so_far)),
        Value::Array(array) => {
            let index = parse_index(key, path_so_far, current)?;
            array
                .get(index)
                .ok_or_else(|| PathError::not_found(path_so_far))
        }
        other => Err(PathError::type_mismatch(
            parent_of(path_so_far),
            CONTAINER,
            other,
        )),
    }
}

fn navigate_step_mut<'a>(
    current: &'a mut Value,
    key: &str,
    path_so_far: &[&str],
) -> Result<&'a mut Value, PathError> {
    match current {
        Value::Table(table) => {
            if !table.contains_key(key) {
                table.insert(key.to_string(), Value::Table(Map::new()));
            }

            table
                .get_mut(key)
                .ok_or_else(|| PathError::not_found(path_so_far))
        }
        Value::Array(array) => {
            let index = key.parse::<usize>().map_err(|_| PathError::TypeMismatch {
                path: parent_of(path_so_far).join("."),
                expected: "table",
                actual: "array",
            })?;

            array
                .get_mut(index)
                .ok_or_else(|| PathError::not_found(path_so_far))
        }
        other => Err(PathError::type_mismatch(
            parent_of(path_so_far),
            CONTAINER,
            other,
        )),
    }
}

fn insert_value(
    container: &mut Value,
    key: &str,
    new_value: Value,
    path: &[&str],
) -> Result<(), PathError> {
    match container {
        Value::Table(table) => {
            table.insert(key.to_string(), new_value);
            Ok(())
        }
        Value::Array(array) => {
            let index = key.parse::<usize>().map_err(|_| PathError::TypeMismatch {
                path: parent_of(path).join("."),
                expected: "table",
                actual: "array",
            })?;

            array
                .get_mut(index)
                .map(|slot| *slot = new_value)
                .ok_or_else(|| PathError::not_found(path))
        }
        other => Err(PathError::type_mismatch(parent_of(path), CONTAINER, other)),
    }
}
