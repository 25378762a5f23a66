use toml::Value;

/// Errors raised while walking a nested table/array tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A key or index along the path is absent.
    #[error("no value found at path '{path}'")]
    NotFound {
        /// The path up to and including the missing component.
        path: String,
    },

    /// A node exists but is not the kind of value the path requires.
    #[error("type mismatch at '{path}': expected {expected}, found {actual}")]
    TypeMismatch {
        /// Path of the offending node.
        path: String,
        /// What the traversal needed at that node.
        expected: &'static str,
        /// What was actually there.
        actual: &'static str,
    },

    /// An insert was requested with no path components.
    #[error("cannot insert at an empty path")]
    EmptyPath,
}

impl PathError {
    pub(super) fn not_found(path_so_far: &[&str]) -> Self {
        PathError::NotFound {
            path: path_so_far.join("."),
        }
    }

    pub(super) fn type_mismatch(path: &[&str], expected: &'static str, actual: &Value) -> Self {
        PathError::TypeMismatch {
            path: path.join("."),
            expected,
            actual: actual.type_str(),
        }
    }
}
