//! Per-call permissions for the path grammar.

use serde::{Deserialize, Serialize};

/// An immutable set of path dialect permissions, built once per call.
///
/// Each `allow_*` constructor consumes and returns the set, so a call site
/// reads as a single expression:
///
/// ```
/// use nxfs_path::PathFlags;
///
/// let flags = PathFlags::new().allow_mount_name().allow_relative_path();
/// assert!(flags.is_mount_name_allowed());
/// assert!(!flags.is_windows_path_allowed());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFlags {
    windows_path: bool,
    relative_path: bool,
    empty_path: bool,
    mount_name: bool,
    backslash: bool,
    all_characters: bool,
}

impl PathFlags {
    pub const fn new() -> Self {
        Self {
            windows_path: false,
            relative_path: false,
            empty_path: false,
            mount_name: false,
            backslash: false,
            all_characters: false,
        }
    }

    /// Drive-letter and UNC forms are recognized.
    pub const fn allow_windows_path(mut self) -> Self {
        self.windows_path = true;
        self
    }

    /// The path may begin with `./` or `.` (not `../`).
    pub const fn allow_relative_path(mut self) -> Self {
        self.relative_path = true;
        self
    }

    /// Empty input is a success returning empty output.
    pub const fn allow_empty_path(mut self) -> Self {
        self.empty_path = true;
        self
    }

    /// A `name:` prefix of up to 15 name bytes is accepted.
    pub const fn allow_mount_name(mut self) -> Self {
        self.mount_name = true;
        self
    }

    /// Backslashes in the body are data bytes, not separators.
    pub const fn allow_backslash(mut self) -> Self {
        self.backslash = true;
        self
    }

    /// Disables the reserved-character check (`:*?<>|`).
    pub const fn allow_all_characters(mut self) -> Self {
        self.all_characters = true;
        self
    }

    pub const fn is_windows_path_allowed(&self) -> bool {
        self.windows_path
    }

    pub const fn is_relative_path_allowed(&self) -> bool {
        self.relative_path
    }

    pub const fn is_empty_path_allowed(&self) -> bool {
        self.empty_path
    }

    pub const fn is_mount_name_allowed(&self) -> bool {
        self.mount_name
    }

    pub const fn is_backslash_allowed(&self) -> bool {
        self.backslash
    }

    pub const fn are_all_characters_allowed(&self) -> bool {
        self.all_characters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_denies_everything() {
        let flags = PathFlags::new();
        assert!(!flags.is_windows_path_allowed());
        assert!(!flags.is_relative_path_allowed());
        assert!(!flags.is_empty_path_allowed());
        assert!(!flags.is_mount_name_allowed());
        assert!(!flags.is_backslash_allowed());
        assert!(!flags.are_all_characters_allowed());
        assert_eq!(flags, PathFlags::default());
    }

    #[test]
    fn test_constructors_are_independent() {
        let flags = PathFlags::new().allow_windows_path().allow_backslash();
        assert!(flags.is_windows_path_allowed());
        assert!(flags.is_backslash_allowed());
        assert!(!flags.is_mount_name_allowed());
    }

    #[test]
    fn test_serde_round_trip() {
        let flags = PathFlags::new().allow_mount_name().allow_all_characters();
        let json = serde_json::to_string(&flags).unwrap();
        let parsed: PathFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flags);

        // Missing fields deserialize to the deny default.
        let parsed: PathFlags = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, PathFlags::new());
    }
}
