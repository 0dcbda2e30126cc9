//! Byte classification for path parsing.
//!
//! Paths are byte strings whose structural characters are all ASCII; these
//! predicates decide which bytes separate segments, which terminate a mount
//! name, and which are reserved outside an allow-all-characters context.

use nxfs_types::{FsCode, Result};

use crate::util::reject;

pub const DIRECTORY_SEPARATOR: u8 = b'/';
pub const ALT_DIRECTORY_SEPARATOR: u8 = b'\\';
pub const DRIVE_SEPARATOR: u8 = b':';
pub const DOT: u8 = b'.';
pub const NUL: u8 = 0;

/// Longest mount name, excluding the terminating `:`.
pub const MOUNT_NAME_LENGTH_MAX: usize = 15;

/// Reserved bytes, rejected in path bodies.
const INVALID_CHARACTERS: &[u8] = b":*?<>|";

/// Bytes rejected inside a UNC host name. `?` is permitted there (Win32
/// namespace hosts use it); `$` is not.
const INVALID_CHARACTERS_FOR_HOST_NAME: &[u8] = b":*<>|$";

/// Bytes rejected inside a mount name. `:` terminates the name instead of
/// being reserved.
const INVALID_CHARACTERS_FOR_MOUNT_NAME: &[u8] = b"*?<>|";

pub fn is_separator(c: u8) -> bool {
    c == DIRECTORY_SEPARATOR
}

pub fn is_nul(c: u8) -> bool {
    c == NUL
}

pub fn is_drive_letter(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Reject reserved bytes (`:*?<>|`) with `InvalidCharacter`.
pub fn check_invalid_character(c: u8) -> Result<()> {
    if INVALID_CHARACTERS.contains(&c) {
        return reject(FsCode::INVALID_CHARACTER);
    }
    Ok(())
}

pub fn check_host_name_character(c: u8) -> Result<()> {
    if INVALID_CHARACTERS_FOR_HOST_NAME.contains(&c) {
        return reject(FsCode::INVALID_CHARACTER);
    }
    Ok(())
}

pub fn check_mount_name_character(c: u8) -> Result<()> {
    if INVALID_CHARACTERS_FOR_MOUNT_NAME.contains(&c) {
        return reject(FsCode::INVALID_CHARACTER);
    }
    Ok(())
}

/// A `.` segment: a dot followed by the end of the string or a `/`.
/// A backslash does not terminate the segment here.
pub fn is_current_directory(path: &[u8]) -> bool {
    if path.is_empty() {
        return false;
    }
    path[0] == DOT && (path.len() < 2 || path[1] == NUL || path[1] == DIRECTORY_SEPARATOR)
}

/// A `..` segment, with the same terminator rule as [`is_current_directory`].
pub fn is_parent_directory(path: &[u8]) -> bool {
    if path.len() < 2 {
        return false;
    }
    path[0] == DOT
        && path[1] == DOT
        && (path.len() < 3 || path[2] == NUL || path[2] == DIRECTORY_SEPARATOR)
}

pub fn is_path_start_with_current_directory(path: &[u8]) -> bool {
    is_current_directory(path) || is_parent_directory(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_bytes() {
        for &c in b":*?<>|" {
            assert!(check_invalid_character(c).is_err());
        }
        for &c in b"aZ09._-&'()" {
            assert!(check_invalid_character(c).is_ok());
        }
        // Separators are not reserved; the grammar handles them.
        assert!(check_invalid_character(b'/').is_ok());
        assert!(check_invalid_character(b'\\').is_ok());
    }

    #[test]
    fn test_host_name_bytes() {
        assert!(check_host_name_character(b'$').is_err());
        assert!(check_host_name_character(b':').is_err());
        // Hosts may contain '?', unlike bodies.
        assert!(check_host_name_character(b'?').is_ok());
        assert!(check_host_name_character(b'-').is_ok());
    }

    #[test]
    fn test_mount_name_bytes() {
        assert!(check_mount_name_character(b'*').is_err());
        assert!(check_mount_name_character(b'?').is_err());
        // ':' terminates a mount name rather than poisoning it.
        assert!(check_mount_name_character(b':').is_ok());
        assert!(check_mount_name_character(b'&').is_ok());
    }

    #[test]
    fn test_dot_segments() {
        assert!(is_current_directory(b"."));
        assert!(is_current_directory(b"./aa"));
        assert!(is_current_directory(b".\0"));
        assert!(!is_current_directory(b".\\aa"));
        assert!(!is_current_directory(b".aa"));

        assert!(is_parent_directory(b".."));
        assert!(is_parent_directory(b"../aa"));
        assert!(!is_parent_directory(b"..\\aa"));
        assert!(!is_parent_directory(b".a"));

        assert!(is_path_start_with_current_directory(b"../aa"));
        assert!(!is_path_start_with_current_directory(b"aa"));
    }
}
