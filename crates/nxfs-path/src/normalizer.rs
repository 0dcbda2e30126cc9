//! Body normalization: collapses `.`/`..` segments and duplicate
//! separators in the region of a path after every recognized prefix.
//!
//! The body is rewritten in a single left-to-right pass. The stack of
//! emitted segments lives implicitly in the output buffer: popping a
//! segment for `..` walks the write cursor back to the previous `/`.
//! Whether a `..` at the root clamps or fails depends on the dialect the
//! formatter detected for the body.

use nxfs_types::{FsCode, Result};

use crate::char_class::{
    is_current_directory, is_parent_directory, is_separator, ALT_DIRECTORY_SEPARATOR,
    DIRECTORY_SEPARATOR, DOT, NUL,
};
use crate::util::{nul_len, reject, value_at};

/// Longest path the parent-directory replacement pre-pass can rewrite.
pub(crate) const MAX_PATH_LENGTH: usize = 0x300;

/// Whether the body needs the pre-pass that reframes `..` runs adjacent to
/// backslash separators: it begins with a separator and contains `\..\`,
/// `/..\`, `\../` or a trailing `\..`.
pub(crate) fn is_parent_directory_path_replacement_needed(path: &[u8]) -> bool {
    if path.is_empty()
        || (path[0] != DIRECTORY_SEPARATOR && path[0] != ALT_DIRECTORY_SEPARATOR)
    {
        return false;
    }

    let mut i = 0;
    while i + 2 < path.len() && path[i] != NUL {
        let c3 = value_at(path, i + 3);

        if path[i] == ALT_DIRECTORY_SEPARATOR
            && path[i + 1] == DOT
            && path[i + 2] == DOT
            && (c3 == DIRECTORY_SEPARATOR || c3 == ALT_DIRECTORY_SEPARATOR || c3 == NUL)
        {
            return true;
        }

        if (path[i] == DIRECTORY_SEPARATOR || path[i] == ALT_DIRECTORY_SEPARATOR)
            && path[i + 1] == DOT
            && path[i + 2] == DOT
            && c3 == ALT_DIRECTORY_SEPARATOR
        {
            return true;
        }

        i += 1;
    }

    false
}

/// Rewrite `source` into `dest` with every `..` run that touches a
/// backslash separator reframed between `/` separators, so the main pass
/// sees it as a poppable parent reference. Other bytes copy through
/// unchanged.
fn replace_parent_directory_path(dest: &mut [u8], source: &[u8]) {
    dest[0] = DIRECTORY_SEPARATOR;

    let mut i = 1;
    while i < source.len() && source[i] != NUL {
        if source.len() > i + 2
            && (source[i - 1] == DIRECTORY_SEPARATOR || source[i - 1] == ALT_DIRECTORY_SEPARATOR)
            && source[i] == DOT
            && source[i + 1] == DOT
            && (source[i + 2] == DIRECTORY_SEPARATOR || source[i + 2] == ALT_DIRECTORY_SEPARATOR)
        {
            dest[i - 1] = DIRECTORY_SEPARATOR;
            dest[i] = DOT;
            dest[i + 1] = DOT;
            dest[i + 2] = DIRECTORY_SEPARATOR;
            i += 3;
        } else {
            if source.len() > i + 1
                && source[i - 1] == ALT_DIRECTORY_SEPARATOR
                && source[i] == DOT
                && source[i + 1] == DOT
                && (source.len() == i + 2 || source[i + 2] == NUL)
            {
                dest[i - 1] = DIRECTORY_SEPARATOR;
                dest[i] = DOT;
                dest[i + 1] = DOT;
                i += 2;
                break;
            }

            dest[i] = source[i];
            i += 1;
        }
    }

    dest[i] = NUL;
}

/// Normalize a path body into `output`, returning the written length
/// (terminator excluded).
///
/// `is_windows_path` selects the clamping dialect for `..` at the root;
/// `is_drive_relative_path` permits a body that does not begin with a
/// separator (a leading `/` is synthesized). On `TooLongPath` the output
/// holds a NUL-terminated truncation of the result.
pub fn normalize(
    output: &mut [u8],
    path: &[u8],
    is_windows_path: bool,
    is_drive_relative_path: bool,
    allow_all_characters: bool,
) -> Result<usize> {
    let mut total: usize = 0;

    if !is_separator(value_at(path, 0)) {
        if !is_drive_relative_path {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }
        if output.is_empty() {
            return reject(FsCode::TOO_LONG_PATH);
        }
        output[total] = DIRECTORY_SEPARATOR;
        total += 1;
    }

    let mut converted = [0u8; MAX_PATH_LENGTH + 1];
    let current_path: &[u8] = if is_parent_directory_path_replacement_needed(path) {
        if nul_len(path) > MAX_PATH_LENGTH {
            return reject(FsCode::TOO_LONG_PATH);
        }
        replace_parent_directory_path(&mut converted, path);
        &converted
    } else {
        path
    };

    let mut i: usize = 0;
    let mut skip_next_separator = false;

    while value_at(current_path, i) != NUL {
        if is_separator(current_path[i]) {
            loop {
                i += 1;
                if !is_separator(value_at(current_path, i)) {
                    break;
                }
            }
            if value_at(current_path, i) == NUL {
                break;
            }

            if !skip_next_separator {
                if total + 1 >= output.len() {
                    if let Some(last) = output.get_mut(total) {
                        *last = NUL;
                    }
                    return reject(FsCode::TOO_LONG_PATH);
                }
                output[total] = DIRECTORY_SEPARATOR;
                total += 1;
            }
            skip_next_separator = false;
        }

        let mut dir_len = 0;
        while !is_separator(value_at(current_path, i + dir_len))
            && value_at(current_path, i + dir_len) != NUL
        {
            dir_len += 1;
        }

        let rest = &current_path[i..];

        if is_current_directory(rest) {
            skip_next_separator = true;
        } else if is_parent_directory(rest) {
            if total == 1 {
                if !is_windows_path {
                    return reject(FsCode::DIRECTORY_UNOBTAINABLE);
                }
                total -= 1;
            } else {
                total -= 2;
                while total != 0 {
                    if output[total] == DIRECTORY_SEPARATOR {
                        break;
                    }
                    total -= 1;
                }
            }
        } else {
            if !allow_all_characters {
                for &c in &current_path[i..i + dir_len] {
                    crate::char_class::check_invalid_character(c)?;
                }
            }

            if total + dir_len + 1 > output.len() {
                let copy_len = output.len() - 1 - total;
                output[total..total + copy_len].copy_from_slice(&current_path[i..i + copy_len]);
                total += copy_len;
                output[total] = NUL;
                return reject(FsCode::TOO_LONG_PATH);
            }

            output[total..total + dir_len].copy_from_slice(&current_path[i..i + dir_len]);
            total += dir_len;
        }

        i += dir_len;
    }

    if skip_next_separator {
        total -= 1;
    }

    if total == 0 && !output.is_empty() {
        output[0] = DIRECTORY_SEPARATOR;
        total = 1;
    }

    if total >= output.len() {
        return reject(FsCode::TOO_LONG_PATH);
    }
    output[total] = NUL;

    Ok(total)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PathState {
    Initial,
    Normal,
    FirstSeparator,
    Separator,
    CurrentDir,
    ParentDir,
}

/// Check whether a path body is already normalized: it must begin with a
/// separator and contain no empty, `.` or `..` segments.
///
/// Returns `(verdict, scanned_length)`. A `false` verdict found mid-scan
/// reports length 0; one found at the end of the string reports the full
/// scanned length.
pub fn is_normalized(path: &[u8], allow_all_characters: bool) -> Result<(bool, usize)> {
    let mut state = PathState::Initial;
    let mut path_length = 0;

    for &c in path {
        if c == NUL {
            break;
        }
        path_length += 1;

        if state != PathState::Initial && !allow_all_characters {
            crate::char_class::check_invalid_character(c)?;
        }

        match state {
            PathState::Initial => {
                if c != DIRECTORY_SEPARATOR {
                    return reject(FsCode::INVALID_PATH_FORMAT);
                }
                state = PathState::FirstSeparator;
            }
            PathState::Normal => {
                if c == DIRECTORY_SEPARATOR {
                    state = PathState::Separator;
                }
            }
            PathState::FirstSeparator | PathState::Separator => {
                if c == DIRECTORY_SEPARATOR {
                    return Ok((false, 0));
                }
                state = if c == DOT {
                    PathState::CurrentDir
                } else {
                    PathState::Normal
                };
            }
            PathState::CurrentDir => {
                if c == DIRECTORY_SEPARATOR {
                    return Ok((false, 0));
                }
                state = if c == DOT {
                    PathState::ParentDir
                } else {
                    PathState::Normal
                };
            }
            PathState::ParentDir => {
                if c == DIRECTORY_SEPARATOR {
                    return Ok((false, 0));
                }
                state = PathState::Normal;
            }
        }
    }

    match state {
        PathState::Initial => reject(FsCode::INVALID_PATH_FORMAT),
        PathState::Normal | PathState::FirstSeparator => Ok((true, path_length)),
        PathState::Separator | PathState::CurrentDir | PathState::ParentDir => {
            Ok((false, path_length))
        }
    }
}
