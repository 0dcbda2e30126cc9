//! Path formatting: prefix recognition and full normalization.
//!
//! The formatter runs the input through a fixed sequence of prefix
//! parsers, each consuming what it recognizes and constraining the stages
//! after it, before handing the remainder to the body normalizer. Every
//! parser exists in two modes: a write mode that copies the (possibly
//! rewritten) prefix into the output, and a check mode that only reports
//! whether the prefix already has its canonical spelling.

use nxfs_types::{FsCode, Result};

use crate::char_class::{
    self, ALT_DIRECTORY_SEPARATOR, DIRECTORY_SEPARATOR, DOT, DRIVE_SEPARATOR,
    MOUNT_NAME_LENGTH_MAX, NUL,
};
use crate::flags::PathFlags;
use crate::normalizer;
use crate::util::{check_invalid_backslash, check_utf8, nul_len, reject, replace_byte, value_at};
use crate::windows;

/// Outcome of a Windows-prefix parse.
///
/// `consumed` is how far the input cursor moves (it includes a dropped
/// `/` between a mount name and the Windows shape); `written` is how many
/// bytes the canonical prefix occupies in the output. `normalized` is
/// only meaningful in check mode, where a `false` means the prefix needs
/// rewriting.
struct WindowsPrefix {
    consumed: usize,
    written: usize,
    normalized: bool,
}

fn check_host_name(name: &[u8]) -> Result<()> {
    if name.len() == 2 && name[0] == DOT && name[1] == DOT {
        return reject(FsCode::INVALID_PATH_FORMAT);
    }
    for &c in name {
        char_class::check_host_name_character(c)?;
    }
    Ok(())
}

fn check_shared_name(name: &[u8]) -> Result<()> {
    if name.len() == 1 && name[0] == DOT {
        return reject(FsCode::INVALID_PATH_FORMAT);
    }
    if name.len() == 2 && name[0] == DOT && name[1] == DOT {
        return reject(FsCode::INVALID_PATH_FORMAT);
    }
    for &c in name {
        char_class::check_invalid_character(c)?;
    }
    Ok(())
}

/// Parse a leading `name:` mount prefix, returning the bytes consumed
/// (name plus colon) or 0 when the input has no well-formed mount name.
///
/// In write mode the scan window is additionally capped by the output
/// capacity, so an over-long prefix surfaces as `TooLongPath` rather than
/// being reparsed as a body.
fn parse_mount_name(path: &[u8], mut out: Option<&mut [u8]>) -> Result<usize> {
    let out_capacity = out.as_deref().map_or(0, |b| b.len());
    let max_mount_length = if out_capacity == 0 {
        MOUNT_NAME_LENGTH_MAX + 1
    } else {
        out_capacity.min(MOUNT_NAME_LENGTH_MAX + 1)
    };

    let mut mount_length = 0;
    while mount_length < max_mount_length && value_at(path, mount_length) != NUL {
        let c = path[mount_length];

        if c == DRIVE_SEPARATOR {
            mount_length += 1;
            break;
        }

        if c == DIRECTORY_SEPARATOR || c == ALT_DIRECTORY_SEPARATOR {
            return Ok(0);
        }

        mount_length += 1;
    }

    // A name of a single byte, or one without its colon in the window, is
    // not a mount name; the caller reparses the input as a plain body.
    if mount_length <= 2 || path[mount_length - 1] != DRIVE_SEPARATOR {
        return Ok(0);
    }

    for i in 0..mount_length {
        char_class::check_mount_name_character(path[i])?;
    }

    if let Some(out) = out.as_deref_mut() {
        if !out.is_empty() {
            if mount_length >= out.len() {
                return reject(FsCode::TOO_LONG_PATH);
            }
            out[..mount_length].copy_from_slice(&path[..mount_length]);
            out[mount_length] = NUL;
        }
    }

    Ok(mount_length)
}

/// Parse a leading `.` relative marker (dot followed by the end of the
/// string or either separator). A leading `..` is rejected outright: a
/// relative path may not begin by climbing out of its own root.
fn parse_relative_dot_path(path: &[u8], mut out: Option<&mut [u8]>) -> Result<usize> {
    if let Some(out) = out.as_deref_mut() {
        if !out.is_empty() {
            out[0] = NUL;
        }
    }

    if value_at(path, 0) == DOT
        && matches!(
            value_at(path, 1),
            NUL | DIRECTORY_SEPARATOR | ALT_DIRECTORY_SEPARATOR
        )
    {
        if let Some(out) = out.as_deref_mut() {
            if !out.is_empty() {
                if out.len() < 2 {
                    return reject(FsCode::TOO_LONG_PATH);
                }
                out[0] = DOT;
                out[1] = NUL;
            }
        }
        return Ok(1);
    }

    if value_at(path, 0) == DOT && value_at(path, 1) == DOT {
        return reject(FsCode::INVALID_PATH_FORMAT);
    }

    Ok(0)
}

/// Parse a Windows prefix: drive letter, DOS device, or UNC root.
///
/// Write mode copies the canonical spelling into `out` (drive prefixes
/// use `/`, DOS device and UNC prefixes use `\`). Check mode reports a
/// non-canonical prefix through `normalized` without consuming anything.
fn parse_windows_path(
    path: &[u8],
    has_mount_name: bool,
    mut out: Option<&mut [u8]>,
) -> Result<WindowsPrefix> {
    if let Some(out) = out.as_deref_mut() {
        if !out.is_empty() {
            out[0] = NUL;
        }
    }

    // A `/` separating a mount name from a Windows shape is dropped.
    let mut start = 0;
    if has_mount_name && value_at(path, 0) == DIRECTORY_SEPARATOR {
        let unc_follows = value_at(path, 1) == ALT_DIRECTORY_SEPARATOR
            && value_at(path, 2) == ALT_DIRECTORY_SEPARATOR;
        let drive_follows = windows::is_windows_drive(&path[1..]);

        if unc_follows || drive_follows {
            if out.is_none() {
                return Ok(WindowsPrefix {
                    consumed: 0,
                    written: 0,
                    normalized: false,
                });
            }
            start = 1;
        }
    }

    let current = &path[start..];

    if windows::is_windows_drive(current) {
        let mut win_length = windows::WINDOWS_DRIVE_LENGTH;
        while value_at(current, win_length) != NUL {
            char_class::check_invalid_character(current[win_length])?;
            if current[win_length] == DIRECTORY_SEPARATOR
                || current[win_length] == ALT_DIRECTORY_SEPARATOR
            {
                break;
            }
            win_length += 1;
        }

        if out.is_none() {
            for i in 0..win_length {
                if current[i] == ALT_DIRECTORY_SEPARATOR {
                    return Ok(WindowsPrefix {
                        consumed: 0,
                        written: 0,
                        normalized: false,
                    });
                }
            }
        }

        if let Some(out) = out.as_deref_mut() {
            if win_length >= out.len() {
                return reject(FsCode::TOO_LONG_PATH);
            }
            out[..win_length].copy_from_slice(&current[..win_length]);
            out[win_length] = NUL;
            replace_byte(&mut out[..win_length], ALT_DIRECTORY_SEPARATOR, DIRECTORY_SEPARATOR);
        }

        return Ok(WindowsPrefix {
            consumed: start + win_length,
            written: win_length,
            normalized: true,
        });
    }

    if windows::is_dos_device_path(current) {
        let mut dos_length = windows::dos_device_path_prefix_length();

        if windows::is_windows_drive(&current[dos_length..]) {
            dos_length += 2;
        } else {
            dos_length -= 1;
        }

        if let Some(out) = out.as_deref_mut() {
            if dos_length >= out.len() {
                return reject(FsCode::TOO_LONG_PATH);
            }
            out[..dos_length].copy_from_slice(&current[..dos_length]);
            out[dos_length] = NUL;
            replace_byte(&mut out[..dos_length], DIRECTORY_SEPARATOR, ALT_DIRECTORY_SEPARATOR);
        }

        return Ok(WindowsPrefix {
            consumed: start + dos_length,
            written: dos_length,
            normalized: true,
        });
    }

    if windows::is_unc_path(current, false, true) {
        if value_at(current, 2) == DIRECTORY_SEPARATOR
            || value_at(current, 2) == ALT_DIRECTORY_SEPARATOR
        {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }

        let mut final_offset: Option<usize> = None;
        let mut component_offset = 0;
        let mut pos = 2;
        while value_at(current, pos) != NUL {
            if current[pos] == DIRECTORY_SEPARATOR || current[pos] == ALT_DIRECTORY_SEPARATOR {
                if component_offset != 0 {
                    check_shared_name(&current[component_offset..pos])?;
                    final_offset = Some(pos);
                    break;
                }

                let next = value_at(current, pos + 1);
                if next == DIRECTORY_SEPARATOR || next == ALT_DIRECTORY_SEPARATOR {
                    return reject(FsCode::INVALID_PATH_FORMAT);
                }

                check_host_name(&current[2..pos])?;
                component_offset = pos + 1;
            }
            pos += 1;
        }

        // A separator with nothing after it leaves an empty share.
        if component_offset == pos {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }

        if component_offset != 0 && final_offset.is_none() {
            check_shared_name(&current[component_offset..pos])?;
            final_offset = Some(pos);
        }

        let unc_prefix_length = final_offset.unwrap_or(0);

        if out.is_none() {
            for i in 0..unc_prefix_length {
                if current[i] == DIRECTORY_SEPARATOR {
                    return Ok(WindowsPrefix {
                        consumed: 0,
                        written: 0,
                        normalized: false,
                    });
                }
            }
        }

        if let Some(out) = out.as_deref_mut() {
            if unc_prefix_length >= out.len() {
                return reject(FsCode::TOO_LONG_PATH);
            }
            out[..unc_prefix_length].copy_from_slice(&current[..unc_prefix_length]);
            out[unc_prefix_length] = NUL;
            replace_byte(
                &mut out[..unc_prefix_length],
                DIRECTORY_SEPARATOR,
                ALT_DIRECTORY_SEPARATOR,
            );
        }

        return Ok(WindowsPrefix {
            consumed: start + unc_prefix_length,
            written: unc_prefix_length,
            normalized: true,
        });
    }

    Ok(WindowsPrefix {
        consumed: 0,
        written: 0,
        normalized: true,
    })
}

/// Normalize `path` into `output` under the given flags, returning the
/// written length (terminator excluded).
///
/// On error the declared length is zero; the output buffer holds
/// whatever prefix had been produced when the rejection was found.
pub fn normalize(output: &mut [u8], path: &[u8], flags: PathFlags) -> Result<usize> {
    let mut src = path;
    let mut pos = 0;
    let mut is_windows_path = false;

    if value_at(src, 0) == NUL {
        if !flags.is_empty_path_allowed() {
            return reject(FsCode::INVALID_PATH);
        }
        if !output.is_empty() {
            output[0] = NUL;
        }
        return Ok(0);
    }

    let mut has_mount_name = false;
    if flags.is_mount_name_allowed() {
        let consumed = parse_mount_name(src, Some(&mut output[pos..]))?;
        pos += consumed;
        has_mount_name = consumed != 0;
        src = &src[consumed..];
    }

    let mut is_drive_relative = false;
    if value_at(src, 0) != DIRECTORY_SEPARATOR
        && !char_class::is_path_start_with_current_directory(src)
        && !windows::is_windows_path(src, false)
    {
        if !flags.is_relative_path_allowed()
            || char_class::check_invalid_character(value_at(src, 0)).is_err()
        {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }

        if pos >= output.len() {
            return reject(FsCode::TOO_LONG_PATH);
        }
        output[pos] = DOT;
        pos += 1;
        is_drive_relative = true;
    }

    if flags.is_relative_path_allowed() {
        if pos >= output.len() {
            return reject(FsCode::TOO_LONG_PATH);
        }

        let consumed = parse_relative_dot_path(src, Some(&mut output[pos..]))?;
        pos += consumed;
        src = &src[consumed..];

        if value_at(src, 0) == NUL {
            if pos >= output.len() {
                return reject(FsCode::TOO_LONG_PATH);
            }
            output[pos] = NUL;
            return Ok(pos);
        }
    }

    if flags.is_windows_path_allowed() {
        if pos >= output.len() {
            return reject(FsCode::TOO_LONG_PATH);
        }

        let prefix = parse_windows_path(src, has_mount_name, Some(&mut output[pos..]))?;
        pos += prefix.written;
        src = &src[prefix.consumed..];

        if value_at(src, 0) == NUL {
            if pos + 1 >= output.len() {
                return reject(FsCode::TOO_LONG_PATH);
            }
            output[pos] = DIRECTORY_SEPARATOR;
            output[pos + 1] = NUL;
            return Ok(pos + 1);
        }

        if prefix.consumed > 0 {
            is_windows_path = true;
        }
    }

    let contains_backslash = check_invalid_backslash(
        src,
        flags.is_windows_path_allowed() || flags.is_backslash_allowed(),
    )?;

    // When Windows paths are allowed, remaining backslashes act as
    // separators: rewrite them before the collapse. (With only
    // AllowBackslash they stay data bytes.)
    if contains_backslash && flags.is_windows_path_allowed() {
        let len = nul_len(src);
        if len > normalizer::MAX_PATH_LENGTH {
            return reject(FsCode::TOO_LONG_PATH);
        }
        let mut replaced = [0u8; normalizer::MAX_PATH_LENGTH + 1];
        replaced[..len].copy_from_slice(&src[..len]);
        replace_byte(&mut replaced[..len], ALT_DIRECTORY_SEPARATOR, DIRECTORY_SEPARATOR);

        let written = normalizer::normalize(
            &mut output[pos..],
            &replaced[..len],
            is_windows_path,
            is_drive_relative,
            flags.are_all_characters_allowed(),
        )?;
        return Ok(pos + written);
    }

    let written = normalizer::normalize(
        &mut output[pos..],
        src,
        is_windows_path,
        is_drive_relative,
        flags.are_all_characters_allowed(),
    )?;
    Ok(pos + written)
}

/// Check whether `path` already equals its canonical form under the given
/// flags.
///
/// Returns `(true, length)` for a normalized path, `(false, 0)` for one
/// the write pipeline would rewrite, and an error for one it would
/// reject.
pub fn is_normalized(path: &[u8], flags: PathFlags) -> Result<(bool, usize)> {
    check_utf8(path)?;

    let mut total = 0;

    if value_at(path, 0) == NUL {
        if !flags.is_empty_path_allowed() {
            return reject(FsCode::INVALID_PATH);
        }
        return Ok((true, 0));
    }

    if value_at(path, 0) != DIRECTORY_SEPARATOR
        && !flags.is_windows_path_allowed()
        && !flags.is_relative_path_allowed()
        && !flags.is_mount_name_allowed()
    {
        return reject(FsCode::INVALID_PATH_FORMAT);
    }

    if windows::is_windows_path(path, false) && !flags.is_windows_path_allowed() {
        return reject(FsCode::INVALID_PATH_FORMAT);
    }

    let mut has_mount_name = false;
    let consumed = parse_mount_name(path, None)?;
    let mut buffer = &path[consumed..];
    if consumed != 0 {
        if !flags.is_mount_name_allowed() {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }
        total += consumed;
        has_mount_name = true;
    }

    if value_at(buffer, 0) != DIRECTORY_SEPARATOR
        && !char_class::is_path_start_with_current_directory(buffer)
        && !windows::is_windows_path(buffer, false)
    {
        if !flags.is_relative_path_allowed()
            || char_class::check_invalid_character(value_at(buffer, 0)).is_err()
        {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }
        // A drive-relative spelling always gains a leading `.` on rewrite.
        return Ok((false, 0));
    }

    let mut is_relative = false;
    let consumed = parse_relative_dot_path(buffer, None)?;
    if consumed != 0 {
        if !flags.is_relative_path_allowed() {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }
        total += consumed;
        buffer = &buffer[consumed..];

        if value_at(buffer, 0) == NUL {
            return Ok((true, total));
        }
        is_relative = true;
    }

    let prefix = parse_windows_path(buffer, has_mount_name, None)?;
    if !prefix.normalized {
        if !flags.is_windows_path_allowed() {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }
        return Ok((false, 0));
    }

    if prefix.written != 0 {
        if !flags.is_windows_path_allowed() {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }
        total += prefix.written;
        buffer = &buffer[prefix.consumed..];

        if is_relative {
            return reject(FsCode::INVALID_PATH_FORMAT);
        }

        // A bare Windows prefix gains a trailing `/` on rewrite, and any
        // backslash left in the body would be rewritten to `/`.
        if value_at(buffer, 0) == NUL {
            return Ok((false, 0));
        }
        for &c in buffer {
            if c == NUL {
                break;
            }
            if c == ALT_DIRECTORY_SEPARATOR {
                return Ok((false, 0));
            }
        }
    }

    if flags.is_backslash_allowed()
        && normalizer::is_parent_directory_path_replacement_needed(buffer)
    {
        return Ok((false, 0));
    }

    let contains_backslash = check_invalid_backslash(
        buffer,
        flags.is_windows_path_allowed() || flags.is_backslash_allowed(),
    )?;
    if contains_backslash && !flags.is_backslash_allowed() {
        return Ok((false, 0));
    }

    let (normalized, length) =
        normalizer::is_normalized(buffer, flags.are_all_characters_allowed())?;
    if !normalized {
        return Ok((false, 0));
    }

    total += length;
    Ok((true, total))
}
