//! An owning path value that tracks its own normalization state.
//!
//! `Path` pairs a growable buffer with an `is_normalized` flag so
//! repeated normalization is free once the stored string is canonical.
//! Storage grows through the process allocator hook (`nxfs-memory`); the
//! parsing itself never allocates.

use nxfs_memory::PathBuffer;
use nxfs_types::{FsCode, Result};

use crate::char_class::{ALT_DIRECTORY_SEPARATOR, DIRECTORY_SEPARATOR, DOT, NUL};
use crate::flags::PathFlags;
use crate::formatter;
use crate::normalizer;
use crate::util::{is_path_relative, nul_len, reject, replace_byte, value_at};
use crate::windows;

const SEPARATOR_LENGTH: usize = 1;
const NUL_TERMINATOR_LENGTH: usize = 1;

/// A file path stored as a NUL-terminated byte string.
#[derive(Default)]
pub struct Path {
    buffer: PathBuffer,
    is_normalized: bool,
}

impl Path {
    /// Create an empty, not-normalized path.
    pub const fn new() -> Self {
        Self {
            buffer: PathBuffer::new(),
            is_normalized: false,
        }
    }

    /// Length of the stored string, terminator excluded.
    pub fn len(&self) -> usize {
        nul_len(self.buffer.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        value_at(self.buffer.as_slice(), 0) == NUL
    }

    /// The stored string, terminator excluded.
    pub fn as_bytes(&self) -> &[u8] {
        let s = self.buffer.as_slice();
        &s[..nul_len(s)]
    }

    pub fn is_normalized(&self) -> bool {
        self.is_normalized
    }

    /// Ensure the buffer can hold `length` bytes. Existing contents are
    /// discarded; callers copy what they need to keep.
    fn preallocate(&mut self, length: usize) {
        if self.buffer.capacity() > length {
            return;
        }
        self.buffer = PathBuffer::allocate(length);
    }

    fn clear_buffer(&mut self) {
        self.buffer = PathBuffer::new();
    }

    fn initialize_impl(&mut self, path: &[u8]) -> Result<()> {
        let length = nul_len(path);
        if length == 0 {
            self.clear_buffer();
            return Ok(());
        }

        self.preallocate(length + NUL_TERMINATOR_LENGTH);
        let buffer = self.buffer.as_mut_slice();
        buffer[..length].copy_from_slice(&path[..length]);
        buffer[length] = NUL;
        Ok(())
    }

    /// Store a copy of `path` as-is. Clears the normalization flag.
    pub fn initialize(&mut self, path: &[u8]) -> Result<()> {
        self.initialize_impl(path)?;
        self.is_normalized = false;
        Ok(())
    }

    /// Store the empty string, which counts as normalized.
    pub fn initialize_as_empty(&mut self) {
        self.clear_buffer();
        self.is_normalized = true;
    }

    /// Store a copy of `path`, normalizing it when it is a relative or a
    /// Windows path.
    ///
    /// Other absolute paths are only checked, not rewritten, yet the flag
    /// is set regardless; the stored string can therefore be flagged
    /// normalized without being canonical. This mirrors the SDK.
    pub fn initialize_with_normalization(&mut self, path: &[u8]) -> Result<()> {
        self.initialize(path)?;

        if value_at(path, 0) != NUL
            && !windows::is_windows_path(path, false)
            && value_at(path, 0) != DIRECTORY_SEPARATOR
        {
            self.normalize(PathFlags::new().allow_relative_path())?;
        } else if windows::is_windows_path(path, true) {
            self.normalize(PathFlags::new().allow_windows_path())?;
        } else {
            let (normalized, _) = normalizer::is_normalized(self.buffer.as_slice(), false)?;
            self.is_normalized = normalized;
        }

        self.is_normalized = true;
        Ok(())
    }

    /// Store a copy of `path` with every backslash rewritten to `/`.
    pub fn initialize_with_replace_backslash(&mut self, path: &[u8]) -> Result<()> {
        self.initialize_impl(path)?;

        if self.buffer.capacity() > 1 {
            let capacity = self.buffer.capacity();
            replace_byte(
                &mut self.buffer.as_mut_slice()[..capacity - 1],
                ALT_DIRECTORY_SEPARATOR,
                DIRECTORY_SEPARATOR,
            );
        }

        self.is_normalized = false;
        Ok(())
    }

    /// Store a copy of `path` with a leading `//` rewritten to `\\`.
    pub fn initialize_with_replace_forward_slashes(&mut self, path: &[u8]) -> Result<()> {
        self.initialize_impl(path)?;

        if self.buffer.capacity() > 1 {
            let buffer = self.buffer.as_mut_slice();
            if buffer[0] == DIRECTORY_SEPARATOR && buffer[1] == DIRECTORY_SEPARATOR {
                buffer[0] = ALT_DIRECTORY_SEPARATOR;
                buffer[1] = ALT_DIRECTORY_SEPARATOR;
            }
        }

        self.is_normalized = false;
        Ok(())
    }

    /// Store a copy of `path` with UNC-style roots escaped: the first
    /// `:///` has its two trailing separators rewritten to `\\`, a leading
    /// `@Host://` becomes `@Host:\\`, and a leading `//` becomes `\\`.
    pub fn initialize_with_replace_unc(&mut self, path: &[u8]) -> Result<()> {
        self.initialize_impl(path)?;
        self.is_normalized = false;

        if value_at(path, 0) == NUL {
            return Ok(());
        }

        let buffer = self.buffer.as_mut_slice();
        let length = nul_len(buffer);

        if let Some(index) = find_subsequence(&buffer[..length], b":///") {
            buffer[index + 2] = ALT_DIRECTORY_SEPARATOR;
            buffer[index + 3] = ALT_DIRECTORY_SEPARATOR;
        }

        if buffer[..length].starts_with(b"@Host://") {
            buffer[6] = ALT_DIRECTORY_SEPARATOR;
            buffer[7] = ALT_DIRECTORY_SEPARATOR;
        }

        if value_at(buffer, 0) == DIRECTORY_SEPARATOR && value_at(buffer, 1) == DIRECTORY_SEPARATOR
        {
            buffer[0] = ALT_DIRECTORY_SEPARATOR;
            buffer[1] = ALT_DIRECTORY_SEPARATOR;
        }

        Ok(())
    }

    /// Prepend `parent`, joining with exactly one separator.
    ///
    /// A Windows current path is refused with `NotImplemented`. A
    /// previously-normalized path keeps its flag only if `parent` is
    /// itself a normalized basic path.
    pub fn insert_parent(&mut self, parent: &[u8]) -> Result<()> {
        if parent.is_empty() || parent[0] == NUL {
            return Ok(());
        }

        if windows::is_windows_path(self.buffer.as_slice(), false) {
            return reject(FsCode::NOT_IMPLEMENTED);
        }

        let mut parent_length = nul_len(parent);
        let mut parent_has_trailing_slash = false;
        if parent[parent_length - 1] == DIRECTORY_SEPARATOR
            || parent[parent_length - 1] == ALT_DIRECTORY_SEPARATOR
        {
            parent_length -= 1;
            parent_has_trailing_slash = true;
        }

        let child_buffer = self.buffer.take();
        let child_full = child_buffer.as_slice();
        let child_start = usize::from(value_at(child_full, 0) == DIRECTORY_SEPARATOR);
        let child = &child_full[child_start.min(child_full.len())..];
        let child_length = nul_len(child);

        self.preallocate(parent_length + SEPARATOR_LENGTH + child_length + NUL_TERMINATOR_LENGTH);
        let dest = self.buffer.as_mut_slice();

        if child_length > 0 {
            dest[parent_length + 1..parent_length + 1 + child_length]
                .copy_from_slice(&child[..child_length]);
            dest[parent_length + 1 + child_length] = NUL;
        }

        let parent_copied = if parent_has_trailing_slash {
            parent_length + SEPARATOR_LENGTH
        } else {
            parent_length
        };
        dest[..parent_copied].copy_from_slice(&parent[..parent_copied]);

        if child_length > 0 {
            dest[parent_length] = DIRECTORY_SEPARATOR;
        } else if !parent_has_trailing_slash {
            dest[parent_length] = NUL;
        }

        if self.is_normalized {
            self.is_normalized =
                matches!(normalizer::is_normalized(parent, false), Ok((true, _)));
        }

        Ok(())
    }

    /// Append `child`, joining with exactly one separator. An empty
    /// current path degenerates to `initialize(child)`.
    pub fn append_child(&mut self, child: &[u8]) -> Result<()> {
        let mut trimmed = child;

        if value_at(self.buffer.as_slice(), 0) != NUL {
            if !trimmed.is_empty() && trimmed[0] == DIRECTORY_SEPARATOR {
                trimmed = &trimmed[1..];
            }
            if value_at(trimmed, 0) == NUL {
                return Ok(());
            }
        }

        let mut parent_length = self.len();
        if parent_length == 0 {
            return self.initialize(child);
        }

        let current = self.buffer.as_slice();
        if current[parent_length - 1] == DIRECTORY_SEPARATOR
            || current[parent_length - 1] == ALT_DIRECTORY_SEPARATOR
        {
            parent_length -= 1;
        }

        let parent_buffer = self.buffer.take();
        let child_length = nul_len(trimmed);

        self.preallocate(parent_length + SEPARATOR_LENGTH + child_length + NUL_TERMINATOR_LENGTH);
        let dest = self.buffer.as_mut_slice();

        dest[..parent_length].copy_from_slice(&parent_buffer.as_slice()[..parent_length]);
        dest[parent_length] = DIRECTORY_SEPARATOR;
        dest[parent_length + 1..parent_length + 1 + child_length]
            .copy_from_slice(&trimmed[..child_length]);
        dest[parent_length + 1 + child_length] = NUL;

        Ok(())
    }

    /// Trim the final non-empty segment, and any separator trailing it.
    ///
    /// The current directory `.` and the root `/` have no removable child
    /// and are refused with `NotImplemented`.
    pub fn remove_child(&mut self) -> Result<()> {
        let path = self.buffer.as_mut_slice();
        let original_length = nul_len(path);

        if original_length == 1 && (path[0] == DIRECTORY_SEPARATOR || path[0] == DOT) {
            return reject(FsCode::NOT_IMPLEMENTED);
        }

        let mut current = original_length;

        if current > 0
            && (path[current - 1] == DIRECTORY_SEPARATOR
                || path[current - 1] == ALT_DIRECTORY_SEPARATOR)
        {
            current -= 1;
        }

        if current > 0 {
            current -= 1;
            loop {
                if path[current] == DIRECTORY_SEPARATOR || path[current] == ALT_DIRECTORY_SEPARATOR
                {
                    if current == 0 {
                        // Keep the root's separator.
                        path[1] = NUL;
                        current = 1;
                    } else {
                        path[current] = NUL;
                    }
                    break;
                }
                if current == 0 {
                    break;
                }
                current -= 1;
            }
        }

        if current == 0 {
            return reject(FsCode::NOT_IMPLEMENTED);
        }

        Ok(())
    }

    /// Normalize the stored path in place under `flags`. A no-op when the
    /// flag is already set; a path that checks out as canonical just gains
    /// the flag without rewriting.
    pub fn normalize(&mut self, flags: PathFlags) -> Result<()> {
        if self.is_normalized {
            return Ok(());
        }

        let (already_normalized, _) = formatter::is_normalized(self.buffer.as_slice(), flags)?;
        if already_normalized {
            self.is_normalized = true;
            return Ok(());
        }

        // Rewriting can add a `./` or a separator after a Windows prefix.
        let mut buffer_length = self.buffer.capacity();
        if flags.is_relative_path_allowed() && is_path_relative(self.buffer.as_slice()) {
            buffer_length += 2;
        }
        if flags.is_windows_path_allowed() && windows::is_windows_path(self.buffer.as_slice(), true)
        {
            buffer_length += 1;
        }

        let mut rewritten = PathBuffer::allocate(buffer_length);
        formatter::normalize(rewritten.as_mut_slice(), self.buffer.as_slice(), flags)?;

        self.buffer = rewritten;
        self.is_normalized = true;
        Ok(())
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&[u8]> for Path {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl std::fmt::Debug for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Path({})", self)
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
