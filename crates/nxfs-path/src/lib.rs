//! Path validation and normalization for the nxfs filesystem toolkit.
//!
//! Every path entering the filesystem layers goes through this crate
//! before any I/O: [`normalize`] validates an untrusted byte string
//! against the dialects permitted by its [`PathFlags`] and writes the
//! canonical absolute form into a caller buffer, [`is_normalized`] asks
//! whether an input already is its own canonical form, and [`Path`] owns
//! a path across edits while tracking that state.
//!
//! Supported dialects, each gated by a flag: POSIX absolute paths,
//! mount-prefixed paths (`save:/file`), Windows drive-letter and UNC
//! paths, Win32 namespace prefixes (`\\?\`, `\\.\`), and relative paths
//! (`./file`).
//!
//! ```
//! use nxfs_path::{normalize, PathFlags};
//!
//! let mut buffer = [0u8; 64];
//! let flags = PathFlags::new().allow_mount_name();
//! let len = normalize(&mut buffer, b"save:/data/../save.bin", flags).unwrap();
//! assert_eq!(&buffer[..len], b"save:/save.bin");
//! ```

pub mod char_class;
pub mod flags;
pub mod formatter;
pub mod normalizer;
pub mod path;
pub mod util;
pub mod windows;

pub use flags::PathFlags;
pub use formatter::{is_normalized, normalize};
pub use path::Path;
pub use util::{check_invalid_backslash, check_utf8, is_path_absolute, is_path_relative, is_sub_path};
