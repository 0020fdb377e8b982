// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host version detection from declared table sizes.

use core::mem::{offset_of, size_of};

use crate::{emacs_env, emacs_runtime};

/// Size of the runtime table every supported host declares
pub const RUNTIME_SIZE: usize = size_of::<emacs_runtime>();
/// Size of the environment table declared by Emacs 25
pub const ENV_SIZE_25: usize = offset_of!(emacs_env, should_quit);
/// Size of the environment table declared by Emacs 26
pub const ENV_SIZE_26: usize = offset_of!(emacs_env, process_input);
/// Size of the environment table declared by Emacs 27
pub const ENV_SIZE_27: usize = offset_of!(emacs_env, get_function_finalizer);
/// Size of the environment table declared by Emacs 28
pub const ENV_SIZE_28: usize = size_of::<emacs_env>();

/// Major host version, as far as the environment table reveals it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostVersion {
    /// Core table: values, strings, vectors, user pointers, non-local exits
    Emacs25 = 25,
    /// Adds `should_quit`
    Emacs26 = 26,
    /// Adds `process_input`, timestamps and big integers
    Emacs27 = 27,
    /// Adds function finalizers, `open_channel`, `make_interactive` and unibyte strings
    Emacs28 = 28,
}

impl HostVersion {
    /// All versions, oldest first
    pub const ALL: [Self; 4] = [Self::Emacs25, Self::Emacs26, Self::Emacs27, Self::Emacs28];

    /// The newest version whose table fits in `size` bytes.
    ///
    /// Returns `None` when the table is smaller than even the Emacs 25 one.
    /// Hosts newer than 28 declare larger tables and map to `Emacs28`.
    #[must_use]
    pub fn from_env_size(size: isize) -> Option<Self> {
        let size = usize::try_from(size).ok()?;
        Self::ALL.into_iter().rev().find(|version| version.env_size() <= size)
    }

    /// Size of the environment table this version declares
    #[must_use]
    pub const fn env_size(self) -> usize {
        match self {
            Self::Emacs25 => ENV_SIZE_25,
            Self::Emacs26 => ENV_SIZE_26,
            Self::Emacs27 => ENV_SIZE_27,
            Self::Emacs28 => ENV_SIZE_28,
        }
    }

    /// Major version number
    #[must_use]
    pub const fn major(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_grow_with_version() {
        assert!(ENV_SIZE_25 < ENV_SIZE_26);
        assert!(ENV_SIZE_26 < ENV_SIZE_27);
        assert!(ENV_SIZE_27 < ENV_SIZE_28);
    }

    #[test]
    fn test_from_env_size() {
        assert_eq!(HostVersion::from_env_size(0), None);
        assert_eq!(HostVersion::from_env_size(-1), None);
        assert_eq!(HostVersion::from_env_size(ENV_SIZE_25 as isize), Some(HostVersion::Emacs25));
        assert_eq!(HostVersion::from_env_size(ENV_SIZE_26 as isize + 1), Some(HostVersion::Emacs26));
        assert_eq!(HostVersion::from_env_size(ENV_SIZE_28 as isize), Some(HostVersion::Emacs28));
        assert_eq!(HostVersion::from_env_size(ENV_SIZE_28 as isize + 64), Some(HostVersion::Emacs28));
    }

    #[test]
    fn test_pointer_sized_entries() {
        let pointer = size_of::<usize>();
        assert_eq!(ENV_SIZE_26 - ENV_SIZE_25, pointer);
        assert_eq!(ENV_SIZE_27 - ENV_SIZE_26, 5 * pointer);
        assert_eq!(ENV_SIZE_28 - ENV_SIZE_27, 5 * pointer);
        assert_eq!(RUNTIME_SIZE, 3 * pointer);
    }

    #[test]
    fn test_tables_start_with_size_header() {
        let pointer = size_of::<usize>();
        assert_eq!(offset_of!(emacs_runtime, size), 0);
        assert_eq!(offset_of!(emacs_runtime, get_environment), 2 * pointer);
        assert_eq!(offset_of!(emacs_env, size), 0);
        assert_eq!(offset_of!(emacs_env, make_global_ref), 2 * pointer);
    }
}
