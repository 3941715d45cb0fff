//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the host counter collector read the real
//! `/proc` filesystem on Linux or an in-memory [`MockFs`](super::MockFs) in tests.

use std::io;
use std::path::Path;

/// Abstraction for reading pseudo-files.
pub trait FileSystem {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}
