/*++

Licensed under the Apache-2.0 license.

File Name:

    error.rs

Abstract:

    Error types reported by the host bridge.

--*/

use std::io;

use thiserror::Error;

/// Failures of the launch path. The offload path has no error kind: it
/// either completes or blocks forever.
#[derive(Debug, Error)]
pub enum HostError {
    /// Duplicating argument `index` failed. `None` means the backing array
    /// itself could not be allocated.
    #[error("out of memory while duplicating launch arguments (index {index:?})")]
    OutOfMemory { index: Option<usize> },

    #[error("can't create kernel main thread: {0}")]
    Spawn(#[source] io::Error),

    /// The context already runs a kernel.
    #[error("kernel already launched")]
    AlreadyLaunched,
}

impl HostError {
    /// Negative errno value handed back across the C ABI.
    pub fn errno(&self) -> i32 {
        match self {
            HostError::OutOfMemory { .. } => -libc::ENOMEM,
            HostError::Spawn(err) => -err.raw_os_error().unwrap_or(libc::EAGAIN),
            HostError::AlreadyLaunched => -libc::EALREADY,
        }
    }
}

/// Failure reported by an init hook. Logged, never fatal.
#[derive(Debug, Error)]
#[error("init hook {hook} failed with code {code}")]
pub struct InitError {
    pub hook: &'static str,
    pub code: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(HostError::OutOfMemory { index: Some(2) }.errno(), -libc::ENOMEM);
        assert_eq!(HostError::OutOfMemory { index: None }.errno(), -libc::ENOMEM);

        let os = HostError::Spawn(io::Error::from_raw_os_error(libc::EPERM));
        assert_eq!(os.errno(), -libc::EPERM);

        let synthetic = HostError::Spawn(io::Error::new(io::ErrorKind::Other, "no threads"));
        assert_eq!(synthetic.errno(), -libc::EAGAIN);

        assert_eq!(HostError::AlreadyLaunched.errno(), -libc::EALREADY);
    }

    #[test]
    fn test_display() {
        let err = HostError::Spawn(io::Error::from_raw_os_error(libc::EAGAIN));
        assert!(err.to_string().starts_with("can't create kernel main thread"));
    }
}
