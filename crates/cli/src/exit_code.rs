//! Process exit codes
//!
//! Scripts rely on these values, so existing codes must never change meaning.

use bfs_core::Error;

/// Exit status of a `bfs` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Anything without a more specific code
    GeneralError = 1,
    /// Bad arguments or an unusable path
    UsageError = 2,
    /// The storage service failed or could not be reached
    NetworkError = 3,
    NotFound = 5,
    /// The operation exists in the interface but not in this backend
    UnsupportedFeature = 6,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::PathNotFound(_) | Error::ProfileNotFound(_) => ExitCode::NotFound,
            Error::InvalidPath(_) | Error::NotAFile(_) | Error::InvalidArgument(_) => {
                ExitCode::UsageError
            }
            Error::BackendIo(_) => ExitCode::NetworkError,
            Error::NotImplemented(_) => ExitCode::UnsupportedFeature,
            Error::Closed(_) | Error::Config(_) | Error::Io(_) | Error::Serialization(_) => {
                ExitCode::GeneralError
            }
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::NetworkError.as_i32(), 3);
        assert_eq!(ExitCode::NotFound.as_i32(), 5);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::from(&Error::path_not_found("c/b")),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from(&Error::not_a_file("c")),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from(&Error::BackendIo("Azure Error: boom".to_string())),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::from(&Error::NotImplemented("nope".to_string())),
            ExitCode::UnsupportedFeature
        );
    }
}
