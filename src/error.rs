use crate::data::FetchError;

/// Exit code for usage, configuration and local I/O failures.
pub const EXIT_USAGE: u8 = 2;
/// Exit code when the provider has no usable data for the requested date.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for upstream (provider) failures.
pub const EXIT_UPSTREAM: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        let code = if err.is_no_data() { EXIT_NO_DATA } else { EXIT_UPSTREAM };
        Self::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_map_to_exit_codes() {
        let no_data = FetchError::NoData {
            what: "etf listing".to_string(),
            date: "20250103".to_string(),
        };
        assert_eq!(AppError::from(no_data).exit_code(), EXIT_NO_DATA);

        let parse = FetchError::Parse("bad json".to_string());
        let err = AppError::from(parse);
        assert_eq!(err.exit_code(), EXIT_UPSTREAM);
        assert!(err.message().contains("bad json"));
    }
}
