//! Error handling for the montage CLI

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors reported at the top of the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Catalog error in {}: {message}", path.display())]
    Catalog { path: PathBuf, message: String },

    #[error("Band error: {message}")]
    Band { message: String },

    #[error("Rendering error: {message}")]
    Rendering { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn catalog<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::Catalog { path, message: message.into() }
    }

    pub fn band<S: Into<String>>(message: S) -> Self {
        Self::Band { message: message.into() }
    }

    pub fn rendering<S: Into<String>>(message: S) -> Self {
        Self::Rendering { message: message.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

/// Error message with hints for the common fatal cases
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Relative paths are resolved from the working directory",
                path.display()
            ));
        }

        CliError::Catalog { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • The catalog needs the columns ID, RA, DEC, Major, Minor and PA\n\
                 • RA and DEC are decimal degrees; Major and Minor are degrees\n\
                 • Source IDs must be unique",
            );
        }

        CliError::Band { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Every image needs a pixel scale: CDELT1/CDELT2 or D001SCAL\n\
                 • Every image needs a celestial WCS (CTYPE, CRVAL, CRPIX)\n\
                 • Run 'montage inspect' to see what each header provides",
            );
        }

        CliError::Config { .. } | CliError::Validation { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your montage.toml configuration file\n\
                 • Use 'montage config --example' to generate a sample configuration",
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("catalog.csv"));
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("catalog.csv"));

        let err = CliError::band("no scale");
        assert!(format_error_with_suggestions(&err).contains("D001SCAL"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(matches!(cli_err, CliError::Io { .. }));
    }
}
