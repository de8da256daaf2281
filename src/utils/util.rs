use thiserror::Error;

/// Errors are split by what the caller can do about them: `Config` signals a
/// header/body mismatch that must abort the run, `Data` a malformed record,
/// `Io` a stream failure.
#[derive(Debug, Error, PartialEq)]
pub enum SvgtError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Malformed input: {0}")]
    Data(String),
    #[error("{0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, SvgtError>;

pub fn handle_error_and_exit(err: SvgtError) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
