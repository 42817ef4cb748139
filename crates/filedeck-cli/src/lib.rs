use filedeck_core::{AppError, ErrorMetadata};
use serde::Serialize;

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("filedeck=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// JSON shape of a per-item failure.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub status: u16,
    pub message: String,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code(),
            status: err.http_status_code(),
            message: err.client_message(),
        }
    }
}

pub fn error_reports(errors: &[AppError]) -> Vec<ErrorReport> {
    errors.iter().map(ErrorReport::from).collect()
}

/// Split `name` off a local path argument.
pub fn file_name(path: &std::path::Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
