use thiserror::Error;

/// Everything that can go wrong between a category's first request and its
/// files landing on disk. The orchestrator only distinguishes two classes,
/// via [`ScrapeError::is_fatal`]: errors that end the run, and errors that
/// skip the current category.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Bot defense answered instead of the page. Retrying within the same
    /// run is unproductive; unblocking takes a different client strategy.
    #[error("blocked by bot defense at {url} (HTTP {status})")]
    Blocked { url: String, status: u16 },

    /// The player id does not exist on the site at all.
    #[error("player page not found at {url}")]
    SubjectNotFound { url: String },

    /// Transient network trouble that survived every retry.
    #[error("request to {url} failed after {attempts} attempt(s): {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("unparseable page: {0}")]
    Parse(String),

    /// Two different columns collided under one name within a single table.
    #[error("category {category}: duplicate column name {column:?}")]
    Schema { category: String, column: String },

    #[error("export I/O error")]
    ExportIo(#[from] std::io::Error),

    #[error("CSV export error")]
    ExportCsv(#[from] csv::Error),

    #[error("workbook export error")]
    ExportXlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ScrapeError {
    /// Whether the rest of the run can still be trusted after this error.
    /// Fatal errors abort the remaining categories; the rest are recorded
    /// as a skip and the run moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::Blocked { .. }
                | ScrapeError::SubjectNotFound { .. }
                | ScrapeError::ExportIo(_)
                | ScrapeError::ExportCsv(_)
                | ScrapeError::ExportXlsx(_)
                | ScrapeError::Client(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_and_export_errors_are_fatal() {
        let blocked = ScrapeError::Blocked {
            url: "http://example.test".into(),
            status: 403,
        };
        assert!(blocked.is_fatal());

        let io = ScrapeError::ExportIo(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(io.is_fatal());
    }

    #[test]
    fn category_level_errors_are_not_fatal() {
        let fetch = ScrapeError::Fetch {
            url: "http://example.test".into(),
            attempts: 4,
            reason: "timed out".into(),
        };
        assert!(!fetch.is_fatal());
        assert!(!ScrapeError::Parse("empty document".into()).is_fatal());

        let schema = ScrapeError::Schema {
            category: "batting".into(),
            column: "Runs".into(),
        };
        assert!(!schema.is_fatal());
    }
}
