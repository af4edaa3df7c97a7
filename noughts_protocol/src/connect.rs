// Connection-establishment error catalogue.
//
// A fixed mapping from connection-level numeric codes to human-readable
// text, used by clients while dialing the coordinator (for logging and
// display). This is a lower-level channel than in-game outcomes: it covers
// the dial only and never mixes with `message::Outcome` values.

use std::fmt;
use std::io;

/// Numeric code for a connection-establishment result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectCode {
    Success,
    Unknown,
    HostNotFound,
    ConnectionRefused,
    Timeout,
    NetworkError,
}

impl ConnectCode {
    /// Stable numeric code.
    pub fn code(self) -> u16 {
        match self {
            ConnectCode::Success => 0,
            ConnectCode::Unknown => 1000,
            ConnectCode::HostNotFound => 1001,
            ConnectCode::ConnectionRefused => 1002,
            ConnectCode::Timeout => 1003,
            ConnectCode::NetworkError => 1004,
        }
    }

    /// Catalogue text for the code.
    pub fn message(self) -> &'static str {
        match self {
            ConnectCode::Success => "connection established",
            ConnectCode::Unknown => "unknown connection error",
            ConnectCode::HostNotFound => "host not found",
            ConnectCode::ConnectionRefused => "connection refused by host",
            ConnectCode::Timeout => "connection attempt timed out",
            ConnectCode::NetworkError => "network error while connecting",
        }
    }

    /// Classify an I/O error raised while dialing.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ConnectCode::ConnectionRefused,
            io::ErrorKind::TimedOut => ConnectCode::Timeout,
            io::ErrorKind::NotFound | io::ErrorKind::AddrNotAvailable => {
                ConnectCode::HostNotFound
            }
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => ConnectCode::NetworkError,
            _ => ConnectCode::Unknown,
        }
    }
}

/// A failed connection attempt: catalogue code plus the underlying error.
#[derive(Debug)]
pub struct ConnectFailure {
    pub code: ConnectCode,
    detail: Option<io::Error>,
}

impl ConnectFailure {
    pub fn new(code: ConnectCode) -> Self {
        ConnectFailure { code, detail: None }
    }

    /// Wrap an I/O error raised while dialing.
    pub fn from_io(err: io::Error) -> Self {
        ConnectFailure {
            code: ConnectCode::from_io(&err),
            detail: Some(err),
        }
    }
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.code.message(), self.code.code())?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConnectFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.detail
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ConnectCode::Success.code(), 0);
        assert_eq!(ConnectCode::Unknown.code(), 1000);
        assert_eq!(ConnectCode::HostNotFound.code(), 1001);
        assert_eq!(ConnectCode::ConnectionRefused.code(), 1002);
        assert_eq!(ConnectCode::Timeout.code(), 1003);
        assert_eq!(ConnectCode::NetworkError.code(), 1004);
    }

    #[test]
    fn every_code_has_text() {
        for code in [
            ConnectCode::Success,
            ConnectCode::Unknown,
            ConnectCode::HostNotFound,
            ConnectCode::ConnectionRefused,
            ConnectCode::Timeout,
            ConnectCode::NetworkError,
        ] {
            assert!(!code.message().is_empty());
        }
    }

    #[test]
    fn classifies_refused_dial() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(ConnectCode::from_io(&err), ConnectCode::ConnectionRefused);
    }

    #[test]
    fn classifies_unknown_kinds_as_unknown() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(ConnectCode::from_io(&err), ConnectCode::Unknown);
    }

    #[test]
    fn failure_display_includes_code_and_detail() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed");
        let failure = ConnectFailure::from_io(err);
        let text = failure.to_string();
        assert!(text.contains("1003"));
        assert!(text.contains("deadline elapsed"));
    }
}
