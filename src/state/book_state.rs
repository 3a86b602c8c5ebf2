/// Book outcome definitions
///
/// Every book the driver loop touches ends in exactly one of these states. Failures are
/// per book: none of them stops processing of the next book.
use std::fmt;

/// Terminal state of one book in a download run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookOutcome {
    // ===== Success =====
    /// Every requested file of the book was written
    Saved,

    // ===== Skip =====
    /// The book page redirected, so the site has no such book
    NotFound,

    // ===== Per-book failures =====
    /// The book page answered with a 4xx/5xx status
    HttpError,

    /// The book page could not be reached
    ConnectionFailed,

    /// The book page request could not be built or its body could not be decoded
    RequestFailed,

    /// The book page markup lacked an expected element
    ParseFailed,

    /// The text download failed, redirected, or ran out of attempts
    TextUnavailable,

    /// The cover image download failed or redirected
    ImageUnavailable,

    /// Writing a file or the JSON description failed
    StorageFailed,
}

impl BookOutcome {
    /// All outcomes, in report order
    pub const ALL: [BookOutcome; 9] = [
        Self::Saved,
        Self::NotFound,
        Self::HttpError,
        Self::ConnectionFailed,
        Self::RequestFailed,
        Self::ParseFailed,
        Self::TextUnavailable,
        Self::ImageUnavailable,
        Self::StorageFailed,
    ];

    /// Returns true if the book was fully saved
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Returns true if the book does not exist on the site
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns true if processing the book failed
    pub fn is_error(&self) -> bool {
        !self.is_success() && !self.is_skipped()
    }

    /// Short machine-friendly name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::NotFound => "not_found",
            Self::HttpError => "http_error",
            Self::ConnectionFailed => "connection_failed",
            Self::RequestFailed => "request_failed",
            Self::ParseFailed => "parse_failed",
            Self::TextUnavailable => "text_unavailable",
            Self::ImageUnavailable => "image_unavailable",
            Self::StorageFailed => "storage_failed",
        }
    }
}

impl fmt::Display for BookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
