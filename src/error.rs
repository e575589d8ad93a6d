use thiserror::Error;

/// Errors surfaced by the CDP transport layer.
///
/// Mirrors the split chromiumoxide draws between transport failures and the
/// remote end rejecting a command outright.
#[derive(Debug, Error)]
pub enum CdpError {
    #[error("cdp transport disconnected")]
    Disconnected,
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
    #[error("cdp command {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("received no response for the pending command")]
    NoResponse,
    #[error("channel closed")]
    ChannelClosed,
}

impl CdpError {
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        CdpError::Remote {
            code,
            message: message.into(),
        }
    }

    /// The CDP code returned by `Runtime.releaseObject` when the object id
    /// is already gone. Fire-and-forget releases swallow exactly this.
    pub const INVALID_REMOTE_OBJECT_ID: i64 = -32000;

    pub fn is_invalid_remote_object_id(&self) -> bool {
        matches!(self, CdpError::Remote { code, .. } if *code == Self::INVALID_REMOTE_OBJECT_ID)
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CdpError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CdpError::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for CdpError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        CdpError::Disconnected
    }
}

/// The BiDi error taxonomy from the wire spec (`error` field of an error
/// response). Every variant corresponds 1:1 to a string on the wire; see
/// [`BidiErrorCode::as_str`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BidiErrorCode {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("invalid session id")]
    InvalidSessionId,
    #[error("no such alert")]
    NoSuchAlert,
    #[error("no such element")]
    NoSuchElement,
    #[error("no such frame")]
    NoSuchFrame,
    #[error("no such handle")]
    NoSuchHandle,
    #[error("no such node")]
    NoSuchNode,
    #[error("no such script")]
    NoSuchScript,
    #[error("session not created")]
    SessionNotCreated,
    #[error("unable to capture screen")]
    UnableToCaptureScreen,
    #[error("unable to close browser")]
    UnableToCloseBrowser,
    #[error("unknown command")]
    UnknownCommand,
    #[error("unknown error")]
    UnknownError,
    #[error("unsupported operation")]
    UnsupportedOperation,
}

impl BidiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidiErrorCode::InvalidArgument => "invalid argument",
            BidiErrorCode::InvalidSessionId => "invalid session id",
            BidiErrorCode::NoSuchAlert => "no such alert",
            BidiErrorCode::NoSuchElement => "no such element",
            BidiErrorCode::NoSuchFrame => "no such frame",
            BidiErrorCode::NoSuchHandle => "no such handle",
            BidiErrorCode::NoSuchNode => "no such node",
            BidiErrorCode::NoSuchScript => "no such script",
            BidiErrorCode::SessionNotCreated => "session not created",
            BidiErrorCode::UnableToCaptureScreen => "unable to capture screen",
            BidiErrorCode::UnableToCloseBrowser => "unable to close browser",
            BidiErrorCode::UnknownCommand => "unknown command",
            BidiErrorCode::UnknownError => "unknown error",
            BidiErrorCode::UnsupportedOperation => "unsupported operation",
        }
    }
}

/// A BiDi-surfaced error: the wire error code plus a human message and
/// optional stacktrace, matching spec section 7's tagged-variant design.
#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct BidiError {
    pub code: BidiErrorCode,
    pub message: String,
    pub stacktrace: Option<String>,
}

impl BidiError {
    pub fn new(code: BidiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stacktrace: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(BidiErrorCode::InvalidArgument, message)
    }

    pub fn no_such_frame(message: impl Into<String>) -> Self {
        Self::new(BidiErrorCode::NoSuchFrame, message)
    }

    pub fn no_such_handle(message: impl Into<String>) -> Self {
        Self::new(BidiErrorCode::NoSuchHandle, message)
    }

    pub fn no_such_script(message: impl Into<String>) -> Self {
        Self::new(BidiErrorCode::NoSuchScript, message)
    }

    pub fn unknown_command(method: impl std::fmt::Display) -> Self {
        Self::new(BidiErrorCode::UnknownCommand, format!("unknown command {method}"))
    }

    pub fn unknown_error(message: impl Into<String>) -> Self {
        Self::new(BidiErrorCode::UnknownError, message)
    }

    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Self::new(BidiErrorCode::UnsupportedOperation, message)
    }
}

/// Translates a CDP failure into the BiDi taxonomy per spec section 7:
/// a disconnected/gone target surfaces as `no such frame` when the command
/// named that context, otherwise errors fall through to `unknown error`
/// with the CDP message preserved.
pub fn cdp_error_to_bidi(err: CdpError, referenced_frame: bool) -> BidiError {
    match err {
        CdpError::Disconnected | CdpError::ChannelClosed if referenced_frame => {
            BidiError::no_such_frame("target is gone")
        }
        CdpError::Disconnected | CdpError::ChannelClosed => {
            BidiError::unknown_error("cdp transport disconnected")
        }
        CdpError::Remote { code, message } => BidiError::unknown_error(format!("{code}: {message}")),
        CdpError::Serde(e) => BidiError::unknown_error(e.to_string()),
        CdpError::NoResponse => BidiError::unknown_error("no response from chromium instance"),
    }
}
