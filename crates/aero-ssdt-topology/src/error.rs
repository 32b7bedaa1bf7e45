use std::borrow::Cow;

use aero_aml::AmlError;
use thiserror::Error;

use crate::records::Token;
use crate::store::RecordKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal topology generation failures. Any of these aborts the whole
/// generation call; the partially built tree must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    #[error("{kind} record {token} not found")]
    NotFound { kind: RecordKind, token: Token },

    #[error("out of memory")]
    OutOfMemory,

    #[error("processor {uid}: unsupported _STA bits in {status:#x}")]
    Unsupported { uid: u32, status: u32 },

    #[error(transparent)]
    Aml(#[from] AmlError),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<Cow<'static, str>>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}
