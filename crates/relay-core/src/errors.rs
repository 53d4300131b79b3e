/// Core error type for the relay.
///
/// Adapter crates should map their specific errors into this type (or into one of the
/// narrower use-case errors below) so callers can tell expected failures from internal ones.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by persistence adapters.
///
/// `NotFound` is a normal outcome for lookups; `AlreadyExists` is raised on unique
/// constraint violations. Everything else is `Backend`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("entity not found")]
    NotFound,

    #[error("entity already exists")]
    AlreadyExists,

    #[error("storage backend: {0}")]
    Backend(String),
}

/// Outcome kinds of [`crate::routing::MessageRouter::send_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("chats not found")]
    ChatsNotFound,

    #[error("chats not allowed")]
    ChatsNotAllowed,

    #[error("can not send message")]
    CannotSend,
}

#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    #[error("company not found")]
    CompanyNotFound,

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CompanyError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::CompanyNotFound,
            other => Self::Storage(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("company not found")]
    CompanyNotFound,

    #[error("chat not found")]
    ChatNotFound,

    #[error("chat already added")]
    ChatAlreadyAdded,

    #[error(transparent)]
    Storage(StorageError),
}

impl From<CompanyError> for ChatError {
    fn from(e: CompanyError) -> Self {
        match e {
            CompanyError::CompanyNotFound => Self::CompanyNotFound,
            CompanyError::Storage(s) => Self::Storage(s),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("company already exists")]
    CompanyAlreadyExists,

    #[error("invalid registration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for RegistrationError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AlreadyExists => Self::CompanyAlreadyExists,
            other => Self::Storage(other),
        }
    }
}
