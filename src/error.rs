use thiserror::Error;

/// Contract violations reported by shape construction and [`World`](crate::World) mutation
///
/// Every error is raised before any state is modified.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),

    #[error("invalid cell size {0}; must be positive and finite")]
    InvalidCellSize(String),

    #[error("item {0} is already registered")]
    DuplicateItem(String),

    #[error("item {0} is not registered")]
    UnknownItem(String),
}

pub type Result<T> = std::result::Result<T, Error>;
