#![forbid(unsafe_code)]

use crd_core::RepoId;
use std::fmt;

/// Transactional step of a batch write, named in [`StoreError::WriteStep`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStep {
    BeginTransaction,
    UpsertRepos,
    UpsertCommits,
    UpsertPrs,
    DeleteReviewers,
    InsertReviewers,
    Commit,
}

impl WriteStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeginTransaction => "begin transaction",
            Self::UpsertRepos => "upsert repos",
            Self::UpsertCommits => "upsert commits",
            Self::UpsertPrs => "upsert prs",
            Self::DeleteReviewers => "delete reviewers",
            Self::InsertReviewers => "insert reviewers",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A stored row no longer decodes into its domain type.
    #[error("corrupt row: {0}")]
    CorruptRow(&'static str),
    #[error("unknown repo (repo_id={repo_id})")]
    UnknownRepo { repo_id: RepoId },
    #[error("{step} failed: {source}")]
    WriteStep {
        step: WriteStep,
        #[source]
        source: rusqlite::Error,
    },
    #[error("RESET_REQUIRED: {0}")]
    ResetRequired(&'static str),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::CorruptRow(_) => "CORRUPT_ROW",
            Self::UnknownRepo { .. } => "UNKNOWN_REPO",
            Self::WriteStep { .. } => "WRITE_FAILED",
            Self::ResetRequired(_) => "RESET_REQUIRED",
        }
    }

    /// The failing step for transactional write errors.
    pub fn write_step(&self) -> Option<WriteStep> {
        match self {
            Self::WriteStep { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub(crate) fn at(step: WriteStep) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::WriteStep { step, source }
}
