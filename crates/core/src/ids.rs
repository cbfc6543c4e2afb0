#![forbid(unsafe_code)]

use std::fmt;

const MAX_ORG_REPO_NAME_LEN: usize = 256;
const MIN_SHA_LEN: usize = 4;
const MAX_SHA_LEN: usize = 64;

/// Storage-assigned surrogate key of a repo. Never reused once assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId(i64);

impl RepoId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Natural key of a repo, e.g. `corp/my-repo`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrgRepoName(String);

impl OrgRepoName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn org(&self) -> &str {
        self.0.split_once('/').map(|(org, _)| org).unwrap_or("")
    }

    pub fn repo(&self) -> &str {
        self.0.split_once('/').map(|(_, repo)| repo).unwrap_or("")
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, OrgRepoNameError> {
        let value = value.into();
        validate_org_repo_name(&value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for OrgRepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OrgRepoNameError {
    #[error("org/repo name must not be empty")]
    Empty,
    #[error("org/repo name is too long")]
    TooLong,
    #[error("org/repo name must look like 'org/name'")]
    MissingSeparator,
    #[error("org/repo name must contain exactly one '/'")]
    TooManySeparators,
    #[error("org/repo name contains whitespace or control characters")]
    InvalidChar,
}

impl OrgRepoNameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "org_repo_name must not be empty",
            Self::TooLong => "org_repo_name is too long",
            Self::MissingSeparator => "org_repo_name must look like 'org/name'",
            Self::TooManySeparators => "org_repo_name must contain exactly one '/'",
            Self::InvalidChar => "org_repo_name contains whitespace or control characters",
        }
    }
}

fn validate_org_repo_name(value: &str) -> Result<(), OrgRepoNameError> {
    if value.is_empty() {
        return Err(OrgRepoNameError::Empty);
    }
    if value.len() > MAX_ORG_REPO_NAME_LEN {
        return Err(OrgRepoNameError::TooLong);
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(OrgRepoNameError::InvalidChar);
    }
    let Some((org, repo)) = value.split_once('/') else {
        return Err(OrgRepoNameError::MissingSeparator);
    };
    if org.is_empty() || repo.is_empty() {
        return Err(OrgRepoNameError::MissingSeparator);
    }
    if repo.contains('/') {
        return Err(OrgRepoNameError::TooManySeparators);
    }
    Ok(())
}

/// Natural key of a commit. Stored lower-case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitSha(String);

impl CommitSha {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, CommitShaError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.len() < MIN_SHA_LEN {
            return Err(CommitShaError::TooShort);
        }
        if trimmed.len() > MAX_SHA_LEN {
            return Err(CommitShaError::TooLong);
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CommitShaError::NotHex);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitShaError {
    #[error("commit sha is too short")]
    TooShort,
    #[error("commit sha is too long")]
    TooLong,
    #[error("commit sha must be hexadecimal")]
    NotHex,
}

impl CommitShaError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => "commit_sha is too short",
            Self::TooLong => "commit_sha is too long",
            Self::NotHex => "commit_sha must be hexadecimal",
        }
    }
}
