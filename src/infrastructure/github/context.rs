//! Repository reference resolution.

use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// An owner/repository pair extracted from a reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Everything a capability needs to reach the repository under analysis.
///
/// Threaded through every capability as an explicit value so two runs can
/// target different repositories without interfering.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub repo: RepoRef,
    pub token: String,
}

/// Parse a repository reference into an owner/repo pair.
///
/// Accepts `https://github.com/owner/repo` (with optional trailing
/// segments or `.git` suffix) and bare `owner/repo`.
pub fn parse_repo_reference(reference: &str) -> DomainResult<RepoRef> {
    let trimmed = reference.trim().trim_end_matches('/');

    let path = if let Some(rest) = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
    {
        rest
    } else if trimmed.contains("://") || trimmed.contains("github.com") {
        return Err(DomainError::InvalidRepoReference(reference.to_string()));
    } else {
        trimmed
    };

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let owner = segments.next();
    let repo = segments.next();

    match (owner, repo) {
        (Some(owner), Some(repo)) => Ok(RepoRef {
            owner: owner.to_string(),
            repo: repo.trim_end_matches(".git").to_string(),
        }),
        _ => Err(DomainError::InvalidRepoReference(reference.to_string())),
    }
}

/// Resolve a reference and produce the setup acknowledgement folded into
/// the supervisor's initial context.
pub fn configure_repository(reference: &str) -> DomainResult<(RepoRef, String)> {
    let repo = parse_repo_reference(reference)?;
    let setup = format!("Repository {repo} configured for analysis.");
    Ok((repo, setup))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let repo = parse_repo_reference("https://github.com/acme/widgets").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "widgets");
    }

    #[test]
    fn test_parse_url_with_extra_segments() {
        let repo = parse_repo_reference("https://github.com/acme/widgets/tree/main/src").unwrap();
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_parse_git_suffix_and_trailing_slash() {
        let repo = parse_repo_reference("https://github.com/acme/widgets.git/").unwrap();
        assert_eq!(repo.repo, "widgets");
    }

    #[test]
    fn test_parse_bare_owner_repo() {
        let repo = parse_repo_reference("acme/widgets").unwrap();
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_parse_invalid_reference() {
        assert!(parse_repo_reference("https://gitlab.com/acme/widgets").is_err());
        assert!(parse_repo_reference("justoneword").is_err());
        assert!(parse_repo_reference("").is_err());
    }

    #[test]
    fn test_configure_repository_setup_text() {
        let (_, setup) = configure_repository("https://github.com/acme/widgets").unwrap();
        assert_eq!(setup, "Repository acme/widgets configured for analysis.");
    }
}
