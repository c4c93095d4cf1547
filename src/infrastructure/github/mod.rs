//! GitHub analysis capabilities.
//!
//! A thin typed layer over the GitHub REST API, exposed to analyzer units
//! through the capability registry. Every capability takes the run's
//! repository context as an explicit value; there is no process-wide
//! current-repository state.

pub mod api;
pub mod capabilities;
pub mod context;
pub mod summarize;

pub use api::{GithubApiClient, GithubError};
pub use capabilities::github_capabilities;
pub use context::{configure_repository, parse_repo_reference, RepoContext, RepoRef};
pub use summarize::summarize_analysis;
