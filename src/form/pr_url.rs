//! GitHub pull request URL parsing
//!
//! Accepts `https://{host}/{owner}/{repo}/pull/{number}` with an optional
//! trailing slash, nothing else.

use url::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GITHUB_HOST: &str = "github.com";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedPr {
    pub owner: String,
    pub repo: String,
    pub number: i64,
    /// The submitted URL, trimmed.
    pub url: String,
}

impl ParsedPr {
    pub fn key(&self) -> (String, String, i64) {
        (self.owner.clone(), self.repo.clone(), self.number)
    }
}

pub fn parse_pr_url(raw: &str, expected_host: &str) -> Result<ParsedPr, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Enter a pull request URL".to_string());
    }

    let url = Url::parse(raw).map_err(|e| format!("Invalid URL {:?}: {}", raw, e))?;

    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case(expected_host) => {}
        _ => return Err(format!("Not a {} URL: {:?}", expected_host, raw)),
    }

    let parts: Vec<&str> = url.path().trim_matches('/').split('/').collect();
    if parts.len() != 4 || parts[2] != "pull" || parts[0].is_empty() || parts[1].is_empty() {
        return Err(format!(
            "Not a valid PR URL: {:?} (expected {}/owner/repo/pull/123)",
            raw, expected_host
        ));
    }

    let number: i64 = parts[3]
        .parse()
        .map_err(|e| format!("Invalid PR number in {:?}: {}", raw, e))?;
    if number <= 0 {
        return Err(format!("Invalid PR number in {:?}", raw));
    }

    Ok(ParsedPr {
        owner: parts[0].to_string(),
        repo: parts[1].to_string(),
        number,
        url: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_canonical_url() {
        let pr = parse_pr_url("https://github.com/rust-lang/rust/pull/12345", "github.com").unwrap();
        assert_eq!(pr.owner, "rust-lang");
        assert_eq!(pr.repo, "rust");
        assert_eq!(pr.number, 12345);
        assert_eq!(pr.url, "https://github.com/rust-lang/rust/pull/12345");
    }

    #[test]
    fn test_trims_whitespace_and_trailing_slash() {
        let pr = parse_pr_url("  https://github.com/a/b/pull/7/  ", "github.com").unwrap();
        assert_eq!(pr.number, 7);
        assert_eq!(pr.url, "https://github.com/a/b/pull/7/");
    }

    #[test]
    fn test_rejects_other_hosts() {
        let err = parse_pr_url("https://gitlab.com/a/b/pull/1", "github.com").unwrap_err();
        assert!(err.contains("Not a github.com URL"));
    }

    #[test]
    fn test_accepts_configured_enterprise_host() {
        let pr = parse_pr_url("https://git.example.com/a/b/pull/3", "git.example.com").unwrap();
        assert_eq!(pr.key(), ("a".to_string(), "b".to_string(), 3));
    }

    #[test]
    fn test_rejects_non_pull_paths() {
        assert!(parse_pr_url("https://github.com/a/b/issues/1", "github.com").is_err());
        assert!(parse_pr_url("https://github.com/a/b/pull/1/files", "github.com").is_err());
        assert!(parse_pr_url("https://github.com/a/b", "github.com").is_err());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(parse_pr_url("https://github.com/a/b/pull/abc", "github.com").is_err());
        assert!(parse_pr_url("https://github.com/a/b/pull/0", "github.com").is_err());
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(parse_pr_url("", "github.com").is_err());
        assert!(parse_pr_url("   ", "github.com").is_err());
        assert!(parse_pr_url("not a url", "github.com").is_err());
    }
}
