//! # Clone Transports
//!
//! Two ways of turning `(repository, ref)` into `archive.tar.gz` inside a
//! scratch directory:
//!
//! - [`HttpArchiveTransport`]: an authenticated download from the forge's
//!   repository archive API, used in CI where a job token is available.
//! - [`SshArchiveTransport`]: `git archive --remote` over SSH, used
//!   everywhere else. SSH runs in batch mode so a missing key fails instead
//!   of prompting.
//!
//! [`select_transport`] picks one from the presence of the job token; nothing
//! else in the fetch path branches on the environment.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use reqwest::blocking::Client;
use url::{form_urlencoded, Url};

use crate::defaults::{ARCHIVE_FILE_NAME, PACKAGE_SCHEME};
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::git;

/// `git@host:path`, optionally written as `ssh://git@host:path`.
const SCP_LIKE: &str = r"^(?:(?:git\+)?ssh://)?(?:[^@/:]+@)?([^@/:]+):([^/\d][^:]*)$";

/// A repository on a forge: its host and project path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProject {
    pub host: String,
    /// `group/subgroup/repo`, without `.git`.
    pub path: String,
}

impl RemoteProject {
    /// Parses https, `git+ssh://`, `ssh://` and scp-like remotes.
    pub fn parse(remote: &str) -> Result<Self> {
        let remote = remote.strip_prefix(PACKAGE_SCHEME).unwrap_or(remote);
        let invalid = |message: &str| Error::InvalidLocator {
            locator: remote.to_string(),
            message: message.to_string(),
        };

        let scp_like = Regex::new(SCP_LIKE)?;
        let (host, path) = match scp_like.captures(remote) {
            Some(captures) => (captures[1].to_string(), captures[2].to_string()),
            None => {
                let url = Url::parse(remote)?;
                let host = url
                    .host_str()
                    .ok_or_else(|| invalid("remote has no host"))?;
                (host.to_string(), url.path().to_string())
            }
        };

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        if path.is_empty() {
            return Err(invalid("remote has no project path"));
        }

        Ok(Self {
            host,
            path: path.to_string(),
        })
    }

    /// Repository archive API endpoint for `git_ref`.
    pub fn archive_endpoint(&self, git_ref: &str) -> String {
        let encode = |value: &str| form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>();
        format!(
            "https://{}/api/v4/projects/{}/repository/archive.tar.gz?sha={}",
            self.host,
            encode(&self.path),
            encode(git_ref)
        )
    }

    /// `git@host:path.git`
    pub fn ssh_remote(&self) -> String {
        format!("git@{}:{}.git", self.host, self.path)
    }
}

/// Produces `archive.tar.gz` for a project at a ref.
pub trait ArchiveTransport: Send + Sync {
    /// Short name used in progress messages.
    fn name(&self) -> &'static str;

    /// Human-readable form of what `download` runs.
    fn describe(&self, project: &RemoteProject, git_ref: &str) -> String;

    /// Writes the archive into `scratch` and returns its path.
    fn download(&self, project: &RemoteProject, git_ref: &str, scratch: &Path) -> Result<PathBuf>;
}

/// Downloads archives through the forge API with a job token.
pub struct HttpArchiveTransport {
    client: Client,
    token: String,
}

impl HttpArchiveTransport {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("polyrepo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl ArchiveTransport for HttpArchiveTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn describe(&self, project: &RemoteProject, git_ref: &str) -> String {
        format!("GET {}", project.archive_endpoint(git_ref))
    }

    fn download(&self, project: &RemoteProject, git_ref: &str, scratch: &Path) -> Result<PathBuf> {
        let endpoint = project.archive_endpoint(git_ref);
        let network = |message: String| Error::Network {
            url: endpoint.clone(),
            message,
        };

        let mut response = self
            .client
            .get(&endpoint)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network(format!("server responded with {}", status)));
        }

        let archive = scratch.join(ARCHIVE_FILE_NAME);
        let mut file = File::create(&archive)?;
        response
            .copy_to(&mut file)
            .map_err(|e| network(e.to_string()))?;
        Ok(archive)
    }
}

/// Runs `git archive --remote` over SSH.
pub struct SshArchiveTransport {
    runner: Arc<dyn CommandRunner>,
}

impl SshArchiveTransport {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl ArchiveTransport for SshArchiveTransport {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn describe(&self, project: &RemoteProject, git_ref: &str) -> String {
        git::archive_command(git_ref, &project.ssh_remote(), ARCHIVE_FILE_NAME).to_string()
    }

    fn download(&self, project: &RemoteProject, git_ref: &str, scratch: &Path) -> Result<PathBuf> {
        let remote = project.ssh_remote();
        let command = git::archive_command(git_ref, &remote, ARCHIVE_FILE_NAME);

        self.runner.run(&command, scratch).map_err(|e| match e {
            Error::CommandFailed { message, .. } => Error::GitClone {
                url: remote.clone(),
                r#ref: git_ref.to_string(),
                hint: git::auth_hint(&message),
                message,
            },
            other => other,
        })?;

        let archive = scratch.join(ARCHIVE_FILE_NAME);
        if !archive.is_file() {
            return Err(Error::Archive {
                path: archive,
                message: "git archive produced no output".to_string(),
            });
        }
        Ok(archive)
    }
}

/// HTTP when a job token is present, SSH otherwise.
pub fn select_transport(
    job_token: Option<&str>,
    runner: Arc<dyn CommandRunner>,
) -> Result<Box<dyn ArchiveTransport>> {
    match job_token.filter(|token| !token.is_empty()) {
        Some(token) => Ok(Box::new(HttpArchiveTransport::new(token)?)),
        None => Ok(Box::new(SshArchiveTransport::new(runner))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::mock::RecordingRunner;
    use tempfile::TempDir;

    fn project(host: &str, path: &str) -> RemoteProject {
        RemoteProject {
            host: host.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_parse_remote_forms() {
        let expected = project("gitlab.com", "polyrepo/ui-shared");
        for remote in [
            "https://gitlab.com/polyrepo/ui-shared.git",
            "polyrepo+https://gitlab.com/polyrepo/ui-shared.git",
            "git+ssh://git@gitlab.com/polyrepo/ui-shared.git",
            "ssh://git@gitlab.com/polyrepo/ui-shared.git",
            "ssh://git@gitlab.com:polyrepo/ui-shared.git",
            "git@gitlab.com:polyrepo/ui-shared.git",
            "gitlab.com:polyrepo/ui-shared",
        ] {
            assert_eq!(RemoteProject::parse(remote).unwrap(), expected, "{}", remote);
        }
    }

    #[test]
    fn test_parse_keeps_subgroups() {
        let parsed = RemoteProject::parse("https://git.example.com/a/b/c.git").unwrap();
        assert_eq!(parsed, project("git.example.com", "a/b/c"));
    }

    #[test]
    fn test_parse_rejects_pathless_remote() {
        assert!(RemoteProject::parse("https://gitlab.com/").is_err());
        assert!(RemoteProject::parse("not a url").is_err());
    }

    #[test]
    fn test_archive_endpoint_encodes_path_and_ref() {
        let endpoint = project("gitlab.com", "polyrepo/ui-shared").archive_endpoint("feature/x");
        assert_eq!(
            endpoint,
            "https://gitlab.com/api/v4/projects/polyrepo%2Fui-shared/repository/archive.tar.gz?sha=feature%2Fx"
        );
    }

    #[test]
    fn test_ssh_remote() {
        assert_eq!(
            project("gitlab.com", "g/r").ssh_remote(),
            "git@gitlab.com:g/r.git"
        );
    }

    #[test]
    fn test_select_transport_by_token() {
        let runner: Arc<dyn CommandRunner> = Arc::new(RecordingRunner::default());
        assert_eq!(select_transport(None, runner.clone()).unwrap().name(), "ssh");
        assert_eq!(select_transport(Some(""), runner.clone()).unwrap().name(), "ssh");
        assert_eq!(select_transport(Some("t0k3n"), runner).unwrap().name(), "http");
    }

    #[test]
    fn test_ssh_transport_runs_git_archive_in_scratch() {
        let temp = TempDir::new().unwrap();
        // The recording runner does not create the archive
        std::fs::write(temp.path().join(ARCHIVE_FILE_NAME), b"").unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let transport = SshArchiveTransport::new(runner.clone());

        let archive = transport
            .download(&project("gitlab.com", "g/r"), "main", temp.path())
            .unwrap();

        assert_eq!(archive, temp.path().join(ARCHIVE_FILE_NAME));
        let calls = runner.calls();
        assert_eq!(
            calls[0].0,
            "git archive main --remote git@gitlab.com:g/r.git --format tar.gz --output archive.tar.gz"
        );
        assert_eq!(calls[0].1, temp.path());
    }

    #[test]
    fn test_ssh_transport_failure_is_a_clone_error() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::failing_on(&["git archive"]));
        let transport = SshArchiveTransport::new(runner);

        let err = transport
            .download(&project("gitlab.com", "g/r"), "main", temp.path())
            .unwrap_err();
        assert!(err.to_string().starts_with("Repository clone failed: "));
    }
}
