//! Git checkouts of third-party repositories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Commit, Repository, ResetType};

/// A working copy of a remote repository at a fixed path.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    /// Remote repository URL
    remote: String,

    /// Local checkout path
    path: PathBuf,
}

impl GitCheckout {
    pub fn new(remote: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        GitCheckout {
            remote: remote.into(),
            path: path.into(),
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a checkout directory is already present.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Clone the remote into the checkout path.
    pub fn clone_repo(&self) -> Result<()> {
        tracing::info!("Cloning {}", self.remote);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Repository::clone(&self.remote, &self.path)
            .with_context(|| format!("failed to clone {}", self.remote))?;

        Ok(())
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.path)
            .with_context(|| format!("failed to open git repository: {}", self.path.display()))
    }

    /// Fetch `reference` (tag or branch) from `origin`.
    pub fn fetch(&self, reference: &str) -> Result<()> {
        tracing::info!("Fetching {} from {}", reference, self.remote);

        let repo = self.open()?;
        let mut remote = repo.find_remote("origin")?;
        let refspecs = [
            format!("+refs/tags/{0}:refs/tags/{0}", reference),
            format!("+refs/heads/{0}:refs/remotes/origin/{0}", reference),
        ];

        // Only one of the two refspecs can match; try them separately so a
        // missing branch does not mask a tag that exists.
        let mut fetched = false;
        let mut last_err = None;
        for refspec in &refspecs {
            match remote.fetch(&[refspec.as_str()], None, None) {
                Ok(()) => fetched = true,
                Err(e) => last_err = Some(e),
            }
        }

        match (fetched, last_err) {
            (false, Some(e)) => {
                Err(e).with_context(|| format!("failed to fetch {} from {}", reference, self.remote))
            }
            _ => Ok(()),
        }
    }

    /// Check out `reference` with a detached HEAD and a hard-reset work tree.
    ///
    /// Tags are preferred, then remote-tracking branches, then any revspec.
    pub fn checkout(&self, reference: &str) -> Result<String> {
        let repo = self.open()?;
        let commit = resolve_commit(&repo, reference)
            .with_context(|| format!("`{}` not found in {}", reference, self.path.display()))?;
        let id = commit.id();

        repo.set_head_detached(id)?;
        repo.reset(commit.as_object(), ResetType::Hard, None)
            .with_context(|| format!("failed to check out {}", reference))?;

        tracing::debug!("Checked out {} at {}", reference, id);
        Ok(id.to_string())
    }
}

fn resolve_commit<'r>(repo: &'r Repository, reference: &str) -> Result<Commit<'r>> {
    let candidates = [
        format!("refs/tags/{}", reference),
        format!("refs/remotes/origin/{}", reference),
        reference.to_string(),
    ];

    let mut last_err = None;
    for spec in &candidates {
        match repo.revparse_single(spec).and_then(|obj| obj.peel_to_commit()) {
            Ok(commit) => return Ok(commit),
            Err(e) => last_err = Some(e),
        }
    }

    match last_err {
        Some(e) => Err(e.into()),
        None => anyhow::bail!("no candidates for `{}`", reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        std::fs::write(workdir.join(name), contents).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("test", "test@example.com").unwrap();

        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&Commit> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn upstream_with_tags(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let first = commit_file(&repo, "README.md", "3.3", "first");
        repo.tag_lightweight("3.3", &repo.find_object(first, None).unwrap(), false)
            .unwrap();
        let second = commit_file(&repo, "README.md", "3.4", "second");
        repo.tag_lightweight("3.4", &repo.find_object(second, None).unwrap(), false)
            .unwrap();
        repo
    }

    #[test]
    fn test_clone_and_checkout_tag() {
        let tmp = TempDir::new().unwrap();
        let upstream = tmp.path().join("upstream");
        upstream_with_tags(&upstream);

        let checkout = GitCheckout::new(upstream.to_string_lossy(), tmp.path().join("glfw"));
        assert!(!checkout.exists());

        checkout.clone_repo().unwrap();
        assert!(checkout.exists());

        checkout.checkout("3.3").unwrap();
        let readme = std::fs::read_to_string(checkout.path().join("README.md")).unwrap();
        assert_eq!(readme, "3.3");

        checkout.fetch("3.4").unwrap();
        checkout.checkout("3.4").unwrap();
        let readme = std::fs::read_to_string(checkout.path().join("README.md")).unwrap();
        assert_eq!(readme, "3.4");
    }

    #[test]
    fn test_checkout_unknown_reference_fails() {
        let tmp = TempDir::new().unwrap();
        let upstream = tmp.path().join("upstream");
        upstream_with_tags(&upstream);

        let checkout = GitCheckout::new(upstream.to_string_lossy(), tmp.path().join("glfw"));
        checkout.clone_repo().unwrap();

        assert!(checkout.checkout("9.9.9").is_err());
    }
}
