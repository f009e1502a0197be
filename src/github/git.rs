//! Local git operations backing the GitHub sync.
//!
//! Repository introspection and commits go through `git2`; pushing shells
//! out to the `git` binary so the user's credential helpers apply.

use super::GitError;
use git2::{Repository, Status, StatusOptions};
use std::path::{Path, PathBuf};
use std::process::Command;

const INDEX_CHANGES: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

/// A discovered git working tree rooted at the project directory.
pub struct GitWorkspace {
    repo: Repository,
    root: PathBuf,
}

impl std::fmt::Debug for GitWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitWorkspace")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitWorkspace {
    pub fn discover(root: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(root).map_err(|_| GitError::NotARepository)?;
        let workdir = repo
            .workdir()
            .ok_or(GitError::NotARepository)?
            .to_path_buf();
        Ok(Self {
            repo,
            root: workdir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remotes(&self) -> Result<Vec<String>, GitError> {
        let names = self.repo.remotes()?;
        Ok(names.iter().flatten().map(str::to_string).collect())
    }

    /// First configured remote, matching the behavior of `git remote`.
    pub fn default_remote(&self) -> Result<String, GitError> {
        self.remotes()?
            .into_iter()
            .next()
            .ok_or(GitError::NoRemotes)
    }

    pub fn remote_url(&self, name: &str) -> Result<String, GitError> {
        let remote = self
            .repo
            .find_remote(name)
            .map_err(|_| GitError::UnknownRemote(name.to_string()))?;
        remote
            .url()
            .map(str::to_string)
            .ok_or_else(|| GitError::UnknownRemote(name.to_string()))
    }

    pub fn current_branch(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(GitError::DetachedHead);
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or(GitError::DetachedHead)
    }

    pub fn head_sha(&self) -> Result<String, GitError> {
        let head = self.repo.head()?.peel_to_commit()?;
        Ok(head.id().to_string())
    }

    /// Paths currently staged in the index.
    pub fn staged_paths(&self) -> Result<Vec<String>, GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status().intersects(INDEX_CHANGES))
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    /// Stage the given paths and commit them, returning the new commit SHA.
    ///
    /// Refuses to run while unrelated files are already staged, and returns
    /// `Ok(None)` when the paths introduce no change against HEAD.
    pub fn commit_paths(
        &self,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<Option<String>, GitError> {
        if !self.staged_paths()?.is_empty() {
            return Err(GitError::DirtyIndex);
        }

        let mut index = self.repo.index()?;
        for path in paths {
            let rel = path
                .strip_prefix(&self.root)
                .map_err(|_| GitError::OutsideRepository(path.clone()))?;
            index.add_path(rel)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let parent = self.repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_id {
            return Ok(None);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(Some(oid.to_string()))
    }

    /// Push the branch via the `git` binary so credential helpers are used.
    pub fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        let output = Command::new("git")
            .args(["push", remote, branch])
            .current_dir(&self.root)
            .output()
            .map_err(|err| GitError::PushFailed(err.to_string()))?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(GitError::PushFailed(if stderr.is_empty() {
                "git push failed".to_string()
            } else {
                stderr
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        // Seed an initial commit so HEAD exists.
        std::fs::write(dir.join("README.md"), "# test\n").unwrap();
        {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("README.md")).unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = repo.signature().unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn test_discover_outside_repo_fails() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            GitWorkspace::discover(temp.path()).unwrap_err(),
            GitError::NotARepository
        ));
    }

    #[test]
    fn test_commit_paths_skips_when_nothing_changed() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let ws = GitWorkspace::discover(temp.path()).unwrap();

        // Committing the already-committed file introduces no change.
        let result = ws
            .commit_paths(&[temp.path().join("README.md")], "noop")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_commit_paths_commits_new_file() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let ws = GitWorkspace::discover(temp.path()).unwrap();

        std::fs::write(temp.path().join("state.json"), "{}").unwrap();
        let sha = ws
            .commit_paths(&[temp.path().join("state.json")], "sync state")
            .unwrap();
        assert!(sha.is_some());
        assert_eq!(ws.head_sha().unwrap(), sha.unwrap());
        // Index is clean afterwards.
        assert!(ws.staged_paths().unwrap().is_empty());
    }

    #[test]
    fn test_commit_paths_rejects_outside_path() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let ws = GitWorkspace::discover(temp.path()).unwrap();
        let outside = TempDir::new().unwrap();
        let err = ws
            .commit_paths(&[outside.path().join("x.md")], "bad")
            .unwrap_err();
        assert!(matches!(err, GitError::OutsideRepository(_)));
    }

    #[test]
    fn test_current_branch_on_fresh_repo() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let ws = GitWorkspace::discover(temp.path()).unwrap();
        let branch = ws.current_branch().unwrap();
        assert!(!branch.is_empty());
    }
}
