//! Git access for tag listing and content-at-tag reads
//!
//! The source repository is kept as a bare clone that only ever needs
//! its tags refreshed; file content is read straight from tag-addressed
//! trees, no working copy required.

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::Repository;

use crate::dedup::ContentSource;
use crate::error::{LineageError, Result};
use crate::version::TagVersion;

/// Clone the repository bare if absent, otherwise refresh its tags.
pub fn ensure_repository(url: &str, dir: &Path) -> Result<Repository> {
    if dir.exists() {
        tracing::info!(path = %dir.display(), "updating existing clone");
        let repo = Repository::open(dir)?;
        {
            let mut remote = repo.find_remote("origin")?;
            remote.fetch(&["refs/tags/*:refs/tags/*"], None, None)?;
        }
        return Ok(repo);
    }

    tracing::info!(url, path = %dir.display(), "cloning repository");
    Ok(RepoBuilder::new().bare(true).clone(url, dir)?)
}

/// Tag-addressed reads of one tracked file in a repository
pub struct GitSource {
    repo: Repository,
    tracked_path: PathBuf,
}

impl GitSource {
    pub fn new(repo: Repository, tracked_path: impl Into<PathBuf>) -> Self {
        Self {
            repo,
            tracked_path: tracked_path.into(),
        }
    }

    /// Open an existing clone
    pub fn open(dir: impl AsRef<Path>, tracked_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(Repository::open(dir)?, tracked_path))
    }

    /// All tag names matching `v*`
    pub fn tag_names(&self) -> Result<Vec<String>> {
        let names = self.repo.tag_names(Some("v*"))?;
        Ok(names.iter().flatten().map(String::from).collect())
    }

    /// Raw bytes of the tracked file at a tag.
    ///
    /// A path absent from the tag's tree (or present as something other
    /// than a file) reports [`LineageError::ContentMissing`]; an unknown
    /// tag or any repository fault is a hard git error.
    pub fn content_at(&self, tag: &str) -> Result<Vec<u8>> {
        let object = self.repo.revparse_single(tag)?;
        let commit = object.peel_to_commit()?;
        let tree = commit.tree()?;

        let entry = match tree.get_path(&self.tracked_path) {
            Ok(entry) => entry,
            Err(err) if err.code() == git2::ErrorCode::NotFound => {
                return Err(LineageError::ContentMissing {
                    version: tag.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let object = entry.to_object(&self.repo)?;
        match object.as_blob() {
            Some(blob) => Ok(blob.content().to_vec()),
            None => Err(LineageError::ContentMissing {
                version: tag.to_string(),
            }),
        }
    }
}

impl ContentSource for GitSource {
    fn fetch(&self, version: &TagVersion) -> Result<Vec<u8>> {
        self.content_at(version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::dedup_revisions;
    use crate::version::select_versions;
    use git2::{Commit, Signature};

    fn commit_and_tag(repo: &Repository, dir: &Path, files: &[(&str, &[u8])], tag: &str) {
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }

        let mut index = repo.index().unwrap();
        for (name, _) in files {
            index.add_path(Path::new(name)).unwrap();
        }
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("test", "test@example.com").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, tag, &tree, &parents)
            .unwrap();

        let target = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight(tag, &target, false).unwrap();
    }

    fn fixture_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        commit_and_tag(&repo, dir.path(), &[("README.md", b"hello")], "v3.0.0");
        commit_and_tag(&repo, dir.path(), &[("plan.go", b"X")], "v3.1.0");
        commit_and_tag(&repo, dir.path(), &[("README.md", b"changed")], "v3.2.0");
        commit_and_tag(&repo, dir.path(), &[("plan.go", b"Y")], "v3.3.0");

        (dir, repo)
    }

    #[test]
    fn test_tag_names_lists_version_tags() {
        let (dir, _repo) = fixture_repo();
        let source = GitSource::open(dir.path(), "plan.go").unwrap();

        let mut tags = source.tag_names().unwrap();
        tags.sort();
        assert_eq!(tags, ["v3.0.0", "v3.1.0", "v3.2.0", "v3.3.0"]);
    }

    #[test]
    fn test_content_at_reads_tag_addressed_bytes() {
        let (dir, _repo) = fixture_repo();
        let source = GitSource::open(dir.path(), "plan.go").unwrap();

        assert_eq!(source.content_at("v3.1.0").unwrap(), b"X");
        assert_eq!(source.content_at("v3.2.0").unwrap(), b"X");
        assert_eq!(source.content_at("v3.3.0").unwrap(), b"Y");
    }

    #[test]
    fn test_absent_path_reports_content_missing() {
        let (dir, _repo) = fixture_repo();
        let source = GitSource::open(dir.path(), "plan.go").unwrap();

        // The file did not exist yet at the first tag.
        let err = source.content_at("v3.0.0").unwrap_err();
        assert!(err.is_content_missing());
    }

    #[test]
    fn test_unknown_tag_is_a_hard_error() {
        let (dir, _repo) = fixture_repo();
        let source = GitSource::open(dir.path(), "plan.go").unwrap();

        let err = source.content_at("v9.9.9").unwrap_err();
        assert!(!err.is_content_missing());
    }

    #[test]
    fn test_dedup_over_a_real_repository() {
        let (dir, _repo) = fixture_repo();
        let source = GitSource::open(dir.path(), "plan.go").unwrap();

        let versions = select_versions(source.tag_names().unwrap(), 3);
        let report = dedup_revisions(versions, &source);

        let names: Vec<&str> = report.unique.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, ["v3.1.0", "v3.3.0"]);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.missing, 1);
    }
}
