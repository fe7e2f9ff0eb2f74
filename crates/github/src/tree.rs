//! Bulk file writes as a single commit through the git data API.

use lifecycle_core::with_retry;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::GitHubClient;
use crate::error::{GitHubError, TreeStep, TreeWriteError};
use crate::types::{FileChange, GitCommit, GitRef, ShaRef};

/// Head of an existing branch.
struct BranchHead {
    commit_sha: String,
    tree_sha: String,
}

impl GitHubClient {
    /// Write `files` to `branch` as one commit and return the commit sha.
    ///
    /// Appends to the branch when it exists (unrelated files are kept via
    /// `base_tree`), otherwise creates the branch with a root commit.
    pub async fn write_files(
        &self,
        repo: &str,
        branch: &str,
        files: &[FileChange],
        message: &str,
    ) -> Result<String, TreeWriteError> {
        info!(repo, branch, files = files.len(), "Writing files as one commit");

        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let sha = self.create_blob(repo, file).await?;
            entries.push(json!({
                "path": file.path,
                "mode": "100644",
                "type": "blob",
                "sha": sha,
            }));
        }

        let head = self.branch_head(repo, branch).await?;

        let mut tree_body = json!({ "tree": entries });
        if let Some(head) = &head {
            tree_body["base_tree"] = Value::String(head.tree_sha.clone());
        }
        let tree_sha = self
            .post_git_object(repo, "/git/trees", &tree_body, TreeStep::Tree)
            .await?;

        let parents: Vec<&str> = head.iter().map(|h| h.commit_sha.as_str()).collect();
        let commit_sha = self
            .post_git_object(
                repo,
                "/git/commits",
                &json!({ "message": message, "tree": tree_sha, "parents": parents }),
                TreeStep::Commit,
            )
            .await?;

        let updated: octocrab::Result<Value> = if head.is_some() {
            self.octocrab
                .patch(
                    self.repo_route(repo, &format!("/git/refs/heads/{}", branch)),
                    Some(&json!({ "sha": commit_sha, "force": false })),
                )
                .await
        } else {
            self.octocrab
                .post(
                    self.repo_route(repo, "/git/refs"),
                    Some(&json!({ "ref": format!("refs/heads/{}", branch), "sha": commit_sha })),
                )
                .await
        };
        updated.map_err(|e| TreeWriteError::new(TreeStep::Ref, GitHubError::from(e).to_string()))?;

        info!(repo, branch, commit = %commit_sha, "Committed files");
        Ok(commit_sha)
    }

    async fn create_blob(&self, repo: &str, file: &FileChange) -> Result<String, TreeWriteError> {
        let route = self.repo_route(repo, "/git/blobs");
        let body = json!({ "content": file.content, "encoding": "utf-8" });
        let label = format!("create blob {}", file.path);

        let blob: ShaRef = with_retry(
            || async {
                let created: octocrab::Result<ShaRef> =
                    self.octocrab.post(route.as_str(), Some(&body)).await;
                created.map_err(GitHubError::from)
            },
            &label,
            self.blob_retry,
        )
        .await
        .map_err(|e| TreeWriteError::blob(&file.path, e.to_string()))?;

        debug!(path = %file.path, sha = %blob.sha, "Created blob");
        Ok(blob.sha)
    }

    /// Current head of `branch`, or `None` when the branch does not exist yet.
    async fn branch_head(
        &self,
        repo: &str,
        branch: &str,
    ) -> Result<Option<BranchHead>, TreeWriteError> {
        let ref_error = |e: GitHubError| TreeWriteError::new(TreeStep::Ref, e.to_string());

        let found: octocrab::Result<GitRef> = self
            .octocrab
            .get(
                self.repo_route(repo, &format!("/git/ref/heads/{}", branch)),
                None::<&()>,
            )
            .await;
        let git_ref = match found.map_err(GitHubError::from) {
            Ok(git_ref) => git_ref,
            // 409 is what an empty repository answers.
            Err(e) if matches!(e.status(), Some(404 | 409)) => return Ok(None),
            Err(e) => return Err(ref_error(e)),
        };

        let commit: octocrab::Result<GitCommit> = self
            .octocrab
            .get(
                self.repo_route(repo, &format!("/git/commits/{}", git_ref.object.sha)),
                None::<&()>,
            )
            .await;
        let commit = commit.map_err(|e| ref_error(GitHubError::from(e)))?;

        Ok(Some(BranchHead {
            commit_sha: git_ref.object.sha,
            tree_sha: commit.tree.sha,
        }))
    }

    async fn post_git_object(
        &self,
        repo: &str,
        path: &str,
        body: &Value,
        step: TreeStep,
    ) -> Result<String, TreeWriteError> {
        let created: octocrab::Result<ShaRef> = self
            .octocrab
            .post(self.repo_route(repo, path), Some(body))
            .await;
        created
            .map(|object| object.sha)
            .map_err(|e| TreeWriteError::new(step, GitHubError::from(e).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_blob_ok(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/blobs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "blob-sha" })))
            .mount(server)
            .await;
    }

    async fn mount_tree_and_commit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/trees"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree-sha" })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/commits"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "commit-sha" })))
            .mount(server)
            .await;
    }

    fn files() -> Vec<FileChange> {
        vec![
            FileChange::new("README.md", "# Lead trail\n"),
            FileChange::new(".github/workflows/provision.yml", "name: Provision\n"),
        ]
    }

    #[tokio::test]
    async fn test_append_commit_keeps_base_tree() {
        let server = MockServer::start().await;
        mount_blob_ok(&server).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/git/ref/heads/main"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "head-sha" } })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/git/commits/head-sha"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "sha": "head-sha", "tree": { "sha": "base-tree" } })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/trees"))
            .and(body_partial_json(json!({ "base_tree": "base-tree" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree-sha" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/commits"))
            .and(body_partial_json(json!({ "tree": "tree-sha", "parents": ["head-sha"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "commit-sha" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/lead-trail/git/refs/heads/main"))
            .and(body_partial_json(json!({ "sha": "commit-sha" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "commit-sha" } })))
            .expect(1)
            .mount(&server)
            .await;

        let sha = test_client(&server)
            .write_files("lead-trail", "main", &files(), "Scaffold project")
            .await
            .unwrap();
        assert_eq!(sha, "commit-sha");
    }

    #[tokio::test]
    async fn test_initial_commit_creates_ref() {
        let server = MockServer::start().await;
        mount_blob_ok(&server).await;
        mount_tree_and_commit(&server).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/git/ref/heads/main"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "message": "Git Repository is empty." })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/refs"))
            .and(body_partial_json(json!({ "ref": "refs/heads/main", "sha": "commit-sha" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ref": "refs/heads/main" })))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .write_files("lead-trail", "main", &files(), "Initial commit")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_blob_failure_names_file_after_retries() {
        let server = MockServer::start().await;
        // test client allows 2 retries: 3 attempts in total.
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/blobs"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "message": "Git Repository is empty." })),
            )
            .expect(3)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .write_files(
                "lead-trail",
                "main",
                &[FileChange::new("app/routes.py", "print('hi')\n")],
                "Scaffold",
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.step,
            TreeStep::Blob {
                path: "app/routes.py".to_string()
            }
        );
        assert!(err.to_string().contains("app/routes.py"));
        assert!(err.to_string().contains("409"));
    }

    #[tokio::test]
    async fn test_commit_failure_names_commit_step() {
        let server = MockServer::start().await;
        mount_blob_ok(&server).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/git/ref/heads/main"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/trees"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree-sha" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/git/commits"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "tree.sha is invalid" })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server)
            .write_files("lead-trail", "main", &files(), "Scaffold")
            .await
            .unwrap_err();
        assert_eq!(err.step, TreeStep::Commit);
    }
}
