// ============================================================
// Layer 6 — Hugging Face Hub Client
// ============================================================
// Publishes artifacts to a Hub repository over its HTTP API.
// hf-hub only downloads, so uploads go through reqwest.
//
// One upload = one commit:
//
//   1. preupload   POST /api/models/<repo>/preupload/<rev>
//                  the Hub decides "regular" or "lfs" per file
//   2. LFS files   POST /<repo>.git/info/lfs/objects/batch
//                  then PUT the bytes to the returned href
//                  and POST to the verify href if one is given
//   3. commit      POST /api/models/<repo>/commit/<rev>
//                  NDJSON: a header line, then one line per file
//                  (regular files inline as base64, LFS files by
//                  sha256 oid)
//
// The token comes from HF_TOKEN / HUGGING_FACE_HUB_TOKEN, then
// from the file written by `huggingface-cli login`.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use crate::domain::traits::{Registry, RepoTarget, UploadFile};
use crate::error::ClassifierError;

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Bytes sent in the preupload sample field.
const SAMPLE_BYTES: usize = 512;

const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

// ─── Token ────────────────────────────────────────────────────────────────────
pub fn resolve_token() -> Option<String> {
    for var in ["HF_TOKEN", "HUGGING_FACE_HUB_TOKEN"] {
        if let Ok(token) = std::env::var(var) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Some(token);
            }
        }
    }
    token_file().and_then(|p| read_token_file(&p))
}

fn token_file() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HF_HOME") {
        return Some(PathBuf::from(home).join("token"));
    }
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".cache").join("huggingface").join("token"))
}

fn read_token_file(path: &Path) -> Option<String> {
    let token = fs::read_to_string(path).ok()?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ─── Commit payload ───────────────────────────────────────────────────────────
/// How a file travels in the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitFile {
    /// Content inlined as base64.
    Regular { path: String, content: Vec<u8> },
    /// Content already in LFS storage, referenced by sha256.
    Lfs { path: String, oid: String, size: u64 },
}

/// NDJSON body for the commit endpoint.
pub fn commit_payload(summary: &str, files: &[CommitFile]) -> Result<String> {
    let mut lines = vec![serde_json::json!({
        "key": "header",
        "value": { "summary": summary, "description": "" }
    })];

    for file in files {
        lines.push(match file {
            CommitFile::Regular { path, content } => serde_json::json!({
                "key": "file",
                "value": { "content": STANDARD.encode(content), "path": path, "encoding": "base64" }
            }),
            CommitFile::Lfs { path, oid, size } => serde_json::json!({
                "key": "lfsFile",
                "value": { "path": path, "algo": "sha256", "oid": oid, "size": size }
            }),
        });
    }

    let mut body = String::new();
    for line in lines {
        body.push_str(&serde_json::to_string(&line)?);
        body.push('\n');
    }
    Ok(body)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ─── Wire types ───────────────────────────────────────────────────────────────
#[derive(Debug, Deserialize)]
struct PreuploadResponse {
    files: Vec<PreuploadFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreuploadFile {
    path:        String,
    upload_mode: String,
}

#[derive(Debug, Deserialize)]
struct LfsBatchResponse {
    objects: Vec<LfsObject>,
}

#[derive(Debug, Deserialize)]
struct LfsObject {
    oid:     String,
    #[serde(default)]
    actions: Option<LfsActions>,
    #[serde(default)]
    error:   Option<LfsError>,
}

#[derive(Debug, Deserialize)]
struct LfsActions {
    upload: Option<LfsAction>,
    verify: Option<LfsAction>,
}

#[derive(Debug, Deserialize)]
struct LfsAction {
    href:   String,
    #[serde(default)]
    header: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LfsError {
    code:    i64,
    message: String,
}

// ─── HubClient ────────────────────────────────────────────────────────────────
pub struct HubClient {
    http:     Client,
    endpoint: String,
    token:    String,
}

impl HubClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token:    token.into(),
        })
    }

    /// Client for HF_ENDPOINT (or huggingface.co) with the resolved token.
    pub fn from_env() -> Result<Self> {
        let token    = resolve_token().ok_or(ClassifierError::MissingToken)?;
        let endpoint = std::env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint, token)
    }

    fn api_url(&self, target: &RepoTarget, action: &str) -> String {
        format!(
            "{}/api/{}s/{}/{}/{}",
            self.endpoint, target.repo_type, target.repo_id, action, target.revision
        )
    }

    fn lfs_batch_url(&self, target: &RepoTarget) -> String {
        let prefix = match target.repo_type.as_str() {
            "model" => String::new(),
            other   => format!("{other}s/"),
        };
        format!("{}/{}{}.git/info/lfs/objects/batch", self.endpoint, prefix, target.repo_id)
    }

    /// Ask the Hub which files must go through LFS.
    fn preupload(&self, target: &RepoTarget, files: &[(String, Vec<u8>)]) -> Result<HashMap<String, String>> {
        let body = serde_json::json!({
            "files": files.iter().map(|(path, content)| serde_json::json!({
                "path":   path,
                "sample": STANDARD.encode(&content[..content.len().min(SAMPLE_BYTES)]),
                "size":   content.len(),
            })).collect::<Vec<_>>()
        });

        let resp = self.http
            .post(self.api_url(target, "preupload"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .context("Preupload request failed")?;
        let parsed: PreuploadResponse = check(resp)?.json().context("Invalid preupload response")?;

        Ok(parsed.files.into_iter().map(|f| (f.path, f.upload_mode)).collect())
    }

    fn upload_lfs(&self, target: &RepoTarget, path: &str, content: &[u8], oid: &str) -> Result<()> {
        let body = serde_json::json!({
            "operation": "upload",
            "transfers": ["basic"],
            "hash_algo": "sha256",
            "objects":   [{ "oid": oid, "size": content.len() }],
        });

        let resp = self.http
            .post(self.lfs_batch_url(target))
            .bearer_auth(&self.token)
            .header("Accept", LFS_MEDIA_TYPE)
            .header("Content-Type", LFS_MEDIA_TYPE)
            .body(serde_json::to_vec(&body)?)
            .send()
            .context("LFS batch request failed")?;
        let batch: LfsBatchResponse = check(resp)?.json().context("Invalid LFS batch response")?;

        let object = batch
            .objects
            .into_iter()
            .find(|o| o.oid == oid)
            .ok_or_else(|| ClassifierError::Registry(format!("LFS batch did not return '{path}'")))?;

        if let Some(err) = object.error {
            return Err(ClassifierError::Registry(format!(
                "LFS error for '{path}': {} {}", err.code, err.message
            )).into());
        }

        // No actions: the object is already stored.
        let Some(actions) = object.actions else {
            tracing::debug!("'{}' already in LFS storage", path);
            return Ok(());
        };

        if let Some(upload) = actions.upload {
            tracing::info!("Uploading '{}' ({} bytes) to LFS", path, content.len());
            let mut req = self.http.put(&upload.href).body(content.to_vec());
            for (k, v) in &upload.header {
                req = req.header(k.as_str(), v.as_str());
            }
            check(req.send().with_context(|| format!("LFS upload of '{path}' failed"))?)?;
        }

        if let Some(verify) = actions.verify {
            let mut req = self.http
                .post(&verify.href)
                .bearer_auth(&self.token)
                .header("Content-Type", LFS_MEDIA_TYPE)
                .body(serde_json::to_vec(&serde_json::json!({ "oid": oid, "size": content.len() }))?);
            for (k, v) in &verify.header {
                req = req.header(k.as_str(), v.as_str());
            }
            check(req.send().with_context(|| format!("LFS verify of '{path}' failed"))?)?;
        }

        Ok(())
    }

    fn commit(&self, target: &RepoTarget, payload: String) -> Result<()> {
        let resp = self.http
            .post(self.api_url(target, "commit"))
            .bearer_auth(&self.token)
            .header("Content-Type", "application/x-ndjson")
            .body(payload)
            .send()
            .context("Commit request failed")?;
        check(resp)?;
        Ok(())
    }
}

impl Registry for HubClient {
    fn repo_url(&self, repo_id: &str) -> String {
        format!("{}/{}", self.endpoint, repo_id)
    }

    fn upload(&self, target: &RepoTarget, files: &[UploadFile], summary: &str) -> Result<()> {
        let mut contents = Vec::with_capacity(files.len());
        for file in files {
            let bytes = fs::read(&file.local)
                .with_context(|| format!("Cannot read '{}'", file.local.display()))?;
            contents.push((file.path_in_repo.clone(), bytes));
        }

        let modes = self.preupload(target, &contents)?;

        let mut commit_files = Vec::with_capacity(contents.len());
        for (path, content) in contents {
            let lfs = modes.get(&path).is_some_and(|m| m == "lfs");
            if lfs {
                let oid = sha256_hex(&content);
                self.upload_lfs(target, &path, &content, &oid)?;
                commit_files.push(CommitFile::Lfs { path, oid, size: content.len() as u64 });
            } else {
                commit_files.push(CommitFile::Regular { path, content });
            }
        }

        self.commit(target, commit_payload(summary, &commit_files)?)?;
        tracing::info!("Committed {} files to '{}'", commit_files.len(), target.repo_id);
        Ok(())
    }
}

/// Turn a non-2xx response into a registry error carrying the body.
fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url  = resp.url().to_string();
    let body = resp.text().unwrap_or_default();
    Err(ClassifierError::Registry(format!("{status} from {url}: {body}")).into())
}
