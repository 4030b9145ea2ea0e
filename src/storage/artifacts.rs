//! Versioned artifact directory with an atomically updated `CURRENT` pointer.
//!
//! File layout: line 1 is a JSON header `{format, version, checksum}`, the
//! remainder is the JSON artifact. `checksum` is the SHA-256 of the body bytes.

use super::write_atomic;
use crate::error::{Result, RiskError};
use crate::model::ModelArtifact;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ARTIFACT_FORMAT: &str = "disaster-risk-artifact/1";

const CURRENT: &str = "CURRENT";
const PREFIX: &str = "artifact-";
const SUFFIX: &str = ".json";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    format: String,
    version: u64,
    checksum: String,
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Published versions, ascending.
    pub fn versions(&self) -> Result<Vec<u64>> {
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(v) = name
                .strip_prefix(PREFIX)
                .and_then(|s| s.strip_suffix(SUFFIX))
                .and_then(|s| s.parse::<u64>().ok())
            {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn path_for(&self, version: u64) -> PathBuf {
        self.dir.join(format!("{PREFIX}{version}{SUFFIX}"))
    }

    /// Write `artifact` as the next version, then point `CURRENT` at it.
    /// The previous artifact stays readable until the pointer moves.
    pub fn publish(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        let version = self.versions()?.last().map_or(1, |v| v + 1);
        let body = serde_json::to_vec(artifact).map_err(|e| RiskError::artifact(self.path_for(version), e))?;
        let header = Header {
            format: ARTIFACT_FORMAT.to_string(),
            version,
            checksum: checksum(&body),
        };
        let mut bytes = serde_json::to_vec(&header).map_err(|e| RiskError::artifact(self.path_for(version), e))?;
        bytes.push(b'\n');
        bytes.extend_from_slice(&body);

        let path = self.path_for(version);
        write_atomic(&path, &bytes)?;
        let name = format!("{PREFIX}{version}{SUFFIX}");
        write_atomic(&self.dir.join(CURRENT), name.as_bytes())?;
        info!(
            path = %path.display(),
            version,
            id = %artifact.id,
            algorithm = %artifact.algorithm(),
            "artifact published"
        );
        Ok(path)
    }

    pub fn current_path(&self) -> Result<PathBuf> {
        let pointer = self.dir.join(CURRENT);
        let name = std::fs::read_to_string(&pointer)
            .map_err(|e| RiskError::artifact(&pointer, format!("no current artifact: {e}")))?;
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(RiskError::artifact(&pointer, format!("invalid pointer `{name}`")));
        }
        Ok(self.dir.join(name))
    }

    pub fn load_current(&self) -> Result<ModelArtifact> {
        self.load(&self.current_path()?)
    }

    /// Read and verify one artifact file.
    pub fn load(&self, path: &Path) -> Result<ModelArtifact> {
        load_artifact(path)
    }
}

pub(crate) fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    let bytes = std::fs::read(path).map_err(|e| RiskError::artifact(path, e))?;
    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| RiskError::artifact(path, "missing header line"))?;
    let (head, body) = (&bytes[..split], &bytes[split + 1..]);

    let header: Header =
        serde_json::from_slice(head).map_err(|e| RiskError::artifact(path, format!("bad header: {e}")))?;
    if header.format != ARTIFACT_FORMAT {
        return Err(RiskError::artifact(
            path,
            format!("unsupported format `{}`", header.format),
        ));
    }
    let actual = checksum(body);
    if actual != header.checksum {
        warn!(path = %path.display(), expected = %header.checksum, actual = %actual, "checksum mismatch");
        return Err(RiskError::artifact(path, "checksum mismatch"));
    }

    let artifact: ModelArtifact =
        serde_json::from_slice(body).map_err(|e| RiskError::artifact(path, format!("bad body: {e}")))?;
    artifact.check_schema(path)?;
    Ok(artifact)
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
