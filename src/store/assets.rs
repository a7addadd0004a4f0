use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest as _, Sha256};

use crate::{
    foundation::error::{FrameError, FrameResult},
    store::{AssetRef, AssetStorage, SignedUrl},
};

/// Normalize and validate storage-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> FrameResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(FrameError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(FrameError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FrameError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(FrameError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_encode(&Sha256::digest(bytes))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

/// Signs and verifies time-limited retrieval URLs.
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Signer for URLs below `base_url`.
    pub fn new(base_url: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            secret: secret.into(),
        }
    }

    fn mac(&self, path: &str, expires: i64) -> FrameResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| FrameError::Other(anyhow::anyhow!("invalid signing key: {e}")))?;
        mac.update(path.as_bytes());
        mac.update(&[0]);
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    fn signature(&self, path: &str, expires: i64) -> FrameResult<String> {
        Ok(hex_encode(&self.mac(path, expires)?.finalize().into_bytes()))
    }

    /// URL for `path` valid until `now + ttl`.
    pub fn sign(&self, path: &str, ttl: Duration, now: DateTime<Utc>) -> FrameResult<SignedUrl> {
        if ttl <= Duration::zero() {
            return Err(FrameError::validation("signed url ttl must be positive"));
        }
        let path = normalize_rel_path(path)?;
        let expires_at = now + ttl;
        let expires = expires_at.timestamp();
        Ok(SignedUrl {
            url: format!(
                "{}/{}?expires={}&sig={}",
                self.base_url,
                path,
                expires,
                self.signature(&path, expires)?
            ),
            expires_at,
        })
    }

    /// Return the asset path when `url` carries a valid, unexpired signature.
    pub fn verify(&self, url: &str, now: DateTime<Utc>) -> FrameResult<String> {
        let rest = url
            .strip_prefix(&self.base_url)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| FrameError::validation("url is not under the signing base"))?;
        let (path, query) = rest
            .split_once('?')
            .ok_or_else(|| FrameError::validation("signed url has no query"))?;

        let mut expires = None;
        let mut sig = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse::<i64>().ok(),
                Some(("sig", v)) => sig = Some(v),
                _ => {}
            }
        }
        let expires = expires.ok_or_else(|| FrameError::validation("missing expires"))?;
        let sig = sig.ok_or_else(|| FrameError::validation("missing sig"))?;

        let sig = hex_decode(sig).ok_or_else(|| FrameError::validation("malformed sig"))?;
        // Constant-time comparison.
        self.mac(path, expires)?
            .verify_slice(&sig)
            .map_err(|_| FrameError::validation("signature mismatch"))?;
        if now.timestamp() >= expires {
            return Err(FrameError::validation("signed url expired"));
        }
        Ok(path.to_owned())
    }
}

/// Process-local [`AssetStorage`].
#[derive(Debug)]
pub struct InMemoryAssetStorage {
    blobs: RwLock<HashMap<String, (String, Vec<u8>)>>,
    signer: UrlSigner,
}

impl InMemoryAssetStorage {
    /// Empty storage signing URLs with `signer`.
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            signer,
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetStorage for InMemoryAssetStorage {
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> FrameResult<AssetRef> {
        let path = normalize_rel_path(path)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| FrameError::store("asset storage lock poisoned"))?;
        blobs.insert(path.clone(), (content_type.to_owned(), bytes.to_vec()));
        Ok(AssetRef {
            path,
            content_type: content_type.to_owned(),
            byte_len: bytes.len() as u64,
        })
    }

    fn get(&self, asset: &AssetRef) -> FrameResult<Vec<u8>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| FrameError::store("asset storage lock poisoned"))?;
        blobs
            .get(&asset.path)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| FrameError::store(format!("asset '{}' not found", asset.path)))
    }

    fn signed_url(
        &self,
        asset: &AssetRef,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> FrameResult<SignedUrl> {
        self.signer.sign(&asset.path, ttl, now)
    }
}

/// [`AssetStorage`] rooted at a local directory.
#[derive(Debug)]
pub struct FsAssetStorage {
    root: PathBuf,
    signer: UrlSigner,
}

impl FsAssetStorage {
    /// Storage under `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>, signer: UrlSigner) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    fn full_path(&self, rel: &str) -> FrameResult<PathBuf> {
        Ok(self.root.join(normalize_rel_path(rel)?))
    }
}

impl AssetStorage for FsAssetStorage {
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> FrameResult<AssetRef> {
        let rel = normalize_rel_path(path)?;
        let full = self.root.join(&rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create asset dir '{}'", parent.display()))?;
        }
        // Readers never see a half-written payload.
        let tmp = full.with_extension("partial");
        std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &full)
            .with_context(|| format!("rename into '{}'", full.display()))?;
        Ok(AssetRef {
            path: rel,
            content_type: content_type.to_owned(),
            byte_len: bytes.len() as u64,
        })
    }

    fn get(&self, asset: &AssetRef) -> FrameResult<Vec<u8>> {
        let full = self.full_path(&asset.path)?;
        Ok(std::fs::read(&full).with_context(|| format!("read '{}'", full.display()))?)
    }

    fn signed_url(
        &self,
        asset: &AssetRef,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> FrameResult<SignedUrl> {
        self.signer.sign(&asset.path, ttl, now)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/assets.rs"]
mod tests;
