use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::Canvas,
    foundation::error::{FrameError, FrameResult},
    store::AssetStorage,
    store::assets::{FsAssetStorage, InMemoryAssetStorage, UrlSigner},
};

/// Canvas sizes and AI acceptance threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Width of the canvas template widths and radii are authored on.
    pub design_width: u32,
    /// Height of the design canvas.
    pub design_height: u32,
    /// Fraction of each side, measured inward, outside of which an AI raster may paint.
    pub ai_interior_inset: f64,
    /// Worker threads for batch export; `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            design_width: 360,
            design_height: 640,
            ai_interior_inset: 0.2,
            threads: None,
        }
    }
}

impl ExportConfig {
    /// Raster output canvas.
    pub fn output_canvas(&self) -> FrameResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Authoring canvas.
    pub fn design_canvas(&self) -> FrameResult<Canvas> {
        Canvas::new(self.design_width, self.design_height)
    }
}

/// Signed retrieval URLs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// URL prefix assets are served under.
    pub base_url: String,
    /// Secret mixed into every signature.
    pub secret: String,
    /// Default lifetime of a signed URL.
    pub ttl_secs: i64,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("base_url", &self.base_url)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/assets".to_owned(),
            secret: "giftframe-dev-secret".to_owned(),
            ttl_secs: 3600,
        }
    }
}

impl SigningConfig {
    /// Default URL lifetime.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs)
    }

    /// Signer for these settings.
    pub fn signer(&self) -> UrlSigner {
        UrlSigner::new(self.base_url.clone(), self.secret.as_bytes().to_vec())
    }
}

/// Process-wide settings. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Raster export sizes and AI thresholds.
    pub export: ExportConfig,
    /// Signed URL settings.
    pub signing: SigningConfig,
    /// Store assets on disk below this directory instead of in memory.
    pub assets_root: Option<PathBuf>,
    /// Font file used for captions in exported rasters.
    pub text_font: Option<PathBuf>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl FrameConfig {
    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> FrameResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `GIFTFRAME_*` environment overrides. Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(w) = env_parse::<u32>("GIFTFRAME_EXPORT_WIDTH").filter(|&n| n > 0) {
            self.export.width = w;
        }
        if let Some(h) = env_parse::<u32>("GIFTFRAME_EXPORT_HEIGHT").filter(|&n| n > 0) {
            self.export.height = h;
        }
        if let Ok(secret) = std::env::var("GIFTFRAME_SIGNING_SECRET")
            && !secret.is_empty()
        {
            self.signing.secret = secret;
        }
        if let Some(root) = std::env::var_os("GIFTFRAME_ASSETS_ROOT") {
            self.assets_root = Some(PathBuf::from(root));
        }
        if let Some(font) = std::env::var_os("GIFTFRAME_TEXT_FONT") {
            self.text_font = Some(PathBuf::from(font));
        }
        self
    }

    /// Check ranges that serde cannot.
    pub fn validate(&self) -> FrameResult<()> {
        self.export.output_canvas()?;
        self.export.design_canvas()?;
        if !(0.0..0.5).contains(&self.export.ai_interior_inset) {
            return Err(FrameError::validation(format!(
                "export.ai_interior_inset {} outside [0, 0.5)",
                self.export.ai_interior_inset
            )));
        }
        if self.export.threads == Some(0) {
            return Err(FrameError::validation("export.threads must be >= 1 when set"));
        }
        if self.signing.secret.is_empty() {
            return Err(FrameError::validation("signing.secret must not be empty"));
        }
        if self.signing.ttl_secs <= 0 {
            return Err(FrameError::validation("signing.ttl_secs must be positive"));
        }
        Ok(())
    }

    /// Asset storage selected by `assets_root`.
    pub fn asset_storage(&self) -> Arc<dyn AssetStorage> {
        let signer = self.signing.signer();
        match &self.assets_root {
            Some(root) => Arc::new(FsAssetStorage::new(root.clone(), signer)),
            None => Arc::new(InMemoryAssetStorage::new(signer)),
        }
    }

    /// Contents of `text_font`, if configured.
    pub fn caption_font(&self) -> FrameResult<Option<Vec<u8>>> {
        let Some(path) = &self.text_font else {
            return Ok(None);
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("read caption font '{}'", path.display()))?;
        Ok(Some(bytes))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
