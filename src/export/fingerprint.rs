use xxhash_rust::xxh3::Xxh3;

use crate::catalog::{ShapeId, ShapeParams};
use crate::foundation::core::Canvas;
use crate::model::template::CustomText;
use crate::render::RenderStyle;

const XXH3_SEED: u64 = 0x6a1f_27c3_90e4_b5d8;

/// Bumped whenever raster output for identical inputs changes.
pub const EXPORTER_REVISION: u32 = 2;

/// Stable content key of one export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExportFingerprint {
    /// High 64 bits of the digest.
    pub hi: u64,
    /// Low 64 bits of the digest.
    pub lo: u64,
}

impl ExportFingerprint {
    /// 32 hex digits.
    pub fn to_hex(self) -> String {
        format!("{:016x}{:016x}", self.hi, self.lo)
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_bits().to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    fn finish(self) -> ExportFingerprint {
        let v = self.inner.digest128();
        ExportFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

/// Identity of a caption font file.
pub fn font_key(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64_with_seed(bytes, XXH3_SEED)
}

/// Fingerprint of a raster export.
///
/// Covers the shape, output-space parameters, output size and revision. With a caption it also
/// covers the caption, the halo style, and the font (`font` is a [`font_key`], `None` when
/// captions are skipped).
pub fn fingerprint_export(
    shape: &ShapeId,
    scaled: &ShapeParams,
    output: Canvas,
    text: Option<&CustomText>,
    style: &RenderStyle,
    font: Option<u64>,
) -> ExportFingerprint {
    let mut h = StableHasher::new();
    h.write_u32(EXPORTER_REVISION);
    h.write_str(shape.as_str());
    h.write_u32(output.width);
    h.write_u32(output.height);
    let c = scaled.primary_color;
    for v in [c.r, c.g, c.b, c.a] {
        h.write_u8(v);
    }
    h.write_f64(scaled.border_width);
    h.write_f64(scaled.border_radius);
    match text {
        None => h.write_u8(0),
        Some(t) => {
            h.write_u8(1);
            h.write_str(t.text.trim());
            h.write_u8(t.position as u8);
            for v in [t.color.r, t.color.g, t.color.b, t.color.a] {
                h.write_u8(v);
            }
            let halo = style.halo_color();
            for v in [halo.r, halo.g, halo.b, halo.a] {
                h.write_u8(v);
            }
            match font {
                None => h.write_u8(0),
                Some(key) => {
                    h.write_u8(1);
                    h.write_bytes(&key.to_le_bytes());
                }
            }
        }
    }
    h.finish()
}
