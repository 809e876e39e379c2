//! Color patch serialization and disk I/O
//!
//! A patch holds only the `(index, color)` pairs of retextured points,
//! not the whole cloud. Files are rkyv archives compressed with LZ4.

use std::path::{Path, PathBuf};

use rkyv::{Archive, Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Rgb};

/// Current patch format version
pub const PATCH_VERSION: u32 = 1;

/// File extension for color patches
pub const PATCH_EXTENSION: &str = "sscp";

/// Retextured colors of one session
#[derive(Debug, Clone, PartialEq, Archive, Deserialize, Serialize)]
pub struct ColorPatch {
    pub version: u32,
    /// Size of the cloud the indices refer to
    pub point_count: u64,
    /// Ascending point indices
    pub indices: Vec<u32>,
    /// Colors parallel to `indices`, channels in [0, 1]
    pub colors: Vec<Rgb>,
}

impl ColorPatch {
    pub fn new(point_count: usize, indices: Vec<u32>, colors: Vec<Rgb>) -> Self {
        Self {
            version: PATCH_VERSION,
            point_count: point_count as u64,
            indices,
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Check the patch can be applied to a cloud of `point_count` points
    pub fn validate(&self, point_count: usize) -> Result<()> {
        if self.version != PATCH_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported patch version {}",
                self.version
            )));
        }
        if self.indices.len() != self.colors.len() {
            return Err(Error::Persistence(format!(
                "{} indices but {} colors",
                self.indices.len(),
                self.colors.len()
            )));
        }
        if self.point_count != point_count as u64 {
            return Err(Error::StaleIndexReference(format!(
                "patch was saved for {} points, store holds {}",
                self.point_count, point_count
            )));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= point_count) {
            return Err(Error::StaleIndexReference(format!(
                "patch references point {} of {}",
                bad, point_count
            )));
        }
        Ok(())
    }
}

/// Serialize a patch to bytes (uncompressed)
pub fn serialize_patch(patch: &ColorPatch) -> Result<Vec<u8>> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(patch)
        .map_err(|e| Error::Persistence(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Deserialize a patch from bytes (uncompressed)
pub fn deserialize_patch(data: &[u8]) -> Result<ColorPatch> {
    // archived f32/u32 fields need an aligned buffer
    let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(data.len());
    aligned.extend_from_slice(data);
    rkyv::from_bytes::<ColorPatch, rkyv::rancor::Error>(&aligned)
        .map_err(|e| Error::Persistence(e.to_string()))
}

/// Serialize and compress a patch using LZ4
pub fn compress_patch(patch: &ColorPatch) -> Result<Vec<u8>> {
    let serialized = serialize_patch(patch)?;
    Ok(lz4_flex::compress_prepend_size(&serialized))
}

/// Decompress and deserialize a patch
pub fn decompress_patch(data: &[u8]) -> Result<ColorPatch> {
    let decompressed = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| Error::Persistence(format!("LZ4 decompression failed: {}", e)))?;
    deserialize_patch(&decompressed)
}

/// Get the file path for a session's patch
pub fn patch_path(base_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Config(format!("invalid session name {:?}", name)));
    }
    Ok(base_dir.join(format!("{}.{}", name, PATCH_EXTENSION)))
}

/// Save a patch to disk (compressed), creating the directory if needed
pub fn save_patch(base_dir: &Path, name: &str, patch: &ColorPatch) -> Result<PathBuf> {
    let path = patch_path(base_dir, name)?;
    std::fs::create_dir_all(base_dir)?;
    std::fs::write(&path, compress_patch(patch)?)?;
    Ok(path)
}

/// Load a patch from disk
pub fn load_patch(base_dir: &Path, name: &str) -> Result<ColorPatch> {
    let path = patch_path(base_dir, name)?;
    let compressed = std::fs::read(&path)?;
    decompress_patch(&compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ColorPatch {
        ColorPatch::new(10, vec![1, 4, 9], vec![[0.0, 0.5, 1.0], [0.25; 3], [1.0, 0.0, 0.0]])
    }

    #[test]
    fn test_patch_path() {
        let base = Path::new("/tmp/patches");
        assert_eq!(
            patch_path(base, "office").unwrap(),
            PathBuf::from("/tmp/patches/office.sscp")
        );
        assert!(patch_path(base, "").is_err());
        assert!(patch_path(base, "../escape").is_err());
        assert!(patch_path(base, "..").is_err());
    }

    #[test]
    fn test_compress_decompress() {
        let patch = sample();
        let compressed = compress_patch(&patch).expect("compression failed");
        assert!(!compressed.is_empty());
        assert_eq!(decompress_patch(&compressed).expect("decompression failed"), patch);
    }

    #[test]
    fn test_corrupt_data() {
        assert!(matches!(decompress_patch(&[1, 2, 3]), Err(Error::Persistence(_))));
    }

    #[test]
    fn test_validate() {
        let patch = sample();
        assert!(patch.validate(10).is_ok());
        assert!(matches!(patch.validate(9), Err(Error::StaleIndexReference(_))));

        let mut bad = sample();
        bad.colors.pop();
        assert!(matches!(bad.validate(10), Err(Error::Persistence(_))));

        let mut future = sample();
        future.version = 99;
        assert!(matches!(future.validate(10), Err(Error::Persistence(_))));

        let mut out_of_range = sample();
        out_of_range.indices[2] = 10;
        assert!(matches!(out_of_range.validate(10), Err(Error::StaleIndexReference(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sessions");
        let path = save_patch(&nested, "scan", &sample()).unwrap();
        assert!(path.exists());
        assert_eq!(load_patch(&nested, "scan").unwrap(), sample());
        assert!(matches!(load_patch(&nested, "missing"), Err(Error::Io(_))));
    }
}
