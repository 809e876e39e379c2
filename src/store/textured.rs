//! Multi-view color accumulation over a fixed point set

use std::collections::HashSet;
use std::path::Path;

use image::{GrayImage, RgbImage};

use crate::cloud::PointCloud;
use crate::core::error::Error;
use crate::core::grid::Grid;
use crate::core::types::{Result, Rgb};
use crate::picking::{EMPTY, IdBuffer, codec};
use crate::store::patch::{self, ColorPatch};

/// Marker color written by [`TexturedPointSet::flag`]
pub const FLAG_COLOR: Rgb = [1.0, 0.0, 1.0];

/// Point cloud whose colors are merged from generated views.
///
/// The first view that colors a point wins: once a point is retextured it
/// ignores later views until [`reset`](Self::reset). A snapshot taken at
/// construction backs `reset`. Pruning shrinks the cloud and the snapshot
/// together, so a reset never brings pruned points back.
pub struct TexturedPointSet {
    cloud: PointCloud,
    original: PointCloud,
    retextured: HashSet<u32>,
    /// Bumped whenever indices held elsewhere become invalid
    epoch: u64,
}

impl TexturedPointSet {
    /// Wrap a cloud. Fails if its indices cannot all be picked.
    pub fn new(cloud: PointCloud) -> Result<Self> {
        codec::check_capacity(cloud.len())?;
        Ok(Self {
            original: cloud.clone(),
            cloud,
            retextured: HashSet::new(),
            epoch: 0,
        })
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn len(&self) -> usize {
        self.cloud.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cloud.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        self.cloud.colors()
    }

    pub fn retextured(&self) -> &HashSet<u32> {
        &self.retextured
    }

    pub fn retextured_count(&self) -> usize {
        self.retextured.len()
    }

    pub fn is_retextured(&self, index: u32) -> bool {
        self.retextured.contains(&index)
    }

    /// Index generation; changes on every prune and reset
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Fail unless `epoch` is current
    pub fn check_epoch(&self, epoch: u64) -> Result<()> {
        if epoch != self.epoch {
            return Err(Error::StaleIndexReference(format!(
                "captured at epoch {}, store is at epoch {}",
                epoch, self.epoch
            )));
        }
        Ok(())
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index as usize >= self.len() {
            return Err(Error::StaleIndexReference(format!(
                "point {} out of range for {} points",
                index,
                self.len()
            )));
        }
        Ok(())
    }

    fn check_ids(&self, ids: impl IntoIterator<Item = u32>) -> Result<()> {
        ids.into_iter()
            .filter(|&id| id != EMPTY)
            .try_for_each(|id| self.check_index(id))
    }

    /// Merge a generated image into the colors of the points it shows.
    ///
    /// Pixels whose point is already retextured are skipped. Returns how
    /// many points got their first color from this call.
    pub fn retexture(&mut self, image: &RgbImage, ids: &IdBuffer) -> Result<usize> {
        if image.dimensions() != ids.dimensions() {
            return Err(Error::InvalidDimensions(format!(
                "image is {}x{}, id buffer is {}x{}",
                image.width(),
                image.height(),
                ids.width(),
                ids.height()
            )));
        }
        self.check_ids(ids.as_slice().iter().copied())?;

        let mut added = 0;
        for (x, y, &id) in ids.enumerate() {
            if id == EMPTY || self.retextured.contains(&id) {
                continue;
            }
            let px = image.get_pixel(x, y).0;
            self.cloud.colors_mut()[id as usize] = px.map(|c| c as f32 / 255.0);
            self.retextured.insert(id);
            added += 1;
        }
        log::info!(
            "Retextured {} new points ({} of {} total)",
            added,
            self.retextured.len(),
            self.len()
        );
        Ok(added)
    }

    /// Paint points with [`FLAG_COLOR`] for inspection. Does not mark them
    /// as retextured.
    pub fn flag(&mut self, ids: &[u32]) -> Result<()> {
        self.check_ids(ids.iter().copied())?;
        let colors = self.cloud.colors_mut();
        for &id in ids.iter().filter(|&&id| id != EMPTY) {
            colors[id as usize] = FLAG_COLOR;
        }
        log::debug!("Flagged {} points", ids.len());
        Ok(())
    }

    /// Keep only `keep` points, renumbered 0..n in `keep` order.
    ///
    /// Irreversible. Repeated indices are kept once (first occurrence).
    /// The retextured set is remapped to the new numbering; every other
    /// index held outside the store is invalidated.
    pub fn filter(&mut self, keep: &[u32]) -> Result<()> {
        self.check_ids(keep.iter().copied())?;
        if keep.contains(&EMPTY) {
            return Err(Error::StaleIndexReference("EMPTY is not a point index".into()));
        }

        let mut seen = HashSet::with_capacity(keep.len());
        let order: Vec<u32> = keep.iter().copied().filter(|id| seen.insert(*id)).collect();

        let before = self.len();
        self.cloud = self.cloud.subset(&order)?;
        self.original = self.original.subset(&order)?;
        self.retextured = order
            .iter()
            .enumerate()
            .filter(|(_, old)| self.retextured.contains(*old))
            .map(|(new, _)| new as u32)
            .collect();
        self.epoch += 1;
        log::info!(
            "Pruned {} -> {} points ({} retextured)",
            before,
            self.len(),
            self.retextured.len()
        );
        Ok(())
    }

    /// Restore colors from the snapshot and forget all retexturing
    pub fn reset(&mut self) {
        self.cloud = self.original.clone();
        self.retextured.clear();
        self.epoch += 1;
        log::info!("Reset {} points to original colors", self.len());
    }

    /// Per-pixel mask: 0 where the pixel's point is already retextured,
    /// 1 everywhere else, EMPTY pixels included.
    pub fn mask_retextured(&self, ids: &IdBuffer) -> Grid<u8> {
        ids.map(|id| if self.retextured.contains(id) { 0 } else { 1 })
    }

    /// [`mask_retextured`](Self::mask_retextured) scaled to 0/255
    pub fn mask_retextured_image(&self, ids: &IdBuffer) -> GrayImage {
        let mask = self.mask_retextured(ids);
        GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            image::Luma([mask.get(x, y).copied().unwrap_or(1) * 255])
        })
    }

    /// Only the retextured points, in ascending index order
    pub fn retextured_cloud(&self) -> Result<PointCloud> {
        self.cloud.subset(&self.sorted_retextured())
    }

    /// Retextured indices, ascending
    pub fn sorted_retextured(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.retextured.iter().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Snapshot the retextured colors as a patch
    pub fn to_patch(&self) -> ColorPatch {
        let indices = self.sorted_retextured();
        let colors = indices.iter().map(|&i| self.cloud.colors()[i as usize]).collect();
        ColorPatch::new(self.len(), indices, colors)
    }

    /// Reset, then write a patch's colors directly and mark its points as
    /// retextured. The patch is validated before anything changes.
    pub fn apply_patch(&mut self, patch: &ColorPatch) -> Result<()> {
        patch.validate(self.len())?;
        self.reset();
        let colors = self.cloud.colors_mut();
        for (&i, &c) in patch.indices.iter().zip(&patch.colors) {
            colors[i as usize] = c;
        }
        self.retextured.extend(patch.indices.iter().copied());
        Ok(())
    }

    /// Persist the retextured colors under `name` in `dir`
    pub fn save(&self, dir: &Path, name: &str) -> Result<std::path::PathBuf> {
        let path = patch::save_patch(dir, name, &self.to_patch())?;
        log::info!("Saved {} retextured points to {:?}", self.retextured.len(), path);
        Ok(path)
    }

    /// Restore colors saved with [`save`](Self::save)
    pub fn load(&mut self, dir: &Path, name: &str) -> Result<()> {
        let patch = patch::load_patch(dir, name)?;
        self.apply_patch(&patch)?;
        log::info!("Loaded {} retextured points from session '{}'", patch.indices.len(), name);
        Ok(())
    }
}
