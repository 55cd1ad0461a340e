//! Read-only layer snapshots for UI panels

use serde::Serialize;

use super::LayerManager;
use crate::error::PaintResult;
use crate::surface::PixelBuffer;
use crate::types::{BlendMode, LayerId};

/// Downscaled preview of a layer, straight-alpha RGBA8 rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl From<&PixelBuffer> for Thumbnail {
    fn from(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            rgba: buffer.as_bytes().to_vec(),
        }
    }
}

/// Everything a layer panel shows for one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub thumbnail: Thumbnail,
}

impl LayerManager {
    /// Layer list bottom to top, with thumbnails no larger than
    /// `thumbnail_size` on either side
    pub fn layer_infos(&self, thumbnail_size: u32) -> PaintResult<Vec<LayerInfo>> {
        self.layers
            .iter()
            .map(|layer| {
                let thumbnail = layer.buffer().thumbnail(thumbnail_size)?;
                Ok(LayerInfo {
                    id: layer.id(),
                    name: layer.name().to_string(),
                    visible: layer.is_visible(),
                    locked: layer.is_locked(),
                    opacity: layer.opacity(),
                    blend_mode: layer.blend_mode(),
                    thumbnail: Thumbnail::from(&thumbnail),
                })
            })
            .collect()
    }
}
