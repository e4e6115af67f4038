//! Labeled grid compositing with the `image` crate.

use async_trait::async_trait;
use futures::future::join_all;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::glyphs;
use crate::domain::errors::RenderError;
use crate::domain::models::{Candidate, CompositeImage, RenderConfig, RenderResult};
use crate::domain::ports::{CompositeRenderer, ContentFetcher};

const CANVAS: Rgb<u8> = Rgb([255, 255, 255]);

/// Grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub tile_size: u32,
    pub columns: u32,
}

impl GridLayout {
    pub fn new(tile_size: u32, columns: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
            columns: columns.max(1),
        }
    }

    /// Canvas size for `tiles` tiles.
    pub fn canvas_size(&self, tiles: u32) -> (u32, u32) {
        let rows = tiles.div_ceil(self.columns).max(1);
        (self.columns * self.tile_size, rows * self.tile_size)
    }

    /// Label glyph scale: a few pixels per font dot on the default tile.
    fn label_scale(&self) -> u32 {
        (self.tile_size / 80).clamp(1, 4)
    }
}

impl From<&RenderConfig> for GridLayout {
    fn from(config: &RenderConfig) -> Self {
        Self::new(config.tile_size, config.columns)
    }
}

/// Decode `bytes` into a square RGB tile. `None` if the bytes are not an image.
pub fn decode_tile(bytes: &[u8], tile_size: u32) -> Option<RgbImage> {
    let decoded = image::load_from_memory(bytes).ok()?;
    Some(imageops::resize(
        &decoded.to_rgb8(),
        tile_size,
        tile_size,
        FilterType::Lanczos3,
    ))
}

/// Paint labeled tiles onto a white canvas and encode it as PNG.
///
/// Tile `i` gets label `i + 1`.
pub fn compose_grid(tiles: &[RgbImage], layout: GridLayout) -> Result<CompositeImage, RenderError> {
    let count = u32::try_from(tiles.len())
        .map_err(|_| RenderError::Encode(format!("too many tiles: {}", tiles.len())))?;
    let (width, height) = layout.canvas_size(count);
    let mut canvas = RgbImage::from_pixel(width, height, CANVAS);
    let scale = layout.label_scale();

    for (index, tile) in (0u32..).zip(tiles) {
        let x = (index % layout.columns) * layout.tile_size;
        let y = (index / layout.columns) * layout.tile_size;
        imageops::replace(&mut canvas, tile, i64::from(x), i64::from(y));
        glyphs::draw_label(&mut canvas, x, y, index + 1, scale);
    }

    encode_png(canvas)
}

/// Compose raw image bodies into a grid, skipping anything that fails to decode.
///
/// Returns the composite along with the indices of the bodies that made it in.
pub fn compose_from_bytes(
    bodies: &[Vec<u8>],
    layout: GridLayout,
) -> Result<Option<(CompositeImage, Vec<usize>)>, RenderError> {
    let mut tiles = Vec::with_capacity(bodies.len());
    let mut included = Vec::with_capacity(bodies.len());
    for (index, body) in bodies.iter().enumerate() {
        if let Some(tile) = decode_tile(body, layout.tile_size) {
            tiles.push(tile);
            included.push(index);
        }
    }
    if tiles.is_empty() {
        return Ok(None);
    }
    Ok(Some((compose_grid(&tiles, layout)?, included)))
}

/// Re-encode an arbitrary image file as a PNG composite, untouched otherwise.
pub fn composite_from_image_bytes(bytes: &[u8]) -> Result<CompositeImage, RenderError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| RenderError::Encode(e.to_string()))?;
    encode_png(decoded.to_rgb8())
}

fn encode_png(image: RgbImage) -> Result<CompositeImage, RenderError> {
    let (width, height) = image.dimensions();
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(CompositeImage { png, width, height })
}

/// Renderer that downloads a batch and tiles it into one labeled PNG.
pub struct GridCompositeRenderer {
    fetcher: Arc<dyn ContentFetcher>,
    layout: GridLayout,
}

impl GridCompositeRenderer {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, layout: GridLayout) -> Self {
        Self { fetcher, layout }
    }

    pub const fn layout(&self) -> GridLayout {
        self.layout
    }
}

#[async_trait]
impl CompositeRenderer for GridCompositeRenderer {
    #[instrument(skip_all, fields(batch = batch.len()))]
    async fn render(&self, batch: &[Candidate]) -> Result<Option<RenderResult>, RenderError> {
        let fetched = join_all(batch.iter().map(|candidate| self.fetcher.fetch(candidate))).await;

        let mut bodies = Vec::with_capacity(batch.len());
        let mut fetched_candidates = Vec::with_capacity(batch.len());
        for (candidate, result) in batch.iter().zip(fetched) {
            match result {
                Ok(content) => {
                    bodies.push(content.bytes);
                    fetched_candidates.push(candidate.clone());
                }
                Err(e) => warn!(candidate = %candidate, error = %e, "skipping candidate"),
            }
        }
        if bodies.is_empty() {
            return Ok(None);
        }

        let layout = self.layout;
        let composed = tokio::task::spawn_blocking(move || compose_from_bytes(&bodies, layout))
            .await
            .map_err(|e| RenderError::Worker(e.to_string()))??;

        let Some((composite, included)) = composed else {
            debug!("no candidate in the batch decoded");
            return Ok(None);
        };
        if included.len() < fetched_candidates.len() {
            debug!(
                dropped = fetched_candidates.len() - included.len(),
                "undecodable candidates left out"
            );
        }

        let candidates = included
            .into_iter()
            .map(|index| fetched_candidates[index].clone())
            .collect();
        Ok(Some(RenderResult {
            composite,
            candidates,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FetchError;
    use crate::domain::ports::FetchedContent;
    use std::collections::HashMap;

    fn png(color: [u8; 3], size: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb(color)))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl ContentFetcher for MapFetcher {
        async fn fetch(&self, candidate: &Candidate) -> Result<FetchedContent, FetchError> {
            self.0
                .get(candidate.as_str())
                .map(|bytes| FetchedContent {
                    bytes: bytes.clone(),
                    content_type: Some("image/png".to_string()),
                })
                .ok_or_else(|| FetchError::Status {
                    url: candidate.to_string(),
                    status: 404,
                })
        }
    }

    fn renderer(entries: Vec<(&str, Vec<u8>)>, layout: GridLayout) -> GridCompositeRenderer {
        let map = entries
            .into_iter()
            .map(|(url, bytes)| (url.to_string(), bytes))
            .collect();
        GridCompositeRenderer::new(Arc::new(MapFetcher(map)), layout)
    }

    #[test]
    fn test_canvas_size() {
        let layout = GridLayout::new(256, 4);
        assert_eq!(layout.canvas_size(1), (1024, 256));
        assert_eq!(layout.canvas_size(4), (1024, 256));
        assert_eq!(layout.canvas_size(5), (1024, 512));
        assert_eq!(layout.canvas_size(16), (1024, 1024));
    }

    #[test]
    fn test_compose_grid_places_tiles_and_labels() {
        let layout = GridLayout::new(32, 2);
        let tiles = vec![
            RgbImage::from_pixel(32, 32, Rgb([200, 0, 0])),
            RgbImage::from_pixel(32, 32, Rgb([0, 200, 0])),
            RgbImage::from_pixel(32, 32, Rgb([0, 0, 200])),
        ];
        let composite = compose_grid(&tiles, layout).unwrap();
        assert_eq!((composite.width, composite.height), (64, 64));

        let decoded = image::load_from_memory(&composite.png).unwrap().to_rgb8();
        // Label boxes sit at each tile's corner.
        assert_eq!(*decoded.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*decoded.get_pixel(32, 0), Rgb([0, 0, 0]));
        // Tile bodies away from the label keep their color.
        assert_eq!(*decoded.get_pixel(31, 31), Rgb([200, 0, 0]));
        assert_eq!(*decoded.get_pixel(63, 31), Rgb([0, 200, 0]));
        assert_eq!(*decoded.get_pixel(31, 63), Rgb([0, 0, 200]));
        // The unused slot stays white.
        assert_eq!(*decoded.get_pixel(63, 63), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_compose_from_bytes_skips_garbage() {
        let bodies = vec![b"not an image".to_vec(), png([10, 10, 10], 8)];
        let (composite, included) = compose_from_bytes(&bodies, GridLayout::new(16, 4))
            .unwrap()
            .unwrap();
        assert_eq!(included, vec![1]);
        assert_eq!((composite.width, composite.height), (64, 16));
    }

    #[test]
    fn test_compose_from_bytes_nothing_decodes() {
        let bodies = vec![b"junk".to_vec()];
        assert!(compose_from_bytes(&bodies, GridLayout::new(16, 4))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_composite_from_image_bytes() {
        let composite = composite_from_image_bytes(&png([1, 2, 3], 5)).unwrap();
        assert_eq!((composite.width, composite.height), (5, 5));
        assert!(composite_from_image_bytes(b"nope").is_err());
    }

    #[tokio::test]
    async fn test_render_keeps_order_and_drops_failures() {
        let renderer = renderer(
            vec![
                ("https://img.test/a.png", png([255, 0, 0], 10)),
                ("https://img.test/c.png", b"<html>".to_vec()),
                ("https://img.test/d.png", png([0, 0, 255], 20)),
            ],
            GridLayout::new(16, 4),
        );
        let batch: Vec<Candidate> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| Candidate::new(format!("https://img.test/{n}.png")))
            .collect();

        let result = renderer.render(&batch).await.unwrap().unwrap();
        let rendered: Vec<&str> = result.candidates.iter().map(Candidate::as_str).collect();
        assert_eq!(
            rendered,
            vec!["https://img.test/a.png", "https://img.test/d.png"]
        );
        assert_eq!(
            result.candidate_for_label(2).map(Candidate::as_str),
            Some("https://img.test/d.png")
        );
        assert_eq!((result.composite.width, result.composite.height), (64, 16));
    }

    #[tokio::test]
    async fn test_render_nothing_fetched() {
        let renderer = renderer(vec![], GridLayout::new(16, 4));
        let batch = vec![Candidate::new("https://img.test/missing.png")];
        assert!(renderer.render(&batch).await.unwrap().is_none());
    }
}
