use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::config::ImagingConfig;
use crate::error::{ReachPosterError, Result};

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub jpeg: Vec<u8>,
    pub path: PathBuf,
}

/// Turns a provider render into an Instagram-ready square JPEG.
///
/// The noise source is seeded from the input bytes, so the same render always
/// produces the same output.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    config: ImagingConfig,
}

impl ImageProcessor {
    pub fn new(config: ImagingConfig) -> Self {
        Self { config }
    }

    pub fn process(&self, source: &[u8]) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(source)
            .map_err(|e| ReachPosterError::Runtime(format!("image decode failed: {e}")))?;
        let size = self.config.size.max(1);
        let mut rgb = decoded
            .resize_exact(size, size, FilterType::Lanczos3)
            .to_rgb8();

        let mut rng = StdRng::seed_from_u64(seed_for(source));
        let saturation = 1.0 + symmetric(&mut rng, self.config.jitter);
        let contrast = 1.0 + symmetric(&mut rng, self.config.jitter);
        apply_film_look(
            &mut rgb,
            &mut rng,
            self.config.grain.abs(),
            saturation,
            contrast,
            self.config.vignette.clamp(0.0, 1.0),
        );

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.config.jpeg_quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| ReachPosterError::Runtime(format!("jpeg encode failed: {e}")))?;
        Ok(out)
    }

    /// Processes off the async runtime and writes the JPEG into the output directory.
    pub async fn process_and_store(&self, source: Vec<u8>) -> Result<ProcessedImage> {
        let processor = self.clone();
        tokio::task::spawn_blocking(move || {
            let jpeg = processor.process(&source)?;
            let dir = processor.config.output_dir();
            let path = Path::new(&dir).join(format!("generated_{}_instagram.jpg", short_hash(&source)));
            std::fs::create_dir_all(&dir).map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
            std::fs::write(&path, &jpeg).map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
            tracing::debug!(path = %path.display(), bytes = jpeg.len(), "Processed image stored");
            Ok(ProcessedImage { jpeg, path })
        })
        .await
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?
    }
}

fn seed_for(source: &[u8]) -> u64 {
    let digest = Sha256::digest(source);
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

fn short_hash(source: &[u8]) -> String {
    format!("{:x}", Sha256::digest(source))[..12].to_string()
}

fn symmetric(rng: &mut StdRng, amplitude: f32) -> f32 {
    let amplitude = amplitude.abs();
    if amplitude == 0.0 {
        return 0.0;
    }
    rng.gen_range(-amplitude..=amplitude)
}

fn apply_film_look(
    image: &mut RgbImage,
    rng: &mut StdRng,
    grain: f32,
    saturation: f32,
    contrast: f32,
    vignette: f32,
) {
    let (width, height) = image.dimensions();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let [r, g, b] = pixel.0.map(f32::from);
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let noise = symmetric(rng, grain);
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let dist = (dx * dx + dy * dy).sqrt() / max_dist;
        let falloff = 1.0 - vignette * dist * dist;

        pixel.0 = [r, g, b].map(|channel| {
            let saturated = luma + (channel - luma) * saturation;
            let contrasted = (saturated - 128.0) * contrast + 128.0;
            ((contrasted + noise) * falloff).round().clamp(0.0, 255.0) as u8
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn sample_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(40, 30, |x, y| {
            Rgba([(x * 6) as u8, (y * 8) as u8, 120, if x % 2 == 0 { 255 } else { 128 }])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("encode png");
        out
    }

    fn small_config() -> ImagingConfig {
        ImagingConfig {
            size: 48,
            ..ImagingConfig::default()
        }
    }

    #[test]
    fn output_is_square_rgb_jpeg() {
        let jpeg = ImageProcessor::new(small_config())
            .process(&sample_png())
            .expect("process");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).expect("decode jpeg");
        assert_eq!(decoded.dimensions(), (48, 48));
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn processing_is_deterministic_per_input() {
        let processor = ImageProcessor::new(small_config());
        let source = sample_png();
        assert_eq!(
            processor.process(&source).expect("first"),
            processor.process(&source).expect("second")
        );
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        let err = ImageProcessor::new(small_config())
            .process(b"definitely not a png")
            .expect_err("garbage");
        assert!(matches!(err, ReachPosterError::Runtime(_)));
    }

    #[tokio::test]
    async fn stores_into_output_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ImagingConfig {
            output_dir: Some(dir.path().to_string_lossy().to_string()),
            ..small_config()
        };
        let processed = ImageProcessor::new(config)
            .process_and_store(sample_png())
            .await
            .expect("store");
        assert!(processed.path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&processed.path).expect("read"), processed.jpeg);
    }
}
