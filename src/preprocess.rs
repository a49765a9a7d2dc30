use std::path::Path;

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, IntoImageView, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use ndarray::Array4;

use crate::error::{DetectError, DetectResult};

#[derive(Debug, Clone, Copy)]
pub struct PreprocessConfig {
    /// Square input side the model was trained on.
    pub size: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { size: 640 }
    }
}

#[derive(Debug)]
pub struct Processor {
    config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Decodes a screenshot and prepares the model input tensor.
    ///
    /// The image is stretched to `size x size` with bilinear interpolation
    /// (no letterboxing; the model trains on the same stretch) and scaled
    /// from 0-255 into [0, 1] in (batch, channel, height, width) order.
    pub fn preprocess(&self, path: &Path) -> DetectResult<Array4<f32>> {
        if !path.exists() {
            return Err(DetectError::NotFound(path.to_path_buf()));
        }
        let decoded = image::open(path)
            .map_err(|err| DetectError::Decode(format!("{}: {err}", path.display())))?;
        self.to_tensor(&decoded)
    }

    fn to_tensor(&self, decoded: &DynamicImage) -> DetectResult<Array4<f32>> {
        let size = self.config.size;
        let src = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let pixel_type = src
            .pixel_type()
            .ok_or_else(|| DetectError::Decode("unsupported pixel layout".into()))?;

        let mut dst = Image::new(size, size, pixel_type);
        let mut resizer = Resizer::new();
        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        resizer
            .resize(&src, &mut dst, Some(&options))
            .map_err(|err| DetectError::Decode(format!("resize failed: {err}")))?;

        let side = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
        for (i, rgb) in dst.buffer().chunks_exact(3).enumerate() {
            let y = i / side;
            let x = i % side;
            tensor[[0, 0, y, x]] = rgb[0] as f32 / 255.0;
            tensor[[0, 1, y, x]] = rgb[1] as f32 / 255.0;
            tensor[[0, 2, y, x]] = rgb[2] as f32 / 255.0;
        }
        Ok(tensor)
    }
}
