use std::path::Path;

use image::Rgba;
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::error::{DetectError, DetectResult};
use crate::postprocess::Detection;

/// Draws detection boxes onto the original screenshot and saves the result.
///
/// Detections live in model-input pixel space, so each box is scaled back to
/// the original image by (original size / input size) per axis before
/// drawing. This scale-back is for rendering only; the JSON output stays in
/// model-input space.
pub fn draw_detections(
    image_path: &Path,
    detections: &[Detection],
    input_size: u32,
    output_path: &Path,
) -> DetectResult<()> {
    let mut img = image::open(image_path)
        .map_err(|err| DetectError::Decode(format!("{}: {err}", image_path.display())))?
        .to_rgba8();
    let sx = img.width() as f32 / input_size as f32;
    let sy = img.height() as f32 / input_size as f32;

    for det in detections {
        let left = (det.x1 * sx).round() as i32;
        let top = (det.y1 * sy).round() as i32;
        let width = ((det.x2 - det.x1) * sx).round().max(1.0) as u32;
        let height = ((det.y2 - det.y1) * sy).round().max(1.0) as u32;
        let rect = Rect::at(left, top).of_size(width, height);
        draw_hollow_rect_mut(&mut img, rect, Rgba([255, 0, 0, 255]));
    }

    img.save(output_path)
        .map_err(|err| DetectError::Decode(format!("{}: {err}", output_path.display())))?;
    Ok(())
}
