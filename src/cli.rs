use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Detect TFT unit portraits in a screenshot", long_about = None)]
pub struct Args {
    /// screenshot image path
    pub source: PathBuf,

    /// ONNX model path
    #[arg(long, default_value = "models/weights.onnx")]
    pub model: PathBuf,

    /// champion metadata path (entry order must match the training class order)
    #[arg(long, default_value = "data/latest/champions.json")]
    pub labels: PathBuf,

    /// confidence threshold
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// IoU threshold for suppression
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// maximum detections kept after suppression
    #[arg(long = "max-det", default_value_t = 300)]
    pub max_det: usize,

    /// save a copy of the screenshot with detection boxes drawn
    #[arg(long)]
    pub annotate: Option<PathBuf>,
}
