use std::process;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use tft_detect::{
    decode, draw_detections, format_detections, load_champion_mapping, Args, DetectError,
    PreprocessConfig, Processor, UnitModel,
};

fn main() {
    // Logging goes to stderr; stdout carries only the JSON payload.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        error!("{err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return Err(DetectError::Usage(err.to_string()).into()),
    };
    if !(0.0..=1.0).contains(&args.conf) || !(0.0..=1.0).contains(&args.iou) {
        return Err(DetectError::Usage("--conf and --iou must be within [0, 1]".into()).into());
    }

    let labels = load_champion_mapping(&args.labels)?;
    debug!("label table: {} entries", labels.len());

    let model = UnitModel::load(&args.model)?;
    let input_size = model.input_size();
    debug!("model input size: {input_size}");

    if let Some(classes) = model.num_classes() {
        if !labels.is_empty() && labels.len() != classes {
            warn!(
                "{}",
                DetectError::ConfigMismatch {
                    labels: labels.len(),
                    classes,
                }
            );
        }
    }

    let processor = Processor::new(PreprocessConfig { size: input_size });
    let tensor = processor.preprocess(&args.source)?;

    let raw = model.run(tensor)?;
    let detections = decode(&raw, args.conf, args.iou, args.max_det)?;
    info!("kept {} detections", detections.len());

    let records = format_detections(&detections, &labels);
    println!("{}", serde_json::to_string(&records)?);

    // The payload is out; a failed annotation only warns.
    if let Some(annotated) = &args.annotate {
        match draw_detections(&args.source, &detections, input_size, annotated) {
            Ok(()) => info!("annotated screenshot written to {}", annotated.display()),
            Err(err) => warn!("annotation failed: {err}"),
        }
    }

    Ok(())
}
