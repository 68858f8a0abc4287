//! Offline trainer for the category classifier.
//!
//! Reads a JSON training dataset, extracts image+text features, fits the
//! forest, reports training-set accuracy, and writes the three model
//! artifacts the serving process loads at startup.
//!
//! ```text
//! train [--data data/training_data.json] [--out models]
//! ```

use anyhow::{bail, Context};
use civitriage::{
    image_features, load_training_records, local_image_path, save_artifacts, Category,
    CategoryClassifier, ClassifierConfig, FeatureConfig, TrainingSample,
};
use std::path::PathBuf;

struct Args {
    data: PathBuf,
    out: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut data = PathBuf::from("data/training_data.json");
    let mut out = PathBuf::from("models");

    let mut argv = std::env::args().skip(1);
    while let Some(flag) = argv.next() {
        match flag.as_str() {
            "--data" => {
                data = PathBuf::from(argv.next().context("--data needs a path")?);
            }
            "--out" => {
                out = PathBuf::from(argv.next().context("--out needs a path")?);
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(Args { data, out })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let records = load_training_records(&args.data)?;
    if records.is_empty() {
        bail!("dataset {} contains no records", args.data.display());
    }

    let feature_cfg = FeatureConfig::default();
    let mut samples = Vec::with_capacity(records.len());
    let mut degraded = 0usize;

    for record in &records {
        let category = Category::from_label(&record.category);
        if category == Category::Other {
            tracing::warn!(
                id = record.id,
                label = %record.category,
                "skipping record with unknown category label"
            );
            continue;
        }

        let Some(path) = local_image_path(&record.image_reference) else {
            tracing::warn!(
                id = record.id,
                reference = %record.image_reference,
                "skipping record with non-local image reference"
            );
            continue;
        };

        let bytes = std::fs::read(&path)
            .with_context(|| format!("reading training image {}", path.display()))?;
        let features = image_features(&bytes, &feature_cfg);
        if features.is_degraded() {
            degraded += 1;
        }

        samples.push(TrainingSample {
            image_features: features.values,
            description: record.description.clone(),
            category,
        });
    }

    if degraded > 0 {
        tracing::warn!(
            degraded,
            total = samples.len(),
            "some training images failed to decode; their visual signal is zeroed"
        );
    }

    let config = ClassifierConfig::default();
    let classifier = CategoryClassifier::train(&samples, config)?;

    // Training-set accuracy: a sanity signal, not an evaluation.
    let mut correct = 0usize;
    for sample in &samples {
        let text = classifier.text_features(&sample.description);
        let prediction = classifier.predict(&sample.image_features, &text.values)?;
        if prediction.category == sample.category {
            correct += 1;
        }
    }
    tracing::info!(
        samples = samples.len(),
        correct,
        accuracy = correct as f64 / samples.len() as f64,
        "training-set accuracy"
    );

    save_artifacts(&classifier, &args.out)?;
    tracing::info!(out = %args.out.display(), "artifacts written");
    Ok(())
}
