//! `ferrite-trainer` command-line entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ferrite_trainer::config::Settings;
use ferrite_trainer::dataset::{
    image_folder_loaders, prepare_validation_split, tiny_imagenet_loaders, BatchSource, DataLoader, ImageFolder,
    ImageTransform,
};
use ferrite_trainer::utils::init_logging;
use ferrite_trainer::{CrossEntropyLoss, FileCheckpointStore, ModelSpec, Trainer, TrainingConfig};

/// Supervised image-classification training harness.
#[derive(Parser, Debug)]
#[command(name = "ferrite-trainer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Restructure a flat validation split into per-class directories
    PrepareVal {
        /// Directory holding val_annotations.txt and images/
        #[arg(long)]
        val_dir: PathBuf,
    },

    /// Train a classifier and checkpoint the best validation model
    Train {
        /// TOML settings file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override run.epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Override run.training_name
        #[arg(long)]
        training_name: Option<String>,
    },
}

fn train(mut settings: Settings) -> Result<f64> {
    settings.apply_env()?;
    settings.validate()?;

    let batch_size = settings.data.batch_size;
    let seed = settings.run.seed;
    let (transform, mut train_loader, mut val_loader) = match &settings.data.root {
        Some(root) => {
            let (train, val) = tiny_imagenet_loaders(root, batch_size, seed)
                .with_context(|| format!("loading images under {}", root.display()))?;
            (train.dataset().transform().clone(), train, Some(val))
        }
        None => {
            let transform = ImageTransform::imagenet(settings.data.image_size)?;
            let train_dir = &settings.data.train_dir;
            match &settings.data.val_dir {
                Some(val_dir) => {
                    let (train, val) = image_folder_loaders(train_dir, val_dir, transform.clone(), batch_size, seed)
                        .with_context(|| {
                            format!("loading images from {} and {}", train_dir.display(), val_dir.display())
                        })?;
                    (transform, train, Some(val))
                }
                None => {
                    let train = ImageFolder::new(train_dir, transform.clone())
                        .with_context(|| format!("loading training images from {}", train_dir.display()))?;
                    (transform, DataLoader::with_seed(train, batch_size, true, seed)?, None)
                }
            }
        }
    };
    let classes = train_loader.dataset().classes().len();

    let model = ModelSpec::mlp(
        settings.model.name.clone(),
        transform.output_size(),
        &settings.model.hidden,
        settings.model.num_classes.unwrap_or(classes),
        settings.model.activation,
        settings.model.dropout,
    )
    .with_seed(settings.run.seed)
    .build()?;
    info!(
        model = %settings.model.name,
        parameters = model.num_parameters(),
        classes,
        "built model"
    );

    let mut config = TrainingConfig::new(
        settings.run.training_name.clone(),
        settings.run.epochs,
        settings.optimizer.learning_rate,
        model,
        CrossEntropyLoss::new(),
        settings.optimizer.build(),
    )?;

    let sink = settings.output.tracking_mode.open_sink(&settings.output.tracking_dir);
    let mut trainer = Trainer::new(FileCheckpointStore::new(&settings.output.checkpoint_dir), sink)
        .with_project(settings.run.project.clone());

    let best = trainer.run(
        &mut config,
        &mut train_loader,
        val_loader.as_mut().map(|l| l as &mut dyn BatchSource),
    )?;
    Ok(best)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::PrepareVal { val_dir } => {
            let report = prepare_validation_split(&val_dir)
                .with_context(|| format!("preparing validation split in {}", val_dir.display()))?;
            if report.already_prepared {
                println!("{} is already prepared", val_dir.display());
            } else {
                println!("Moved {} images into {} class directories", report.images, report.classes);
            }
        }
        Commands::Train { config, epochs, training_name } => {
            let mut settings = match config {
                Some(path) => Settings::load(&path)
                    .with_context(|| format!("reading settings from {}", path.display()))?,
                None => Settings::default(),
            };
            if let Some(epochs) = epochs {
                settings.run.epochs = epochs;
            }
            if let Some(name) = training_name {
                settings.run.training_name = name;
            }
            let best = train(settings)?;
            println!("Best validation accuracy: {:.2}%", best);
        }
    }

    Ok(())
}
