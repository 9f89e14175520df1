use anyhow::{bail, ensure, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pneumonia_rs::config::InputKind;
use pneumonia_rs::{Classifier, Config, PneumoniaError, ReaderImageSource};

fn main() -> Result<()> {
    // Defaults to warn; override with RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .try_init();

    let config = Config::new();
    ensure!(
        config.model_path.exists(),
        "Model path does not exist: {}",
        config.model_path.display()
    );

    let classifier = Classifier::with_onnx_model(&config);

    match config.input_kind() {
        InputKind::Stdin => {
            let prediction = classifier
                .classify_source(&mut ReaderImageSource::stdin())
                .map_err(explain)
                .context("Failed to classify image from stdin")?;
            println!("{prediction}");
        }
        InputKind::File(path) => {
            let prediction = classifier
                .classify_path(&path)
                .map_err(explain)
                .with_context(|| format!("Failed to classify {}", path.display()))?;
            println!("{prediction}");
        }
        InputKind::Directory(dir) => {
            let results = classifier
                .classify_directory(&dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?;
            let total = results.len();
            let mut failed = 0;
            for (path, result) in results {
                match result {
                    Ok(prediction) => println!("{}\n{prediction}\n", path.display()),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {:#}", path.display(), explain(e));
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {total} images could not be classified");
            }
        }
    }

    Ok(())
}

/// Adds a user-facing hint to errors the user can fix without touching the model.
fn explain(err: PneumoniaError) -> anyhow::Error {
    if err.is_permission_denied() {
        anyhow::Error::new(err).context("Permission denied: grant read access to the image and retry")
    } else {
        anyhow::Error::new(err)
    }
}
