//! Check every locale file against a reference language.
//!
//! Usage:
//!   validate-locales [--reference CODE]
//!
//! The reference defaults to TRANSLATOR_LANGUAGE, then en-us. Exits with a
//! non-zero status when a locale file fails to load or misses reference keys.
//!
//! Optional environment variables:
//! - TRANSLATOR_LOCALES_DIR (defaults to locales)
//! - TRANSLATOR_FETCH_ATTEMPTS (defaults to 3)

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use translation_registry::config::Config;
use translation_registry::loader;
use translation_registry::validator::TranslationValidator;
use translation_registry::{EnvironmentController, TranslationRepository};

const DEFAULT_REFERENCE: &str = "en-us";

fn parse_reference(args: &[String]) -> Result<Option<String>> {
    let mut reference = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--reference" | "-r" => match iter.next() {
                Some(code) => reference = Some(code.clone()),
                None => bail!("--reference requires a value"),
            },
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(reference)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_registry=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env()?;
    let reference = parse_reference(&args)?
        .or_else(|| config.language.clone())
        .unwrap_or_else(|| DEFAULT_REFERENCE.to_string());

    let languages = loader::discover_languages(&config.locales_dir)
        .await
        .with_context(|| format!("Failed to list {}", config.locales_dir.display()))?;
    info!(
        "Validating {} locale file(s) against {}",
        languages.len(),
        reference
    );

    let environment = EnvironmentController::new(Some(reference.as_str()));
    let repository = TranslationRepository::new(&environment);
    let retry = config.retry();

    let mut failed = false;
    for language in &languages {
        match loader::load_language(&config.locales_dir, language, &retry).await {
            Ok(batch) => repository.register_parts(batch, language),
            Err(e) => {
                error!("{}: {}", language, e);
                failed = true;
            }
        }
    }

    let reports = TranslationValidator::validate_languages(&repository.collected(), &reference)
        .with_context(|| format!("Reference language {} has no strings", reference))?;

    for (language, report) in &reports {
        if report.is_clean() {
            println!("{}: OK", language);
            continue;
        }

        println!(
            "{}: {} error(s), {} warning(s)",
            language,
            report.errors.len(),
            report.warnings.len()
        );
        for message in &report.errors {
            println!("  error: {}", message);
        }
        for message in &report.warnings {
            println!("  warning: {}", message);
        }
        failed |= report.has_errors();
    }

    if failed {
        std::process::exit(1);
    }

    info!("All locale files are consistent with {}", reference);
    Ok(())
}
