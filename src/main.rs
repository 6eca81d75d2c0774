//! Resolve one translation key against the locale directory.
//!
//! Usage:
//!   translation-registry [--language CODE] KEY [NAME=VALUE ...]
//!
//! Optional environment variables:
//! - TRANSLATOR_LANGUAGE (initial language when none is saved)
//! - TRANSLATOR_PERSIST_LANGUAGE (defaults to true)
//! - TRANSLATOR_SETTINGS_FILE (defaults to .translator/settings.json)
//! - TRANSLATOR_LOCALES_DIR (defaults to locales)
//! - TRANSLATOR_FETCH_ATTEMPTS (defaults to 3)

use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use translation_registry::{config::Config, loader, TranslationRepository, TranslatorText};

const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq)]
struct Args {
    language: Option<String>,
    text: TranslatorText,
}

/// Parse the command line. `None` means usage was requested.
fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut language = None;
    let mut key = None;
    let mut parameters = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--language" | "-l" => match iter.next() {
                Some(code) => language = Some(code.clone()),
                None => bail!("--language requires a value"),
            },
            _ if key.is_none() => key = Some(arg.clone()),
            _ => match arg.split_once('=') {
                Some((name, value)) => parameters.push((name.to_string(), value.to_string())),
                None => bail!("Expected NAME=VALUE, got {:?}", arg),
            },
        }
    }

    let Some(key) = key else {
        return Ok(None);
    };

    Ok(Some(Args {
        language,
        text: TranslatorText::new(key).with_parameters(parameters),
    }))
}

fn print_usage() {
    println!(
        r#"
Resolve a translation key from JSON locale files

USAGE:
    translation-registry [--language CODE] KEY [NAME=VALUE ...]

OPTIONS:
    -l, --language CODE   Switch to CODE before resolving (saved when persistence is on)
    -h, --help            Print this message

EXAMPLES:
    translation-registry --language tr-tr generic.hello name=Kyle
"#
    );
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
    let Some(args) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };

    let config = Config::from_env()?;
    let environment = config.environment()?;
    let repository = TranslationRepository::new(&environment);

    if let Some(code) = &args.language {
        environment.set_language(code.as_str());
    }

    let Some(language) = repository.current_language() else {
        bail!("No language selected: pass --language or set TRANSLATOR_LANGUAGE");
    };

    info!(
        "Loading {} strings from {}",
        language,
        config.locales_dir.display()
    );
    repository
        .lazyload()
        .insert_one(loader::json_directory(config.locales_dir.clone(), config.retry()));

    let loaded = timeout(LOAD_TIMEOUT, async {
        while !repository.has_language(&language) && repository.metrics().fetch_failures() == 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    if loaded.is_err() {
        warn!("No strings for {} after {:?}", language, LOAD_TIMEOUT);
    } else if !repository.has_language(&language) {
        warn!("Strings for {} could not be loaded", language);
    }

    println!("{}", repository.get_string(args.text));
    Ok(())
}
