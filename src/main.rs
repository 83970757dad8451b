//! cbfmt - Format PHP files with phpcbf

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cbfmt::sink::LogSink;
use cbfmt::{parse_args, CliArgs, Config, FormatSession, Result};
use glob::Pattern;
use rayon::prelude::*;
use walkdir::WalkDir;

/// PHP file extensions to process
const PHP_EXTENSIONS: &[&str] = &["php"];

fn main() -> ExitCode {
    // Parse CLI arguments
    let args = parse_args();
    init_logging(&args);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Route the `log` facade to stderr; `RUST_LOG` still takes precedence
fn init_logging(args: &CliArgs) {
    let default_filter = if args.debug {
        "debug"
    } else if args.silent {
        "off"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Returns `Ok(false)` when at least one file failed to format
fn run(args: &CliArgs) -> Result<bool> {
    // Check if we should read from stdin
    let use_stdin =
        args.inputs.is_empty() || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");

    // If no inputs and running interactively, print usage; otherwise read from stdin
    if args.inputs.is_empty() && io::stdin().is_terminal() {
        let _ = cbfmt::cli::build_cli().print_help();
        return Ok(true);
    }

    if use_stdin {
        process_stdin(args)?;
        return Ok(true);
    }

    // An explicit settings file applies to every file; otherwise each file
    // discovers its own
    let base_config = match &args.config {
        Some(_) => Some(build_config(args, None)?),
        None => None,
    };

    // Configure thread pool if --jobs specified
    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                log::warn!("failed to configure thread pool: {e}");
            }
        }
    }

    let files = collect_files(args);
    if files.is_empty() {
        if !args.silent {
            eprintln!("No PHP files found to format.");
        }
        return Ok(true);
    }

    let success_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);
    let process = |path: &PathBuf| {
        let result = match &base_config {
            Some(config) => process_single_file(path, config, args),
            None => build_config(args, Some(path.as_path()))
                .and_then(|config| process_single_file(path, &config, args)),
        };
        match result {
            Ok(()) => {
                success_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error_count.fetch_add(1, Ordering::Relaxed);
                log::error!("{}: {e:#}", path.display());
            }
        }
    };

    // Sequential for stdout (keeps output in order) or --jobs 1
    if args.stdout || args.jobs == Some(1) {
        files.iter().for_each(process);
    } else {
        files.par_iter().for_each(process);
    }

    let success = success_count.load(Ordering::Relaxed);
    let errors = error_count.load(Ordering::Relaxed);
    if !args.silent && !args.stdout {
        if errors == 0 {
            eprintln!("Processed {success} files successfully.");
        } else {
            eprintln!("Processed {success} files, {errors} errors.");
        }
    }

    Ok(errors == 0)
}

/// Build configuration from settings files and CLI overrides
///
/// With `--config`, that file is used as-is; otherwise settings are
/// auto-discovered from `for_path` (or the current directory).
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        log::debug!("Using explicit config file: {}", config_path.display());
        Config::from_toml_file(config_path)?
    } else {
        let start = match for_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().unwrap_or_default(),
        };
        if log::log_enabled!(log::Level::Debug) {
            let discovered = Config::discover_config_files(&start);
            if discovered.is_empty() {
                log::debug!("No config files discovered for: {}", start.display());
            }
            for f in &discovered {
                log::debug!("Discovered config file: {}", f.display());
            }
        }
        Config::from_discovered_files(&start)
    };

    // Override with CLI arguments
    if let Some(executable) = &args.executable {
        config.executable_path.clone_from(executable);
    }
    if let Some(standard) = &args.standard {
        config.standard = Some(standard.clone());
    }
    if args.config_search {
        config.config_search = true;
    }
    if !args.config_filenames.is_empty() {
        config.config_filenames.clone_from(&args.config_filenames);
    }
    if args.debug {
        config.debug = true;
    }

    log::debug!("Configuration: {config:?}");

    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Build a session for one configuration
fn build_session(config: &Config, args: &CliArgs) -> FormatSession {
    let workspace = args
        .workspace
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    FormatSession::new(
        config.format_options(&workspace),
        Arc::new(LogSink::error()),
        Arc::new(LogSink::debug()),
    )
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    // Compile exclude patterns
    let exclude_patterns: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("ignoring invalid exclude pattern {p:?}: {e}");
                None
            }
        })
        .collect();

    let mut files = Vec::new();

    for input in &args.inputs {
        if input.is_file() {
            // Explicitly named files are formatted whatever their extension
            if !is_excluded(input, &exclude_patterns) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            if args.recursive {
                for entry in WalkDir::new(input)
                    .follow_links(true)
                    .max_depth(256)
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_excluded(e.path(), &exclude_patterns))
                    .filter_map(std::result::Result::ok)
                {
                    let path = entry.path();
                    if path.is_file() && is_php_file(path, &args.extensions) {
                        files.push(path.to_path_buf());
                    }
                }
            } else if let Ok(entries) = std::fs::read_dir(input) {
                for entry in entries.filter_map(std::result::Result::ok) {
                    let path = entry.path();
                    if path.is_file()
                        && is_php_file(&path, &args.extensions)
                        && !is_excluded(&path, &exclude_patterns)
                    {
                        files.push(path);
                    }
                }
            }
        } else {
            log::warn!("{}: no such file or directory", input.display());
        }
    }

    files
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        // Match against full path
        if pattern.matches(&path_str) {
            return true;
        }

        // Match against each path component (file name and directories)
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

/// Check if a file has a PHP extension (case-insensitive)
fn is_php_file(path: &Path, custom_extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PHP_EXTENSIONS
                .iter()
                .copied()
                .chain(custom_extensions.iter().map(|c| c.strip_prefix('.').unwrap_or(c)))
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Format a single file in place (or to stdout)
fn process_single_file(path: &Path, config: &Config, args: &CliArgs) -> Result<()> {
    if !config.enable {
        log::debug!("Formatting disabled, skipping {}", path.display());
        return Ok(());
    }

    let original = std::fs::read_to_string(path)?;
    let session = build_session(config, args);

    let edit = session.format_document(path, &original)?;

    if args.stdout {
        let text = edit.as_deref().unwrap_or(&original);
        io::stdout().write_all(text.as_bytes())?;
    } else if let Some(text) = edit {
        std::fs::write(path, text)?;
        if !args.silent {
            eprintln!("Formatted: {}", path.display());
        }
    }

    Ok(())
}

/// Process input from stdin, output to stdout
fn process_stdin(args: &CliArgs) -> Result<()> {
    let document = args
        .stdin_filename
        .clone()
        .unwrap_or_else(|| PathBuf::from("stdin.php"));
    let document = if document.is_absolute() {
        document
    } else {
        std::env::current_dir().unwrap_or_default().join(document)
    };
    let config = build_config(args, Some(document.as_path()))?;

    let mut original = String::new();
    io::stdin().read_to_string(&mut original)?;

    let edit = if config.enable {
        build_session(&config, args).format_document(&document, &original)?
    } else {
        None
    };

    // Always output to stdout when reading from stdin
    let text = edit.as_deref().unwrap_or(&original);
    io::stdout().write_all(text.as_bytes())?;
    Ok(())
}
