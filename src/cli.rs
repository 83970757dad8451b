//! Command-line interface for cbfmt.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to format
    pub inputs: Vec<PathBuf>,

    /// Settings file (disables auto-discovery)
    pub config: Option<PathBuf>,

    /// phpcbf executable
    pub executable: Option<String>,

    /// Standard passed to phpcbf
    pub standard: Option<String>,

    /// Enable ruleset file discovery
    pub config_search: bool,

    /// Ruleset file names (replaces the default list)
    pub config_filenames: Vec<String>,

    /// Workspace root substituted for `{{workspaceFolder}}`
    pub workspace: Option<PathBuf>,

    /// Recurse into directories
    pub recursive: bool,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Additional PHP file extensions
    pub extensions: Vec<String>,

    /// Path used for ruleset discovery when reading stdin
    pub stdin_filename: Option<PathBuf>,

    /// Output to stdout instead of in-place
    pub stdout: bool,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Enable debug output
    pub debug: bool,

    /// Silent mode
    pub silent: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("cbfmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Format PHP files with phpcbf (PHP_CodeSniffer's beautifier)")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to format (\"-\" reads stdin)")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to settings file (overrides auto-discovery of cbfmt.toml)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("executable")
                .short('e')
                .long("executable")
                .help("phpcbf executable; may start with {{workspaceFolder}} or ~/ [default: phpcbf]")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("standard")
                .long("standard")
                .help("Coding standard or ruleset path passed to phpcbf")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("config-search")
                .long("config-search")
                .help("Use the nearest phpcs ruleset file found in the file's ancestor directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-filename")
                .long("config-filename")
                .help("Ruleset file name recognized by --config-search (can be repeated, replaces the defaults)")
                .value_name("NAME")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("workspace")
                .short('W')
                .long("workspace")
                .help("Workspace root substituted for {{workspaceFolder}} [default: current directory]")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively format directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('x')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("ext")
                .long("ext")
                .help("Additional PHP file extension (can be repeated, e.g., --ext inc --ext phtml)")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("stdin-filename")
                .long("stdin-filename")
                .help("Path of the file being read from stdin, used for settings and ruleset discovery")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("stdout")
                .short('s')
                .long("stdout")
                .help("Output to stdout instead of modifying files in-place")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (phpcbf command lines and output)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (no output, for editor integration)")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        executable: matches.get_one::<String>("executable").cloned(),
        standard: matches.get_one::<String>("standard").cloned(),
        config_search: matches.get_flag("config-search"),
        config_filenames: matches
            .get_many::<String>("config-filename")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        workspace: matches.get_one::<PathBuf>("workspace").cloned(),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        extensions: matches
            .get_many::<String>("ext")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        stdin_filename: matches.get_one::<PathBuf>("stdin-filename").cloned(),
        stdout: matches.get_flag("stdout"),
        jobs: matches.get_one::<usize>("jobs").copied(),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds() {
        let cmd = build_cli();
        assert_eq!(cmd.get_name(), "cbfmt");
        cmd.debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse_args_from(vec!["cbfmt", "index.php"]);
        assert_eq!(args.inputs, vec![PathBuf::from("index.php")]);
        assert_eq!(args.executable, None);
        assert_eq!(args.standard, None);
        assert!(!args.config_search);
        assert!(args.config_filenames.is_empty());
        assert!(!args.stdout);
        assert!(!args.debug);
    }

    #[test]
    fn test_executable_and_standard() {
        let args = parse_args_from(vec![
            "cbfmt",
            "-e",
            "{{workspaceFolder}}/vendor/bin/phpcbf",
            "--standard",
            "PSR12",
            "src/",
        ]);
        assert_eq!(
            args.executable.as_deref(),
            Some("{{workspaceFolder}}/vendor/bin/phpcbf")
        );
        assert_eq!(args.standard.as_deref(), Some("PSR12"));
    }

    #[test]
    fn test_config_filenames_repeatable() {
        let args = parse_args_from(vec![
            "cbfmt",
            "--config-search",
            "--config-filename",
            "phpcs.xml",
            "--config-filename",
            "custom.xml",
            "src/",
        ]);
        assert!(args.config_search);
        assert_eq!(args.config_filenames, vec!["phpcs.xml", "custom.xml"]);
    }

    #[test]
    fn test_exclude_multiple() {
        let args = parse_args_from(vec![
            "cbfmt", "-r", "-x", "vendor", "--exclude", "*.blade.php", "src/",
        ]);
        assert_eq!(args.exclude, vec!["vendor", "*.blade.php"]);
    }

    #[test]
    fn test_extra_extensions() {
        let args = parse_args_from(vec!["cbfmt", "-r", "--ext", "inc", "--ext", ".phtml", "src/"]);
        assert_eq!(args.extensions, vec!["inc", ".phtml"]);
    }

    #[test]
    fn test_stdin_filename() {
        let args = parse_args_from(vec!["cbfmt", "--stdin-filename", "src/index.php", "-"]);
        assert_eq!(args.stdin_filename, Some(PathBuf::from("src/index.php")));
        assert_eq!(args.inputs, vec![PathBuf::from("-")]);
    }

    #[test]
    fn test_jobs_and_flags() {
        let args = parse_args_from(vec!["cbfmt", "-j", "4", "-D", "-S", "-s", "index.php"]);
        assert_eq!(args.jobs, Some(4));
        assert!(args.debug);
        assert!(args.silent);
        assert!(args.stdout);
    }
}
