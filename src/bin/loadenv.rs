use std::env;
use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, Command};

use loadenv::{Encoding, EnvLoader, TargetEnv};

const DEFAULT_FILE: &str = ".env";

const HELP: &str = "\
loadenv - run commands with variables loaded from dotenv files

Usage:
  loadenv run [OPTIONS] -- COMMAND [ARGS...]
  loadenv run [OPTIONS] COMMAND [ARGS...]
  loadenv --help
  loadenv --version

Commands:
  run       Load dotenv files and execute a command
";

const RUN_HELP: &str = "\
loadenv run - load dotenv files and execute a command

Usage:
  loadenv run [OPTIONS] -- COMMAND [ARGS...]
  loadenv run [OPTIONS] COMMAND [ARGS...]

Options:
  -f, --file <PATHS>      Dotenv file path(s). Repeat or pass comma-separated paths.
                          Defaults to .env.
  -i, --ignore            Ignore dotenv files that fail to load.
      --ignore-missing    Alias for --ignore.
  -o, --override          Override existing environment variables.
      --overload          Alias for --override.
      --encoding <NAME>   Input encoding: utf8 (default) or latin1.
  -v, --verbose           Print loader diagnostics to stderr.
  -q, --quiet             Suppress loader diagnostics (default).
  -h, --help              Show this help text.

Environment:
  DOTENV_CONFIG_PATH      Default file path when no -f is given.
  DOTENV_CONFIG_ENCODING  Default input encoding.
  DOTENV_CONFIG_OVERRIDE  Default for --override.
  DOTENV_CONFIG_DEBUG     Default for --verbose.
  DOTENV_CONFIG_QUIET     Default for --quiet.
  DOTENV_KEY              Decrypt each file as an encrypted vault blob.
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum RunCommand {
    Help,
    Execute(RunOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunOptions {
    files: Vec<PathBuf>,
    required: bool,
    override_existing: bool,
    encoding: Encoding,
    verbose: bool,
    decryption_key: Option<String>,
    command: OsString,
    args: Vec<OsString>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            required: true,
            override_existing: false,
            encoding: Encoding::Utf8,
            verbose: false,
            decryption_key: None,
            command: OsString::new(),
            args: Vec::new(),
        }
    }
}

fn main() {
    process::exit(run(env::args_os()));
}

fn run(args: impl IntoIterator<Item = OsString>) -> i32 {
    let mut args = args.into_iter();
    let _bin = args.next();

    let Some(subcommand) = args.next() else {
        print_help();
        return 0;
    };

    let subcommand = subcommand.to_string_lossy();
    match subcommand.as_ref() {
        "-h" | "--help" | "help" => {
            print_help();
            0
        }
        "-V" | "--version" | "version" => {
            print_version();
            0
        }
        "run" => match parse_run_options(args.collect(), |name| env::var(name).ok()) {
            Ok(RunCommand::Help) => {
                print_run_help();
                0
            }
            Ok(RunCommand::Execute(options)) => match execute_run(options) {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("loadenv: {err}");
                    1
                }
            },
            Err(err) => {
                eprintln!("loadenv: {err}");
                eprintln!("Try `loadenv run --help`.");
                1
            }
        },
        unknown => {
            eprintln!("loadenv: unknown subcommand `{unknown}`");
            eprintln!("Try `loadenv --help`.");
            1
        }
    }
}

fn parse_run_options(
    args: Vec<OsString>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<RunCommand, String> {
    let mut options = env_defaults(env_lookup)?;
    let mut files = Vec::new();
    let mut index = 0usize;
    while index < args.len() {
        let token = args[index].to_string_lossy();
        match token.as_ref() {
            "--" => {
                index += 1;
                break;
            }
            "-h" | "--help" => return Ok(RunCommand::Help),
            "-f" | "--file" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    return Err("missing value for `-f/--file`".to_owned());
                };
                parse_file_text(&value.to_string_lossy(), &mut files)?;
                index += 1;
            }
            value if value.starts_with("--file=") => {
                parse_file_text(&value["--file=".len()..], &mut files)?;
                index += 1;
            }
            "--encoding" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    return Err("missing value for `--encoding`".to_owned());
                };
                options.encoding = parse_encoding(&value.to_string_lossy())?;
                index += 1;
            }
            "-i" | "--ignore" | "--ignore-missing" => {
                options.required = false;
                index += 1;
            }
            "-o" | "--override" | "--overload" => {
                options.override_existing = true;
                index += 1;
            }
            "-v" | "--verbose" => {
                options.verbose = true;
                index += 1;
            }
            "-q" | "--quiet" => {
                options.verbose = false;
                index += 1;
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown option `{unknown}`"));
            }
            _ => break,
        }
    }

    if !files.is_empty() {
        options.files = files;
    }
    if options.files.is_empty() {
        options.files.push(PathBuf::from(DEFAULT_FILE));
    }

    let remaining = &args[index..];
    let Some((command, command_args)) = remaining.split_first() else {
        return Err("missing command after `run`".to_owned());
    };

    options.command = command.clone();
    options.args = command_args.to_vec();
    Ok(RunCommand::Execute(options))
}

/// Seed options from `DOTENV_CONFIG_*` and `DOTENV_KEY`; flags win later.
fn env_defaults(lookup: impl Fn(&str) -> Option<String>) -> Result<RunOptions, String> {
    let mut options = RunOptions::default();

    if let Some(path) = lookup("DOTENV_CONFIG_PATH") {
        options.files.push(PathBuf::from(path));
    }
    if let Some(name) = lookup("DOTENV_CONFIG_ENCODING") {
        options.encoding = parse_encoding(&name)?;
    }
    if let Some(value) = lookup("DOTENV_CONFIG_OVERRIDE") {
        options.override_existing = env_truthy(&value);
    }
    if let Some(value) = lookup("DOTENV_CONFIG_DEBUG") {
        options.verbose = env_truthy(&value);
    }
    if let Some(value) = lookup("DOTENV_CONFIG_QUIET")
        && env_truthy(&value)
    {
        options.verbose = false;
    }
    options.decryption_key = lookup("DOTENV_KEY").filter(|key| !key.is_empty());

    Ok(options)
}

fn env_truthy(value: &str) -> bool {
    !matches!(value.to_ascii_lowercase().as_str(), "" | "0" | "false")
}

fn parse_encoding(name: &str) -> Result<Encoding, String> {
    Encoding::from_name(name).ok_or_else(|| format!("unsupported encoding `{name}`"))
}

fn parse_file_text(raw: &str, files: &mut Vec<PathBuf>) -> Result<(), String> {
    let mut added = 0usize;
    for segment in raw.split(',') {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        files.push(PathBuf::from(trimmed));
        added += 1;
    }
    if added == 0 {
        return Err("`-f/--file` requires at least one path".to_owned());
    }
    Ok(())
}

fn execute_run(options: RunOptions) -> Result<i32, String> {
    let baseline = TargetEnv::snapshot();
    let mut loader = EnvLoader::new()
        .paths(&options.files)
        .encoding(options.encoding)
        .override_existing(options.override_existing)
        .quiet(!options.verbose)
        .debug(options.verbose)
        .target(baseline.clone());
    if let Some(key_material) = &options.decryption_key {
        loader = loader.decryption_key(key_material);
    }

    let report = loader.load().map_err(|err| err.to_string())?;
    if options.required && !report.errors.is_empty() {
        let mut lines = Vec::new();
        for failure in &report.errors {
            lines.push(format!("{}: {}", failure.path.display(), failure.error));
        }
        return Err(lines.join("\n"));
    }

    let target = loader.into_target();
    let (Some(before), Some(after)) = (baseline.as_memory(), target.as_memory()) else {
        return Err("internal: loader target is not in-memory".to_owned());
    };

    // Only pass keys the load actually changed; untouched inherited
    // variables reach the child unconverted.
    let mut command = Command::new(&options.command);
    command.args(&options.args);
    for (key, value) in after {
        if before.get(key) != Some(value) {
            command.env(key, value);
        }
    }

    execute_command(command, &options.command)
}

#[cfg(unix)]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let err = command.exec();
    Err(format!(
        "failed to execute `{}`: {err}",
        program.to_string_lossy()
    ))
}

#[cfg(not(unix))]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let status = command
        .status()
        .map_err(|err| format!("failed to execute `{}`: {err}", program.to_string_lossy()))?;
    Ok(status.code().unwrap_or(1))
}

fn print_help() {
    println!("{HELP}");
}

fn print_run_help() {
    println!("{RUN_HELP}");
}

fn print_version() {
    println!("loadenv {}", env!("CARGO_PKG_VERSION"));
}
