use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::env::TargetEnv;
use crate::error::Error;
use crate::model::{Encoding, Entry, LoadReport, PathError};
use crate::parser::parse_str_with_source;
use crate::populate::{PopulateOptions, populate};
use crate::vault;

/// Load `.env` from the current working directory into the process
/// environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    unsafe { from_filename(".env") }
}

/// Load one dotenv file into the process environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_path(path: impl AsRef<Path>) -> Result<LoadReport, Error> {
    let mut loader = EnvLoader::new()
        .path(path)
        .target(unsafe { TargetEnv::process() });
    loader.load()
}

/// Load multiple dotenv files into the process environment, later files
/// taking precedence.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_paths<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut loader = EnvLoader::new()
        .paths(paths)
        .target(unsafe { TargetEnv::process() });
    loader.load()
}

/// Load a dotenv file by name from the current working directory into the
/// process environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_filename(name: &str) -> Result<LoadReport, Error> {
    unsafe { from_path(PathBuf::from(name)) }
}

/// Builder-style dotenv loader.
///
/// The default target is a process-isolated in-memory map; opt in to
/// process mutation explicitly via [`TargetEnv::process`].
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    encoding: Encoding,
    override_existing: bool,
    quiet: bool,
    debug: bool,
    decryption_key: Option<String>,
    target: TargetEnv,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Suppress the one-line injection summary printed after `load`.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Print per-path and per-key diagnostics to stderr.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Treat each configured file as an encrypted vault blob and decrypt it
    /// with this key material before parsing.
    pub fn decryption_key(mut self, key_material: impl Into<String>) -> Self {
        self.decryption_key = Some(key_material.into());
        self
    }

    pub fn target(mut self, target: TargetEnv) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &TargetEnv {
        &self.target
    }

    pub fn target_env_mut(&mut self) -> &mut TargetEnv {
        &mut self.target
    }

    pub fn into_target(self) -> TargetEnv {
        self.target
    }

    /// Read, decode, and parse all configured paths without touching the
    /// target. Later paths win duplicate keys.
    pub fn parse_only(&self) -> Result<Vec<Entry>, Error> {
        let (entries, mut collected) = self.collect_entries();
        if collected.files_read == 0
            && let Some(failure) = collected.errors.pop()
        {
            return Err(failure.error);
        }
        Ok(entries)
    }

    /// Parse all configured paths and populate the target.
    ///
    /// Per-path failures are collected into the report while the remaining
    /// paths keep loading; only when every path fails is the last failure
    /// returned as `Err`.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let (entries, mut collected) = self.collect_entries();
        if collected.files_read == 0
            && let Some(failure) = collected.errors.pop()
        {
            return Err(failure.error);
        }

        let options = PopulateOptions {
            override_existing: self.override_existing,
            debug: self.debug,
        };
        let written = populate(&mut self.target, &entries, &options)?;

        let report = LoadReport {
            loaded: written.len(),
            skipped_existing: entries.len() - written.len(),
            files_read: collected.files_read,
            errors: collected.errors,
        };
        if !self.quiet {
            eprintln!(
                "loadenv: injected {} vars from {} file(s)",
                report.loaded, report.files_read
            );
        }
        Ok(report)
    }

    fn collect_entries(&self) -> (Vec<Entry>, Collected) {
        let mut merged_entries: Vec<Entry> = Vec::new();
        let mut by_key = HashMap::<String, usize>::new();
        let mut collected = Collected::default();

        for path in self.effective_paths() {
            let parsed = match self.read_entries(&path) {
                Ok(parsed) => parsed,
                Err(error) => {
                    if self.debug {
                        eprintln!("loadenv: failed to load {}: {error}", path.display());
                    }
                    collected.errors.push(PathError { path, error });
                    continue;
                }
            };

            collected.files_read += 1;
            for entry in parsed {
                if let Some(existing_idx) = by_key.get(&entry.key).copied() {
                    merged_entries[existing_idx] = entry;
                } else {
                    by_key.insert(entry.key.clone(), merged_entries.len());
                    merged_entries.push(entry);
                }
            }
        }

        (merged_entries, collected)
    }

    fn read_entries(&self, path: &Path) -> Result<Vec<Entry>, Error> {
        let bytes = std::fs::read(path)?;
        let text = decode(&bytes, self.encoding)?;
        let text = match &self.decryption_key {
            Some(key_material) => Cow::Owned(vault::decrypt(&text, key_material)?),
            None => text,
        };
        Ok(parse_str_with_source(&text, Some(path)))
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            return vec![PathBuf::from(".env")];
        }
        let home = dirs::home_dir();
        self.paths
            .iter()
            .map(|path| resolve_home(path, home.as_deref()))
            .collect()
    }
}

#[derive(Debug, Default)]
struct Collected {
    files_read: usize,
    errors: Vec<PathError>,
}

fn decode(bytes: &[u8], encoding: Encoding) -> Result<Cow<'_, str>, Error> {
    match encoding {
        Encoding::Utf8 => Ok(Cow::Borrowed(std::str::from_utf8(bytes)?)),
        Encoding::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&byte| byte as char).collect())),
    }
}

/// Expand a leading `~` to the user's home directory. Paths without the
/// prefix, or with no known home, pass through untouched.
fn resolve_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let Some(rest) = text.strip_prefix('~') else {
        return path.to_path_buf();
    };
    let Some(home) = home else {
        return path.to_path_buf();
    };
    home.join(rest.trim_start_matches('/'))
}
