use std::collections::BTreeMap;

use crate::env::TargetEnv;
use crate::error::{Error, PopulateError, PopulateErrorKind};
use crate::model::Entry;

/// Merge policy and diagnostics knobs for [`populate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulateOptions {
    /// Replace values already present in the target.
    pub override_existing: bool,
    /// Print per-key skip/write diagnostics to stderr.
    pub debug: bool,
}

/// Merge `source` entries into `target` in source order.
///
/// Existing target keys are preserved unless `override_existing` is set.
/// Returns the subset of entries actually written. The source is validated
/// up front; an unusable entry fails before any target mutation.
pub fn populate(
    target: &mut TargetEnv,
    source: &[Entry],
    options: &PopulateOptions,
) -> Result<BTreeMap<String, String>, Error> {
    validate_source(source)?;

    let mut written = BTreeMap::new();
    for entry in source {
        if entry.key.is_empty() {
            // Unreachable through the parser; guard against hand-built input.
            if options.debug {
                eprintln!("loadenv: skipping entry with empty key");
            }
            continue;
        }

        if !options.override_existing && target.contains_key(&entry.key) {
            if options.debug {
                eprintln!("loadenv: skipping existing key {}", entry.key);
            }
            continue;
        }

        target.set_var(&entry.key, &entry.value);
        written.insert(entry.key.clone(), entry.value.clone());
        if options.debug {
            eprintln!("loadenv: set {}", entry.key);
        }
    }

    Ok(written)
}

/// Reject entries that cannot name or hold an environment variable.
///
/// Keys with `=` or NUL and values with NUL would panic in
/// `std::env::set_var`; checking all entries first keeps the fail-fast
/// contract: no mutation happens on an invalid source.
fn validate_source(source: &[Entry]) -> Result<(), PopulateError> {
    for entry in source {
        if entry.key.contains('=') || entry.key.contains('\0') {
            return Err(PopulateError::new(
                entry.key.clone(),
                PopulateErrorKind::InvalidKey,
            ));
        }
        if entry.value.contains('\0') {
            return Err(PopulateError::new(
                entry.key.clone(),
                PopulateErrorKind::InvalidValue,
            ));
        }
    }
    Ok(())
}
