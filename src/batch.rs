//! File and directory discovery.
//!
//! A directory argument expands to its `*.jack` files (non-recursively); a
//! file argument is compiled alone. Each `Foo.jack` produces a sibling
//! `Foo.vm`. Grounded on the reference driver's `main()`
//! (`original_source/projects/JackCompiler.py`): derive the class name from
//! the file stem, compile fully into memory before writing so a failure
//! never leaves a partial `.vm` file on disk, and keep going on to the next
//! file in a directory after one file fails (spec §7).

use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::compile_class;
use crate::error::JackError;

/// One `.jack` input and the `.vm` output path it will produce.
pub struct Unit {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
}

/// Expand `input` into the list of compilation units it names: the file
/// itself if it is a file, or every `*.jack` file directly inside it if it
/// is a directory (not recursive, matching the original driver).
pub fn discover(input: &Path) -> std::io::Result<Vec<Unit>> {
    if input.is_dir() {
        let mut units = Vec::new();
        for entry in fs::read_dir(input)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jack") {
                units.push(unit_for(&path));
            }
        }
        units.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        Ok(units)
    } else {
        Ok(vec![unit_for(input)])
    }
}

fn unit_for(path: &Path) -> Unit {
    Unit {
        source_path: path.to_path_buf(),
        output_path: path.with_extension("vm"),
    }
}

/// Compile one unit, writing its `.vm` file only on success.
pub fn compile_unit(unit: &Unit) -> Result<(), JackError> {
    let source = fs::read_to_string(&unit.source_path).map_err(|e| JackError::InternalAssertion(
        format!("failed to read {}: {e}", unit.source_path.display()),
    ))?;
    let vm_text = compile_class(&source, &unit.source_path)?;
    fs::write(&unit.output_path, vm_text).map_err(|e| {
        JackError::InternalAssertion(format!(
            "failed to write {}: {e}",
            unit.output_path.display()
        ))
    })?;
    Ok(())
}
