//! Confirm-then-replace handling for everything a stage writes.
//!
//! Stages never merge into leftovers from an earlier run. An existing file
//! is only truncated, and an existing directory only removed and recreated,
//! after the caller says yes.

use std::fs;
use std::io;
use std::path::Path;

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, question: &str) -> bool {
        self(question)
    }
}

/// Whether the target may now be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ready,
    Declined,
}

/// Ask before overwriting `path` if it already exists. Nothing is touched.
pub fn claim_file(path: &Path, confirm: &mut dyn Confirm) -> io::Result<Disposition> {
    if path.exists() && !confirm.confirm(&overwrite_question(path)) {
        tracing::info!("Overwrite of {:?} declined", path);
        return Ok(Disposition::Declined);
    }
    Ok(Disposition::Ready)
}

/// Make `dir` an empty directory, asking first if it already exists.
pub fn replace_dir(dir: &Path, confirm: &mut dyn Confirm) -> io::Result<Disposition> {
    if dir.exists() {
        if !confirm.confirm(&overwrite_question(dir)) {
            tracing::info!("Replacement of {:?} declined", dir);
            return Ok(Disposition::Declined);
        }
        if dir.is_dir() {
            fs::remove_dir_all(dir)?;
        } else {
            fs::remove_file(dir)?;
        }
    }
    fs::create_dir_all(dir)?;
    Ok(Disposition::Ready)
}

fn overwrite_question(path: &Path) -> String {
    format!(
        "\u{201c}{}\u{201d} already exists. Type \u{201c}Y\u{201d} to overwrite it.",
        path.display()
    )
}
