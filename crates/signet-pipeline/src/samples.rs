//! Sample documents for exercising a running watcher by hand.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::model::has_pdf_extension;

/// Names written by [`create_sample_files`]: two signed, one unsigned, one unmatched.
pub const SAMPLE_FILENAMES: [&str; 4] = [
    "Contract_ClientA_2024-01-15_signed.pdf",
    "Invoice_ClientB_2024-01-16_executed.pdf",
    "Agreement_ClientC_2024-01-17_unsigned.pdf",
    "random_file.pdf",
];

/// What [`create_sample_files`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    /// Files written (new or recreated).
    pub created_files: Vec<String>,
    /// Sample names already present before the call.
    pub existing_files: Vec<String>,
    /// Directory the samples were written to.
    pub workplace_path: PathBuf,
    /// PDFs in the workplace after the call.
    pub total_files: usize,
}

/// Write the sample documents into `workplace`, creating it if needed.
///
/// Existing samples are left alone unless `force` is set.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] when the directory or a file cannot be written.
pub fn create_sample_files(workplace: &Path, force: bool) -> PipelineResult<SampleReport> {
    fs::create_dir_all(workplace)
        .map_err(|err| PipelineError::io("samples.create_dir", workplace, err))?;

    let mut report = SampleReport {
        workplace_path: workplace.to_path_buf(),
        ..SampleReport::default()
    };
    for name in SAMPLE_FILENAMES {
        let path = workplace.join(name);
        let exists = path.exists();
        if exists {
            report.existing_files.push(name.to_string());
            if !force {
                continue;
            }
        }
        let verb = if exists { "recreated" } else { "created" };
        let body = format!("Sample content for {name} - {verb} at {}", Utc::now().to_rfc3339());
        fs::write(&path, body).map_err(|err| PipelineError::io("samples.write", &path, err))?;
        report.created_files.push(if exists {
            format!("{name} (recreated)")
        } else {
            name.to_string()
        });
    }

    report.total_files = fs::read_dir(workplace)
        .map_err(|err| PipelineError::io("samples.read_dir", workplace, err))?
        .filter_map(Result::ok)
        .filter(|entry| has_pdf_extension(&entry.path()))
        .count();
    info!(
        workplace = %workplace.display(),
        created = report.created_files.len(),
        existing = report.existing_files.len(),
        "sample files written"
    );
    Ok(report)
}

/// Rename `original_name` to `new_name` inside `workplace`.
///
/// A placeholder document is written first when `original_name` is absent,
/// so a rename notification can be produced on demand. Both names must be
/// bare file names.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] with kind `InvalidInput` for names that are
/// empty or contain a path component, `AlreadyExists` when `new_name` is
/// taken, or the underlying failure of the write or rename.
pub fn rename_in_workplace(
    workplace: &Path,
    original_name: &str,
    new_name: &str,
) -> PipelineResult<PathBuf> {
    let original = workplace.join(bare_file_name(workplace, original_name)?);
    let renamed = workplace.join(bare_file_name(workplace, new_name)?);
    if fs::symlink_metadata(&renamed).is_ok() {
        return Err(PipelineError::io(
            "samples.rename",
            &renamed,
            io::Error::new(io::ErrorKind::AlreadyExists, "target name already taken"),
        ));
    }

    if !original.exists() {
        fs::create_dir_all(workplace)
            .map_err(|err| PipelineError::io("samples.create_dir", workplace, err))?;
        fs::write(&original, "Test PDF content - created for rename testing")
            .map_err(|err| PipelineError::io("samples.write", &original, err))?;
        info!(path = %original.display(), "created rename test file");
    }

    fs::rename(&original, &renamed)
        .map_err(|err| PipelineError::io("samples.rename", &original, err))?;
    info!(
        from = original_name,
        to = new_name,
        "renamed file in workplace"
    );
    Ok(renamed)
}

fn bare_file_name<'a>(workplace: &Path, name: &'a str) -> PipelineResult<&'a str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(PipelineError::io(
            "samples.file_name",
            workplace.join(name),
            io::Error::new(io::ErrorKind::InvalidInput, "expected a bare file name"),
        )),
    }
}
