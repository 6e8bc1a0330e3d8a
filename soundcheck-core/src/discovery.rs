//! File discovery module for finding video files to check.
//!
//! Only the top level of the provided directory is searched. A file qualifies
//! when its extension (case-insensitive) is one of the known video extensions.

use crate::error::{CoreError, CoreResult};
use crate::utils::is_valid_video_file;

use std::path::{Path, PathBuf};

/// Finds video files in the specified directory, sorted by path.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the discovered video files
/// * `Err(CoreError::Io)` - If the directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If no video files are found
///
/// # Examples
///
/// ```rust,no_run
/// use soundcheck_core::find_video_files;
/// use std::path::Path;
///
/// match find_video_files(Path::new("/path/to/videos")) {
///     Ok(files) => println!("Found {} video files", files.len()),
///     Err(e) => println!("Error finding video files: {}", e),
/// }
/// ```
pub fn find_video_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            is_valid_video_file(&path).then_some(path)
        })
        .collect();

    if files.is_empty() {
        log::debug!("No video files found in {}", input_dir.display());
        Err(CoreError::NoFilesFound)
    } else {
        files.sort();
        log::debug!("Found {} video files in {}", files.len(), input_dir.display());
        Ok(files)
    }
}
