//! Zipping multi-file results.
//!
//! Photo slide posts come back from yt-dlp as a pile of images. Telegram
//! delivery stays single-message by packing them into one archive.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::core::error::{AppError, AppResult};

/// Packs `files` into a zip at `dest`. Entry names are the source file
/// names; duplicates get a numeric suffix.
pub fn zip_files(files: &[PathBuf], dest: &Path) -> AppResult<()> {
    if files.is_empty() {
        return Err(AppError::Validation("nothing to archive".to_string()));
    }

    let out = fs_err::File::create(dest)?;
    let mut writer = zip::ZipWriter::new(out);
    // Media files are already compressed; Deflated mostly just costs CPU,
    // but keeps the archive readable by every client.
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used: Vec<String> = Vec::new();
    for file in files {
        let base = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let name = if used.contains(&base) {
            format!("{}_{}", used.len(), base)
        } else {
            base
        };
        used.push(name.clone());

        writer.start_file(name, options)?;
        let mut input = fs_err::File::open(file)?;
        io::copy(&mut input, &mut writer)?;
    }

    writer.finish()?.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_zip_roundtrip() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("slide_1.jpg");
        let b = dir.path().join("slide_2.jpg");
        fs_err::write(&a, b"first image bytes").unwrap();
        fs_err::write(&b, b"second image bytes").unwrap();

        let dest = dir.path().join("slides.zip");
        zip_files(&[a, b], &dest).unwrap();

        let mut archive = zip::ZipArchive::new(fs_err::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("slide_1.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first image bytes");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(zip_files(&[], &dir.path().join("empty.zip")).is_err());
    }

    #[test]
    fn test_duplicate_names_get_suffixed() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs_err::create_dir_all(&sub).unwrap();
        let a = dir.path().join("pic.jpg");
        let b = sub.join("pic.jpg");
        fs_err::write(&a, b"one").unwrap();
        fs_err::write(&b, b"two").unwrap();

        let dest = dir.path().join("out.zip");
        zip_files(&[a, b], &dest).unwrap();

        let archive = zip::ZipArchive::new(fs_err::File::open(&dest).unwrap()).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert!(names.contains(&"pic.jpg"));
        assert!(names.contains(&"1_pic.jpg"));
    }
}
