//! Archive extraction.

use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::debug;
use usetofu_core::{Error, Result};

/// Unpacks release archives.
#[async_trait]
pub trait ArchiveExtractor: Send + Sync {
    /// Unpack a zip archive into `dest` and return the extracted directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if the archive cannot be read or written out.
    async fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<PathBuf>;

    /// Unpack a gzip-compressed tar archive into `dest` and return the
    /// extracted directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if the archive cannot be read or written out.
    async fn extract_tar(&self, archive: &Path, dest: &Path) -> Result<PathBuf>;
}

/// Extracts onto the local filesystem on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsExtractor;

#[async_trait]
impl ArchiveExtractor for FsExtractor {
    async fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<PathBuf> {
        run_blocking(archive, dest, unpack_zip).await
    }

    async fn extract_tar(&self, archive: &Path, dest: &Path) -> Result<PathBuf> {
        run_blocking(archive, dest, unpack_tar_gz).await
    }
}

async fn run_blocking(
    archive: &Path,
    dest: &Path,
    unpack: fn(&Path, &Path) -> io::Result<()>,
) -> Result<PathBuf> {
    debug!(archive = %archive.display(), dest = %dest.display(), "Extracting archive");

    let archive_owned = archive.to_path_buf();
    let dest_owned = dest.to_path_buf();
    let outcome =
        tokio::task::spawn_blocking(move || unpack(&archive_owned, &dest_owned)).await;

    match outcome {
        Ok(Ok(())) => Ok(dest.to_path_buf()),
        Ok(Err(e)) => Err(Error::extraction(archive, e.to_string())),
        Err(e) => Err(Error::extraction(archive, format!("extraction task failed: {e}"))),
    }
}

fn unpack_zip(archive: &Path, dest: &Path) -> io::Result<()> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?).map_err(io::Error::other)?;
    std::fs::create_dir_all(dest)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(io::Error::other)?;

        // Entries escaping the destination are skipped
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let outpath = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&outpath)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

fn unpack_tar_gz(archive: &Path, dest: &Path) -> io::Result<()> {
    let mut tar = Archive::new(GzDecoder::new(File::open(archive)?));
    tar.set_preserve_permissions(true);
    std::fs::create_dir_all(dest)?;
    tar.unpack(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        writer.start_file("tofu", options).unwrap();
        writer.write_all(b"#!/bin/sh\necho tofu\n").unwrap();
        writer
            .start_file("LICENSE", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"MPL-2.0").unwrap();
        writer.finish().unwrap();
    }

    fn write_tar_gz(path: &Path) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let body = b"#!/bin/sh\necho tofu\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, "tofu", &body[..]).unwrap();

        builder.into_inner().unwrap().finish().unwrap();
    }

    #[tokio::test]
    async fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tofu.zip");
        write_zip(&archive);

        let dest = temp.path().join("out");
        let dir = FsExtractor.extract_zip(&archive, &dest).await.unwrap();

        assert_eq!(dir, dest);
        assert!(dest.join("tofu").is_file());
        assert_eq!(std::fs::read_to_string(dest.join("LICENSE")).unwrap(), "MPL-2.0");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dest.join("tofu")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_extract_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tofu.tar.gz");
        write_tar_gz(&archive);

        let dest = temp.path().join("out");
        let dir = FsExtractor.extract_tar(&archive, &dest).await.unwrap();

        assert_eq!(dir, dest);
        assert_eq!(
            std::fs::read_to_string(dest.join("tofu")).unwrap(),
            "#!/bin/sh\necho tofu\n"
        );
    }

    #[tokio::test]
    async fn test_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, b"not a zip").unwrap();

        let err = FsExtractor
            .extract_zip(&archive, &temp.path().join("out"))
            .await
            .unwrap_err();

        assert!(matches!(&err, Error::Extraction { archive: a, .. } if a == &archive));
    }

    #[tokio::test]
    async fn test_tar_of_zip_bytes_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tofu.zip");
        write_zip(&archive);

        let result = FsExtractor
            .extract_tar(&archive, &temp.path().join("out"))
            .await;
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }
}
