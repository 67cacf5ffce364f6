//! Native archive extraction.
//!
//! Archives named by `archive_extract` steps are unpacked with Rust
//! libraries, no external tools involved. Format is detected from the
//! file name. Entry paths and link targets are validated, and nothing
//! is ever written through a symlink created by an earlier entry, so a
//! hostile archive cannot write outside its destination directory.

use crate::output;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot detect archive format of '{0}'")]
    UnknownFormat(String),
    #[error("archive contains unsafe path: {0}")]
    UnsafePath(String),
    #[error("archive contains unsafe link target: {0}")]
    UnsafeLink(String),
    #[error("archive path passes through a symlink: {0}")]
    SymlinkComponent(String),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

fn io_err(context: impl Into<String>, source: std::io::Error) -> ExtractError {
    ExtractError::Io {
        context: context.into(),
        source,
    }
}

/// Formats understood by [`extract`], detected from file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub fn detect(file_name: &str) -> Option<ArchiveFormat> {
        let name = file_name.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(ArchiveFormat::TarXz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Some(ArchiveFormat::TarBz2)
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Some(ArchiveFormat::TarZst)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarXz => "tar.xz",
            ArchiveFormat::TarBz2 => "tar.bz2",
            ArchiveFormat::TarZst => "tar.zst",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Extract an archive into `dest`, detecting the format from the file
/// name. The destination directory is created if needed.
pub fn extract(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file_name = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| archive.display().to_string());

    let format = ArchiveFormat::detect(&file_name)
        .ok_or_else(|| ExtractError::UnknownFormat(file_name.clone()))?;

    std::fs::create_dir_all(dest)
        .map_err(|e| io_err(format!("cannot create directory {}", dest.display()), e))?;

    let pb = output::spinner(&format!("extracting {}", file_name));
    let result = extract_with_format(archive, dest, format);
    output::progress_done(pb);

    result?;
    output::detail(&format!("extracted {} to {}", file_name, dest.display()));
    Ok(())
}

fn extract_with_format(
    archive: &Path,
    dest: &Path,
    format: ArchiveFormat,
) -> Result<(), ExtractError> {
    let file = File::open(archive)
        .map_err(|e| io_err(format!("cannot open {}", archive.display()), e))?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(reader), dest),
        ArchiveFormat::TarXz => extract_tar(xz2::read::XzDecoder::new(reader), dest),
        ArchiveFormat::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(reader), dest),
        ArchiveFormat::TarZst => {
            let decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| io_err("zstd init error", e))?;
            extract_tar(decoder, dest)
        }
        ArchiveFormat::Tar => extract_tar(reader, dest),
        ArchiveFormat::Zip => extract_zip(archive, dest),
    }
}

/// Unpack a tar stream, rejecting entries that could land outside
/// `dest`.
fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<(), ExtractError> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().map_err(|e| io_err("tar read error", e))? {
        let mut entry = entry.map_err(|e| io_err("tar entry error", e))?;

        let path = entry
            .path()
            .map_err(|e| io_err("tar path error", e))?
            .into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(ExtractError::UnsafePath(path.display().to_string()));
        }
        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let full_path = dest.join(&path);
        check_no_symlink_components(dest, &full_path)?;

        let entry_type = entry.header().entry_type();
        if entry_type == tar::EntryType::Symlink || entry_type == tar::EntryType::Link {
            let target = entry
                .link_name()
                .map_err(|e| io_err("tar link error", e))?
                .ok_or_else(|| ExtractError::UnsafeLink(path.display().to_string()))?;
            let parent = full_path.parent().unwrap_or(dest);
            check_link_target(dest, parent, &target)?;
        }

        if let Some(parent) = full_path.parent() {
            check_no_symlink_components(dest, parent)?;
            std::fs::create_dir_all(parent)
                .map_err(|e| io_err(format!("cannot create directory {}", parent.display()), e))?;
        }

        entry
            .unpack(&full_path)
            .map_err(|e| io_err(format!("unpack error for {}", path.display()), e))?;
    }

    Ok(())
}

/// Reject paths where any existing component under `dest`, the leaf
/// included, is a symlink. The lexical checks run before anything is on
/// disk; once an earlier entry has created a symlink, writing through
/// it can land outside `dest` even when the path itself is clean.
fn check_no_symlink_components(dest: &Path, full_path: &Path) -> Result<(), ExtractError> {
    let rel = full_path
        .strip_prefix(dest)
        .map_err(|_| ExtractError::UnsafePath(full_path.display().to_string()))?;

    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(ExtractError::SymlinkComponent(cur.display().to_string()));
        }
    }

    Ok(())
}

/// Reject link targets that are absolute or resolve above `dest`.
fn check_link_target(dest: &Path, link_parent: &Path, target: &Path) -> Result<(), ExtractError> {
    if target.is_absolute()
        || target
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(ExtractError::UnsafeLink(target.display().to_string()));
    }

    let candidate = lexical_normalize(&link_parent.join(target));
    if candidate.strip_prefix(lexical_normalize(dest)).is_err() {
        return Err(ExtractError::UnsafeLink(target.display().to_string()));
    }
    Ok(())
}

// Lexically normalize a path without touching the filesystem, so link
// targets can be judged without following anything.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut has_root = false;

    for component in path.components() {
        match component {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive)
        .map_err(|e| io_err(format!("cannot open {}", archive.display()), e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        // enclosed_name already rejects traversal; skip hostile entries
        let Some(rel_path) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest.join(rel_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| {
                io_err(format!("cannot create directory {}", out_path.display()), e)
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| io_err(format!("cannot create directory {}", parent.display()), e))?;
        }
        let mut out_file = std::fs::File::create(&out_path)
            .map_err(|e| io_err(format!("cannot create {}", out_path.display()), e))?;
        std::io::copy(&mut entry, &mut out_file)
            .map_err(|e| io_err(format!("write error for {}", out_path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}
