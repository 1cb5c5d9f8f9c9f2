//! Game image preparation.

use crate::abi::retro_game_info;
use crate::error::{HostError, Result};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// What the core receives: the file path alone, or the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameImage {
    /// The core reads the file itself.
    Path,
    /// Whole file, owned by the host until unload.
    Buffer(Vec<u8>),
}

/// Open the file for reading without reading it.
pub(crate) fn check_readable(path: &Path) -> io::Result<()> {
    let file = File::open(path)?;
    if file.metadata()?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path is a directory",
        ));
    }
    Ok(())
}

fn game_io_error(path: &Path, error: io::Error) -> HostError {
    match error.kind() {
        io::ErrorKind::NotFound => HostError::GameNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HostError::GameAccessDenied(path.to_path_buf()),
        _ => HostError::GameUnknown {
            path: path.to_path_buf(),
            reason: error.to_string(),
        },
    }
}

#[derive(Debug)]
pub struct LoadedGame {
    path: PathBuf,
    c_path: CString,
    title: String,
    image: GameImage,
}

impl LoadedGame {
    /// Validate `path` and prepare the image the core asked for.
    pub fn open(path: &Path, need_fullpath: bool) -> Result<Self> {
        check_readable(path).map_err(|e| game_io_error(path, e))?;

        let c_path = CString::new(path.to_string_lossy().into_owned()).map_err(|_| {
            HostError::GameUnknown {
                path: path.to_path_buf(),
                reason: "path contains a NUL byte".to_string(),
            }
        })?;

        let image = if need_fullpath {
            GameImage::Path
        } else {
            GameImage::Buffer(std::fs::read(path).map_err(|e| game_io_error(path, e))?)
        };

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "game".to_string());

        Ok(Self {
            path: path.to_path_buf(),
            c_path,
            title,
            image,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem; names the SRAM and save-state files.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn image(&self) -> &GameImage {
        &self.image
    }

    /// Descriptor passed to `retro_load_game`. Borrows from `self`.
    pub(crate) fn game_info(&self) -> retro_game_info {
        let (data, size) = match &self.image {
            GameImage::Path => (std::ptr::null(), 0),
            GameImage::Buffer(bytes) => (bytes.as_ptr().cast(), bytes.len()),
        };
        retro_game_info {
            path: self.c_path.as_ptr(),
            data,
            size,
            meta: std::ptr::null(),
        }
    }
}
