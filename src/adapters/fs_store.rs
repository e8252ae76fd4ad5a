//! Directory-backed file store.
//!
//! Implements [`FileStore`] with `std::fs` rooted at one directory.  On
//! the device that directory is the SD card's FAT VFS mount point
//! (`/sdcard`); on the host it is any local folder.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::FileStore;
use crate::error::StoreError;

pub struct FsFileStore {
    root: PathBuf,
    available: bool,
}

impl FsFileStore {
    /// Open the store at `root`, creating the directory if needed.  A
    /// root that cannot be created yields an unavailable store rather
    /// than an error, so the node keeps running without persistence.
    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let available = match fs::create_dir_all(&root) {
            Ok(()) => {
                info!("Store: mounted at {}", root.display());
                true
            }
            Err(e) => {
                warn!("Store: {} unavailable: {}", root.display(), e);
                false
            }
        };
        Self { root, available }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable);
        }
        // Flat namespace only.
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(StoreError::NotFound);
        }
        Ok(self.root.join(name))
    }
}

fn map_io(e: io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound,
        io::ErrorKind::StorageFull => StoreError::Full,
        _ => StoreError::Io,
    }
}

impl FileStore for FsFileStore {
    fn is_available(&self) -> bool {
        self.available
    }

    fn exists(&mut self, name: &str) -> Result<bool, StoreError> {
        let path = self.path(name)?;
        Ok(path.is_file())
    }

    fn create(&mut self, name: &str, initial: &[u8]) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(map_io)?;
        file.write_all(initial).map_err(map_io)?;
        file.flush().map_err(map_io)
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let mut file = OpenOptions::new().append(true).open(path).map_err(map_io)?;
        file.write_all(data).map_err(map_io)?;
        file.flush().map_err(map_io)
    }

    fn read_at(&mut self, name: &str, offset: u64, buf: &mut [u8]) -> Result<usize, StoreError> {
        let path = self.path(name)?;
        let mut file = File::open(path).map_err(map_io)?;
        file.seek(SeekFrom::Start(offset)).map_err(map_io)?;
        file.read(buf).map_err(map_io)
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        fs::remove_file(path).map_err(map_io)
    }

    fn for_each_name(&mut self, visit: &mut dyn FnMut(&str)) -> Result<(), StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable);
        }
        for entry in fs::read_dir(&self.root).map_err(map_io)? {
            let entry = entry.map_err(map_io)?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                visit(name);
            }
        }
        Ok(())
    }
}
