//! RAM-backed file store.
//!
//! Implements [`FileStore`] over a `BTreeMap`.  Used by the simulator when
//! no data directory is given, and by tests.  Two fault switches emulate
//! a pulled SD card and a failing write.

use std::collections::BTreeMap;

use crate::app::ports::FileStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemFileStore {
    files: BTreeMap<String, Vec<u8>>,
    unavailable: bool,
    fail_appends: bool,
}

impl MemFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate inserting or removing the medium.
    pub fn set_available(&mut self, available: bool) {
        self.unavailable = !available;
    }

    /// Make every subsequent append fail with [`StoreError::Io`].
    pub fn fail_appends(&mut self, fail: bool) {
        self.fail_appends = fail;
    }

    pub fn contents(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn has(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl FileStore for MemFileStore {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn exists(&mut self, name: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.files.contains_key(name))
    }

    fn create(&mut self, name: &str, initial: &[u8]) -> Result<(), StoreError> {
        self.check()?;
        if self.files.contains_key(name) {
            return Err(StoreError::Io);
        }
        self.files.insert(name.to_owned(), initial.to_vec());
        Ok(())
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_appends {
            return Err(StoreError::Io);
        }
        let file = self.files.get_mut(name).ok_or(StoreError::NotFound)?;
        file.extend_from_slice(data);
        Ok(())
    }

    fn read_at(&mut self, name: &str, offset: u64, buf: &mut [u8]) -> Result<usize, StoreError> {
        self.check()?;
        let file = self.files.get(name).ok_or(StoreError::NotFound)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(file.len());
        let n = buf.len().min(file.len() - start);
        buf[..n].copy_from_slice(&file[start..start + n]);
        Ok(n)
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        self.check()?;
        self.files.remove(name).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn for_each_name(&mut self, visit: &mut dyn FnMut(&str)) -> Result<(), StoreError> {
        self.check()?;
        for name in self.files.keys() {
            visit(name);
        }
        Ok(())
    }
}
