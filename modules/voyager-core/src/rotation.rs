//! Folder rotation for the upload destination.
//!
//! Uploads go into `<root>/<suffix>`, then `<root>/1-<suffix>`,
//! `<root>/2-<suffix>`, ... Once the active (highest-numbered) folder holds
//! `capacity` files, the next ordinal is created and becomes active. State
//! is re-derived from a listing on every call; nothing is cached.

use dropbox_client::{DropboxError, Metadata};
use tracing::{debug, info, warn};

use voyager_common::{Config, StorageFolder};

use crate::traits::FolderStore;

/// Where folders live and how full they may get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    /// Parent path; `""` is the provider root.
    pub root: String,
    pub suffix: String,
    pub capacity: usize,
}

impl FolderLayout {
    pub fn new(root: impl Into<String>, suffix: impl Into<String>, capacity: usize) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
            capacity,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.storage_root.clone(),
            config.folder_suffix.clone(),
            config.folder_capacity,
        )
    }

    /// `<suffix>` for ordinal 0, `<n>-<suffix>` otherwise.
    pub fn folder_name(&self, ordinal: u32) -> String {
        if ordinal == 0 {
            self.suffix.clone()
        } else {
            format!("{ordinal}-{}", self.suffix)
        }
    }

    pub fn folder_path(&self, ordinal: u32) -> String {
        format!("{}/{}", self.root, self.folder_name(ordinal))
    }

    /// The bare `<root>/<suffix>` folder, also the fallback destination.
    pub fn base_path(&self) -> String {
        self.folder_path(0)
    }

    /// Parse a folder name into its ordinal. Only `<suffix>` and
    /// `<digits>-<suffix>` match.
    pub fn parse_ordinal(&self, name: &str) -> Option<u32> {
        if name == self.suffix {
            return Some(0);
        }
        let digits = name.strip_suffix(self.suffix.as_str())?.strip_suffix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    fn listing_limit(&self) -> u32 {
        u32::try_from(self.capacity.saturating_add(1)).unwrap_or(u32::MAX)
    }
}

/// Picks the folder the next upload should land in, creating folders as needed.
pub struct FolderAllocator<'a> {
    store: &'a dyn FolderStore,
    layout: &'a FolderLayout,
}

impl<'a> FolderAllocator<'a> {
    pub fn new(store: &'a dyn FolderStore, layout: &'a FolderLayout) -> Self {
        Self { store, layout }
    }

    /// Never fails: provider errors fall back to the bare `<root>/<suffix>` folder.
    pub async fn allocate(&self) -> StorageFolder {
        match self.try_allocate().await {
            Ok(folder) => folder,
            Err(e) => {
                warn!(error = %e, fallback = %self.layout.base_path(), "Folder allocation failed, using base folder");
                StorageFolder {
                    path: self.layout.base_path(),
                    ordinal: 0,
                    file_count: 0,
                }
            }
        }
    }

    async fn try_allocate(&self) -> Result<StorageFolder, DropboxError> {
        let entries = match self.store.list_folder(&self.layout.root, None).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                info!(root = %self.layout.root, "Storage root missing, creating base folder");
                return Ok(self.create_fresh(0).await);
            }
            Err(e) => return Err(e),
        };

        let Some(active) = self.active_ordinal(&entries) else {
            info!("No upload folders yet, creating base folder");
            return Ok(self.create_fresh(0).await);
        };

        let active_path = self.layout.folder_path(active);
        let contents = match self
            .store
            .list_folder(&active_path, Some(self.layout.listing_limit()))
            .await
        {
            Ok(contents) => contents,
            Err(e) if e.is_not_found() => {
                info!(folder = %active_path, "Active folder vanished, recreating");
                return Ok(self.create_fresh(active).await);
            }
            Err(e) => return Err(e),
        };

        let file_count = contents.iter().filter(|e| e.is_file()).count();
        debug!(folder = %active_path, file_count, capacity = self.layout.capacity, "Active folder");

        if file_count >= self.layout.capacity {
            let next = active + 1;
            info!(full = %active_path, next = %self.layout.folder_path(next), "Folder at capacity, rotating");
            return Ok(self.create_fresh(next).await);
        }

        Ok(StorageFolder {
            path: active_path,
            ordinal: active,
            file_count,
        })
    }

    fn active_ordinal(&self, entries: &[Metadata]) -> Option<u32> {
        entries
            .iter()
            .filter(|e| e.is_folder())
            .filter_map(|e| self.layout.parse_ordinal(e.name()))
            .max()
    }

    /// Create the folder for `ordinal` and return it. A failed create (for
    /// instance a concurrent allocator got there first) still returns the path.
    async fn create_fresh(&self, ordinal: u32) -> StorageFolder {
        let path = self.layout.folder_path(ordinal);
        if let Err(e) = self.store.create_folder(&path).await {
            warn!(folder = %path, error = %e, "Folder creation failed, using it anyway");
        }
        StorageFolder {
            path,
            ordinal,
            file_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FolderLayout {
        FolderLayout::new("", "captcha", 1000)
    }

    #[test]
    fn parses_bare_and_numbered_names() {
        let layout = layout();
        assert_eq!(layout.parse_ordinal("captcha"), Some(0));
        assert_eq!(layout.parse_ordinal("1-captcha"), Some(1));
        assert_eq!(layout.parse_ordinal("42-captcha"), Some(42));
    }

    #[test]
    fn rejects_other_names() {
        let layout = layout();
        for name in [
            "captchas",
            "captcha-1",
            "-captcha",
            "x-captcha",
            "1captcha",
            "1--captcha",
            "+1-captcha",
            "1-Captcha",
            "photos",
            "",
        ] {
            assert_eq!(layout.parse_ordinal(name), None, "{name:?} should not parse");
        }
    }

    #[test]
    fn paths_are_rooted() {
        assert_eq!(layout().base_path(), "/captcha");
        assert_eq!(layout().folder_path(3), "/3-captcha");

        let nested = FolderLayout::new("/uploads", "captcha", 10);
        assert_eq!(nested.folder_path(0), "/uploads/captcha");
        assert_eq!(nested.folder_path(2), "/uploads/2-captcha");
    }
}
