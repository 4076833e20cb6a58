use std::collections::HashMap;

use parking_lot::RwLock;

use super::types::Folder;

/// Known folders per account, looked up by name.
#[derive(Debug, Default)]
pub struct FolderDirectory {
    folders: RwLock<HashMap<(i64, String), Folder>>,
}

impl FolderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a folder. Returns true when it was not known before.
    pub fn register(&self, folder: Folder) -> bool {
        let key = (folder.account, folder.name.clone());
        self.folders.write().insert(key, folder).is_none()
    }

    pub fn get(&self, account: i64, name: &str) -> Option<Folder> {
        self.folders
            .read()
            .get(&(account, name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.folders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FolderType;

    fn folder(account: i64, name: &str) -> Folder {
        Folder {
            account,
            name: name.into(),
            folder_type: FolderType::User,
            auto_classify: false,
        }
    }

    #[test]
    fn folders_are_scoped_by_account() {
        let directory = FolderDirectory::new();
        assert!(directory.register(folder(1, "Work")));
        assert!(directory.get(1, "Work").is_some());
        assert!(directory.get(2, "Work").is_none());
    }

    #[test]
    fn register_replaces_existing_folder() {
        let directory = FolderDirectory::new();
        directory.register(folder(1, "Work"));
        let mut updated = folder(1, "Work");
        updated.auto_classify = true;
        assert!(!directory.register(updated));
        assert_eq!(directory.len(), 1);
        assert!(directory.get(1, "Work").unwrap().auto_classify);
    }
}
