use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderType {
    Inbox,
    Outbox,
    Drafts,
    Sent,
    Archive,
    Trash,
    Junk,
    System,
    User,
}

impl FolderType {
    /// Only inbox, junk and user folders take part in learning and prediction.
    pub fn can_classify(self) -> bool {
        matches!(self, FolderType::Inbox | FolderType::Junk | FolderType::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub account: i64,
    pub name: String,
    pub folder_type: FolderType,
    /// Whether messages may be auto-filed into this folder.
    #[serde(default)]
    pub auto_classify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request to move a message, handed to whatever executes folder operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveAction {
    pub account: i64,
    pub message: i64,
    pub from_folder: String,
    pub to_folder: String,
    /// Hide the message in listings until the move completes.
    pub hide: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligible_folder_types() {
        assert!(FolderType::Inbox.can_classify());
        assert!(FolderType::Junk.can_classify());
        assert!(FolderType::User.can_classify());
        assert!(!FolderType::Sent.can_classify());
        assert!(!FolderType::Trash.can_classify());
        assert!(!FolderType::Drafts.can_classify());
    }
}
