pub mod folders;
pub mod message;
pub mod types;

pub use folders::FolderDirectory;
pub use message::MessageEvent;
pub use types::{Address, Folder, FolderType, MoveAction};
