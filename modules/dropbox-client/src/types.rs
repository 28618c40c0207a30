use serde::{Deserialize, Serialize};

// --- list_folder ---

/// Argument for `files/list_folder`.
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderArg {
    pub path: String,
    pub recursive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Argument for `files/list_folder/continue`.
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderContinueArg {
    pub cursor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListFolderResult {
    pub entries: Vec<Metadata>,
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub has_more: bool,
}

/// A directory entry, discriminated by Dropbox's `.tag` field.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub enum Metadata {
    File(FileMetadata),
    Folder(FolderMetadata),
    Deleted(DeletedMetadata),
}

impl Metadata {
    pub fn name(&self) -> &str {
        match self {
            Metadata::File(f) => &f.name,
            Metadata::Folder(f) => &f.name,
            Metadata::Deleted(d) => &d.name,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Metadata::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Metadata::Folder(_))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FolderMetadata {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeletedMetadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

// --- create_folder_v2 ---

#[derive(Debug, Clone, Serialize)]
pub struct CreateFolderArg {
    pub path: String,
    pub autorename: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolderResult {
    pub metadata: FolderMetadata,
}

// --- upload ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Never overwrite; a name clash is a conflict error unless `autorename` is set.
    Add,
    Overwrite,
}

/// JSON carried in the `Dropbox-API-Arg` header of a content upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadArg {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
}

impl UploadArg {
    pub fn add(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::Add,
            autorename: false,
            mute: false,
        }
    }
}

// --- errors ---

/// Body Dropbox returns with a 409 endpoint-specific error.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_tag_discriminates_entries() {
        let json = r#"{"entries":[
            {".tag":"folder","name":"captcha","id":"id:1","path_display":"/captcha"},
            {".tag":"file","name":"1700000000000.jpg","id":"id:2","size":2048},
            {".tag":"deleted","name":"gone.jpg"}
        ],"cursor":"c","has_more":false}"#;

        let result: ListFolderResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.entries.len(), 3);
        assert!(result.entries[0].is_folder());
        assert!(result.entries[1].is_file());
        assert!(!result.entries[2].is_file());
        assert_eq!(result.entries[1].name(), "1700000000000.jpg");
    }

    #[test]
    fn upload_arg_add_mode_serializes_like_dropbox_expects() {
        let arg = serde_json::to_value(UploadArg::add("/captcha/1.jpg")).unwrap();
        assert_eq!(
            arg,
            serde_json::json!({
                "path": "/captcha/1.jpg",
                "mode": "add",
                "autorename": false,
                "mute": false
            })
        );
    }
}
