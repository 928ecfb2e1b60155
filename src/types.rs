//! Persisted entities: folders, projects and templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payload::QrContent;
use crate::style::{QrOptions, StyleOptions};

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A saved studio configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub folder_id: String,
    #[serde(flatten)]
    pub content: QrContent,
    pub qr_options: QrOptions,
    pub created_at: DateTime<Utc>,
}

/// Project fields supplied by the caller; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub folder_id: String,
    pub content: QrContent,
    pub qr_options: QrOptions,
}

/// Reusable style snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub options: StyleOptions,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_json_layout() {
        let project = Project {
            id: "p1".to_string(),
            name: "Site".to_string(),
            folder_id: "default".to_string(),
            content: QrContent::Url("https://a.b".to_string()),
            qr_options: QrOptions::default(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["folderId"], "default");
        assert_eq!(json["qrType"], "url");
        assert_eq!(json["qrData"], "https://a.b");
        assert_eq!(json["qrOptions"]["width"], 300);
        assert!(json["createdAt"].is_string());

        let back: Project = serde_json::from_value(json).unwrap();
        assert_eq!(back, project);
    }

    #[test]
    fn test_ids_are_uuid_v4() {
        let folder = Folder::new("Work");
        let parsed = Uuid::parse_str(&folder.id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_ne!(Folder::new("Work").id, folder.id);
    }
}
