//! Folders, projects and templates with write-through persistence
//!
//! The store owns the three collections and the selected language. Every
//! mutation updates memory first and then writes the whole collection back
//! through the key-value backend.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::constants::folders::{DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME};
use crate::constants::i18n::DEFAULT_LANGUAGE;
use crate::constants::storage::*;
use crate::error::StoreError;
use crate::i18n;
use crate::persistence::{self, KeyValueStore};
use crate::style::StyleOptions;
use crate::types::{Folder, NewProject, Project, Template, new_id};

pub struct AppStore<B: KeyValueStore> {
    backend: B,
    folders: Vec<Folder>,
    projects: Vec<Project>,
    templates: Vec<Template>,
    language: String,
}

fn default_folder() -> Folder {
    Folder {
        id: DEFAULT_FOLDER_ID.to_string(),
        name: DEFAULT_FOLDER_NAME.to_string(),
        created_at: Utc::now(),
    }
}

/// Keep the first entry of every id
fn dedupe_by_id<T>(items: &mut Vec<T>, id: impl Fn(&T) -> &str, collection: &str) {
    let mut seen = HashSet::new();
    let before = items.len();
    items.retain(|item| seen.insert(id(item).to_string()));
    if items.len() != before {
        warn!(
            collection = %collection,
            dropped = before - items.len(),
            "Dropped entries with duplicate ids"
        );
    }
}

fn require_name(name: &str, what: &'static str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName { what });
    }
    Ok(trimmed.to_string())
}

impl<B: KeyValueStore> AppStore<B> {
    /// Load all collections from `backend`
    pub fn open(mut backend: B) -> Self {
        let mut folders: Vec<Folder> = persistence::load(&backend, FOLDERS_KEY, vec![default_folder()]);
        let mut projects: Vec<Project> = persistence::load(&backend, PROJECTS_KEY, Vec::new());
        let mut templates: Vec<Template> = persistence::load(&backend, TEMPLATES_KEY, Vec::new());
        let mut language: String = persistence::load(&backend, LANGUAGE_KEY, DEFAULT_LANGUAGE.to_string());

        dedupe_by_id(&mut folders, |f| f.id.as_str(), FOLDERS_KEY);
        dedupe_by_id(&mut projects, |p| p.id.as_str(), PROJECTS_KEY);
        dedupe_by_id(&mut templates, |t| t.id.as_str(), TEMPLATES_KEY);

        if !folders.iter().any(|f| f.id == DEFAULT_FOLDER_ID) {
            warn!("Default folder missing from storage, restoring it");
            folders.insert(0, default_folder());
            persistence::save(&mut backend, FOLDERS_KEY, &folders);
        }

        if !i18n::is_supported(&language) {
            warn!(language = %language, fallback = DEFAULT_LANGUAGE, "Stored language is not supported");
            language = DEFAULT_LANGUAGE.to_string();
        }

        info!(
            folders = folders.len(),
            projects = projects.len(),
            templates = templates.len(),
            language = %language,
            "Store opened"
        );

        Self {
            backend,
            folders,
            projects,
            templates,
            language,
        }
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    #[cfg(test)]
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Create a folder; blank names are ignored
    pub fn add_folder(&mut self, name: &str) -> Option<Folder> {
        let name = require_name(name, "folder").ok()?;
        let folder = Folder::new(name);
        info!(id = %folder.id, name = %folder.name, "Folder created");
        self.folders.push(folder.clone());
        self.persist_folders();
        Some(folder)
    }

    /// Delete a folder and every project in it, returning how many projects went with it
    pub fn delete_folder(&mut self, id: &str) -> Result<usize, StoreError> {
        if id == DEFAULT_FOLDER_ID {
            warn!(id = %id, "Refusing to delete the default folder");
            return Err(StoreError::ProtectedFolder(id.to_string()));
        }

        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        if self.folders.len() == before {
            debug!(id = %id, "Delete requested for unknown folder");
            return Ok(0);
        }

        let projects_before = self.projects.len();
        self.projects.retain(|p| p.folder_id != id);
        let cascaded = projects_before - self.projects.len();

        self.persist_folders();
        self.persist_projects();
        info!(id = %id, cascaded, "Folder deleted");
        Ok(cascaded)
    }

    pub fn add_project(&mut self, draft: NewProject) -> Result<Project, StoreError> {
        let name = require_name(&draft.name, "project")?;
        if self.folder(&draft.folder_id).is_none() {
            return Err(StoreError::UnknownFolder(draft.folder_id));
        }

        let project = Project {
            id: new_id(),
            name,
            folder_id: draft.folder_id,
            content: draft.content,
            qr_options: draft.qr_options,
            created_at: Utc::now(),
        };
        info!(id = %project.id, name = %project.name, folder = %project.folder_id, "Project saved");
        self.projects.push(project.clone());
        self.persist_projects();
        Ok(project)
    }

    /// Replace the project with the same id; false when there is none
    pub fn update_project(&mut self, project: Project) -> bool {
        let Some(slot) = self.projects.iter_mut().find(|p| p.id == project.id) else {
            debug!(id = %project.id, "Update requested for unknown project");
            return false;
        };
        *slot = project;
        self.persist_projects();
        true
    }

    pub fn delete_project(&mut self, id: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return false;
        }
        info!(id = %id, "Project deleted");
        self.persist_projects();
        true
    }

    /// Projects of a folder, newest first
    pub fn projects_in_folder(&self, folder_id: &str) -> Vec<&Project> {
        // Reverse before the stable sort so equal timestamps list the latest insert first
        let mut projects: Vec<&Project> = self
            .projects
            .iter()
            .rev()
            .filter(|p| p.folder_id == folder_id)
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        projects
    }

    pub fn add_template(&mut self, name: &str, options: StyleOptions) -> Result<Template, StoreError> {
        let name = require_name(name, "template")?;
        let template = Template {
            id: new_id(),
            name,
            options,
        };
        info!(id = %template.id, name = %template.name, "Template saved");
        self.templates.push(template.clone());
        self.persist_templates();
        Ok(template)
    }

    pub fn delete_template(&mut self, id: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        if self.templates.len() == before {
            return false;
        }
        info!(id = %id, "Template deleted");
        self.persist_templates();
        true
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, code: &str) -> Result<(), StoreError> {
        if !i18n::is_supported(code) {
            return Err(StoreError::UnsupportedLanguage(code.to_string()));
        }
        self.language = code.to_string();
        persistence::save(&mut self.backend, LANGUAGE_KEY, &self.language);
        info!(language = %code, "Language changed");
        Ok(())
    }

    fn persist_folders(&mut self) {
        persistence::save(&mut self.backend, FOLDERS_KEY, &self.folders);
    }

    fn persist_projects(&mut self) {
        persistence::save(&mut self.backend, PROJECTS_KEY, &self.projects);
    }

    fn persist_templates(&mut self) {
        persistence::save(&mut self.backend, TEMPLATES_KEY, &self.templates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::QrContent;
    use crate::persistence::MemoryStore;
    use crate::style::QrOptions;

    fn draft(name: &str, folder_id: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            folder_id: folder_id.to_string(),
            content: QrContent::Url("https://example.com".to_string()),
            qr_options: QrOptions::default(),
        }
    }

    #[test]
    fn test_fresh_store_has_default_folder() {
        let store = AppStore::open(MemoryStore::new());
        assert_eq!(store.folders().len(), 1);
        assert_eq!(store.folders()[0].id, DEFAULT_FOLDER_ID);
        assert!(store.projects().is_empty());
        assert!(store.templates().is_empty());
        assert_eq!(store.language(), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_default_folder_is_protected() {
        let mut store = AppStore::open(MemoryStore::new());
        store.add_project(draft("Home", DEFAULT_FOLDER_ID)).unwrap();

        let result = store.delete_folder(DEFAULT_FOLDER_ID);
        assert_eq!(result, Err(StoreError::ProtectedFolder(DEFAULT_FOLDER_ID.to_string())));
        assert!(store.folder(DEFAULT_FOLDER_ID).is_some());
        assert_eq!(store.projects().len(), 1);
    }

    #[test]
    fn test_delete_folder_cascades_only_its_projects() {
        let mut store = AppStore::open(MemoryStore::new());
        let work = store.add_folder("Work").unwrap();
        assert_eq!(store.folder(&work.id), Some(&work));
        store.add_project(draft("A", &work.id)).unwrap();
        store.add_project(draft("B", &work.id)).unwrap();
        let kept = store.add_project(draft("C", DEFAULT_FOLDER_ID)).unwrap();

        assert_eq!(store.delete_folder(&work.id), Ok(2));
        assert!(store.folder(&work.id).is_none());
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.projects()[0].id, kept.id);
    }

    #[test]
    fn test_delete_unknown_folder_is_noop() {
        let mut store = AppStore::open(MemoryStore::new());
        assert_eq!(store.delete_folder("nope"), Ok(0));
        assert_eq!(store.folders().len(), 1);
    }

    #[test]
    fn test_blank_folder_name_ignored() {
        let mut store = AppStore::open(MemoryStore::new());
        assert!(store.add_folder("   ").is_none());
        assert_eq!(store.folders().len(), 1);
    }

    #[test]
    fn test_add_project_validation() {
        let mut store = AppStore::open(MemoryStore::new());
        assert_eq!(
            store.add_project(draft(" ", DEFAULT_FOLDER_ID)),
            Err(StoreError::EmptyName { what: "project" })
        );
        assert_eq!(
            store.add_project(draft("X", "missing")),
            Err(StoreError::UnknownFolder("missing".to_string()))
        );
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_projects_in_folder_newest_first() {
        let mut store = AppStore::open(MemoryStore::new());
        let first = store.add_project(draft("first", DEFAULT_FOLDER_ID)).unwrap();
        let second = store.add_project(draft("second", DEFAULT_FOLDER_ID)).unwrap();

        let mut older = first.clone();
        older.created_at = second.created_at - chrono::Duration::seconds(10);
        assert!(store.update_project(older));

        let listed: Vec<&str> = store
            .projects_in_folder(DEFAULT_FOLDER_ID)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(listed, vec!["second", "first"]);
    }

    #[test]
    fn test_projects_in_folder_ties_newest_insert_first() {
        let mut store = AppStore::open(MemoryStore::new());
        let a = store.add_project(draft("a", DEFAULT_FOLDER_ID)).unwrap();
        let mut b = store.add_project(draft("b", DEFAULT_FOLDER_ID)).unwrap();
        b.created_at = a.created_at;
        assert!(store.update_project(b));

        let listed: Vec<&str> = store
            .projects_in_folder(DEFAULT_FOLDER_ID)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(listed, vec!["b", "a"]);
    }

    #[test]
    fn test_update_and_delete_missing_project() {
        let mut store = AppStore::open(MemoryStore::new());
        let project = store.add_project(draft("a", DEFAULT_FOLDER_ID)).unwrap();

        let mut ghost = project.clone();
        ghost.id = "ghost".to_string();
        assert!(!store.update_project(ghost));
        assert!(!store.delete_project("ghost"));
        assert!(store.delete_project(&project.id));
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_templates() {
        let mut store = AppStore::open(MemoryStore::new());
        assert_eq!(
            store.add_template("", StyleOptions::default()),
            Err(StoreError::EmptyName { what: "template" })
        );
        let before = store.templates().to_vec();
        let mut style = StyleOptions::default();
        style.dots_options.color = "#ff0000".to_string();
        let template = store.add_template("Red", style.clone()).unwrap();
        assert_eq!(store.template(&template.id).unwrap().options, style);
        assert!(store.delete_template(&template.id));
        assert!(!store.delete_template(&template.id));
        assert_eq!(store.templates(), before.as_slice());
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut store = AppStore::open(MemoryStore::new());
        let folder = store.add_folder("Work").unwrap();
        let project = store.add_project(draft("Site", &folder.id)).unwrap();
        store.add_template("Plain", StyleOptions::default()).unwrap();
        store.set_language("en").unwrap();

        let reopened = AppStore::open(store.into_backend());
        assert_eq!(reopened.folders().len(), 2);
        assert_eq!(reopened.project(&project.id), Some(&project));
        assert_eq!(reopened.templates().len(), 1);
        assert_eq!(reopened.language(), "en");
    }

    #[test]
    fn test_missing_default_folder_is_restored() {
        let mut backend = MemoryStore::new();
        let only = vec![Folder::new("Loose")];
        persistence::save(&mut backend, FOLDERS_KEY, &only);

        let store = AppStore::open(backend);
        assert_eq!(store.folders().len(), 2);
        assert_eq!(store.folders()[0].id, DEFAULT_FOLDER_ID);
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let mut backend = MemoryStore::new();
        let folder = Folder::new("Twice");
        persistence::save(&mut backend, FOLDERS_KEY, &vec![default_folder(), folder.clone(), folder]);

        let store = AppStore::open(backend);
        assert_eq!(store.folders().len(), 2);
    }

    #[test]
    fn test_corrupt_collection_falls_back() {
        let mut backend = MemoryStore::new();
        backend.set(PROJECTS_KEY, "not json").unwrap();
        let store = AppStore::open(backend);
        assert!(store.projects().is_empty());
        assert_eq!(store.folders()[0].id, DEFAULT_FOLDER_ID);
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let mut store = AppStore::open(MemoryStore::new());
        assert_eq!(
            store.set_language("xx"),
            Err(StoreError::UnsupportedLanguage("xx".to_string()))
        );
        assert_eq!(store.language(), DEFAULT_LANGUAGE);
    }
}
