use eframe::egui;

use crate::constants::folders::DEFAULT_FOLDER_ID;
use crate::gui::constants::*;
use crate::i18n::Translator;
use crate::persistence::KeyValueStore;
use crate::store::AppStore;
use crate::types::Folder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileManagerAction {
    None,
    AddFolder(String),
    DeleteFolder(String),
    SaveProject { name: String, folder_id: String },
    LoadProject(String),
    DeleteProject(String),
}

#[derive(Debug, Clone)]
enum PendingDelete {
    Folder { id: String, name: String },
    Project { id: String, name: String },
}

pub struct FileManager {
    active_folder_id: String,
    new_folder_name: String,
    project_name: String,
    pending_delete: Option<PendingDelete>,
}

/// Name shown for a folder; the default folder uses the localized label
pub fn folder_display_name(tr: &Translator, folder: &Folder) -> String {
    if folder.id == DEFAULT_FOLDER_ID {
        tr.t("fileManager.default_folder_name")
    } else {
        folder.name.clone()
    }
}

impl FileManager {
    pub fn new() -> Self {
        Self {
            active_folder_id: DEFAULT_FOLDER_ID.to_string(),
            new_folder_name: String::new(),
            project_name: String::new(),
            pending_delete: None,
        }
    }

    pub fn clear_new_folder_name(&mut self) {
        self.new_folder_name.clear();
    }

    pub fn clear_project_name(&mut self) {
        self.project_name.clear();
    }

    pub fn select_folder(&mut self, id: &str) {
        self.active_folder_id = id.to_string();
    }

    /// Draw the manager window; `open` is cleared when the user closes it
    pub fn show<B: KeyValueStore>(
        &mut self,
        ctx: &egui::Context,
        open: &mut bool,
        tr: &Translator,
        store: &AppStore<B>,
    ) -> FileManagerAction {
        let mut action = FileManagerAction::None;

        if store.folder(&self.active_folder_id).is_none() {
            self.active_folder_id = DEFAULT_FOLDER_ID.to_string();
        }

        egui::Window::new(tr.t("fileManager.title"))
            .id(egui::Id::new("file_manager"))
            .open(open)
            .collapsible(false)
            .resizable(true)
            .default_size([FILE_MANAGER_WIDTH, FILE_MANAGER_HEIGHT])
            .show(ctx, |ui| {
                ui.horizontal_top(|ui| {
                    ui.vertical(|ui| {
                        ui.set_width(FOLDER_COLUMN_WIDTH);
                        if let Some(folder_action) = self.folder_column(ui, tr, store) {
                            action = folder_action;
                        }
                    });

                    ui.separator();

                    ui.vertical(|ui| {
                        if let Some(project_action) = self.project_column(ui, tr, store) {
                            action = project_action;
                        }
                    });
                });
            });

        if self.pending_delete.is_some() {
            if let Some(confirmed) = self.delete_confirm_dialog(ctx, tr) {
                action = confirmed;
            }
        }

        action
    }

    fn folder_column<B: KeyValueStore>(
        &mut self,
        ui: &mut egui::Ui,
        tr: &Translator,
        store: &AppStore<B>,
    ) -> Option<FileManagerAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.new_folder_name)
                    .hint_text(tr.t("fileManager.new_folder_placeholder"))
                    .desired_width(FOLDER_COLUMN_WIDTH - 40.0),
            );
            if ui.button("➕").clicked() && !self.new_folder_name.trim().is_empty() {
                action = Some(FileManagerAction::AddFolder(self.new_folder_name.clone()));
            }
        });

        ui.add_space(ITEM_SPACING);

        egui::ScrollArea::vertical()
            .id_salt("folder_list")
            .show(ui, |ui| {
                for folder in store.folders() {
                    let name = folder_display_name(tr, folder);
                    ui.horizontal(|ui| {
                        let selected = folder.id == self.active_folder_id;
                        if ui.selectable_label(selected, format!("📁 {name}")).clicked() {
                            self.active_folder_id = folder.id.clone();
                        }

                        if folder.id == DEFAULT_FOLDER_ID {
                            ui.add_enabled(false, egui::Button::new("🗑"))
                                .on_disabled_hover_text(tr.t("fileManager.folder.cannot_delete_default"));
                        } else if ui.button(egui::RichText::new("🗑").color(DANGER)).clicked() {
                            self.pending_delete = Some(PendingDelete::Folder {
                                id: folder.id.clone(),
                                name: name.clone(),
                            });
                        }
                    });
                }
            });

        action
    }

    fn project_column<B: KeyValueStore>(
        &mut self,
        ui: &mut egui::Ui,
        tr: &Translator,
        store: &AppStore<B>,
    ) -> Option<FileManagerAction> {
        let mut action = None;

        let folder_name = store
            .folder(&self.active_folder_id)
            .map(|folder| folder_display_name(tr, folder))
            .unwrap_or_default();

        ui.group(|ui| {
            ui.label(egui::RichText::new(tr.t("fileManager.save_prompt.title")).strong());
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.project_name)
                        .hint_text(tr.t("fileManager.save_prompt.placeholder")),
                );
                if ui.button(tr.t("fileManager.save_prompt.button")).clicked() {
                    action = Some(FileManagerAction::SaveProject {
                        name: self.project_name.clone(),
                        folder_id: self.active_folder_id.clone(),
                    });
                }
            });
        });

        ui.add_space(SECTION_SPACING);
        ui.heading(tr.translate("fileManager.folder_title", &[("name", &folder_name)]));
        ui.add_space(ITEM_SPACING);

        let projects = store.projects_in_folder(&self.active_folder_id);
        if projects.is_empty() {
            ui.label(egui::RichText::new(tr.t("fileManager.empty_folder.title")).strong());
            ui.weak(tr.t("fileManager.empty_folder.body"));
            return action;
        }

        egui::ScrollArea::vertical()
            .id_salt("project_list")
            .show(ui, |ui| {
                for project in projects {
                    ui.group(|ui| {
                        ui.set_width(ui.available_width());
                        ui.label(egui::RichText::new(&project.name).strong());
                        ui.small(format!(
                            "{}: {}",
                            tr.t("fileManager.project.type"),
                            tr.t(&format!("qrType.{}", project.content.qr_type()))
                        ));
                        ui.small(format!(
                            "{}: {}",
                            tr.t("fileManager.project.created"),
                            project.created_at.format("%Y-%m-%d %H:%M")
                        ));
                        ui.horizontal(|ui| {
                            if ui.button(tr.t("fileManager.project.load")).clicked() {
                                action = Some(FileManagerAction::LoadProject(project.id.clone()));
                            }
                            if ui.button(egui::RichText::new("🗑").color(DANGER)).clicked() {
                                self.pending_delete = Some(PendingDelete::Project {
                                    id: project.id.clone(),
                                    name: project.name.clone(),
                                });
                            }
                        });
                    });
                    ui.add_space(ITEM_SPACING);
                }
            });

        action
    }

    fn delete_confirm_dialog(&mut self, ctx: &egui::Context, tr: &Translator) -> Option<FileManagerAction> {
        let (message, confirmed) = match self.pending_delete.as_ref()? {
            PendingDelete::Folder { id, name } => (
                tr.translate("fileManager.confirm_delete_folder", &[("name", name)]),
                FileManagerAction::DeleteFolder(id.clone()),
            ),
            PendingDelete::Project { id, name } => (
                tr.translate("fileManager.project.confirm_delete", &[("name", name)]),
                FileManagerAction::DeleteProject(id.clone()),
            ),
        };

        let mut action = None;
        egui::Window::new(tr.t("modal.confirm.default_button"))
            .id(egui::Id::new("file_manager_confirm"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui
                        .button(egui::RichText::new(tr.t("modal.confirm.default_button")).color(DANGER))
                        .clicked()
                    {
                        action = Some(confirmed);
                        self.pending_delete = None;
                    }
                    if ui.button(tr.t("modal.confirm.cancel_button")).clicked() {
                        self.pending_delete = None;
                    }
                });
            });

        action
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}
