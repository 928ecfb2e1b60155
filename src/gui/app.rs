//! Studio window implemented with egui/eframe

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{error, info, warn};

use super::components::{
    FileManager, FileManagerAction, OptionsAction, OptionsPanel, PreviewAction, PreviewPanel,
};
use super::components::file_manager::folder_display_name;
use super::constants::*;
use crate::config::AppConfig;
use crate::constants::studio::DOWNLOAD_NAME;
use crate::error::StoreError;
use crate::i18n::{self, Translator};
use crate::persistence::KeyValueStore;
use crate::render::{QrRenderer, logo_data_url};
use crate::store::AppStore;
use crate::studio::Studio;

struct StatusMessage {
    text: String,
    color: egui::Color32,
}

struct StudioApp {
    config: AppConfig,
    store: AppStore<Box<dyn KeyValueStore>>,
    translator: Translator,
    studio: Studio<QrRenderer>,
    options_panel: OptionsPanel,
    preview_panel: PreviewPanel,
    file_manager: FileManager,
    texture: Option<(u64, egui::TextureHandle)>,
    show_file_manager: bool,
    status_message: Option<StatusMessage>,
}

impl StudioApp {
    fn new(
        _cc: &CreationContext<'_>,
        config: AppConfig,
        store: AppStore<Box<dyn KeyValueStore>>,
        translator: Translator,
        studio: Studio<QrRenderer>,
    ) -> Self {
        info!(language = %translator.language(), "Initializing studio window");
        let preview_panel = PreviewPanel::new(config.default_export_size, config.default_export_format);

        Self {
            config,
            store,
            translator,
            studio,
            options_panel: OptionsPanel::new(),
            preview_panel,
            file_manager: FileManager::new(),
            texture: None,
            show_file_manager: false,
            status_message: None,
        }
    }

    fn ok(&mut self, text: String) {
        self.status_message = Some(StatusMessage { text, color: STATUS_OK });
    }

    fn fail(&mut self, text: String) {
        self.status_message = Some(StatusMessage {
            text,
            color: STATUS_ERROR,
        });
    }

    /// Upload the engine's image when its revision moved
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let engine = self.studio.engine();
        let revision = engine.revision();
        if matches!(&self.texture, Some((current, _)) if *current == revision) {
            return;
        }

        let image = engine.image();
        let size = [image.width() as usize, image.height() as usize];
        let pixels = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());

        match &mut self.texture {
            Some((current, handle)) => {
                handle.set(pixels, egui::TextureOptions::NEAREST);
                *current = revision;
            }
            None => {
                let handle = ctx.load_texture(PREVIEW_TEXTURE, pixels, egui::TextureOptions::NEAREST);
                self.texture = Some((revision, handle));
            }
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(self.translator.t("header.title"));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(format!("📁 {}", self.translator.t("header.myProjects")))
                    .clicked()
                {
                    self.show_file_manager = true;
                }

                let mut language = self.translator.language().to_string();
                egui::ComboBox::from_id_salt("language_selector")
                    .selected_text(i18n::display_name(&language).to_string())
                    .show_ui(ui, |ui| {
                        for (code, name) in i18n::LANGUAGES {
                            ui.selectable_value(&mut language, code.to_string(), name);
                        }
                    });
                if language != self.translator.language() {
                    self.switch_language(&language);
                }
            });
        });
    }

    fn switch_language(&mut self, code: &str) {
        if let Err(err) = self.store.set_language(code) {
            warn!(error = %err, "Language change rejected");
            self.fail(err.to_string());
            return;
        }
        self.translator = i18n::load_for_store(&mut self.store, self.config.locales_dir.as_deref());
    }

    fn handle_options_action(&mut self, action: OptionsAction) {
        let tr = &self.translator;
        match action {
            OptionsAction::None => {}
            OptionsAction::SaveTemplate(name) => {
                match self.store.add_template(&name, self.studio.style_snapshot()) {
                    Ok(template) => {
                        let text = tr.translate("templates.alert.saved", &[("name", &template.name)]);
                        self.options_panel.clear_template_name();
                        self.ok(text);
                    }
                    Err(StoreError::EmptyName { .. }) => {
                        let text = tr.t("templates.alert.name_required");
                        self.fail(text);
                    }
                    Err(err) => self.fail(err.to_string()),
                }
            }
            OptionsAction::ApplyTemplate(id) => {
                let Some(template) = self.store.template(&id) else {
                    warn!(id = %id, "Apply requested for unknown template");
                    return;
                };
                self.studio.apply_template(template, Instant::now());
                let text = tr.translate("templates.alert.applied", &[("name", &template.name)]);
                self.ok(text);
            }
            OptionsAction::DeleteTemplate(id) => {
                self.store.delete_template(&id);
            }
            OptionsAction::LoadLogo(path) => match logo_data_url(&path) {
                Ok(url) => self.studio.edit_options(Instant::now(), |options| {
                    options.style.image = Some(url);
                }),
                Err(err) => {
                    error!(path = %path.display(), error = ?err, "Failed to load logo");
                    self.fail(format!("{err:#}"));
                }
            },
            OptionsAction::RemoveLogo => self.studio.edit_options(Instant::now(), |options| {
                options.style.image = None;
            }),
        }
    }

    fn handle_preview_action(&mut self, action: PreviewAction) {
        match action {
            PreviewAction::None => {}
            PreviewAction::Download { extension, size } => {
                let dir = self.config.resolved_export_dir();
                match self.studio.export(extension, size, &dir, DOWNLOAD_NAME) {
                    Ok(path) => {
                        let text = path.display().to_string();
                        self.ok(text);
                    }
                    Err(err) => {
                        error!(error = ?err, "Export failed");
                        self.fail(format!("{err:#}"));
                    }
                }
            }
            PreviewAction::Save => self.show_file_manager = true,
            PreviewAction::Reset => {
                if let Err(err) = self.studio.reset() {
                    error!(error = ?err, "Reset failed");
                    self.fail(format!("{err:#}"));
                }
            }
        }
    }

    fn handle_file_manager_action(&mut self, action: FileManagerAction) {
        let tr = &self.translator;
        match action {
            FileManagerAction::None => {}
            FileManagerAction::AddFolder(name) => {
                if let Some(folder) = self.store.add_folder(&name) {
                    self.file_manager.clear_new_folder_name();
                    self.file_manager.select_folder(&folder.id);
                }
            }
            FileManagerAction::DeleteFolder(id) => match self.store.delete_folder(&id) {
                Ok(_) => {}
                Err(StoreError::ProtectedFolder(_)) => {
                    let text = tr.t("fileManager.folder.cannot_delete_default");
                    self.fail(text);
                }
                Err(err) => self.fail(err.to_string()),
            },
            FileManagerAction::SaveProject { name, folder_id } => {
                if self.studio.payload().is_empty() {
                    let text = tr.t("fileManager.alert.no_qr");
                    self.fail(text);
                    return;
                }
                match self.studio.save_to(&mut self.store, &name, &folder_id) {
                    Ok(project) => {
                        let folder_name = self
                            .store
                            .folder(&project.folder_id)
                            .map(|folder| folder_display_name(tr, folder))
                            .unwrap_or_default();
                        let text = tr.translate(
                            "fileManager.alert.project_saved",
                            &[("name", &project.name), ("folderName", &folder_name)],
                        );
                        self.file_manager.clear_project_name();
                        self.ok(text);
                    }
                    Err(StoreError::EmptyName { .. }) => {
                        let text = tr.t("fileManager.alert.name_required");
                        self.fail(text);
                    }
                    Err(err) => self.fail(err.to_string()),
                }
            }
            FileManagerAction::LoadProject(id) => {
                let Some(project) = self.store.project(&id) else {
                    warn!(id = %id, "Load requested for unknown project");
                    return;
                };
                self.studio.load_project(project, Instant::now());
                let text = tr.translate("studio.project_loaded", &[("name", &project.name)]);
                self.show_file_manager = false;
                self.ok(text);
            }
            FileManagerAction::DeleteProject(id) => {
                self.store.delete_project(&id);
            }
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if let Err(err) = self.studio.tick(now) {
            error!(error = ?err, "Render update failed");
            self.fail(format!("{err:#}"));
        }
        self.sync_texture(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(PADDING);
            self.header(ui);
            ui.add_space(PADDING);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| match &self.status_message {
            Some(message) => {
                ui.colored_label(message.color, &message.text);
            }
            None => {
                let qr_type = self.translator.t(&format!("qrType.{}", self.studio.qr_type()));
                ui.colored_label(STATUS_INFO, qr_type);
            }
        });

        let mut options_action = OptionsAction::None;
        egui::SidePanel::left("options")
            .resizable(false)
            .exact_width(OPTIONS_PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.add_space(PADDING);
                    options_action =
                        self.options_panel
                            .ui(ui, &self.translator, &mut self.studio, self.store.templates());
                });
            });

        let mut preview_action = PreviewAction::None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(PADDING);
            let texture = self.texture.as_ref().map(|(_, handle)| handle);
            preview_action = self.preview_panel.ui(ui, &self.translator, texture);
        });

        let mut file_action = FileManagerAction::None;
        if self.show_file_manager {
            file_action = self.file_manager.show(
                ctx,
                &mut self.show_file_manager,
                &self.translator,
                &self.store,
            );
        }

        self.handle_options_action(options_action);
        self.handle_preview_action(preview_action);
        self.handle_file_manager_action(file_action);

        if let Some(deadline) = self.studio.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!(
            projects = self.store.projects().len(),
            templates = self.store.templates().len(),
            "Studio exiting"
        );
    }
}

pub fn run_gui(
    config: AppConfig,
    store: AppStore<Box<dyn KeyValueStore>>,
    translator: Translator,
) -> Result<()> {
    let studio = Studio::<QrRenderer>::open(Duration::from_millis(config.debounce_ms))?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_app_id(APP_ID)
            .with_title(translator.t("header.title")),
        ..Default::default()
    };

    eframe::run_native(
        APP_ID,
        options,
        Box::new(move |cc| Ok(Box::new(StudioApp::new(cc, config, store, translator, studio)))),
    )
    .map_err(|err| anyhow!("Failed to launch studio window: {err}"))
}
