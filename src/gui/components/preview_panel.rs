use eframe::egui;

use crate::constants::studio::DOWNLOAD_RESOLUTIONS;
use crate::gui::constants::*;
use crate::i18n::Translator;
use crate::style::Extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    None,
    Download { extension: Extension, size: u32 },
    Save,
    Reset,
}

pub struct PreviewPanel {
    resolution: u32,
    extension: Extension,
    show_reset_confirm: bool,
}

impl PreviewPanel {
    pub fn new(resolution: u32, extension: Extension) -> Self {
        Self {
            resolution,
            extension,
            show_reset_confirm: false,
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        tr: &Translator,
        texture: Option<&egui::TextureHandle>,
    ) -> PreviewAction {
        let mut action = PreviewAction::None;

        ui.heading(tr.t("preview.title"));
        ui.add_space(SECTION_SPACING);

        ui.vertical_centered(|ui| match texture {
            Some(texture) => {
                let side = texture.size_vec2().x.min(PREVIEW_MAX_SIDE);
                ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(side, side)));
            }
            None => {
                ui.spinner();
            }
        });

        ui.add_space(SECTION_SPACING);

        ui.group(|ui| {
            egui::Grid::new("export_settings")
                .num_columns(2)
                .spacing([PADDING, PADDING])
                .show(ui, |ui| {
                    ui.label(tr.t("preview.resolution"));
                    egui::ComboBox::from_id_salt("export_resolution")
                        .selected_text(format!("{0} x {0}", self.resolution))
                        .show_ui(ui, |ui| {
                            for size in DOWNLOAD_RESOLUTIONS {
                                ui.selectable_value(&mut self.resolution, size, format!("{size} x {size}"));
                            }
                        });
                    ui.end_row();

                    ui.label(tr.t("preview.format"));
                    egui::ComboBox::from_id_salt("export_format")
                        .selected_text(self.extension.as_str().to_uppercase())
                        .show_ui(ui, |ui| {
                            for extension in Extension::ALL {
                                ui.selectable_value(
                                    &mut self.extension,
                                    extension,
                                    extension.as_str().to_uppercase(),
                                );
                            }
                        });
                    ui.end_row();
                });

            ui.add_space(ITEM_SPACING);

            ui.horizontal(|ui| {
                if ui.button(format!("⬇ {}", tr.t("preview.download_button"))).clicked() {
                    action = PreviewAction::Download {
                        extension: self.extension,
                        size: self.resolution,
                    };
                }
                if ui.button(format!("💾 {}", tr.t("preview.save_button"))).clicked() {
                    action = PreviewAction::Save;
                }
                if ui
                    .button(egui::RichText::new(tr.t("preview.reset_button")).color(DANGER))
                    .clicked()
                {
                    self.show_reset_confirm = true;
                }
            });
        });

        if self.show_reset_confirm && self.reset_confirm_dialog(ui.ctx(), tr) {
            action = PreviewAction::Reset;
        }

        action
    }

    /// True once the user confirms
    fn reset_confirm_dialog(&mut self, ctx: &egui::Context, tr: &Translator) -> bool {
        let mut confirmed = false;

        egui::Window::new(tr.t("studio.reset_modal.title"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(tr.t("studio.reset_modal.body"));
                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui
                        .button(egui::RichText::new(tr.t("modal.confirm.reset_button")).color(DANGER))
                        .clicked()
                    {
                        confirmed = true;
                        self.show_reset_confirm = false;
                    }
                    if ui.button(tr.t("modal.confirm.cancel_button")).clicked() {
                        self.show_reset_confirm = false;
                    }
                });
            });

        confirmed
    }
}
