use eframe::egui;
use std::path::PathBuf;
use std::time::Instant;

use crate::color::HexColor;
use crate::constants::validation::{MAX_IMAGE_SIZE, MIN_IMAGE_SIZE};
use crate::gui::constants::*;
use crate::i18n::Translator;
use crate::payload::{QrContent, QrType, VCardData, WifiData, WifiEncryption};
use crate::studio::{RenderEngine, Studio};
use crate::style::{CornerDotType, CornerSquareType, DotType, ErrorCorrectionLevel, QrOptions};
use crate::types::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Type,
    Design,
    Templates,
}

/// Requests the options panel cannot fulfil on its own
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsAction {
    None,
    SaveTemplate(String),
    ApplyTemplate(String),
    DeleteTemplate(String),
    LoadLogo(PathBuf),
    RemoveLogo,
}

pub struct OptionsPanel {
    tab: Tab,
    template_name: String,
    logo_path: String,
}

impl OptionsPanel {
    pub fn new() -> Self {
        Self {
            tab: Tab::Type,
            template_name: String::new(),
            logo_path: String::new(),
        }
    }

    /// Template name field is cleared once the app has stored it
    pub fn clear_template_name(&mut self) {
        self.template_name.clear();
    }

    pub fn ui<E: RenderEngine>(
        &mut self,
        ui: &mut egui::Ui,
        tr: &Translator,
        studio: &mut Studio<E>,
        templates: &[Template],
    ) -> OptionsAction {
        let mut action = OptionsAction::None;

        ui.horizontal(|ui| {
            for (tab, key) in [
                (Tab::Type, "tabs.type"),
                (Tab::Design, "tabs.design"),
                (Tab::Templates, "tabs.templates"),
            ] {
                ui.selectable_value(&mut self.tab, tab, tr.t(key));
            }
        });
        ui.separator();
        ui.add_space(ITEM_SPACING);

        match self.tab {
            Tab::Type => type_tab(ui, tr, studio),
            Tab::Design => {
                let mut options = studio.options().clone();
                let (changed, design_action) = self.design_tab(ui, tr, &mut options);
                if changed {
                    studio.set_options(options, Instant::now());
                }
                action = design_action;
            }
            Tab::Templates => action = self.templates_tab(ui, tr, templates),
        }

        action
    }

    fn design_tab(
        &mut self,
        ui: &mut egui::Ui,
        tr: &Translator,
        options: &mut QrOptions,
    ) -> (bool, OptionsAction) {
        let mut changed = false;
        let mut action = OptionsAction::None;
        let style = &mut options.style;

        egui::CollapsingHeader::new(tr.t("design.accordion.colors"))
            .id_salt("design_colors")
            .default_open(true)
            .show(ui, |ui| {
                changed |= color_row(ui, &tr.t("design.colors.background"), &mut style.background_options.color);
                changed |= color_row(ui, &tr.t("design.colors.dots"), &mut style.dots_options.color);
                changed |= color_row(
                    ui,
                    &tr.t("design.colors.cornerSquare"),
                    &mut style.corners_square_options.color,
                );
                changed |= color_row(ui, &tr.t("design.colors.cornerDot"), &mut style.corners_dot_options.color);
            });

        egui::CollapsingHeader::new(tr.t("design.accordion.shapes"))
            .id_salt("design_shapes")
            .show(ui, |ui| {
                let dot_label = |kind: DotType| tr.t(&format!("dot_style.{}", kind.key()));
                let square_label = |kind: CornerSquareType| tr.t(&format!("corner_square_style.{}", kind.key()));
                let corner_dot_label = |kind: CornerDotType| tr.t(&format!("corner_dot_style.{}", kind.key()));

                ui.label(tr.t("design.shapes.dotStyle"));
                egui::ComboBox::from_id_salt("dot_style")
                    .selected_text(dot_label(style.dots_options.kind))
                    .show_ui(ui, |ui| {
                        for kind in DotType::ALL {
                            changed |= ui
                                .selectable_value(&mut style.dots_options.kind, kind, dot_label(kind))
                                .changed();
                        }
                    });

                // Unset corner shapes follow the dot shape
                let dots = style.dots_options.kind;
                ui.label(tr.t("design.shapes.cornerSquareStyle"));
                egui::ComboBox::from_id_salt("corner_square_style")
                    .selected_text(
                        style
                            .corners_square_options
                            .kind
                            .map(square_label)
                            .unwrap_or_else(|| dot_label(dots)),
                    )
                    .show_ui(ui, |ui| {
                        for kind in CornerSquareType::ALL {
                            changed |= ui
                                .selectable_value(&mut style.corners_square_options.kind, Some(kind), square_label(kind))
                                .changed();
                        }
                    });

                ui.label(tr.t("design.shapes.cornerDotStyle"));
                egui::ComboBox::from_id_salt("corner_dot_style")
                    .selected_text(
                        style
                            .corners_dot_options
                            .kind
                            .map(corner_dot_label)
                            .unwrap_or_else(|| dot_label(dots)),
                    )
                    .show_ui(ui, |ui| {
                        for kind in CornerDotType::ALL {
                            changed |= ui
                                .selectable_value(&mut style.corners_dot_options.kind, Some(kind), corner_dot_label(kind))
                                .changed();
                        }
                    });
            });

        egui::CollapsingHeader::new(tr.t("design.accordion.logo"))
            .id_salt("design_logo")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.logo_path)
                            .hint_text("/path/to/logo.png")
                            .desired_width(200.0),
                    );
                    let upload_key = if style.image.is_some() {
                        "design.logo.change"
                    } else {
                        "design.logo.upload"
                    };
                    if ui.button(tr.t(upload_key)).clicked() && !self.logo_path.trim().is_empty() {
                        action = OptionsAction::LoadLogo(PathBuf::from(self.logo_path.trim()));
                    }
                });

                if style.image.is_some() {
                    if ui
                        .button(egui::RichText::new(tr.t("design.logo.remove")).color(DANGER))
                        .clicked()
                    {
                        action = OptionsAction::RemoveLogo;
                    }

                    ui.add_space(ITEM_SPACING);
                    ui.label(tr.t("design.logo.size"));
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut style.image_options.image_size, MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE)
                                .step_by(LOGO_SIZE_STEP),
                        )
                        .changed();

                    ui.label(tr.t("design.logo.margin"));
                    changed |= ui
                        .add(egui::Slider::new(&mut style.image_options.margin, 0..=LOGO_MARGIN_MAX))
                        .changed();

                    changed |= ui
                        .checkbox(&mut style.image_options.hide_background_dots, tr.t("design.logo.hideDots"))
                        .changed();
                }
            });

        egui::CollapsingHeader::new(tr.t("design.accordion.advanced"))
            .id_salt("design_advanced")
            .show(ui, |ui| {
                ui.label(tr.t("design.advanced.margin"));
                changed |= ui
                    .add(egui::Slider::new(&mut style.margin, 0..=MARGIN_MAX).step_by(MARGIN_STEP))
                    .changed();

                ui.add_space(ITEM_SPACING);
                ui.label(tr.t("design.advanced.errorCorrection"));
                let level = &mut style.qr_options.error_correction_level;
                let level_label = |level: ErrorCorrectionLevel| tr.t(&format!("ecl.{level}"));
                egui::ComboBox::from_id_salt("error_correction")
                    .selected_text(level_label(*level))
                    .show_ui(ui, |ui| {
                        for candidate in ErrorCorrectionLevel::ALL {
                            changed |= ui.selectable_value(level, candidate, level_label(candidate)).changed();
                        }
                    });
                ui.small(tr.t(&format!("ecl.{level}.desc")));
            });

        (changed, action)
    }

    fn templates_tab(&mut self, ui: &mut egui::Ui, tr: &Translator, templates: &[Template]) -> OptionsAction {
        let mut action = OptionsAction::None;

        ui.group(|ui| {
            ui.label(egui::RichText::new(tr.t("templates.save.title")).strong());
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.template_name)
                        .hint_text(tr.t("templates.save.placeholder")),
                );
                if ui.button(tr.t("templates.save.button")).clicked() {
                    action = OptionsAction::SaveTemplate(self.template_name.clone());
                }
            });
        });

        ui.add_space(SECTION_SPACING);
        ui.label(egui::RichText::new(tr.t("templates.saved.title")).strong());
        ui.add_space(ITEM_SPACING);

        if templates.is_empty() {
            ui.weak(tr.t("templates.saved.empty"));
            return action;
        }

        for template in templates {
            ui.horizontal(|ui| {
                ui.label(&template.name);
                if ui.button(tr.t("templates.saved.apply")).clicked() {
                    action = OptionsAction::ApplyTemplate(template.id.clone());
                }
                if ui.button(egui::RichText::new("🗑").color(DANGER)).clicked() {
                    action = OptionsAction::DeleteTemplate(template.id.clone());
                }
            });
        }

        action
    }
}

impl Default for OptionsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn type_tab<E: RenderEngine>(ui: &mut egui::Ui, tr: &Translator, studio: &mut Studio<E>) {
    ui.label(egui::RichText::new(tr.t("typePanel.title")).strong());
    ui.add_space(ITEM_SPACING);

    let current = studio.qr_type();
    ui.horizontal_wrapped(|ui| {
        for qr_type in QrType::ALL {
            let label = tr.t(&format!("qrType.{qr_type}"));
            if ui.selectable_label(current == qr_type, label).clicked() {
                studio.set_qr_type(qr_type, Instant::now());
            }
        }
    });

    ui.add_space(SECTION_SPACING);

    let mut content = studio.content().clone();
    let changed = match &mut content {
        QrContent::Url(url) => {
            ui.label(tr.t("form.url.label"));
            ui.add(egui::TextEdit::singleline(url).hint_text(tr.t("form.url.placeholder")))
                .changed()
        }
        QrContent::Text(text) => {
            ui.label(tr.t("form.text.label"));
            ui.add(
                egui::TextEdit::multiline(text)
                    .hint_text(tr.t("form.text.placeholder"))
                    .desired_rows(5),
            )
            .changed()
        }
        QrContent::Vcard(card) => vcard_form(ui, tr, card),
        QrContent::Wifi(wifi) => wifi_form(ui, tr, wifi),
        QrContent::Pdf | QrContent::Social | QrContent::App => {
            let type_name = tr.t(&format!("qrType.{current}"));
            ui.group(|ui| {
                ui.label(egui::RichText::new(tr.t("comingSoon.title")).strong());
                ui.label(tr.translate("comingSoon.body", &[("type", &type_name)]));
            });
            false
        }
    };

    if changed {
        studio.set_content(content, Instant::now());
    }
}

fn vcard_form(ui: &mut egui::Ui, tr: &Translator, card: &mut VCardData) -> bool {
    let mut changed = false;
    ui.label(egui::RichText::new(tr.t("form.vcard.title")).strong());

    egui::Grid::new("vcard_form").num_columns(2).spacing([PADDING, PADDING]).show(ui, |ui| {
        for (key, value) in [
            ("form.vcard.firstName", &mut card.first_name),
            ("form.vcard.lastName", &mut card.last_name),
            ("form.vcard.phone", &mut card.phone),
            ("form.vcard.email", &mut card.email),
            ("form.vcard.company", &mut card.company),
            ("form.vcard.title_job", &mut card.title),
            ("form.vcard.website", &mut card.website),
            ("form.vcard.address", &mut card.address),
        ] {
            ui.label(tr.t(key));
            changed |= ui.text_edit_singleline(value).changed();
            ui.end_row();
        }
    });

    changed
}

fn wifi_form(ui: &mut egui::Ui, tr: &Translator, wifi: &mut WifiData) -> bool {
    let mut changed = false;
    ui.label(egui::RichText::new(tr.t("form.wifi.title")).strong());

    let encryption_label = |encryption: WifiEncryption| {
        tr.t(match encryption {
            WifiEncryption::Wpa => "form.wifi.encryption_wpa",
            WifiEncryption::Wep => "form.wifi.encryption_wep",
            WifiEncryption::NoPass => "form.wifi.encryption_none",
        })
    };

    egui::Grid::new("wifi_form").num_columns(2).spacing([PADDING, PADDING]).show(ui, |ui| {
        ui.label(tr.t("form.wifi.ssid"));
        changed |= ui.text_edit_singleline(&mut wifi.ssid).changed();
        ui.end_row();

        ui.label(tr.t("form.wifi.encryption"));
        egui::ComboBox::from_id_salt("wifi_encryption")
            .selected_text(encryption_label(wifi.encryption))
            .show_ui(ui, |ui| {
                for encryption in WifiEncryption::ALL {
                    changed |= ui
                        .selectable_value(&mut wifi.encryption, encryption, encryption_label(encryption))
                        .changed();
                }
            });
        ui.end_row();

        if wifi.encryption != WifiEncryption::NoPass {
            ui.label(tr.t("form.wifi.password"));
            let password = wifi.password.get_or_insert_with(String::new);
            changed |= ui.add(egui::TextEdit::singleline(password).password(true)).changed();
            ui.end_row();
        }
    });

    changed |= ui.checkbox(&mut wifi.hidden, tr.t("form.wifi.hidden")).changed();
    changed
}

/// Hex field plus picker; the picker only shows while the text parses
fn color_row(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        if ui
            .add(egui::TextEdit::singleline(value).desired_width(90.0))
            .changed()
        {
            changed = true;
        }
        if let Some(parsed) = HexColor::parse(value) {
            let mut color = parsed.to_egui();
            if ui.color_edit_button_srgba(&mut color).changed() {
                *value = HexColor::from_egui(color).to_hex_string();
                changed = true;
            }
        }
    });
    changed
}
