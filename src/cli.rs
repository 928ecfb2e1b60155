//! Command-line interface
//!
//! Every subcommand except `gui` works on the same store the studio window
//! uses, so projects saved here show up in the file manager and vice versa.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::constants::folders::DEFAULT_FOLDER_ID;
use crate::constants::studio::DOWNLOAD_NAME;
use crate::i18n::{self, Translator};
use crate::payload::{self, QrContent, VCardData, WifiData, WifiEncryption};
use crate::persistence::KeyValueStore;
use crate::render::QrRenderer;
use crate::store::AppStore;
use crate::studio::Studio;
use crate::style::{Extension, StyleOptions};

#[derive(Debug, Parser)]
#[command(name = "qr-studio", version, about = "Design, save and export styled QR codes")]
pub struct Cli {
    /// Store folders, projects and templates here
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Read settings from this file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the studio window (default)
    Gui,
    /// Manage folders
    #[command(subcommand)]
    Folder(FolderCommand),
    /// Manage saved projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage style templates
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Print the text a QR code for this content would encode
    Payload {
        #[command(subcommand)]
        content: ContentArgs,
    },
    /// Show or change the display language
    Lang { code: Option<String> },
}

#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    List,
    Add { name: String },
    /// Delete a folder and every project in it
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List projects, newest first
    List {
        #[arg(long)]
        folder: Option<String>,
    },
    /// Print a project as JSON
    Show { id: String },
    Delete { id: String },
    Rename { id: String, name: String },
    /// Save content with the default style (or a template's) as a new project
    Save {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = DEFAULT_FOLDER_ID)]
        folder: String,
        /// Template id whose style to use
        #[arg(long)]
        template: Option<String>,
        #[command(subcommand)]
        content: ContentArgs,
    },
    /// Render a project to an image file
    Export {
        id: String,
        #[arg(long, value_enum)]
        format: Option<Extension>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(64..=4096))]
        size: Option<u32>,
        /// Output directory
        #[arg(long)]
        out: Option<PathBuf>,
        /// File name without extension
        #[arg(long, default_value = DOWNLOAD_NAME)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    List,
    /// Save a style as a template, from a project or the built-in default
    Add {
        name: String,
        #[arg(long)]
        from_project: Option<String>,
    },
    Delete { id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ContentArgs {
    Url { url: String },
    Text { text: String },
    Vcard {
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        website: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    Wifi {
        #[arg(long)]
        ssid: String,
        #[arg(long, value_enum, default_value_t = WifiEncryption::Wpa)]
        encryption: WifiEncryption,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        hidden: bool,
    },
}

impl From<ContentArgs> for QrContent {
    fn from(args: ContentArgs) -> Self {
        match args {
            ContentArgs::Url { url } => QrContent::Url(url),
            ContentArgs::Text { text } => QrContent::Text(text),
            ContentArgs::Vcard {
                first_name,
                last_name,
                phone,
                email,
                company,
                title,
                website,
                address,
            } => QrContent::Vcard(VCardData {
                first_name,
                last_name,
                phone,
                email,
                company,
                title,
                website,
                address,
            }),
            ContentArgs::Wifi {
                ssid,
                encryption,
                password,
                hidden,
            } => QrContent::Wifi(WifiData {
                ssid,
                encryption,
                password,
                hidden,
            }),
        }
    }
}

/// Shared state for running one non-GUI command
pub struct CommandRunner<'a, B: KeyValueStore> {
    pub config: &'a AppConfig,
    pub store: &'a mut AppStore<B>,
    pub translator: Translator,
}

impl<B: KeyValueStore> CommandRunner<'_, B> {
    fn t(&self, key: &str, replacements: &[(&str, &str)]) -> String {
        self.translator.translate(key, replacements)
    }

    fn studio(&self) -> Result<Studio<QrRenderer>> {
        Studio::open(Duration::from_millis(self.config.debounce_ms))
    }

    pub fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Gui => Ok(()),
            Command::Folder(command) => self.folder(command),
            Command::Project(command) => self.project(command),
            Command::Template(command) => self.template(command),
            Command::Payload { content } => {
                let content = QrContent::from(content);
                println!("{}", payload::format_payload(&content)?);
                Ok(())
            }
            Command::Lang { code } => self.lang(code),
        }
    }

    fn folder(&mut self, command: FolderCommand) -> Result<()> {
        match command {
            FolderCommand::List => {
                for folder in self.store.folders() {
                    let name = if folder.id == DEFAULT_FOLDER_ID {
                        self.t("fileManager.default_folder_name", &[])
                    } else {
                        folder.name.clone()
                    };
                    let count = self.store.projects_in_folder(&folder.id).len();
                    println!("{}\t{}\t{}", folder.id, name, count);
                }
            }
            FolderCommand::Add { name } => {
                let folder = self
                    .store
                    .add_folder(&name)
                    .ok_or_else(|| anyhow!(self.t("fileManager.alert.name_required", &[])))?;
                println!("{}", self.t("cli.folder_created", &[("name", &folder.name), ("id", &folder.id)]));
            }
            FolderCommand::Delete { id } => {
                if self.store.folder(&id).is_none() {
                    return Err(anyhow!(self.t("cli.folder_not_found", &[("id", &id)])));
                }
                let cascaded = self.store.delete_folder(&id).map_err(|e| match e {
                    crate::error::StoreError::ProtectedFolder(_) => {
                        anyhow!(self.t("fileManager.folder.cannot_delete_default", &[]))
                    }
                    other => anyhow!(other),
                })?;
                println!("{}", self.t("cli.folder_deleted", &[("count", &cascaded.to_string())]));
            }
        }
        Ok(())
    }

    fn project(&mut self, command: ProjectCommand) -> Result<()> {
        match command {
            ProjectCommand::List { folder } => {
                let folder_ids: Vec<String> = match folder {
                    Some(id) if self.store.folder(&id).is_none() => {
                        return Err(anyhow!(self.t("cli.folder_not_found", &[("id", &id)])));
                    }
                    Some(id) => vec![id],
                    None => self.store.folders().iter().map(|f| f.id.clone()).collect(),
                };
                for folder_id in folder_ids {
                    for project in self.store.projects_in_folder(&folder_id) {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            project.id,
                            project.name,
                            project.folder_id,
                            project.content.qr_type(),
                            project.created_at.to_rfc3339()
                        );
                    }
                }
            }
            ProjectCommand::Show { id } => {
                let project = self.find_project(&id)?;
                let json = serde_json::to_string_pretty(project).context("Failed to serialize project")?;
                println!("{json}");
            }
            ProjectCommand::Delete { id } => {
                if !self.store.delete_project(&id) {
                    return Err(anyhow!(self.t("cli.project_not_found", &[("id", &id)])));
                }
                println!("{}", self.t("cli.project_deleted", &[("id", &id)]));
            }
            ProjectCommand::Rename { id, name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(anyhow!(self.t("fileManager.alert.name_required", &[])));
                }
                let mut project = self.find_project(&id)?.clone();
                project.name = name.to_string();
                self.store.update_project(project);
                println!("{}", self.t("cli.project_renamed", &[("id", &id), ("name", name)]));
            }
            ProjectCommand::Save {
                name,
                folder,
                template,
                content,
            } => {
                let now = Instant::now();
                let mut studio = self.studio()?;
                studio.set_content(content.into(), now);
                if let Some(template_id) = template {
                    let template = self
                        .store
                        .template(&template_id)
                        .ok_or_else(|| anyhow!(self.t("cli.template_not_found", &[("id", &template_id)])))?
                        .clone();
                    studio.apply_template(&template, now);
                }
                let project = studio.save_to(&mut *self.store, &name, &folder)?;
                let folder_name = self
                    .store
                    .folder(&project.folder_id)
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                println!(
                    "{}",
                    self.t(
                        "fileManager.alert.project_saved",
                        &[("name", &project.name), ("folderName", &folder_name)]
                    )
                );
                println!("{}", project.id);
            }
            ProjectCommand::Export {
                id,
                format,
                size,
                out,
                name,
            } => {
                let project = self.find_project(&id)?.clone();
                let mut studio = self.studio()?;
                studio.load_project(&project, Instant::now());

                let format = format.unwrap_or(self.config.default_export_format);
                let size = size.unwrap_or(self.config.default_export_size);
                let dir = out.unwrap_or_else(|| self.config.resolved_export_dir());
                let path = studio.export(format, size, &dir, &name)?;
                println!("{}", self.t("cli.exported", &[("path", &path.display().to_string())]));
            }
        }
        Ok(())
    }

    fn template(&mut self, command: TemplateCommand) -> Result<()> {
        match command {
            TemplateCommand::List => {
                for template in self.store.templates() {
                    println!("{}\t{}", template.id, template.name);
                }
                if self.store.templates().is_empty() {
                    println!("{}", self.t("templates.saved.empty", &[]));
                }
            }
            TemplateCommand::Add { name, from_project } => {
                let style = match from_project {
                    Some(id) => self.find_project(&id)?.qr_options.style.clone(),
                    None => StyleOptions::default(),
                };
                let template = self
                    .store
                    .add_template(&name, style)
                    .map_err(|_| anyhow!(self.t("templates.alert.name_required", &[])))?;
                println!("{}", self.t("templates.alert.saved", &[("name", &template.name)]));
                println!("{}", template.id);
            }
            TemplateCommand::Delete { id } => {
                if !self.store.delete_template(&id) {
                    return Err(anyhow!(self.t("cli.template_not_found", &[("id", &id)])));
                }
                println!("{}", self.t("cli.template_deleted", &[("id", &id)]));
            }
        }
        Ok(())
    }

    fn lang(&mut self, code: Option<String>) -> Result<()> {
        let Some(code) = code else {
            let current = self.store.language().to_string();
            println!(
                "{}",
                self.t("cli.language_current", &[("lang", &current), ("name", i18n::display_name(&current))])
            );
            for (code, name) in i18n::LANGUAGES {
                println!("{code}\t{name}");
            }
            return Ok(());
        };

        self.store.set_language(&code)?;
        self.translator = i18n::load_for_store(&mut *self.store, self.config.locales_dir.as_deref());
        let loaded = self.translator.language().to_string();
        println!("{}", self.t("cli.language_set", &[("name", i18n::display_name(&loaded))]));
        Ok(())
    }

    fn find_project(&self, id: &str) -> Result<&crate::types::Project> {
        self.store
            .project(id)
            .ok_or_else(|| anyhow!(self.t("cli.project_not_found", &[("id", id)])))
    }
}
