//! Studio orchestration
//!
//! The studio owns the editable state (content plus style) and a render
//! engine. Edits never touch the engine directly: each one schedules an
//! update through a trailing-edge debouncer, and the host loop drives it with
//! `tick`. Reset is the one path that updates the engine immediately.

pub mod debounce;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::constants::studio::DEFAULT_DATA;
use crate::error::StoreError;
use crate::payload::{self, QrContent, QrType};
use crate::persistence::KeyValueStore;
use crate::store::AppStore;
use crate::style::{Extension, QrOptions, StyleOptions};
use crate::types::{NewProject, Project, Template};
use debounce::Debouncer;

/// Everything an engine needs to draw one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub data: String,
    pub options: QrOptions,
}

/// Rendering backend consumed by the studio
pub trait RenderEngine: Sized {
    fn construct(request: &RenderRequest) -> Result<Self>;
    fn update(&mut self, request: &RenderRequest) -> Result<()>;
    /// Write `<name>.<extension>` into `dir` and return its path
    fn download(&self, name: &str, extension: Extension, dir: &Path) -> Result<PathBuf>;
}

pub struct Studio<E: RenderEngine> {
    content: QrContent,
    options: QrOptions,
    engine: E,
    debouncer: Debouncer<RenderRequest>,
}

fn default_content() -> QrContent {
    QrContent::Url(DEFAULT_DATA.to_string())
}

impl<E: RenderEngine> Studio<E> {
    /// Start from the built-in default and construct the engine for it
    pub fn open(debounce_window: Duration) -> Result<Self> {
        let content = default_content();
        let options = QrOptions::default();
        let request = RenderRequest {
            data: derive_payload(&content),
            options: options.clone(),
        };
        let engine = E::construct(&request).context("Failed to construct render engine")?;

        Ok(Self {
            content,
            options,
            engine,
            debouncer: Debouncer::new(debounce_window),
        })
    }

    pub fn content(&self) -> &QrContent {
        &self.content
    }

    pub fn qr_type(&self) -> QrType {
        self.content.qr_type()
    }

    pub fn options(&self) -> &QrOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Payload for the current content; unsupported types yield an empty string
    pub fn payload(&self) -> String {
        derive_payload(&self.content)
    }

    /// Current state as the engine would receive it
    pub fn render_request(&self) -> RenderRequest {
        let data = self.payload();
        let mut options = self.options.clone();
        options.data = data.clone();
        RenderRequest { data, options }
    }

    /// Switch type and reset the form to the type's empty shape
    pub fn set_qr_type(&mut self, qr_type: QrType, now: Instant) {
        if qr_type == self.qr_type() {
            return;
        }
        self.content = qr_type.default_content();
        self.schedule(now);
    }

    pub fn set_content(&mut self, content: QrContent, now: Instant) {
        self.content = content;
        self.schedule(now);
    }

    pub fn set_options(&mut self, options: QrOptions, now: Instant) {
        self.options = options;
        self.schedule(now);
    }

    /// Mutate the options in place, then schedule an update
    pub fn edit_options(&mut self, now: Instant, edit: impl FnOnce(&mut QrOptions)) {
        edit(&mut self.options);
        self.schedule(now);
    }

    /// Merge a template's style over the current options, keeping size and payload
    pub fn apply_template(&mut self, template: &Template, now: Instant) {
        self.options.style = template.options.clone();
        info!(template = %template.name, "Template applied");
        self.schedule(now);
    }

    pub fn load_project(&mut self, project: &Project, now: Instant) {
        self.content = project.content.clone();
        self.options = project.qr_options.clone();
        info!(project = %project.name, id = %project.id, "Project loaded");
        self.schedule(now);
    }

    /// Restore the built-in default and redraw right away
    pub fn reset(&mut self) -> Result<()> {
        if self.debouncer.cancel().is_some() {
            debug!("Pending render update dropped by reset");
        }
        self.content = default_content();
        self.options = QrOptions::default();
        let request = self.render_request();
        self.engine.update(&request).context("Failed to update render engine")?;
        info!("Studio reset to defaults");
        Ok(())
    }

    /// Fire the pending update if its window has passed; true when one ran
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        let Some(request) = self.debouncer.poll(now) else {
            return Ok(false);
        };
        debug!(payload_len = request.data.len(), "Applying debounced render update");
        self.engine.update(&request).context("Failed to update render engine")?;
        Ok(true)
    }

    /// When the next update is due, for scheduling a wake-up
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Style part of the current options, for saving as a template
    pub fn style_snapshot(&self) -> StyleOptions {
        self.options.style.clone()
    }

    /// Project fields for the current state
    pub fn draft(&self, name: &str, folder_id: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            folder_id: folder_id.to_string(),
            content: self.content.clone(),
            qr_options: self.render_request().options,
        }
    }

    pub fn save_to<B: KeyValueStore>(
        &self,
        store: &mut AppStore<B>,
        name: &str,
        folder_id: &str,
    ) -> Result<Project, StoreError> {
        store.add_project(self.draft(name, folder_id))
    }

    /// Render the current state at `size` x `size` with a fresh engine and write it to `dir`
    pub fn export(&self, extension: Extension, size: u32, dir: &Path, name: &str) -> Result<PathBuf> {
        let current = self.render_request();
        let request = RenderRequest {
            data: current.data,
            options: current.options.with_size(size),
        };
        let engine = E::construct(&request)
            .with_context(|| format!("Failed to construct {size}px render engine"))?;
        let path = engine.download(name, extension, dir)?;
        info!(path = %path.display(), size, format = %extension, "QR code exported");
        Ok(path)
    }

    fn schedule(&mut self, now: Instant) {
        let request = self.render_request();
        debug!(qr_type = %self.qr_type(), "Render update scheduled");
        self.debouncer.push(request, now);
    }
}

fn derive_payload(content: &QrContent) -> String {
    match payload::format_payload(content) {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "Rendering empty payload");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::folders::DEFAULT_FOLDER_ID;
    use crate::constants::studio::DEBOUNCE_MS;
    use crate::payload::{WifiData, WifiEncryption};
    use crate::persistence::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Engine that records every request it is constructed or updated with
    #[derive(Debug)]
    struct RecordingEngine {
        constructed: RenderRequest,
        updates: Rc<RefCell<Vec<RenderRequest>>>,
    }

    thread_local! {
        static LOG: Rc<RefCell<Vec<RenderRequest>>> = Rc::new(RefCell::new(Vec::new()));
    }

    impl RenderEngine for RecordingEngine {
        fn construct(request: &RenderRequest) -> Result<Self> {
            Ok(Self {
                constructed: request.clone(),
                updates: LOG.with(|log| log.clone()),
            })
        }

        fn update(&mut self, request: &RenderRequest) -> Result<()> {
            self.updates.borrow_mut().push(request.clone());
            Ok(())
        }

        fn download(&self, name: &str, extension: Extension, dir: &Path) -> Result<PathBuf> {
            let path = dir.join(format!("{name}.{extension}"));
            std::fs::write(&path, format!("{}x{}", self.constructed.options.width, self.constructed.options.height))?;
            Ok(path)
        }
    }

    const WINDOW: Duration = Duration::from_millis(DEBOUNCE_MS);

    fn studio() -> (Studio<RecordingEngine>, Rc<RefCell<Vec<RenderRequest>>>) {
        let studio = Studio::<RecordingEngine>::open(WINDOW).unwrap();
        let updates = studio.engine().updates.clone();
        updates.borrow_mut().clear();
        (studio, updates)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_open_constructs_default() {
        let (studio, updates) = studio();
        assert_eq!(studio.engine().constructed.data, DEFAULT_DATA);
        assert_eq!(studio.engine().constructed.options, QrOptions::default());
        assert!(updates.borrow().is_empty());
        assert_eq!(studio.next_deadline(), None);
    }

    #[test]
    fn test_burst_of_edits_yields_one_update() {
        let (mut studio, updates) = studio();
        let start = Instant::now();
        let colors = ["#111111", "#222222", "#333333", "#444444", "#555555"];
        for (i, color) in colors.iter().enumerate() {
            let now = start + ms(i as u64 * 60);
            studio.edit_options(now, |o| o.style.dots_options.color = color.to_string());
            assert!(!studio.tick(now + ms(10)).unwrap());
        }
        assert!(updates.borrow().is_empty());

        let last_edit = start + ms(4 * 60);
        assert!(!studio.tick(last_edit + WINDOW - ms(1)).unwrap());
        assert!(studio.tick(last_edit + WINDOW).unwrap());
        assert!(!studio.tick(last_edit + WINDOW * 3).unwrap());

        let updates = updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].options.style.dots_options.color, "#555555");
    }

    #[test]
    fn test_set_qr_type_resets_content() {
        let (mut studio, updates) = studio();
        let now = Instant::now();
        studio.set_qr_type(QrType::Wifi, now);
        assert_eq!(
            studio.content(),
            &QrContent::Wifi(WifiData {
                ssid: String::new(),
                encryption: WifiEncryption::Wpa,
                password: Some(String::new()),
                hidden: false,
            })
        );

        studio.set_qr_type(QrType::Url, now + ms(10));
        assert_eq!(studio.payload(), "https://");
        studio.tick(now + ms(10) + WINDOW).unwrap();
        assert_eq!(updates.borrow().last().unwrap().data, "https://");
    }

    #[test]
    fn test_unsupported_type_renders_empty_payload() {
        let (mut studio, updates) = studio();
        let now = Instant::now();
        studio.set_qr_type(QrType::Pdf, now);
        assert_eq!(studio.payload(), "");
        studio.tick(now + WINDOW).unwrap();
        assert_eq!(updates.borrow()[0].data, "");
        assert_eq!(updates.borrow()[0].options.data, "");
    }

    #[test]
    fn test_reset_updates_immediately_and_cancels_pending() {
        let (mut studio, updates) = studio();
        let now = Instant::now();
        studio.set_content(QrContent::Text("draft".to_string()), now);
        studio.edit_options(now, |o| o.style.margin = 40);

        studio.reset().unwrap();
        assert_eq!(updates.borrow().len(), 1);
        assert_eq!(updates.borrow()[0].data, DEFAULT_DATA);
        assert_eq!(updates.borrow()[0].options.style, StyleOptions::default());
        assert_eq!(studio.next_deadline(), None);

        assert!(!studio.tick(now + WINDOW * 2).unwrap());
        assert_eq!(updates.borrow().len(), 1);
        assert_eq!(studio.content(), &QrContent::Url(DEFAULT_DATA.to_string()));
    }

    #[test]
    fn test_apply_template_keeps_size_and_content() {
        let (mut studio, _) = studio();
        let now = Instant::now();
        studio.set_content(QrContent::Text("keep me".to_string()), now);
        studio.edit_options(now, |o| o.width = 512);

        let mut style = StyleOptions::default();
        style.background_options.color = "#00ff00".to_string();
        let template = Template {
            id: "t".to_string(),
            name: "Green".to_string(),
            options: style.clone(),
        };
        studio.apply_template(&template, now);

        assert_eq!(studio.options().style, style);
        assert_eq!(studio.options().width, 512);
        assert_eq!(studio.payload(), "keep me");
    }

    #[test]
    fn test_save_and_load_project_round_trip() {
        let (mut studio, updates) = studio();
        let mut store = AppStore::open(MemoryStore::new());
        let now = Instant::now();
        studio.set_content(QrContent::Text("hello".to_string()), now);
        studio.edit_options(now, |o| o.style.dots_options.color = "#abcdef".to_string());

        let project = studio.save_to(&mut store, "Greeting", DEFAULT_FOLDER_ID).unwrap();
        assert_eq!(project.qr_options.data, "hello");

        studio.reset().unwrap();
        studio.load_project(&project, now + ms(5));
        assert_eq!(studio.content(), &project.content);
        assert_eq!(studio.options(), &project.qr_options);

        studio.tick(now + ms(5) + WINDOW).unwrap();
        let last = updates.borrow().last().cloned().unwrap();
        assert_eq!(last.data, "hello");
        assert_eq!(last.options.style.dots_options.color, "#abcdef");
    }

    #[test]
    fn test_save_rejects_empty_name() {
        let (studio, _) = studio();
        let mut store = AppStore::open(MemoryStore::new());
        assert!(studio.save_to(&mut store, "", DEFAULT_FOLDER_ID).is_err());
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_export_uses_fresh_engine_at_size() {
        let (studio, updates) = studio();
        let dir = tempfile::tempdir().unwrap();
        let path = studio.export(Extension::Png, 2048, dir.path(), "qr-code").unwrap();
        assert_eq!(path, dir.path().join("qr-code.png"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2048x2048");
        assert_eq!(studio.options().width, 300);
        assert!(updates.borrow().is_empty());
    }
}
