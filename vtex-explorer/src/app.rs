//! The main window: menu bar, document tabs, side panels and dialogs.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor},
    path::{Path, PathBuf},
    sync::Arc,
};

use common::prelude::StateInstance;
use vtex::vtf::VTF;

use crate::{
    browse::view::{BrowseAction, BrowseView},
    docs::{DocId, Document, DocumentRegistry},
    gui::{info::InfoPanel, resources::ResourcePanel, settings::SettingsPanel, viewer::ImageView},
    ops,
    options::Options,
    render::quad::QuadPipeline,
};

#[derive(PartialEq)]
enum LeftTab {
    Settings,
    FileSystem,
}

#[derive(PartialEq)]
enum RightTab {
    Info,
    Resources,
}

struct ImportDialog {
    paths: Vec<PathBuf>,
    minor: u32,
    mips: bool,
}

struct VersionDialog {
    files: Vec<PathBuf>,
    /// Set for batch conversions, so output mirrors the folder layout.
    base: Option<PathBuf>,
    minor: u32,
    custom_destination: bool,
    destination: Option<PathBuf>,
}

struct FoldersDialog {
    import_root: PathBuf,
    export_root: PathBuf,
    minor: u32,
    mips: bool,
}

pub struct App {
    docs: DocumentRegistry,
    viewer: ImageView,
    browse: BrowseView,
    options: Options,
    quad: Arc<QuadPipeline>,
    status: String,
    prev_active: Option<DocId>,
    left_tab: LeftTab,
    right_tab: RightTab,
    import_dialog: Option<ImportDialog>,
    version_dialog: Option<VersionDialog>,
    folders_dialog: Option<FoldersDialog>,
}

impl App {
    pub fn new(instance: &StateInstance, options: Options) -> Self {
        Self {
            docs: DocumentRegistry::new(),
            viewer: ImageView::new(),
            browse: BrowseView::new(),
            options,
            quad: Arc::new(QuadPipeline::new(instance)),
            status: "Ready".to_owned(),
            prev_active: None,
            left_tab: LeftTab::FileSystem,
            right_tab: RightTab::Info,
            import_dialog: None,
            version_dialog: None,
            folders_dialog: None,
        }
    }

    pub fn quad(&self) -> Arc<QuadPipeline> {
        self.quad.clone()
    }

    pub fn ui(&mut self, ctx: &egui::Context, instance: &StateInstance) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                self.file_menu(ui);
                self.tools_menu(ui);
                self.view_menu(ui);
            });
        });

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| self.tabs_ui(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::SidePanel::left("sidebar")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.left_tab, LeftTab::Settings, "Settings");
                    ui.selectable_value(&mut self.left_tab, LeftTab::FileSystem, "File System");
                });
                ui.separator();
                match self.left_tab {
                    LeftTab::Settings => {
                        let Self { docs, viewer, .. } = self;
                        SettingsPanel::ui(ui, viewer, docs.active_doc_mut());
                    }
                    LeftTab::FileSystem => {
                        let action = egui::ScrollArea::both()
                            .show(ui, |ui| self.browse.ui(ui))
                            .inner;
                        if let Some(action) = action {
                            self.handle_browse_action(action);
                        }
                    }
                }
            });

        egui::SidePanel::right("details")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.right_tab, RightTab::Info, "Info");
                    ui.selectable_value(&mut self.right_tab, RightTab::Resources, "Resources");
                });
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| match self.right_tab {
                    RightTab::Info => InfoPanel::ui(ui, self.docs.active_doc()),
                    RightTab::Resources => ResourcePanel::ui(ui, self.docs.active_doc()),
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Self {
                docs, viewer, quad, ..
            } = self;
            let active = docs.active().and_then(|id| docs.get(id).map(|doc| (id, doc)));
            viewer.ui(ui, active, instance, quad);
        });

        self.import_dialog_ui(ctx);
        self.version_dialog_ui(ctx);
        self.folders_dialog_ui(ctx);

        // rebind the viewer when the active tab changes
        if self.prev_active != self.docs.active() {
            self.prev_active = self.docs.active();
            self.viewer.reset_for(self.docs.active_doc());
        }
    }

    // --- documents ---

    pub fn open_vtf_path(&mut self, path: &Path) {
        let loaded = File::open(path)
            .map_err(vtex::error::VtexError::from)
            .and_then(|file| VTF::read(&mut BufReader::new(file)));

        match loaded {
            Ok(vtf) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "texture.vtf".to_owned());
                self.docs
                    .insert(Document::new(name, Some(path.to_owned()), vtf));
                self.options.remember(path);
                self.status = format!("Opened {}", path.display());
            }
            Err(e) => self.status = format!("Failed to open {}: {e}", path.display()),
        }
    }

    fn open_vtf_bytes(&mut self, name: String, bytes: Vec<u8>) {
        match VTF::read(&mut BufReader::new(Cursor::new(bytes))) {
            Ok(vtf) => {
                self.docs.insert(Document::new(name.clone(), None, vtf));
                self.status = format!("Opened {name}");
            }
            Err(e) => self.status = format!("Failed to open {name}: {e}"),
        }
    }

    fn handle_browse_action(&mut self, action: BrowseAction) {
        match action {
            BrowseAction::OpenVtfFile(path) => self.open_vtf_path(&path),
            BrowseAction::OpenVtfEntry { name, bytes } => self.open_vtf_bytes(name, bytes),
        }
    }

    fn tabs_ui(&mut self, ui: &mut egui::Ui) {
        if self.docs.is_empty() {
            ui.weak("No open textures");
            return;
        }

        let order: Vec<DocId> = self.docs.order().to_vec();
        let mut close = None;
        ui.horizontal_wrapped(|ui| {
            for id in order {
                let Some(doc) = self.docs.get(id) else {
                    continue;
                };
                let title = doc.title();
                let selected = self.docs.active() == Some(id);
                if ui.selectable_label(selected, title).clicked() {
                    self.docs.set_active(id);
                }
                if ui.small_button("✖").clicked() {
                    close = Some(id);
                }
                ui.separator();
            }
        });

        if let Some(id) = close {
            self.docs.close(id);
            self.viewer.invalidate(id);
        }
    }

    // --- menus ---

    fn file_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("File", |ui| {
            if ui.button("Open").clicked() {
                ui.close_menu();
                self.open_dialog();
            }
            if ui.button("Save").clicked() {
                ui.close_menu();
                self.save_active(false);
            }
            if ui.button("Save As...").clicked() {
                ui.close_menu();
                self.save_active(true);
            }
            if ui.button("Export").clicked() {
                ui.close_menu();
                self.export_active();
            }
            if ui.button("Import...").clicked() {
                ui.close_menu();
                self.import_files();
            }
        });
    }

    fn tools_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("Tools", |ui| {
            if ui.button("VTF Version Editor (Individual)").clicked() {
                ui.close_menu();
                let files = rfd::FileDialog::new()
                    .add_filter("VTF", &["vtf"])
                    .set_directory(self.options.last_dir())
                    .pick_files()
                    .unwrap_or_default();
                if !files.is_empty() {
                    self.options.remember(&files[0]);
                    self.version_dialog = Some(VersionDialog {
                        files,
                        base: None,
                        minor: 4,
                        custom_destination: false,
                        destination: None,
                    });
                }
            }
            if ui.button("VTF Version Editor (Batch)").clicked() {
                ui.close_menu();
                if let Some(dir) = rfd::FileDialog::new()
                    .set_directory(self.options.last_dir())
                    .pick_folder()
                {
                    self.options.remember(&dir);
                    let files = ops::walk_files(&dir, &["vtf"]);
                    if files.is_empty() {
                        self.status = format!("No VTF files under {}", dir.display());
                    } else {
                        self.version_dialog = Some(VersionDialog {
                            files,
                            base: Some(dir),
                            minor: 4,
                            custom_destination: false,
                            destination: None,
                        });
                    }
                }
            }
            if ui.button("Folders to VTF").clicked() {
                ui.close_menu();
                let import_root = rfd::FileDialog::new()
                    .set_title("Import From")
                    .set_directory(self.options.last_dir())
                    .pick_folder();
                let export_root = rfd::FileDialog::new()
                    .set_title("Export To")
                    .set_directory(self.options.last_dir())
                    .pick_folder();
                if let (Some(import_root), Some(export_root)) = (import_root, export_root) {
                    self.options.remember(&import_root);
                    self.options.remember(&export_root);
                    self.folders_dialog = Some(FoldersDialog {
                        import_root,
                        export_root,
                        minor: 4,
                        mips: true,
                    });
                }
            }
        });
    }

    fn view_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("View", |ui| {
            ui.checkbox(&mut self.viewer.red, "Red");
            ui.checkbox(&mut self.viewer.green, "Green");
            ui.checkbox(&mut self.viewer.blue, "Blue");
            ui.checkbox(&mut self.viewer.alpha, "Alpha");
        });
    }

    // --- file operations ---

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("VTF", &["vtf"])
            .set_directory(self.options.last_dir())
            .pick_file();
        if let Some(path) = picked {
            self.open_vtf_path(&path);
        }
    }

    fn save_active(&mut self, save_as: bool) {
        let Some(id) = self.docs.active() else {
            self.status = "Nothing to save".to_owned();
            return;
        };
        let existing = self.docs.get(id).and_then(|d| d.path.clone());

        let path = if save_as || existing.is_none() {
            rfd::FileDialog::new()
                .add_filter("VTF", &["vtf"])
                .set_directory(self.options.last_dir())
                .save_file()
        } else {
            existing
        };
        let Some(mut path) = path else {
            return;
        };
        if path.extension().map_or(true, |e| e != "vtf") {
            path.set_extension("vtf");
        }

        let written = self
            .docs
            .get(id)
            .ok_or_else(|| "document closed".to_owned())
            .and_then(|doc| {
                let file = File::create(&path).map_err(|e| e.to_string())?;
                doc.vtf
                    .write(&mut BufWriter::new(file))
                    .map_err(|e| e.to_string())
            });

        match written {
            Ok(()) => {
                if let Some(doc) = self.docs.get_mut(id) {
                    if let Some(name) = path.file_name() {
                        doc.name = name.to_string_lossy().into_owned();
                    }
                    doc.path = Some(path.clone());
                    doc.modified = false;
                }
                self.options.remember(&path);
                self.status = format!("Saved {}", path.display());
            }
            Err(e) => self.status = format!("Failed to save: {e}"),
        }
    }

    fn export_active(&mut self) {
        let Some(doc) = self.docs.active_doc() else {
            self.status = "Nothing to export".to_owned();
            return;
        };

        let picked = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "tga", "gif", "tif"])
            .set_directory(self.options.last_dir())
            .save_file();
        let Some(path) = picked else {
            return;
        };

        match ops::export::export_document(&doc.vtf, &path) {
            Ok(count) => {
                self.options.remember(&path);
                self.status = format!("Exported {count} image(s) to {}", path.display());
            }
            Err(e) => self.status = format!("Export failed: {e}"),
        }
    }

    fn import_files(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter(
                "Images and VTF",
                &["bmp", "gif", "tif", "jpg", "jpeg", "png", "tga", "hdr", "vtf"],
            )
            .set_directory(self.options.last_dir())
            .pick_files()
            .unwrap_or_default();
        if picked.is_empty() {
            return;
        }
        self.options.remember(&picked[0]);

        // vtf selections re-open directly; everything else goes through
        // the import options dialog
        let (vtfs, images): (Vec<_>, Vec<_>) = picked
            .into_iter()
            .partition(|p| p.extension().map_or(false, |e| e == "vtf"));
        for path in &vtfs {
            self.open_vtf_path(path);
        }
        if !images.is_empty() {
            self.import_dialog = Some(ImportDialog {
                paths: images,
                minor: 4,
                mips: true,
            });
        }
    }

    // --- dialogs ---

    fn import_dialog_ui(&mut self, ctx: &egui::Context) {
        let mut accepted = false;
        let mut cancelled = false;
        let mut open = self.import_dialog.is_some();
        if let Some(dialog) = &mut self.import_dialog {
            egui::Window::new("Import Images")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(format!("{} image(s) selected", dialog.paths.len()));
                    version_combo(ui, "import_version", &mut dialog.minor);
                    ui.checkbox(&mut dialog.mips, "Generate mipmaps");
                    ui.separator();
                    ui.horizontal(|ui| {
                        if ui.button("Import").clicked() {
                            accepted = true;
                        }
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                    });
                });
        }

        if accepted {
            if let Some(dialog) = self.import_dialog.take() {
                match ops::import::generate(&dialog.paths, dialog.minor, dialog.mips) {
                    Ok(vtf) => {
                        let name = ops::import::import_name(&dialog.paths);
                        self.docs.insert(Document::new(name.clone(), None, vtf));
                        self.status = format!("Imported {name}");
                    }
                    Err(e) => self.status = format!("Import failed: {e}"),
                }
            }
        } else if cancelled || !open {
            self.import_dialog = None;
        }
    }

    fn version_dialog_ui(&mut self, ctx: &egui::Context) {
        let mut accepted = false;
        let mut cancelled = false;
        let mut open = self.version_dialog.is_some();
        if let Some(dialog) = &mut self.version_dialog {
            egui::Window::new("VTF Version Editor")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(format!("{} file(s)", dialog.files.len()));
                    version_combo(ui, "convert_version", &mut dialog.minor);
                    ui.checkbox(&mut dialog.custom_destination, "Custom Destination");
                    if dialog.custom_destination {
                        ui.horizontal(|ui| {
                            let text = dialog
                                .destination
                                .as_ref()
                                .map(|p| p.display().to_string())
                                .unwrap_or_default();
                            ui.label(text);
                            if ui.button("Choose...").clicked() {
                                dialog.destination = rfd::FileDialog::new().pick_folder();
                            }
                        });
                    }
                    ui.separator();
                    ui.horizontal(|ui| {
                        if ui.button("Update Version").clicked() {
                            accepted = true;
                        }
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                    });
                });
        }

        if accepted {
            if let Some(dialog) = self.version_dialog.take() {
                if dialog.custom_destination && dialog.destination.is_none() {
                    self.status = "The destination is left empty, cancelling".to_owned();
                    return;
                }
                let base = dialog.base.clone().unwrap_or_default();
                let destination = if dialog.custom_destination {
                    dialog.destination.as_deref().map(|d| (d, base.as_path()))
                } else {
                    None
                };
                let summary = ops::version::run(&dialog.files, dialog.minor, destination);
                self.status = format!(
                    "Version update: {} converted, {} skipped, {} failed",
                    summary.converted, summary.skipped, summary.failed
                );
            }
        } else if cancelled || !open {
            self.version_dialog = None;
        }
    }

    fn folders_dialog_ui(&mut self, ctx: &egui::Context) {
        let mut accepted = false;
        let mut cancelled = false;
        let mut open = self.folders_dialog.is_some();
        if let Some(dialog) = &mut self.folders_dialog {
            egui::Window::new("Folders to VTF")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(format!("From: {}", dialog.import_root.display()));
                    ui.label(format!("To: {}", dialog.export_root.display()));
                    version_combo(ui, "folders_version", &mut dialog.minor);
                    ui.checkbox(&mut dialog.mips, "Generate mipmaps");
                    ui.separator();
                    ui.horizontal(|ui| {
                        if ui.button("Convert").clicked() {
                            accepted = true;
                        }
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                    });
                });
        }

        if accepted {
            if let Some(dialog) = self.folders_dialog.take() {
                let summary = ops::folders::run(
                    &dialog.import_root,
                    &dialog.export_root,
                    dialog.minor,
                    dialog.mips,
                );
                self.status = format!(
                    "Folders to VTF: {} written, {} failed",
                    summary.written, summary.failed
                );
            }
        } else if cancelled || !open {
            self.folders_dialog = None;
        }
    }
}

fn version_combo(ui: &mut egui::Ui, id: &str, minor: &mut u32) {
    egui::ComboBox::from_id_source(id)
        .selected_text(format!("7.{minor}"))
        .show_ui(ui, |ui| {
            for candidate in 0..=5 {
                ui.selectable_value(minor, candidate, format!("7.{candidate}"));
            }
        });
}
