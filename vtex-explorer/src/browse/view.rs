//! egui rendering for the browse tree. Population is triggered on the
//! closed-to-open transition of each collapsing header; the displayed
//! children are re-sorted after every expansion while the canonical order
//! stays untouched.

use std::path::PathBuf;

use ahash::AHashSet;

use super::{DisplayType, EntryTree, NodeId, NodeKind};

pub enum BrowseAction {
    OpenVtfFile(PathBuf),
    OpenVtfEntry { name: String, bytes: Vec<u8> },
}

pub struct BrowseView {
    tree: EntryTree,
    open: AHashSet<NodeId>,
}

fn icon(display: DisplayType) -> &'static str {
    match display {
        DisplayType::Folder => "📁",
        DisplayType::Vtf => "🖼",
        DisplayType::Vpk => "📦",
        DisplayType::Font => "🔤",
        DisplayType::Image => "🌄",
        DisplayType::None => "🗋",
    }
}

fn filesystem_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

impl BrowseView {
    pub fn new() -> Self {
        Self {
            tree: EntryTree::new(filesystem_root()),
            open: AHashSet::new(),
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) -> Option<BrowseAction> {
        let mut action = None;
        for child in self.tree.sorted_children(EntryTree::ROOT) {
            self.node_ui(ui, child, &mut action);
        }
        action
    }

    fn node_ui(&mut self, ui: &mut egui::Ui, id: NodeId, action: &mut Option<BrowseAction>) {
        let node = self.tree.node(id);
        let text = format!("{} {}", icon(node.display()), node.label());

        if self.tree.has_children(id) {
            let header = egui::CollapsingHeader::new(text)
                .id_source(id)
                .default_open(false)
                .show(ui, |ui| {
                    if self.open.insert(id) {
                        self.tree.populate(id);
                    }
                    if self.tree.row_count(id) == 0 {
                        ui.weak("empty");
                    }
                    for child in self.tree.sorted_children(id) {
                        self.node_ui(ui, child, action);
                    }
                });
            // collapsed nodes may retry a failed archive open on the next
            // expansion
            if header.body_response.is_none() {
                self.open.remove(&id);
            }
        } else {
            let response = ui.selectable_label(false, text);
            if response.double_clicked() {
                *action = self.activate(id);
            }
        }
    }

    /// Double-click on a leaf: texture files open as documents.
    fn activate(&self, id: NodeId) -> Option<BrowseAction> {
        let node = self.tree.node(id);
        match node.kind() {
            NodeKind::RegularFile if node.display() == DisplayType::Vtf => {
                Some(BrowseAction::OpenVtfFile(node.path().to_owned()))
            }
            NodeKind::VpkEntry => {
                let entry = node.entry_path()?;
                if !entry.ends_with(".vtf") {
                    return None;
                }
                let name = node.label().to_owned();
                let bytes = self.tree.read_entry_bytes(id)?;
                Some(BrowseAction::OpenVtfEntry { name, bytes })
            }
            _ => None,
        }
    }
}
