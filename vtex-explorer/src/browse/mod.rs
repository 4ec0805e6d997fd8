//! The browse tree: a lazily populated hierarchy over the filesystem and
//! any VPK archives found in it.

pub mod view;

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use ahash::AHashMap;
use vtex::prelude::*;

/// Raster formats the viewer can open directly.
pub const SUPPORTED_IMAGES: [&str; 8] = ["bmp", "gif", "tif", "jpg", "jpeg", "png", "tga", "hdr"];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    RegularFile,
    VpkFile,
    VpkEntry,
}

/// Icon hint derived from the file extension, orthogonal to [`NodeKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayType {
    Folder,
    Vtf,
    Vpk,
    Font,
    Image,
    None,
}

impl DisplayType {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "vtf" => DisplayType::Vtf,
            "vpk" => DisplayType::Vpk,
            "ttf" | "otf" => DisplayType::Font,
            _ if SUPPORTED_IMAGES.contains(&ext) => DisplayType::Image,
            _ => DisplayType::None,
        }
    }
}

fn is_allowed_extension(ext: &str) -> bool {
    matches!(ext, "vpk" | "vtf" | "ttf" | "otf") || SUPPORTED_IMAGES.contains(&ext)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

pub struct Node {
    label: String,
    path: PathBuf,
    kind: NodeKind,
    display: DisplayType,
    expandable: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pak: Option<VPKDirectory>,
    entry_path: Option<String>,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: PathBuf::new(),
            kind: NodeKind::RegularFile,
            display: DisplayType::None,
            expandable: false,
            parent: None,
            children: Vec::new(),
            pak: None,
            entry_path: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
    pub fn display(&self) -> DisplayType {
        self.display
    }
    pub fn is_expandable(&self) -> bool {
        self.expandable
    }
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
    /// Path relative to the owning archive, for `VpkEntry` nodes.
    pub fn entry_path(&self) -> Option<&str> {
        self.entry_path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }
    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }
    pub fn set_display(&mut self, display: DisplayType) {
        self.display = display;
    }
    pub fn set_expandable(&mut self, expandable: bool) {
        self.expandable = expandable;
    }
    pub fn set_entry_path(&mut self, entry: String) {
        self.entry_path = Some(entry);
    }
}

/// Arena-backed tree. The root is a synthetic "File System" node whose
/// first level is filled at construction; everything deeper fills on the
/// first expansion request.
pub struct EntryTree {
    nodes: Vec<Node>,
}

impl EntryTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(root_path: PathBuf) -> Self {
        let mut root = Node::new("File System");
        root.set_kind(NodeKind::Folder);
        root.set_display(DisplayType::Folder);
        root.set_path(root_path);
        root.set_expandable(true);

        let mut tree = Self { nodes: vec![root] };
        tree.populate(Self::ROOT);
        tree
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Transfers the node into the arena as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    // --- display-binding queries ---

    pub fn row_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].children.len()
    }

    pub fn column_count(&self) -> usize {
        1
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Child at `row` in insertion order.
    pub fn index(&self, row: usize, parent: NodeId) -> Option<NodeId> {
        self.nodes[parent.0].children.get(row).copied()
    }

    /// Position of this node within its parent, by identity search.
    /// The root reports 0.
    pub fn row_in_parent(&self, id: NodeId) -> usize {
        match self.nodes[id.0].parent {
            Some(parent) => self.nodes[parent.0]
                .children
                .iter()
                .position(|&c| c == id)
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Answers from the expandable flag before population so the view can
    /// draw an expand affordance without recursing into the whole tree.
    pub fn has_children(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        node.is_expandable() || node.child_count() > 0
    }

    /// Child ids reordered for display; canonical order stays untouched.
    pub fn sorted_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.nodes[id.0].children.clone();
        children.sort_by(|&a, &b| {
            let a = &self.nodes[a.0].label;
            let b = &self.nodes[b.0].label;
            a.to_lowercase().cmp(&b.to_lowercase())
        });
        children
    }

    // --- population ---

    /// Fills a node's children, once. Populated nodes are left alone, so
    /// calling this on every expansion notification is harmless.
    pub fn populate(&mut self, id: NodeId) {
        if self.nodes[id.0].child_count() > 0 {
            return;
        }

        match self.nodes[id.0].kind {
            NodeKind::VpkFile => self.populate_vpk(id),
            _ => self.populate_dir(id),
        }
    }

    fn populate_vpk(&mut self, id: NodeId) {
        if self.nodes[id.0].pak.is_none() {
            match VPKDirectory::load(self.nodes[id.0].path.clone()) {
                Ok(pak) => self.nodes[id.0].pak = Some(pak),
                Err(e) => {
                    // leave the node empty; a later expand retries the open
                    log::warn!("failed to open {:?}: {e}", self.nodes[id.0].path);
                    return;
                }
            }
        }

        // snapshot the listing so the arena can grow while we walk it
        let listing: Vec<(String, Vec<(String, String, DisplayType)>)> = {
            let pak = self.nodes[id.0].pak.as_ref().unwrap();
            pak.directories()
                .map(|(dir, entries)| {
                    let files = entries
                        .iter()
                        .filter(|e| is_allowed_extension(e.extension()))
                        .map(|e| {
                            (
                                e.filename().to_owned(),
                                e.path().to_owned(),
                                DisplayType::from_extension(e.extension()),
                            )
                        })
                        .collect();
                    (dir.to_owned(), files)
                })
                .collect()
        };

        // folders are deduplicated by full accumulated path, so sibling
        // folders sharing a name under different parents stay distinct
        let mut folders: AHashMap<String, NodeId> = AHashMap::new();

        for (dir, files) in listing {
            let mut current = id;
            if !dir.is_empty() {
                let mut accumulated = String::new();
                for segment in dir.split('/') {
                    accumulated.push_str(segment);
                    current = match folders.get(&accumulated) {
                        Some(&node) => node,
                        None => {
                            let mut folder = Node::new(segment);
                            folder.set_kind(NodeKind::Folder);
                            folder.set_display(DisplayType::Folder);
                            folder.set_expandable(true);
                            let node = self.append_child(current, folder);
                            folders.insert(accumulated.clone(), node);
                            node
                        }
                    };
                    accumulated.push('/');
                }
            }

            for (filename, entry_path, display) in files {
                let mut node = Node::new(filename);
                node.set_kind(NodeKind::VpkEntry);
                node.set_display(display);
                node.set_entry_path(entry_path);
                self.append_child(current, node);
            }
        }
    }

    fn populate_dir(&mut self, id: NodeId) {
        let path = self.nodes[id.0].path.clone();
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            // unreadable directories yield nothing
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let entry_path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir {
                // probe one level so empty folders get no expand affordance
                let expandable = fs::read_dir(&entry_path)
                    .map(|mut entries| entries.next().is_some())
                    .unwrap_or(false);

                let mut node = Node::new(name);
                node.set_kind(NodeKind::Folder);
                node.set_display(DisplayType::Folder);
                node.set_path(entry_path);
                node.set_expandable(expandable);
                self.append_child(id, node);
            } else {
                let Some(ext) = entry_path
                    .extension()
                    .map(|e| e.to_string_lossy().to_ascii_lowercase())
                else {
                    continue;
                };
                if !is_allowed_extension(&ext) {
                    continue;
                }

                let mut node = Node::new(name);
                node.set_display(DisplayType::from_extension(&ext));

                if ext == "vpk" {
                    // right extension but wrong magic means some unrelated
                    // file; drop it rather than choke on it at open time
                    if !has_vpk_signature(&entry_path) {
                        continue;
                    }
                    node.set_kind(NodeKind::VpkFile);
                    node.set_expandable(true);
                }

                node.set_path(entry_path);
                self.append_child(id, node);
            }
        }
    }

    // --- archive access ---

    /// Nearest ancestor holding the archive this entry lives in.
    pub fn vpk_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            if self.nodes[current.0].kind == NodeKind::VpkFile {
                return Some(current);
            }
            current = self.parent(current)?;
        }
    }

    /// Reads a `VpkEntry` node's bytes out of its archive.
    pub fn read_entry_bytes(&self, id: NodeId) -> Option<Vec<u8>> {
        let entry = self.nodes[id.0].entry_path.as_deref()?;
        let ancestor = self.vpk_ancestor(id)?;
        let pak = self.nodes[ancestor.0].pak.as_ref()?;
        match pak.read_entry(entry) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("failed to read {entry}: {e}");
                None
            }
        }
    }
}

fn has_vpk_signature(path: &Path) -> bool {
    let mut bytes = [0u8; 4];
    let read = fs::File::open(path).and_then(|mut f| f.read_exact(&mut bytes));
    read.is_ok() && u32::from_le_bytes(bytes) == VPK_SIGNATURE
}

#[cfg(test)]
mod tree_tests {
    use std::fs::File;
    use std::io::Write;

    use super::*;

    fn touch(dir: &Path, name: &str, contents: &[u8]) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(contents).unwrap();
    }

    /// Minimal valid v1 VPK with entries under a/b and a/c.
    fn vpk_bytes() -> Vec<u8> {
        fn cstr(out: &mut Vec<u8>, s: &str) {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        fn entry(out: &mut Vec<u8>, preload: &[u8]) {
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&(preload.len() as u16).to_le_bytes());
            out.extend_from_slice(&0x7fffu16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0xffffu16.to_le_bytes());
            out.extend_from_slice(preload);
        }

        let mut tree = Vec::new();
        cstr(&mut tree, "vtf");
        cstr(&mut tree, "a/b");
        cstr(&mut tree, "one");
        entry(&mut tree, b"one");
        cstr(&mut tree, "");
        cstr(&mut tree, "a/c");
        cstr(&mut tree, "two");
        entry(&mut tree, b"two");
        cstr(&mut tree, "three");
        entry(&mut tree, b"three");
        cstr(&mut tree, "");
        cstr(&mut tree, "");
        cstr(&mut tree, "");

        let mut out = Vec::new();
        out.extend_from_slice(&VPK_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(tree.len() as u32).to_le_bytes());
        out.extend_from_slice(&tree);
        out
    }

    #[test]
    fn test_allow_list_filter() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.vtf", b"xx");
        touch(tmp.path(), "b.png", b"xx");
        touch(tmp.path(), "c.txt", b"xx");
        touch(tmp.path(), "d.exe", b"xx");

        let tree = EntryTree::new(tmp.path().to_owned());
        assert_eq!(tree.row_count(EntryTree::ROOT), 2);
    }

    #[test]
    fn test_populate_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.vtf", b"xx");
        touch(tmp.path(), "b.tga", b"xx");

        let mut tree = EntryTree::new(tmp.path().to_owned());
        let first = tree.row_count(EntryTree::ROOT);
        tree.populate(EntryTree::ROOT);
        tree.populate(EntryTree::ROOT);
        assert_eq!(tree.row_count(EntryTree::ROOT), first);
    }

    #[test]
    fn test_magic_check_drops_fake_vpk() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.vtf", b"xx");
        touch(tmp.path(), "b.vpk", b"not a vpk at all");
        touch(tmp.path(), "c.txt", b"xx");

        let tree = EntryTree::new(tmp.path().to_owned());
        assert_eq!(tree.row_count(EntryTree::ROOT), 1);
        let only = tree.index(0, EntryTree::ROOT).unwrap();
        assert_eq!(tree.node(only).label(), "a.vtf");
        assert_eq!(tree.node(only).kind(), NodeKind::RegularFile);
        assert_eq!(tree.node(only).display(), DisplayType::Vtf);
    }

    #[test]
    fn test_real_vpk_becomes_expandable_archive_node() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "pack_dir.vpk", &vpk_bytes());

        let tree = EntryTree::new(tmp.path().to_owned());
        assert_eq!(tree.row_count(EntryTree::ROOT), 1);
        let vpk = tree.index(0, EntryTree::ROOT).unwrap();
        assert_eq!(tree.node(vpk).kind(), NodeKind::VpkFile);
        assert_eq!(tree.node(vpk).display(), DisplayType::Vpk);
        assert!(tree.has_children(vpk));
        // the affordance comes from the flag, not from population
        assert_eq!(tree.node(vpk).child_count(), 0);
    }

    #[test]
    fn test_vpk_population_dedups_shared_prefixes() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "pack_dir.vpk", &vpk_bytes());

        let mut tree = EntryTree::new(tmp.path().to_owned());
        let vpk = tree.index(0, EntryTree::ROOT).unwrap();
        tree.populate(vpk);

        // one "a" folder with "b" and "c" under it
        assert_eq!(tree.row_count(vpk), 1);
        let a = tree.index(0, vpk).unwrap();
        assert_eq!(tree.node(a).label(), "a");
        assert_eq!(tree.node(a).kind(), NodeKind::Folder);
        assert_eq!(tree.row_count(a), 2);

        let b = tree.index(0, a).unwrap();
        let c = tree.index(1, a).unwrap();
        assert_eq!(tree.node(b).label(), "b");
        assert_eq!(tree.node(c).label(), "c");
        assert_eq!(tree.row_count(b), 1);
        assert_eq!(tree.row_count(c), 2);

        let one = tree.index(0, b).unwrap();
        assert_eq!(tree.node(one).kind(), NodeKind::VpkEntry);
        assert_eq!(tree.node(one).entry_path(), Some("a/b/one.vtf"));
        assert_eq!(tree.node(one).display(), DisplayType::Vtf);
    }

    #[test]
    fn test_entry_bytes_read_through_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "pack_dir.vpk", &vpk_bytes());

        let mut tree = EntryTree::new(tmp.path().to_owned());
        let vpk = tree.index(0, EntryTree::ROOT).unwrap();
        tree.populate(vpk);

        let a = tree.index(0, vpk).unwrap();
        let b = tree.index(0, a).unwrap();
        let one = tree.index(0, b).unwrap();
        assert_eq!(tree.vpk_ancestor(one), Some(vpk));
        assert_eq!(tree.read_entry_bytes(one).unwrap(), b"one");
    }

    #[test]
    fn test_row_in_parent_matches_insertion_order() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["a.vtf", "b.vtf", "c.vtf", "d.vtf"] {
            touch(tmp.path(), name, b"xx");
        }

        let tree = EntryTree::new(tmp.path().to_owned());
        assert_eq!(tree.row_count(EntryTree::ROOT), 4);
        assert_eq!(tree.column_count(), 1);
        for row in 0..4 {
            let child = tree.index(row, EntryTree::ROOT).unwrap();
            assert_eq!(tree.row_in_parent(child), row);
            assert_eq!(tree.parent(child), Some(EntryTree::ROOT));
        }
        assert_eq!(tree.row_in_parent(EntryTree::ROOT), 0);
    }

    #[test]
    fn test_empty_subdir_not_expandable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();
        fs::create_dir(tmp.path().join("full")).unwrap();
        touch(&tmp.path().join("full"), "a.vtf", b"xx");

        let tree = EntryTree::new(tmp.path().to_owned());
        assert_eq!(tree.row_count(EntryTree::ROOT), 2);
        for row in 0..2 {
            let child = tree.index(row, EntryTree::ROOT).unwrap();
            let expect = tree.node(child).label() == "full";
            assert_eq!(tree.has_children(child), expect);
        }
    }

    #[test]
    fn test_sorted_children_leave_canonical_order_alone() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["zebra.vtf", "apple.vtf", "mango.vtf"] {
            touch(tmp.path(), name, b"xx");
        }

        let tree = EntryTree::new(tmp.path().to_owned());
        let sorted = tree.sorted_children(EntryTree::ROOT);
        let labels: Vec<_> = sorted.iter().map(|&id| tree.node(id).label()).collect();
        assert_eq!(labels, ["apple.vtf", "mango.vtf", "zebra.vtf"]);

        // canonical order still answers the model queries
        let canonical: Vec<_> = (0..3)
            .map(|row| tree.index(row, EntryTree::ROOT).unwrap())
            .collect();
        for (row, id) in canonical.iter().enumerate() {
            assert_eq!(tree.row_in_parent(*id), row);
        }
    }
}
