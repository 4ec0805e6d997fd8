//! Open documents, keyed by id. Tabs hold ids, never pointers; closing a
//! tab drops the owned document.

use std::path::PathBuf;

use ahash::AHashMap;
use vtex::vtf::VTF;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocId(u64);

pub struct Document {
    pub name: String,
    pub path: Option<PathBuf>,
    pub vtf: VTF,
    pub modified: bool,
}

impl Document {
    pub fn new(name: String, path: Option<PathBuf>, vtf: VTF) -> Self {
        Self {
            name,
            path,
            vtf,
            modified: false,
        }
    }

    pub fn title(&self) -> String {
        if self.modified {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Default)]
pub struct DocumentRegistry {
    next: u64,
    docs: AHashMap<DocId, Document>,
    order: Vec<DocId>,
    active: Option<DocId>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, makes it active and returns its fresh id.
    pub fn insert(&mut self, doc: Document) -> DocId {
        let id = DocId(self.next);
        self.next += 1;
        self.docs.insert(id, doc);
        self.order.push(id);
        self.active = Some(id);
        id
    }

    /// Removes and drops the document. A neighbouring tab becomes active
    /// when the active one closes.
    pub fn close(&mut self, id: DocId) {
        let Some(pos) = self.order.iter().position(|&d| d == id) else {
            return;
        };
        self.order.remove(pos);
        self.docs.remove(&id);

        if self.active == Some(id) {
            self.active = self
                .order
                .get(pos.min(self.order.len().saturating_sub(1)))
                .copied();
        }
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(&id)
    }

    pub fn get_mut(&mut self, id: DocId) -> Option<&mut Document> {
        self.docs.get_mut(&id)
    }

    pub fn active(&self) -> Option<DocId> {
        self.active
    }

    pub fn set_active(&mut self, id: DocId) {
        if self.docs.contains_key(&id) {
            self.active = Some(id);
        }
    }

    pub fn active_doc(&self) -> Option<&Document> {
        self.active.and_then(|id| self.docs.get(&id))
    }

    pub fn active_doc_mut(&mut self) -> Option<&mut Document> {
        let id = self.active?;
        self.docs.get_mut(&id)
    }

    pub fn order(&self) -> &[DocId] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    fn doc(name: &str) -> Document {
        let vtf = VTF::from_rgba8(4, 4, vec![vec![0; 64]], false, 4).unwrap();
        Document::new(name.into(), None, vtf)
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut reg = DocumentRegistry::new();
        let a = reg.insert(doc("a"));
        reg.close(a);
        let b = reg.insert(doc("b"));
        assert_ne!(a, b);
        assert!(reg.get(a).is_none());
        assert!(reg.get(b).is_some());
    }

    #[test]
    fn test_closing_active_picks_neighbour() {
        let mut reg = DocumentRegistry::new();
        let a = reg.insert(doc("a"));
        let b = reg.insert(doc("b"));
        let c = reg.insert(doc("c"));
        assert_eq!(reg.active(), Some(c));

        reg.set_active(b);
        reg.close(b);
        assert_eq!(reg.active(), Some(c));
        reg.close(c);
        assert_eq!(reg.active(), Some(a));
        reg.close(a);
        assert_eq!(reg.active(), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_closing_inactive_keeps_active() {
        let mut reg = DocumentRegistry::new();
        let a = reg.insert(doc("a"));
        let b = reg.insert(doc("b"));
        reg.close(a);
        assert_eq!(reg.active(), Some(b));
        assert_eq!(reg.order(), &[b]);
    }
}
