//! INI-backed application options: recent paths and window behaviour.

use std::path::{Path, PathBuf};

use ini::Ini;

const MAX_RECENT: usize = 10;

pub struct Options {
    path: PathBuf,
    pub recent: Vec<String>,
    pub start_maximized: bool,
}

impl Options {
    pub fn load(path: PathBuf) -> Self {
        let mut options = Self {
            path,
            recent: Vec::new(),
            start_maximized: false,
        };

        let Ok(ini) = Ini::load_from_file(&options.path) else {
            return options;
        };

        if let Some(general) = ini.section(Some("general")) {
            options.start_maximized = general.get("start_maximized") == Some("true");
        }
        if let Some(recent) = ini.section(Some("recent")) {
            for (_, value) in recent.iter() {
                options.recent.push(value.to_owned());
            }
        }
        options
    }

    pub fn save(&self) {
        let mut ini = Ini::new();
        ini.with_section(Some("general"))
            .set("start_maximized", self.start_maximized.to_string());
        for (i, path) in self.recent.iter().enumerate() {
            ini.with_section(Some("recent"))
                .set(format!("path{i}"), path.clone());
        }
        if let Err(e) = ini.write_to_file(&self.path) {
            log::warn!("failed to save options: {e}");
        }
    }

    /// Directory to seed file dialogs with.
    pub fn last_dir(&self) -> PathBuf {
        self.recent
            .last()
            .map(|p| {
                let path = Path::new(p);
                if path.is_dir() {
                    path.to_owned()
                } else {
                    path.parent().map(Path::to_owned).unwrap_or_default()
                }
            })
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
    }

    /// Most recent paths go last; duplicates move to the back.
    pub fn remember(&mut self, path: &Path) {
        let entry = path.to_string_lossy().into_owned();
        self.recent.retain(|p| *p != entry);
        self.recent.push(entry);
        if self.recent.len() > MAX_RECENT {
            self.recent.remove(0);
        }
        self.save();
    }
}

#[cfg(test)]
mod options_tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let ini = tmp.path().join("vtex-explorer.ini");

        let mut options = Options::load(ini.clone());
        assert!(options.recent.is_empty());
        options.start_maximized = true;
        options.remember(Path::new("/tmp/a.vtf"));
        options.remember(Path::new("/tmp/b.vtf"));
        options.remember(Path::new("/tmp/a.vtf"));

        let options = Options::load(ini);
        assert!(options.start_maximized);
        assert_eq!(options.recent, vec!["/tmp/b.vtf", "/tmp/a.vtf"]);
    }
}
