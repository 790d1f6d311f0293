//! Persistence for the assignment set
//!
//! The engine treats the store as a single document that is loaded whole and
//! written whole, once per reconciliation.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::de::from_str;
use quick_xml::se::to_string;

use super::assignment::StoredAssignments;

/// Errors that can occur while loading or saving assignments
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
    #[error("Could not find config directory")]
    NoConfigDir,
}

/// Load/save of the persisted [`StoredAssignments`]
pub trait AssignmentStore {
    /// Load the persisted set; a store that was never written yields the default set
    fn load(&self) -> Result<StoredAssignments, StoreError>;

    /// Replace the persisted set
    fn save(&mut self, stored: &StoredAssignments) -> Result<(), StoreError>;
}

/// Hook observing every save
pub type SaveHook = Box<dyn FnMut(&StoredAssignments) + Send>;

/// Volatile store, used by the headless binary and tests
#[derive(Default)]
pub struct MemoryAssignmentStore {
    stored: Option<StoredAssignments>,
    saves: usize,
    on_save: Option<SaveHook>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously persisted set
    pub fn with_stored(stored: StoredAssignments) -> Self {
        Self {
            stored: Some(stored),
            ..Default::default()
        }
    }

    /// Call `hook` after every save
    pub fn on_save(mut self, hook: SaveHook) -> Self {
        self.on_save = Some(hook);
        self
    }

    pub fn stored(&self) -> Option<&StoredAssignments> {
        self.stored.as_ref()
    }

    /// Number of saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl AssignmentStore for MemoryAssignmentStore {
    fn load(&self) -> Result<StoredAssignments, StoreError> {
        Ok(self.stored.clone().unwrap_or_default())
    }

    fn save(&mut self, stored: &StoredAssignments) -> Result<(), StoreError> {
        self.stored = Some(stored.clone());
        self.saves += 1;
        if let Some(hook) = self.on_save.as_mut() {
            hook(stored);
        }
        Ok(())
    }
}

/// Store backed by an XML document on disk
#[derive(Debug, Clone)]
pub struct XmlAssignmentStore {
    path: PathBuf,
}

impl XmlAssignmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config location
    pub fn at_default_path() -> Result<Self, StoreError> {
        Self::default_path().map(Self::new).ok_or(StoreError::NoConfigDir)
    }

    /// Default location (e.g. ~/.config/StageDisplay/displays.xml on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("StageDisplay");
            p.push("displays.xml");
            p
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssignmentStore for XmlAssignmentStore {
    fn load(&self) -> Result<StoredAssignments, StoreError> {
        if !self.path.exists() {
            return Ok(StoredAssignments::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(from_str(&contents)?)
    }

    fn save(&mut self, stored: &StoredAssignments) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let xml = to_string(stored)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
        fs::write(&self.path, formatted)?;

        tracing::debug!(
            path = %self.path.display(),
            count = stored.count,
            "Saved output assignments"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::assignment::{auto_assign, LogicalRole};
    use crate::output::display::{Output, OutputBounds, OutputId};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("stage-display-test-{}", std::process::id()))
            .join(name)
    }

    fn sample() -> StoredAssignments {
        let outputs = vec![
            Output::new(OutputId(11), OutputBounds::new(0, 0, 1920, 1080)),
            Output::new(OutputId(12), OutputBounds::new(1920, 0, 1280, 720)),
            Output::new(OutputId(13), OutputBounds::new(-1024, 0, 1024, 768)),
            Output::new(OutputId(14), OutputBounds::new(3200, 0, 800, 600)),
        ];
        StoredAssignments::new(outputs.len(), auto_assign(&outputs))
    }

    #[test]
    fn test_memory_store_defaults_to_first_run() {
        let store = MemoryAssignmentStore::new();
        assert!(store.load().unwrap().is_first_run());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_xml_store_persists_roles() {
        let path = temp_path("persist.xml");
        let _ = fs::remove_file(&path);

        let mut store = XmlAssignmentStore::new(&path);
        assert!(store.load().unwrap().is_first_run());

        let stored = sample();
        store.save(&stored).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml"));
        assert!(written.contains("<StageDisplays>"));

        let loaded = XmlAssignmentStore::new(&path).load().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.assignments[3].role, LogicalRole::Other(1));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_xml_store_reports_corrupt_file() {
        let path = temp_path("corrupt.xml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "<StageDisplays><count>two</count>").unwrap();

        let result = XmlAssignmentStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::XmlParse(_))));

        let _ = fs::remove_file(&path);
    }
}
