use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::WalletError;
use crate::models::holding::{Holding, HoldingDeclaration};

/// What the ledger persists: the declarations (the configuration of
/// record) and the per-symbol holdings derived from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub declarations: Vec<HoldingDeclaration>,
    pub holdings: HashMap<String, Holding>,
}

/// Persistence boundary for the ledger. The store is the authoritative
/// record: mutations save synchronously before they report success, and
/// a failed save rolls the in-memory change back.
pub trait HoldingStore: Send + Sync {
    /// Load the persisted document. An absent backing record yields an
    /// empty document, not an error.
    fn load(&self) -> Result<LedgerDocument, WalletError>;

    /// Replace the persisted document.
    fn save(&self, document: &LedgerDocument) -> Result<(), WalletError>;
}

/// Plain JSON file store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl HoldingStore for JsonFileStore {
    fn load(&self) -> Result<LedgerDocument, WalletError> {
        if !self.path.exists() {
            return Ok(LedgerDocument::default());
        }
        let bytes = std::fs::read(&self.path)?;
        let document = serde_json::from_slice(&bytes)?;
        Ok(document)
    }

    fn save(&self, document: &LedgerDocument) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(document)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral wallets.
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<LedgerDocument>,
    /// When set, every `save` fails with an I/O error. Lets tests
    /// exercise the rollback-on-save-failure path.
    fail_saves: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: LedgerDocument) -> Self {
        Self {
            document: Mutex::new(document),
            fail_saves: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn document(&self) -> LedgerDocument {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl HoldingStore for MemoryStore {
    fn load(&self) -> Result<LedgerDocument, WalletError> {
        Ok(self.document())
    }

    fn save(&self, document: &LedgerDocument) -> Result<(), WalletError> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(WalletError::Io("simulated save failure".into()));
        }
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = document.clone();
        Ok(())
    }
}
