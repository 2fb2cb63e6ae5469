use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::RegistrationSnapshot;
use crate::infrastructure::traits::RegistrationStore;
use crate::infrastructure::{InfraError, InfraResult};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// In-memory registration store that counts every mutating call.
#[derive(Debug, Default)]
pub struct MemoryRegistrationStore {
    entries: Mutex<BTreeMap<String, PathBuf>>,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
    fail_writes: bool,
}

impl MemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose `insert` and `delete` always fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Pre-populate an entry without counting it as a call.
    pub fn seed(&self, name: &str, path: impl Into<PathBuf>) {
        self.lock().insert(name.to_string(), path.into());
    }

    pub fn get(&self, name: &str) -> Option<PathBuf> {
        self.lock().get(name).cloned()
    }

    pub fn entries(&self) -> BTreeMap<String, PathBuf> {
        self.lock().clone()
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Total mutating calls, failed ones included.
    pub fn calls(&self) -> usize {
        self.inserts() + self.deletes()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, PathBuf>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RegistrationStore for MemoryRegistrationStore {
    fn snapshot(&self) -> InfraResult<RegistrationSnapshot> {
        Ok(self
            .lock()
            .iter()
            .map(|(name, path)| (name.clone(), path.clone()))
            .collect())
    }

    fn insert(&self, name: &str, path: &Path) -> InfraResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(InfraError::store(format!("insert '{name}'"), "access denied"));
        }
        self.lock().insert(name.to_string(), path.to_path_buf());
        Ok(())
    }

    fn delete(&self, name: &str) -> InfraResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(InfraError::store(format!("delete '{name}'"), "access denied"));
        }
        self.lock().remove(name);
        Ok(())
    }
}
