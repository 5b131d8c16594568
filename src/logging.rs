use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::sync::Mutex;
use tracing::{info, Level};

use crate::protocol::DistanceVector;
use crate::RouterId;

/// Installs the fmt subscriber used by the binary.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Why a router's table was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChangeReason {
    /// Local entry seeded and direct neighbors discovered.
    Startup,
    /// Relaxed against an advertisement from this neighbor.
    Advertisement { from: RouterId },
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub router: RouterId,
    pub reason: ChangeReason,
    pub table: DistanceVector,
    pub recorded_at: DateTime<Utc>,
}

impl fmt::Display for TableSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DV of router {}:", self.router)?;
        for (node, entry) in self.table.iter() {
            writeln!(f, "Node: {}, {}", node, entry)?;
        }
        Ok(())
    }
}

/// Serialized sink for table changes, shared by every router of a network.
///
/// Each record is printed and retained in arrival order. Routers record while
/// holding their own table lock, so per-router order matches the order in
/// which their tables changed.
#[derive(Debug, Default)]
pub struct TableJournal {
    history: Mutex<Vec<TableSnapshot>>,
}

impl TableJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, router: &str, reason: ChangeReason, table: &DistanceVector) {
        let snapshot = TableSnapshot {
            router: router.to_string(),
            reason,
            table: table.clone(),
            recorded_at: Utc::now(),
        };

        let mut history = self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        info!("{}", snapshot);
        history.push(snapshot);
    }

    /// Everything recorded so far.
    pub fn history(&self) -> Vec<TableSnapshot> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Records belonging to one router, oldest first.
    pub fn history_of(&self, router: &str) -> Vec<TableSnapshot> {
        self.history()
            .into_iter()
            .filter(|snapshot| snapshot.router == router)
            .collect()
    }

    /// Writes the history as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.history())?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
