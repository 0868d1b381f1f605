use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use system::chrono::{DateTime, Utc};
use system::{Diagram, DiagramId, DiagramSummary, NewDiagram, StrokeBlob};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("diagram table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("diagram data is corrupt: {0}")]
    Corrupt(#[from] system::serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DiagramRecord {
    id: DiagramId,
    owner: String,
    title: String,
    strokes: StrokeBlob,
    is_shared: bool,
    created_at: DateTime<Utc>,
}

impl DiagramRecord {
    fn summary(&self) -> DiagramSummary {
        DiagramSummary {
            id: self.id,
            title: self.title.clone(),
            owner: self.owner.clone(),
            is_shared: self.is_shared,
            created_at: self.created_at,
        }
    }

    fn diagram(&self) -> Result<Diagram, StoreError> {
        Ok(Diagram {
            id: self.id,
            title: self.title.clone(),
            owner: self.owner.clone(),
            is_shared: self.is_shared,
            created_at: self.created_at,
            strokes: self.strokes.decode()?,
        })
    }
}

#[derive(Debug, Default)]
struct DiagramTable {
    records: Vec<DiagramRecord>,
}

impl DiagramTable {
    fn next_id(&self) -> DiagramId {
        self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    /// Newest first; equal timestamps fall back to the later id.
    fn summaries(&self, filter: impl Fn(&DiagramRecord) -> bool) -> Vec<DiagramSummary> {
        let mut matching: Vec<&DiagramRecord> =
            self.records.iter().filter(|r| filter(*r)).collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        matching.into_iter().map(DiagramRecord::summary).collect()
    }
}

/// Single-table diagram storage, optionally mirrored to a JSON file.
///
/// With a backing file every `create` rewrites the whole table before returning, so an
/// acknowledged diagram survives a restart.
pub struct DiagramStore {
    table: Mutex<DiagramTable>,
    path: Option<PathBuf>,
}

impl DiagramStore {
    pub fn in_memory() -> Self {
        Self {
            table: Mutex::new(DiagramTable::default()),
            path: None,
        }
    }

    /// Loads `path` if it exists; a missing file starts an empty table there.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match fs::read(&path).await {
            Ok(bytes) => system::serde_json::from_slice::<Vec<DiagramRecord>>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        log::info!("Loaded {} diagram(s) from {}", records.len(), path.display());
        Ok(Self {
            table: Mutex::new(DiagramTable { records }),
            path: Some(path),
        })
    }

    pub async fn create(&self, diagram: NewDiagram) -> Result<DiagramId, StoreError> {
        let mut table = self.table.lock().await;
        let id = table.next_id();
        table.records.push(DiagramRecord {
            id,
            owner: diagram.owner,
            title: diagram.title,
            strokes: diagram.strokes,
            is_shared: diagram.is_shared,
            created_at: Utc::now(),
        });

        if let Some(path) = &self.path {
            if let Err(err) = write_table(path, &table.records).await {
                table.records.pop();
                return Err(err);
            }
        }
        log::info!("Diagram {} saved", id);
        Ok(id)
    }

    pub async fn get_by_id(&self, id: DiagramId) -> Result<Option<Diagram>, StoreError> {
        let table = self.table.lock().await;
        table
            .records
            .iter()
            .find(|r| r.id == id)
            .map(DiagramRecord::diagram)
            .transpose()
    }

    pub async fn list_by_owner(&self, owner: &str) -> Vec<DiagramSummary> {
        self.table.lock().await.summaries(|r| r.owner == owner)
    }

    pub async fn list_shared(&self) -> Vec<DiagramSummary> {
        self.table.lock().await.summaries(|r| r.is_shared)
    }
}

async fn write_table(path: &Path, records: &[DiagramRecord]) -> Result<(), StoreError> {
    let bytes = system::serde_json::to_vec(records)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
