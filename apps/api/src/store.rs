//! File-backed project store.
//!
//! A single JSON document (`<data_dir>/projects.json`) holding every project. Each
//! mutation rewrites the file before returning. There is no locking across processes;
//! concurrent writers race and the last write wins.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Page, Project, ProjectStatus, ProjectSummary};

const PROJECTS_FILE: &str = "projects.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt project store: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectsDocument {
    projects: HashMap<String, Project>,
}

/// Fields that `ProjectStore::update` may replace. `None` leaves the field untouched.
#[derive(Debug, Default, Clone)]
pub struct ProjectUpdate {
    pub outline: Option<Vec<Page>>,
    pub images: Option<BTreeMap<u32, String>>,
    pub status: Option<ProjectStatus>,
}

pub struct ProjectStore {
    file: PathBuf,
    document: Mutex<ProjectsDocument>,
}

impl ProjectStore {
    /// Opens (or initializes) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|source| StoreError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let file = data_dir.join(PROJECTS_FILE);
        let store = if file.exists() {
            let raw = std::fs::read_to_string(&file).map_err(|source| StoreError::Io {
                path: file.clone(),
                source,
            })?;
            let document: ProjectsDocument = serde_json::from_str(&raw)?;
            info!(
                "Loaded {} projects from {}",
                document.projects.len(),
                file.display()
            );
            Self {
                file,
                document: Mutex::new(document),
            }
        } else {
            let store = Self {
                file,
                document: Mutex::new(ProjectsDocument::default()),
            };
            store.save(&store.lock())?;
            info!("Initialized empty project store at {}", store.file.display());
            store
        };

        Ok(store)
    }

    pub fn get(&self, id: &str) -> Option<Project> {
        self.lock().projects.get(id).cloned()
    }

    pub fn create(
        &self,
        id: &str,
        theme: &str,
        outline: Vec<Page>,
        reference_image: Option<String>,
    ) -> Result<Project, StoreError> {
        let now = Utc::now();
        let project = Project {
            id: id.to_string(),
            theme: theme.to_string(),
            reference_image,
            outline,
            images: BTreeMap::new(),
            status: ProjectStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        let mut document = self.lock();
        document.projects.insert(project.id.clone(), project.clone());
        self.save(&document)?;
        debug!("Created project {} ({} pages)", id, project.outline.len());
        Ok(project)
    }

    pub fn update(&self, id: &str, update: ProjectUpdate) -> Result<Project, StoreError> {
        let mut document = self.lock();
        let project = document
            .projects
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(outline) = update.outline {
            project.outline = outline;
        }
        if let Some(images) = update.images {
            project.images = images;
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        project.updated_at = Utc::now();

        let updated = project.clone();
        self.save(&document)?;
        Ok(updated)
    }

    /// Summaries, newest first.
    pub fn list(&self) -> Vec<ProjectSummary> {
        let document = self.lock();
        let mut projects: Vec<&Project> = document.projects.values().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        projects.into_iter().map(ProjectSummary::from).collect()
    }

    /// The most recently created project, if any.
    pub fn latest(&self) -> Option<Project> {
        self.lock()
            .projects
            .values()
            .max_by_key(|p| p.created_at)
            .cloned()
    }

    /// Removes a project. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut document = self.lock();
        let existed = document.projects.remove(id).is_some();
        if existed {
            self.save(&document)?;
        }
        Ok(existed)
    }

    fn lock(&self) -> MutexGuard<'_, ProjectsDocument> {
        // Poisoning is ignored: the in-memory map stays authoritative.
        self.document.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, document: &ProjectsDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.file, raw).map_err(|source| StoreError::Io {
            path: self.file.clone(),
            source,
        })
    }
}
