//! JSON-file task store.
//!
//! The whole collection lives in one JSON array. Every operation loads a
//! fresh snapshot, mutating operations rewrite the full array through an
//! atomic replace, so a reader always sees either the old or the new
//! document.

use parking_lot::Mutex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::task::{display_order, Task, TaskFields};
use crate::validate::is_valid_id;

// temp files start out 0600; a fresh store file gets the usual 0644
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    // serializes read-modify-write cycles issued through this handle
    lock: Mutex<()>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Creates the data directory and an empty `[]` document if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        if !store.path.exists() {
            store.save_all(&[])?;
            tracing::info!(path = %store.path.display(), "initialized empty task store");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the collection. A missing, unreadable or corrupt file yields
    /// an empty list; the cause is logged, never returned.
    pub fn load_all(&self) -> Vec<Task> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "task file absent");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read tasks file");
                return Vec::new();
            }
        };
        if data.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<Task>>(&data) {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), path = %self.path.display(), "loaded tasks");
                tasks
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "tasks file is corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Writes the collection to a sibling temp file, syncs it, then renames
    /// it over the canonical path.
    pub fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tasks)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        match fs::metadata(&self.path) {
            Ok(meta) => tmp
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(write_err)?,
            #[cfg(unix)]
            Err(_) => {
                use std::os::unix::fs::PermissionsExt;
                tmp.as_file()
                    .set_permissions(fs::Permissions::from_mode(NEW_FILE_MODE))
                    .map_err(write_err)?
            }
            #[cfg(not(unix))]
            Err(_) => {}
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::debug!(count = tasks.len(), path = %self.path.display(), "saved tasks");
        Ok(())
    }

    /// Loads a snapshot, lets `f` change it, and persists the result only
    /// if `f` succeeds.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut Vec<Task>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock();
        let mut tasks = self.load_all();
        let out = f(&mut tasks)?;
        self.save_all(&tasks)?;
        Ok(out)
    }

    pub fn create(&self, fields: TaskFields) -> Result<Task, StoreError> {
        let task = Task::new(fields);
        self.transact(|tasks| {
            tasks.push(task.clone());
            Ok(())
        })?;
        tracing::info!(id = %task.id, "task created");
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Result<Task, StoreError> {
        check_id(id)?;
        self.load_all()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn update(&self, id: &str, fields: TaskFields) -> Result<Task, StoreError> {
        check_id(id)?;
        let task = self.transact(|tasks| {
            let task = find_mut(tasks, id)?;
            task.apply(fields);
            Ok(task.clone())
        })?;
        tracing::info!(id, "task updated");
        Ok(task)
    }

    pub fn toggle_done(&self, id: &str) -> Result<Task, StoreError> {
        check_id(id)?;
        let task = self.transact(|tasks| {
            let task = find_mut(tasks, id)?;
            task.toggle();
            Ok(task.clone())
        })?;
        tracing::info!(id, done = task.done, "task toggled");
        Ok(task)
    }

    /// Removes the task and returns it.
    pub fn delete(&self, id: &str) -> Result<Task, StoreError> {
        check_id(id)?;
        let task = self.transact(|tasks| {
            let idx = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            Ok(tasks.remove(idx))
        })?;
        tracing::info!(id, "task deleted");
        Ok(task)
    }

    pub fn list_sorted(&self) -> Vec<Task> {
        let mut tasks = self.load_all();
        tasks.sort_by(display_order);
        tasks
    }
}

fn check_id(id: &str) -> Result<(), StoreError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task, StoreError> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn unknown_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            priority: Priority::Low,
        }
    }

    fn temp_store() -> (TempDir, TaskStore) {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn blank_file_loads_empty() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "\n").unwrap();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn open_seeds_an_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("tasks.json");
        let store = TaskStore::open(&path).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn open_keeps_existing_tasks() {
        let (dir, store) = temp_store();
        store.create(fields("kept")).unwrap();
        let reopened = TaskStore::open(dir.path().join("tasks.json")).unwrap();
        assert_eq!(reopened.load_all().len(), 1);
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let (dir, store) = temp_store();
        store.create(fields("one")).unwrap();
        store.create(fields("two")).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["tasks.json"]);
    }

    #[test]
    fn unwritable_location_reports_write_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();
        let store = TaskStore::new(blocker.join("tasks.json"));

        let err = store.create(fields("lost")).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[test]
    fn failed_transform_does_not_write() {
        let (_dir, store) = temp_store();
        let task = store.create(fields("one")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.update(&unknown_id(), fields("two")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.get(&task.id).unwrap().title, "one");
    }

    #[test]
    fn get_finds_by_id() {
        let (_dir, store) = temp_store();
        let task = store.create(fields("find me")).unwrap();
        assert_eq!(store.get(&task.id).unwrap(), task);
        assert!(store.get(&unknown_id()).unwrap_err().is_not_found());
    }

    #[test]
    fn toggle_and_delete_unknown_ids() {
        let (_dir, store) = temp_store();
        assert!(store.toggle_done(&unknown_id()).unwrap_err().is_not_found());
        assert!(store.delete(&unknown_id()).unwrap_err().is_not_found());
    }

    #[test]
    fn malformed_ids_are_rejected_before_loading() {
        let (_dir, store) = temp_store();
        store.create(fields("one")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        for id in ["nope", "", "../tasks"] {
            assert!(matches!(store.get(id), Err(StoreError::InvalidId(_))));
            assert!(matches!(store.update(id, fields("x")), Err(StoreError::InvalidId(_))));
            assert!(matches!(store.toggle_done(id), Err(StoreError::InvalidId(_))));
            assert!(matches!(store.delete(id), Err(StoreError::InvalidId(_))));
        }
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.save_all(&[]).unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o640)).unwrap();

        store.create(fields("one")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn fresh_store_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, NEW_FILE_MODE);
    }
}
