//! In-memory backend for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use projsync_core::{apply_edits, EditSpan};
use projsync_service::backend::{
    ConfiguredProject, OpenedFile, ProjectBackend, ScriptBuffer, WatchRequest,
};
use projsync_watcher::{EventKind, WatchEvent};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Route session logs to the test harness output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// A configured project listing its files explicitly
#[derive(Debug, Clone)]
pub struct FakeProject {
    config_file: PathBuf,
    files: BTreeSet<PathBuf>,
}

impl ConfiguredProject for FakeProject {
    fn config_file(&self) -> &Path {
        &self.config_file
    }

    fn contains_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}

/// Buffer shared with the backend state
#[derive(Debug, Clone)]
pub struct FakeBuffer {
    path: PathBuf,
    text: Arc<Mutex<String>>,
    edits: Arc<Mutex<Vec<(PathBuf, EditSpan)>>>,
}

impl ScriptBuffer for FakeBuffer {
    fn len(&self) -> usize {
        self.text.lock().len()
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.text.lock()[start..end].to_string()
    }

    fn apply_edit(&self, start: usize, end: usize, replacement: &str) {
        let span = EditSpan {
            start,
            end,
            text: replacement.to_string(),
        };
        apply_edits(&mut self.text.lock(), std::slice::from_ref(&span));
        self.edits.lock().push((self.path.clone(), span));
    }
}

/// What a resolved program looks like to tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeProgram {
    pub file: PathBuf,
    pub text: String,
}

#[derive(Default)]
struct State {
    projects: Vec<FakeProject>,
    buffers: HashMap<PathBuf, Arc<Mutex<String>>>,
    opened: Vec<PathBuf>,
    closed: Vec<PathBuf>,
    watch_events: Vec<WatchEvent>,
    extension_calls: Vec<Vec<String>>,
    without_program: BTreeSet<PathBuf>,
    default_project: Option<PathBuf>,
    default_project_error: Option<String>,
    /// Project that adopts files created in watched directories
    adopting_project: Option<usize>,
    /// Watches requested whenever a file is opened
    watches_on_open: Vec<WatchRequest>,
    pending_watches: Vec<WatchRequest>,
}

/// Project service double
pub struct FakeBackend {
    cwd: PathBuf,
    state: Mutex<State>,
    edits: Arc<Mutex<Vec<(PathBuf, EditSpan)>>>,
}

impl FakeBackend {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            state: Mutex::new(State::default()),
            edits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_project(self, config_file: &str, files: &[&str]) -> Self {
        self.state.lock().projects.push(FakeProject {
            config_file: PathBuf::from(config_file),
            files: files.iter().map(PathBuf::from).collect(),
        });
        self
    }

    /// Make the most recently added project pick up created files
    pub fn adopting_created_files(self) -> Self {
        {
            let mut state = self.state.lock();
            state.adopting_project = state.projects.len().checked_sub(1);
        }
        self
    }

    /// Ask for `request` every time a file is opened
    pub fn requesting_watch(self, request: WatchRequest) -> Self {
        self.state.lock().watches_on_open.push(request);
        self
    }

    /// Change a live buffer without going through the session
    pub fn overwrite_buffer(&self, path: &str, text: &str) {
        if let Some(buffer) = self.buffer(Path::new(path)) {
            buffer.apply_edit(0, buffer.len(), text);
        }
    }

    pub fn failing_default_project(self, message: &str) -> Self {
        self.state.lock().default_project_error = Some(message.to_string());
        self
    }

    pub fn without_program(&self, path: &str) {
        self.state.lock().without_program.insert(PathBuf::from(path));
    }

    /// Forget a buffer as if the backend closed the file on its own
    pub fn drop_buffer(&self, path: &str) {
        self.state.lock().buffers.remove(Path::new(path));
    }

    pub fn buffer_text(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .buffers
            .get(Path::new(path))
            .map(|text| text.lock().clone())
    }

    pub fn opened_files(&self) -> Vec<PathBuf> {
        self.state.lock().opened.clone()
    }

    pub fn closed_files(&self) -> Vec<PathBuf> {
        self.state.lock().closed.clone()
    }

    pub fn open_buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn watch_events(&self) -> Vec<WatchEvent> {
        self.state.lock().watch_events.clone()
    }

    pub fn extension_calls(&self) -> Vec<Vec<String>> {
        self.state.lock().extension_calls.clone()
    }

    pub fn default_project(&self) -> Option<PathBuf> {
        self.state.lock().default_project.clone()
    }

    pub fn applied_edits(&self) -> Vec<(PathBuf, EditSpan)> {
        self.edits.lock().clone()
    }
}

impl ProjectBackend for FakeBackend {
    type Buffer = FakeBuffer;
    type Project = FakeProject;
    type Program = FakeProgram;

    fn current_directory(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn open_file(&self, path: &Path, text: &str, _project_root: Option<&Path>) -> OpenedFile {
        let mut state = self.state.lock();
        state.opened.push(path.to_path_buf());
        let requested = state.watches_on_open.clone();
        state.pending_watches.extend(requested);
        state
            .buffers
            .insert(path.to_path_buf(), Arc::new(Mutex::new(text.to_string())));

        match state.projects.iter().find(|project| project.contains_file(path)) {
            Some(project) => OpenedFile::in_project(project.config_file.clone()),
            None => OpenedFile::in_default_project(),
        }
    }

    fn close_file(&self, path: &Path) {
        let mut state = self.state.lock();
        state.buffers.remove(path);
        state.closed.push(path.to_path_buf());
    }

    fn buffer(&self, path: &Path) -> Option<FakeBuffer> {
        let state = self.state.lock();
        state.buffers.get(path).map(|text| FakeBuffer {
            path: path.to_path_buf(),
            text: Arc::clone(text),
            edits: Arc::clone(&self.edits),
        })
    }

    fn configured_projects(&self) -> Vec<FakeProject> {
        self.state.lock().projects.clone()
    }

    fn program_for_file(&self, path: &Path) -> Option<FakeProgram> {
        let state = self.state.lock();
        if state.without_program.contains(path) {
            return None;
        }
        let text = state.buffers.get(path)?.lock().clone();
        Some(FakeProgram {
            file: path.to_path_buf(),
            text,
        })
    }

    fn set_extra_file_extensions(&self, extensions: &[String]) {
        self.state.lock().extension_calls.push(extensions.to_vec());
    }

    fn set_default_project(&self, config_path: &Path) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        if let Some(message) = &state.default_project_error {
            anyhow::bail!("{message}");
        }
        state.default_project = Some(config_path.to_path_buf());
        Ok(())
    }

    fn take_watch_requests(&self) -> Vec<WatchRequest> {
        std::mem::take(&mut self.state.lock().pending_watches)
    }

    fn notify_watch(&self, event: &WatchEvent) {
        let mut state = self.state.lock();
        state.watch_events.push(event.clone());
        if event.kind == EventKind::Create {
            if let Some(index) = state.adopting_project {
                state.projects[index].files.insert(event.path.clone());
            }
        }
    }
}
