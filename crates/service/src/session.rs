//! The synchronization orchestrator
//!
//! A [`ProjectSession`] owns everything that has to stay consistent with one
//! backend for its whole lifetime: the open-file cache, the watch registry,
//! the extension set last sent and the default-project matches of the
//! current run. Each [`ProjectSession::resolve`] call walks the same steps:
//!
//! 1. absolutize the request path and look it up in the open-file cache
//! 2. on a miss, replay a synthetic watch event for orphaned files
//! 3. on a hit, push the new text into the backend buffer
//! 4. open the file (or reuse the cached open result)
//! 5. classify project membership
//! 6. fetch the compiled program
//! 7. enforce the default-project match cap

use crate::backend::{OpenedFile, ProjectBackend, ScriptBuffer};
use crate::cache::OpenFileCache;
use crate::classify::{
    classify, is_in_configured_project, DefaultProjectAllowlist, Membership, MembershipFacts,
};
use crate::config::{OrphanPolicy, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::matches::DefaultProjectMatches;
use parking_lot::Mutex;
use projsync_core::{absolutize, diff_to_edits, full_replace};
use projsync_watcher::{WatchHandle, WatchKind, WatchRegistry};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// One file to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    /// File path as given by the caller, absolute or relative
    pub file_path: PathBuf,
    /// Full current text of the file
    pub code: String,
    /// Root directory handed to the backend and used for allow-list matching
    pub project_root: Option<PathBuf>,
    /// Extra file extensions the backend should recognize
    pub extra_file_extensions: Vec<String>,
}

impl ParseRequest {
    pub fn new(file_path: impl Into<PathBuf>, code: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            code: code.into(),
            project_root: None,
            extra_file_extensions: Vec::new(),
        }
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_extra_file_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// A compiled program resolved for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProgram<P> {
    /// Absolute path of the file
    pub file_path: PathBuf,
    /// The backend's program containing the file
    pub program: P,
    /// Config file of the configured project that claimed the file
    pub config_file: Option<PathBuf>,
    /// The file was served by the default project
    pub used_default_project: bool,
}

/// Per-backend synchronization state
pub struct ProjectSession<B: ProjectBackend> {
    backend: Arc<B>,
    config: ServiceConfig,
    allowlist: DefaultProjectAllowlist,
    open_files: OpenFileCache<OpenedFile>,
    watches: WatchRegistry,
    default_project_matches: DefaultProjectMatches,
    extra_file_extensions: BTreeSet<String>,
}

impl<B: ProjectBackend + 'static> ProjectSession<B> {
    /// Create a session driving `backend`
    ///
    /// Validates `config`, installs the default project descriptor and the
    /// configured extra extensions.
    pub fn new(backend: Arc<B>, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let allowlist = DefaultProjectAllowlist::new(&config.allow_default_project)?;
        let capacity = NonZeroUsize::new(config.maximum_open_files).ok_or_else(|| {
            ServiceError::InvalidConfig("maximum_open_files must be at least 1".to_string())
        })?;

        let closer = Arc::clone(&backend);
        let open_files = OpenFileCache::new(
            capacity,
            Box::new(move |path: &Path, _opened: OpenedFile| {
                debug!("Closing project service file: {}", path.display());
                closer.close_file(path);
            }),
        );

        if let Some(descriptor) = &config.default_project {
            let descriptor = absolutize(descriptor, &backend.current_directory());
            backend
                .set_default_project(&descriptor)
                .map_err(|err| ServiceError::DefaultProject {
                    path: descriptor.clone(),
                    message: format!("{err:#}"),
                })?;
            info!("Using default project {}", descriptor.display());
        }

        let mut session = Self {
            backend,
            config,
            allowlist,
            open_files,
            watches: WatchRegistry::new(),
            default_project_matches: DefaultProjectMatches::new(),
            extra_file_extensions: BTreeSet::new(),
        };
        session.update_extra_file_extensions(&[]);

        Ok(session)
    }

    /// Resolve `request`, counting default-project files in the session's own set
    pub fn resolve(
        &mut self,
        request: &ParseRequest,
        requires_full_type_info: bool,
    ) -> Result<Option<ResolvedProgram<B::Program>>> {
        let mut matches = std::mem::take(&mut self.default_project_matches);
        let result = self.resolve_with_matches(request, requires_full_type_info, &mut matches);
        self.default_project_matches = matches;
        result
    }

    /// Resolve `request`, counting default-project files in `matches`
    ///
    /// Returns `Ok(None)` when the backend has no program for the file yet.
    pub fn resolve_with_matches(
        &mut self,
        request: &ParseRequest,
        requires_full_type_info: bool,
        matches: &mut DefaultProjectMatches,
    ) -> Result<Option<ResolvedProgram<B::Program>>> {
        self.update_extra_file_extensions(&request.extra_file_extensions);

        let cwd = self.backend.current_directory();
        let file_path = absolutize(&request.file_path, &cwd);
        let root_dir = match &request.project_root {
            Some(root) => absolutize(root, &cwd),
            None => cwd,
        };
        let allowlisted = self.allowlist.matches_relative_to(&file_path, &root_dir);

        debug!(
            "Opening project service file for: {} at absolute path {}",
            request.file_path.display(),
            file_path.display()
        );

        let reused = if self.open_files.contains(&file_path) {
            self.sync_content(&file_path, &request.code)
        } else {
            self.check_orphan(&file_path, allowlisted)?;
            None
        };

        let opened = match reused {
            Some(opened) => opened,
            None => self.open(&file_path, &request.code, &root_dir),
        };

        if requires_full_type_info {
            debug!(
                "Project service type information enabled; checking for file path match on: {:?}",
                self.allowlist.patterns()
            );
        }
        let facts = MembershipFacts {
            path: &file_path,
            opened: &opened,
            in_configured_project: is_in_configured_project(&*self.backend, &file_path),
            allowlisted,
        };
        let membership = classify(facts, requires_full_type_info)?;

        debug!("Retrieving program for: {}", file_path.display());
        let Some(program) = self.backend.program_for_file(&file_path) else {
            debug!("Could not find project service program for: {}", file_path.display());
            return Ok(None);
        };

        let used_default_project = membership == Membership::DefaultProject;
        if used_default_project {
            matches.insert(&file_path);
        }
        // Checked on every request: a caller-owned set may already be over the cap
        matches.check(self.config.maximum_default_project_file_match_count)?;

        debug!("Found project service program for: {}", file_path.display());
        Ok(Some(ResolvedProgram {
            file_path,
            program,
            config_file: opened.config_file,
            used_default_project,
        }))
    }

    /// Push `code` into the buffer of an already open file
    ///
    /// Returns the cached open result, or `None` when the backend dropped the
    /// buffer and the file has to be opened again.
    fn sync_content(&mut self, path: &Path, code: &str) -> Option<OpenedFile> {
        let Some(buffer) = self.backend.buffer(path) else {
            debug!("Buffer missing for cached file, reopening: {}", path.display());
            return None;
        };
        let opened = self.open_files.get(path)?.clone();

        // The buffer may have been edited behind the session
        let snapshot = buffer.text(0, buffer.len());
        if snapshot == code {
            trace!("Content unchanged: {}", path.display());
            return Some(opened);
        }

        debug!("File already opened, sending changes: {}", path.display());
        let edits = if self.config.incremental_sync {
            diff_to_edits(&snapshot, code)
        } else {
            full_replace(snapshot.len(), code)
        };
        for edit in &edits {
            trace!(
                "Applying edit [{}, {}) with {} bytes",
                edit.start,
                edit.end,
                edit.text.len()
            );
            buffer.apply_edit(edit.start, edit.end, &edit.text);
        }

        Some(opened)
    }

    /// Replay a watch event for a file no configured project claims yet
    fn check_orphan(&self, path: &Path, allowlisted: bool) -> Result<()> {
        if is_in_configured_project(&*self.backend, path) {
            return Ok(());
        }

        debug!("Orphaned file: {}", path.display());
        match self.watches.trigger(path) {
            Some(event) => {
                debug!("Triggering watcher: {}", event.watched.display());
                self.backend.notify_watch(&event);
            }
            None => {
                debug!("No watcher found for: {}", path.display());
                if self.config.orphan_policy == OrphanPolicy::Reject && !allowlisted {
                    return Err(ServiceError::OrphanedFile {
                        path: path.to_path_buf(),
                    });
                }
            }
        }

        Ok(())
    }

    fn open(&mut self, path: &Path, code: &str, root_dir: &Path) -> OpenedFile {
        let opened = self.backend.open_file(path, code, Some(root_dir));
        debug!(
            "Opened project service file: {} (config file: {:?})",
            path.display(),
            opened.config_file
        );
        self.open_files.insert(path.to_path_buf(), opened.clone());
        self.register_requested_watches();
        opened
    }

    /// Register the watches the backend asked for while opening files
    fn register_requested_watches(&mut self) {
        let cwd = self.backend.current_directory();
        for request in self.backend.take_watch_requests() {
            let path = absolutize(&request.path, &cwd);
            let registered = match request.kind {
                WatchKind::File => self.watches.watch_file(&path),
                WatchKind::Directory => self.watches.watch_directory(&path),
            };
            if let Err(err) = registered {
                warn!("Ignoring watch request for {}: {}", path.display(), err);
            }
        }
    }

    /// Send the extension set to the backend when it changed
    fn update_extra_file_extensions(&mut self, requested: &[String]) {
        let wanted: BTreeSet<String> = self
            .config
            .extra_file_extensions
            .iter()
            .chain(requested)
            .cloned()
            .collect();

        if wanted == self.extra_file_extensions {
            return;
        }

        let extensions: Vec<String> = wanted.iter().cloned().collect();
        debug!("Adjusting extra file extensions: {:?}", extensions);
        self.backend.set_extra_file_extensions(&extensions);
        self.extra_file_extensions = wanted;
    }

    /// Close one open file in the backend
    pub fn close_file(&mut self, path: &Path) -> bool {
        let path = absolutize(path, &self.backend.current_directory());
        self.open_files.remove(&path)
    }

    /// Close every open file in the backend
    pub fn close_all(&mut self) {
        self.open_files.clear();
    }

    pub fn open_file_count(&self) -> usize {
        self.open_files.len()
    }

    pub fn is_open(&self, path: &Path) -> bool {
        let path = absolutize(path, &self.backend.current_directory());
        self.open_files.contains(&path)
    }

    /// Files matched by the default project through [`ProjectSession::resolve`]
    pub fn default_project_matches(&self) -> &DefaultProjectMatches {
        &self.default_project_matches
    }

    /// Start a new linting run for [`ProjectSession::resolve`]
    pub fn clear_default_project_matches(&mut self) {
        self.default_project_matches.clear();
    }

    /// Register a watch on a file
    pub fn watch_file(&mut self, path: &Path) -> Result<WatchHandle> {
        let path = absolutize(path, &self.backend.current_directory());
        Ok(self.watches.watch_file(&path)?)
    }

    /// Register a watch on a directory and everything below it
    pub fn watch_directory(&mut self, path: &Path) -> Result<WatchHandle> {
        let path = absolutize(path, &self.backend.current_directory());
        Ok(self.watches.watch_directory(&path)?)
    }

    pub fn close_watch(&mut self, handle: &WatchHandle) -> bool {
        self.watches.close(handle)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

/// A session shared between threads
///
/// The lock is held for a whole resolve, so requests never interleave.
pub struct SharedSession<B: ProjectBackend> {
    inner: Arc<Mutex<ProjectSession<B>>>,
}

impl<B: ProjectBackend> Clone for SharedSession<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ProjectBackend + 'static> SharedSession<B> {
    pub fn new(session: ProjectSession<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn resolve(
        &self,
        request: &ParseRequest,
        requires_full_type_info: bool,
    ) -> Result<Option<ResolvedProgram<B::Program>>> {
        self.inner.lock().resolve(request, requires_full_type_info)
    }

    pub fn resolve_with_matches(
        &self,
        request: &ParseRequest,
        requires_full_type_info: bool,
        matches: &mut DefaultProjectMatches,
    ) -> Result<Option<ResolvedProgram<B::Program>>> {
        self.inner
            .lock()
            .resolve_with_matches(request, requires_full_type_info, matches)
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut ProjectSession<B>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
