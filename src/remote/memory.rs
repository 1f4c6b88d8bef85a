//! In-memory [`RemoteFs`] with a call log, a settable clock and failure hooks.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap, HashSet},
    path::Path,
};

use async_trait::async_trait;

use crate::profile::Mode;

use super::{RemoteError, RemoteErrorKind, RemoteFs, RemoteOp, RemotePath, RemoteStat};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Dir { mode: u32 },
    File { content: Vec<u8>, modified: u64, mode: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    List(String),
    CreateDir(String, u32),
    Stat(String),
    Upload(String),
    SetPermissions(String, u32),
    DeleteTree(String),
}

pub struct MemoryRemote {
    nodes: RefCell<BTreeMap<String, Node>>,
    calls: RefCell<Vec<Call>>,
    now: Cell<u64>,
    failures: RefCell<HashMap<(RemoteOp, String), RemoteErrorKind>>,
    appear_on_create: RefCell<HashSet<String>>,
}

pub const DEFAULT_FILE_MODE: u32 = 0o600;

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(BTreeMap::new()),
            calls: RefCell::new(Vec::new()),
            now: Cell::new(1_000),
            failures: RefCell::new(HashMap::new()),
            appear_on_create: RefCell::new(HashSet::new()),
        }
    }

    /// Creates `path` and all its ancestors as directories.
    pub fn with_dir(self, path: &str) -> Self {
        let mut current = RemotePath::new(path);
        let mut nodes = self.nodes.borrow_mut();
        while !current.is_empty() {
            nodes
                .entry(current.as_str().to_string())
                .or_insert(Node::Dir { mode: 0o755 });
            if current.as_str() == "/" {
                break;
            }
            current = current.parent();
        }
        drop(nodes);
        self
    }

    pub fn with_file(self, path: &str, content: &[u8], modified: u64, mode: u32) -> Self {
        let path = RemotePath::new(path);
        let this = self.with_dir(path.parent().as_str());
        this.nodes.borrow_mut().insert(
            path.as_str().to_string(),
            Node::File {
                content: content.to_vec(),
                modified,
                mode,
            },
        );
        this
    }

    /// Makes `op` on `path` fail with `kind`.
    pub fn fail(&self, op: RemoteOp, path: &str, kind: RemoteErrorKind) {
        self.failures
            .borrow_mut()
            .insert((op, RemotePath::new(path).as_str().to_string()), kind);
    }

    /// Simulates another writer creating `path` right before this client's mkdir.
    pub fn appear_on_create(&self, path: &str) {
        self.appear_on_create
            .borrow_mut()
            .insert(RemotePath::new(path).as_str().to_string());
    }

    pub fn set_now(&self, now: u64) {
        self.now.set(now);
    }

    pub fn node(&self, path: &str) -> Option<Node> {
        self.nodes.borrow().get(path).cloned()
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match self.node(path)? {
            Node::File { content, .. } => Some(content),
            Node::Dir { .. } => None,
        }
    }

    pub fn file_mode(&self, path: &str) -> Option<u32> {
        match self.node(path)? {
            Node::File { mode, .. } => Some(mode),
            Node::Dir { .. } => None,
        }
    }

    pub fn set_file_mode(&self, path: &str, new_mode: u32) {
        if let Some(Node::File { mode, .. }) = self.nodes.borrow_mut().get_mut(path) {
            *mode = new_mode;
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn created_dirs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::CreateDir(path, _) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Upload(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn injected(&self, op: RemoteOp, path: &RemotePath) -> Result<(), RemoteError> {
        match self
            .failures
            .borrow()
            .get(&(op, path.as_str().to_string()))
        {
            Some(kind) => Err(RemoteError::new(op, path, *kind)),
            None => Ok(()),
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.borrow().get(path), Some(Node::Dir { .. }))
    }

    fn children(&self, dir: &str) -> Vec<String> {
        let prefix = if dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{dir}/")
        };

        self.nodes
            .borrow()
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(|name| name.to_string())
            .collect()
    }
}

#[async_trait(?Send)]
impl RemoteFs for MemoryRemote {
    async fn list_entries(&self, dir: &RemotePath) -> Result<Vec<String>, RemoteError> {
        self.record(Call::List(dir.to_string()));
        self.injected(RemoteOp::ListEntries, dir)?;

        if !self.is_dir(dir.as_str()) {
            return Err(RemoteError::new(RemoteOp::ListEntries, dir, RemoteErrorKind::NotFound));
        }
        Ok(self.children(dir.as_str()))
    }

    async fn create_dir(&self, path: &RemotePath, mode: Mode) -> Result<(), RemoteError> {
        self.record(Call::CreateDir(path.to_string(), mode.bits()));
        self.injected(RemoteOp::CreateDir, path)?;

        if self.appear_on_create.borrow_mut().remove(path.as_str()) {
            self.nodes
                .borrow_mut()
                .insert(path.to_string(), Node::Dir { mode: 0o700 });
        }

        if self.nodes.borrow().contains_key(path.as_str()) {
            return Err(RemoteError::new(RemoteOp::CreateDir, path, RemoteErrorKind::AlreadyExists));
        }
        let parent = path.parent();
        if !parent.is_empty() && !self.is_dir(parent.as_str()) {
            return Err(RemoteError::new(RemoteOp::CreateDir, path, RemoteErrorKind::NotFound));
        }

        self.nodes
            .borrow_mut()
            .insert(path.to_string(), Node::Dir { mode: mode.bits() });
        Ok(())
    }

    async fn stat_file(&self, path: &RemotePath) -> Result<RemoteStat, RemoteError> {
        self.record(Call::Stat(path.to_string()));
        self.injected(RemoteOp::Stat, path)?;

        match self.node(path.as_str()) {
            Some(Node::File { modified, .. }) => Ok(RemoteStat {
                modified: Some(modified),
            }),
            Some(Node::Dir { .. }) => {
                Err(RemoteError::new(RemoteOp::Stat, path, RemoteErrorKind::Other))
            }
            None => Err(RemoteError::new(RemoteOp::Stat, path, RemoteErrorKind::NotFound)),
        }
    }

    async fn upload(&self, local: &Path, remote: &RemotePath) -> Result<(), RemoteError> {
        self.record(Call::Upload(remote.to_string()));
        self.injected(RemoteOp::Upload, remote)?;

        if !self.is_dir(remote.parent().as_str()) {
            return Err(RemoteError::new(RemoteOp::Upload, remote, RemoteErrorKind::NotFound));
        }
        let content = std::fs::read(local)
            .map_err(|err| RemoteError::new(RemoteOp::Upload, remote, RemoteErrorKind::Other).with_source(err))?;

        let mut nodes = self.nodes.borrow_mut();
        let mode = match nodes.get(remote.as_str()) {
            Some(Node::File { mode, .. }) => *mode,
            _ => DEFAULT_FILE_MODE,
        };
        nodes.insert(
            remote.to_string(),
            Node::File {
                content,
                modified: self.now.get(),
                mode,
            },
        );
        Ok(())
    }

    async fn set_permissions(&self, path: &RemotePath, mode: Mode) -> Result<(), RemoteError> {
        self.record(Call::SetPermissions(path.to_string(), mode.bits()));
        self.injected(RemoteOp::SetPermissions, path)?;

        match self.nodes.borrow_mut().get_mut(path.as_str()) {
            Some(Node::File { mode: current, .. }) | Some(Node::Dir { mode: current }) => {
                *current = mode.bits();
                Ok(())
            }
            None => Err(RemoteError::new(RemoteOp::SetPermissions, path, RemoteErrorKind::NotFound)),
        }
    }

    async fn delete_tree(&self, path: &RemotePath) -> Result<(), RemoteError> {
        self.record(Call::DeleteTree(path.to_string()));
        self.injected(RemoteOp::DeleteTree, path)?;

        let key = path.as_str();
        let prefix = format!("{key}/");
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(key) {
            return Err(RemoteError::new(RemoteOp::DeleteTree, path, RemoteErrorKind::NotFound));
        }
        nodes.retain(|existing, _| existing != key && !existing.starts_with(&prefix));
        Ok(())
    }
}
