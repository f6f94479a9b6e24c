// Copyright 2025 Logtree Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The logger repository: a tree of named logger nodes with inherited
//! levels.
//!
//! Nodes live in an arena owned by the [`Hierarchy`]; parent links are arena
//! indices, and the [`Logger`](crate::Logger) handles returned to callers are
//! thin references into it. Looking up a dotted name auto-vivifies every
//! missing ancestor, so a later configuration of an intermediate name is an
//! in-place update that descendants observe immediately.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use crate::Logger;
use crate::append::Appender;
use crate::record::Level;
use crate::record::LevelFilter;

const ROOT: usize = 0;
const ROOT_LEVEL: LevelFilter = LevelFilter::Debug;

pub(crate) struct Node {
    name: Arc<str>,
    parent: usize,
    level: Option<LevelFilter>,
    appenders: Vec<Arc<Appender>>,
    additive: bool,
}

impl Node {
    fn new(name: Arc<str>, parent: usize) -> Node {
        Node {
            name,
            parent,
            level: None,
            appenders: vec![],
            additive: true,
        }
    }
}

struct Tree {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl Tree {
    fn insert(&mut self, name: &str, parent: usize) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(Arc::from(name), parent));
        self.index.insert(name.to_string(), idx);
        idx
    }
}

/// An observer of structural changes to a [`Hierarchy`].
pub trait HierarchyListener: Send + Sync + 'static {
    /// Invoked synchronously when a logger node is created, after the node is
    /// reachable from the root and before `get_logger` returns to its caller.
    fn logger_created(&self, logger: &Logger);
}

impl<T: HierarchyListener + ?Sized> HierarchyListener for Arc<T> {
    fn logger_created(&self, logger: &Logger) {
        (**self).logger_created(logger);
    }
}

/// The repository owning a tree of logger nodes.
///
/// All state a log call reads concurrently lives behind a reader-writer lock
/// (the tree) or atomics (the global threshold and the shutdown flag), so
/// steady-state enablement checks and appender walks never block each other.
///
/// # Examples
///
/// ```
/// use logtree::Hierarchy;
/// use logtree::LevelFilter;
///
/// let hierarchy = Hierarchy::new();
/// let logger = hierarchy.get_logger("app.server");
/// assert_eq!(logger.effective_level(), LevelFilter::Debug);
/// ```
pub struct Hierarchy {
    tree: RwLock<Tree>,
    threshold: AtomicU8,
    terminated: AtomicBool,
    listeners: RwLock<Vec<Box<dyn HierarchyListener>>>,
    unconfigured_reported: AtomicBool,
}

impl std::fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hierarchy")
            .field("loggers", &self.read().nodes.len())
            .field("threshold", &self.threshold())
            .field("terminated", &self.terminated.load(Ordering::Relaxed))
            .finish()
    }
}

impl Hierarchy {
    /// Create a hierarchy whose root logger defaults to
    /// [`LevelFilter::Debug`].
    pub fn new() -> Arc<Hierarchy> {
        Hierarchy::with_root_level(ROOT_LEVEL)
    }

    /// Create a hierarchy with the given root level.
    pub fn with_root_level(level: LevelFilter) -> Arc<Hierarchy> {
        let mut root = Node::new(Arc::from("root"), ROOT);
        root.level = Some(level);
        Arc::new(Hierarchy {
            tree: RwLock::new(Tree {
                nodes: vec![root],
                index: HashMap::new(),
            }),
            threshold: AtomicU8::new(LevelFilter::All as u8),
            terminated: AtomicBool::new(false),
            listeners: RwLock::new(vec![]),
            unconfigured_reported: AtomicBool::new(false),
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(self: &Arc<Self>, idx: usize, name: Arc<str>) -> Logger {
        Logger::new(self.clone(), idx, name)
    }

    /// The root logger.
    pub fn root(self: &Arc<Self>) -> Logger {
        let name = self.read().nodes[ROOT].name.clone();
        self.handle(ROOT, name)
    }

    /// Return the logger with the given dotted name, creating it and any
    /// missing ancestors on first use. The empty name returns the root.
    ///
    /// Concurrent calls with the same name observe a single node; creation is
    /// serialized under the tree's write lock with a second existence check.
    pub fn get_logger(self: &Arc<Self>, name: &str) -> Logger {
        if name.is_empty() {
            return self.root();
        }

        if let Some(logger) = self.lookup(name) {
            return logger;
        }

        let mut created = Vec::new();
        let leaf = {
            let mut tree = self.write();
            if let Some(&idx) = tree.index.get(name) {
                // lost the race to another creator
                let name = tree.nodes[idx].name.clone();
                drop(tree);
                return self.handle(idx, name);
            }

            let mut parent = ROOT;
            for end in name
                .match_indices('.')
                .map(|(at, _)| at)
                .chain(std::iter::once(name.len()))
            {
                let prefix = &name[..end];
                if let Some(&idx) = tree.index.get(prefix) {
                    parent = idx;
                } else {
                    parent = tree.insert(prefix, parent);
                    created.push((parent, tree.nodes[parent].name.clone()));
                }
            }
            parent
        };

        // notify with the lock released, root-to-leaf, each node already
        // reachable
        if !created.is_empty() {
            let listeners = self
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (idx, name) in &created {
                let logger = self.handle(*idx, name.clone());
                for listener in listeners.iter() {
                    listener.logger_created(&logger);
                }
            }
        }

        let name = created
            .last()
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| self.read().nodes[leaf].name.clone());
        self.handle(leaf, name)
    }

    fn lookup(self: &Arc<Self>, name: &str) -> Option<Logger> {
        let tree = self.read();
        let &idx = tree.index.get(name)?;
        let name = tree.nodes[idx].name.clone();
        drop(tree);
        Some(self.handle(idx, name))
    }

    /// Whether a logger with the given name already exists.
    pub fn exists(&self, name: &str) -> bool {
        self.read().index.contains_key(name)
    }

    /// The names of all loggers created so far, root excluded, in no
    /// particular order.
    pub fn logger_names(&self) -> Vec<String> {
        self.read().index.keys().cloned().collect()
    }

    /// Register a structural-change listener.
    pub fn add_listener(&self, listener: impl HierarchyListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// The hierarchy-wide threshold: a global floor applied in addition to
    /// per-logger levels.
    pub fn threshold(&self) -> LevelFilter {
        LevelFilter::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    /// Set the hierarchy-wide threshold.
    pub fn set_threshold(&self, threshold: LevelFilter) {
        self.threshold.store(threshold as u8, Ordering::Relaxed);
    }

    /// Whether [`shutdown`](Hierarchy::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.terminated.load(Ordering::Relaxed)
    }

    /// Detach and close all appenders, reset every logger level (root back to
    /// its default) and additivity flag, and clear the threshold. The tree
    /// structure is preserved. Idempotent.
    pub fn reset_configuration(&self) {
        let detached = {
            let mut tree = self.write();
            let mut detached = Vec::new();
            for (idx, node) in tree.nodes.iter_mut().enumerate() {
                detached.append(&mut node.appenders);
                node.level = (idx == ROOT).then_some(ROOT_LEVEL);
                node.additive = true;
            }
            detached
        };
        self.threshold.store(LevelFilter::All as u8, Ordering::Relaxed);
        // Arc duplicates are fine here: close is idempotent per appender
        for appender in detached {
            appender.close();
        }
    }

    /// Reset the configuration, release appender resources, and mark the
    /// hierarchy terminal: every later log call is a silent no-op. Idempotent.
    pub fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        self.flush();
        self.reset_configuration();
    }

    /// Flush every attached appender.
    pub fn flush(&self) {
        for appender in self.all_appenders() {
            appender.flush();
        }
    }

    fn all_appenders(&self) -> Vec<Arc<Appender>> {
        let tree = self.read();
        let mut all: Vec<Arc<Appender>> = Vec::new();
        for node in &tree.nodes {
            for appender in &node.appenders {
                if !all.iter().any(|seen| Arc::ptr_eq(seen, appender)) {
                    all.push(appender.clone());
                }
            }
        }
        all
    }

    // node-level operations, used through Logger handles

    pub(crate) fn node_level(&self, idx: usize) -> Option<LevelFilter> {
        self.read().nodes[idx].level
    }

    pub(crate) fn set_node_level(&self, idx: usize, level: Option<LevelFilter>) {
        let mut tree = self.write();
        // the root always carries an explicit level; clearing it restores the
        // default
        tree.nodes[idx].level = match level {
            None if idx == ROOT => Some(ROOT_LEVEL),
            other => other,
        };
    }

    pub(crate) fn effective_level(&self, idx: usize) -> LevelFilter {
        let tree = self.read();
        let mut cursor = idx;
        loop {
            if let Some(level) = tree.nodes[cursor].level {
                return level;
            }
            debug_assert_ne!(cursor, ROOT, "the root always has an explicit level");
            cursor = tree.nodes[cursor].parent;
        }
    }

    pub(crate) fn enabled(&self, idx: usize, level: Level) -> bool {
        if self.terminated.load(Ordering::Relaxed) {
            return false;
        }
        if !self.threshold().enables(level) {
            return false;
        }
        self.effective_level(idx).enables(level)
    }

    pub(crate) fn node_additive(&self, idx: usize) -> bool {
        self.read().nodes[idx].additive
    }

    pub(crate) fn set_node_additive(&self, idx: usize, additive: bool) {
        self.write().nodes[idx].additive = additive;
    }

    /// Attach an appender. The same instance attached twice is kept once.
    pub(crate) fn add_node_appender(&self, idx: usize, appender: Arc<Appender>) {
        let mut tree = self.write();
        let appenders = &mut tree.nodes[idx].appenders;
        if !appenders.iter().any(|seen| Arc::ptr_eq(seen, &appender)) {
            appenders.push(appender);
        }
    }

    pub(crate) fn remove_node_appender(&self, idx: usize, name: &str) -> Option<Arc<Appender>> {
        let mut tree = self.write();
        let appenders = &mut tree.nodes[idx].appenders;
        let at = appenders.iter().position(|a| a.name() == name)?;
        Some(appenders.remove(at))
    }

    pub(crate) fn node_appender_names(&self, idx: usize) -> Vec<String> {
        self.read().nodes[idx]
            .appenders
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    /// Collect the appenders an event emitted at `idx` must reach: the node's
    /// own appenders, then each ancestor's while additivity holds, in
    /// insertion order per node, de-duplicated by instance identity.
    pub(crate) fn appenders_for(&self, idx: usize) -> Vec<Arc<Appender>> {
        let tree = self.read();
        let mut collected: Vec<Arc<Appender>> = Vec::new();
        let mut cursor = idx;
        loop {
            let node = &tree.nodes[cursor];
            for appender in &node.appenders {
                if !collected.iter().any(|seen| Arc::ptr_eq(seen, appender)) {
                    collected.push(appender.clone());
                }
            }
            if !node.additive || cursor == ROOT {
                break;
            }
            cursor = node.parent;
        }
        collected
    }

    /// One-time diagnostic for events that found no appender anywhere on
    /// their walk.
    pub(crate) fn report_unconfigured(&self, name: &str) {
        if !self.unconfigured_reported.swap(true, Ordering::Relaxed) {
            let _ = writeln!(
                std::io::stderr(),
                "logtree: no appenders could be found for logger \"{name}\"; events are being dropped"
            );
        }
    }
}

static DEFAULT: OnceLock<Arc<Hierarchy>> = OnceLock::new();

/// The process-wide default hierarchy, created on first use.
pub fn hierarchy() -> Arc<Hierarchy> {
    DEFAULT.get_or_init(Hierarchy::new).clone()
}

/// Shorthand for [`hierarchy()`]`.get_logger(name)`.
pub fn logger(name: &str) -> Logger {
    hierarchy().get_logger(name)
}

/// Chooses the [`Hierarchy`] a logging facade operates on, allowing one
/// repository per isolation context (tenant, test, plugin).
pub trait Selector: Send + Sync + 'static {
    /// The hierarchy for the current context.
    fn select(&self) -> Arc<Hierarchy>;
}

/// A selector that always answers the process-wide default hierarchy.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct DefaultSelector {}

impl Selector for DefaultSelector {
    fn select(&self) -> Arc<Hierarchy> {
        hierarchy()
    }
}
