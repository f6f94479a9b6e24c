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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use logtree::Append;
use logtree::Appender;
use logtree::Error;
use logtree::Hierarchy;
use logtree::HierarchyListener;
use logtree::Level;
use logtree::LevelFilter;
use logtree::Logger;
use logtree::Record;
use logtree::append::Testing;

/// An appender target that records its tag into a shared journal, so tests
/// can assert on dispatch order across appenders.
#[derive(Debug)]
struct Tagger {
    tag: &'static str,
    journal: Arc<Mutex<Vec<&'static str>>>,
}

impl Append for Tagger {
    fn append(&self, _record: &Record) -> Result<(), Error> {
        self.journal.lock().unwrap().push(self.tag);
        Ok(())
    }
}

fn tagged(
    name: &str,
    tag: &'static str,
    journal: &Arc<Mutex<Vec<&'static str>>>,
) -> Arc<Appender> {
    Appender::builder(name)
        .target(Tagger {
            tag,
            journal: journal.clone(),
        })
        .build()
}

#[test]
fn effective_level_defaults_to_root() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("fresh.logger");
    assert_eq!(logger.level(), None);
    assert_eq!(logger.effective_level(), LevelFilter::Debug);
}

#[test]
fn nearest_ancestor_wins() {
    let hierarchy = Hierarchy::new();
    let leaf = hierarchy.get_logger("a.b.c");

    hierarchy.get_logger("a").set_level(Some(LevelFilter::Warn));
    assert_eq!(leaf.effective_level(), LevelFilter::Warn);

    hierarchy
        .get_logger("a.b")
        .set_level(Some(LevelFilter::Debug));
    assert_eq!(leaf.effective_level(), LevelFilter::Debug);
}

#[test]
fn lazy_father_resolution() {
    let hierarchy = Hierarchy::new();
    // creates placeholders for "a" and "a.b"
    let leaf = hierarchy.get_logger("a.b.c");
    hierarchy.get_logger("a").set_level(Some(LevelFilter::Info));

    // configuring the intermediate node later must shadow "a"
    hierarchy
        .get_logger("a.b")
        .set_level(Some(LevelFilter::Error));
    assert_eq!(leaf.effective_level(), LevelFilter::Error);
}

#[test]
fn additivity_walks_leaf_to_root_in_order() {
    let hierarchy = Hierarchy::new();
    let journal = Arc::new(Mutex::new(Vec::new()));

    let parent = hierarchy.get_logger("x");
    parent.add_appender(tagged("a1", "A1", &journal));
    let child = hierarchy.get_logger("x.y");
    child.add_appender(tagged("a2", "A2", &journal));

    child.info("event");
    assert_eq!(*journal.lock().unwrap(), vec!["A2", "A1"]);

    journal.lock().unwrap().clear();
    child.set_additive(false);
    child.info("event");
    assert_eq!(*journal.lock().unwrap(), vec!["A2"]);
}

#[test]
fn shared_appender_runs_once_per_event() {
    let hierarchy = Hierarchy::new();
    let testing = Testing::default();
    let lines = testing.buffer();
    let shared = Appender::builder("shared").target(testing).build();

    hierarchy.get_logger("x").add_appender(shared.clone());
    hierarchy.get_logger("x.y").add_appender(shared);

    hierarchy.get_logger("x.y").info("event");
    assert_eq!(lines.lock().unwrap().len(), 1);
}

#[test]
fn duplicate_attachment_is_kept_once() {
    let hierarchy = Hierarchy::new();
    let appender = Appender::builder("dup").target(Testing::default()).build();
    let logger = hierarchy.get_logger("dup.holder");
    logger.add_appender(appender.clone());
    logger.add_appender(appender);
    assert_eq!(logger.appender_names(), vec!["dup"]);
}

#[test]
fn disabled_levels_never_evaluate_the_message() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("lazy");
    logger.set_level(Some(LevelFilter::Info));
    logger.add_appender(Appender::builder("sink").target(Testing::default()).build());

    let evaluations = AtomicUsize::new(0);
    logger.log_with(Level::Debug, || {
        evaluations.fetch_add(1, Ordering::SeqCst);
        "expensive".to_string()
    });
    assert_eq!(evaluations.load(Ordering::SeqCst), 0);

    logger.log_with(Level::Info, || {
        evaluations.fetch_add(1, Ordering::SeqCst);
        "expensive".to_string()
    });
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);
}

#[test]
fn hierarchy_threshold_only_raises_the_bar() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("floor");
    logger.set_level(Some(LevelFilter::Debug));

    hierarchy.set_threshold(LevelFilter::Error);
    assert!(!logger.enabled(Level::Warn));
    assert!(logger.enabled(Level::Error));

    // a permissive threshold cannot lower a per-logger level
    logger.set_level(Some(LevelFilter::Warn));
    hierarchy.set_threshold(LevelFilter::Trace);
    assert!(!logger.enabled(Level::Info));
}

#[test]
fn off_rejects_everything_all_accepts_everything() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("sentinels");

    logger.set_level(Some(LevelFilter::Off));
    assert!(!logger.enabled(Level::Fatal));

    logger.set_level(Some(LevelFilter::All));
    assert!(logger.enabled(Level::Trace));
}

#[test]
fn reset_detaches_and_closes_appenders() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("reset.me");
    logger.set_level(Some(LevelFilter::Error));
    logger.set_additive(false);
    let appender = Appender::builder("victim").target(Testing::default()).build();
    logger.add_appender(appender.clone());

    hierarchy.reset_configuration();

    assert!(appender.is_closed());
    assert!(logger.appender_names().is_empty());
    assert_eq!(logger.level(), None);
    assert!(logger.additive());
    assert_eq!(logger.effective_level(), LevelFilter::Debug);
    assert!(hierarchy.exists("reset.me"), "tree structure is preserved");
}

#[test]
fn shutdown_is_idempotent_and_terminal() {
    let hierarchy = Hierarchy::new();
    let testing = Testing::default();
    let lines = testing.buffer();
    let logger = hierarchy.get_logger("doomed");
    logger.add_appender(Appender::builder("sink").target(testing).build());

    logger.info("before");
    hierarchy.shutdown();
    hierarchy.shutdown();

    assert!(hierarchy.is_shutdown());
    assert!(!logger.enabled(Level::Fatal));
    logger.fatal("after");
    assert_eq!(lines.lock().unwrap().len(), 1, "only the pre-shutdown event");
}

#[derive(Debug, Default)]
struct NameCollector(Mutex<Vec<String>>);

impl HierarchyListener for NameCollector {
    fn logger_created(&self, logger: &Logger) {
        self.0.lock().unwrap().push(logger.name().to_string());
    }
}

#[test]
fn listeners_see_ancestors_before_descendants() {
    let hierarchy = Hierarchy::new();
    let collector = Arc::new(NameCollector::default());
    hierarchy.add_listener(collector.clone());

    hierarchy.get_logger("p.q.r");
    assert_eq!(*collector.0.lock().unwrap(), vec!["p", "p.q", "p.q.r"]);

    // an existing node is not re-announced
    hierarchy.get_logger("p.q");
    assert_eq!(collector.0.lock().unwrap().len(), 3);
}

#[test]
fn concurrent_lookups_create_a_single_node() {
    let hierarchy = Hierarchy::new();
    let collector = Arc::new(NameCollector::default());
    hierarchy.add_listener(collector.clone());

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let hierarchy = hierarchy.clone();
            std::thread::spawn(move || hierarchy.get_logger("raced.node"))
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let created = collector.0.lock().unwrap();
    assert_eq!(
        created.iter().filter(|name| *name == "raced.node").count(),
        1
    );
    assert_eq!(created.iter().filter(|name| *name == "raced").count(), 1);
}

#[test]
fn empty_name_is_the_root() {
    let hierarchy = Hierarchy::new();
    let root = hierarchy.get_logger("");
    assert_eq!(root.name(), "root");
    assert_eq!(root.level(), Some(LevelFilter::Debug));

    // clearing the root level restores the default instead of breaking the
    // effective-level walk
    root.set_level(None);
    assert_eq!(root.level(), Some(LevelFilter::Debug));
}
