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

//! One broken destination must never suppress output to healthy ones, and
//! nothing raised inside the pipeline may reach application code.

use std::sync::Arc;
use std::sync::Mutex;

use logtree::Append;
use logtree::Appender;
use logtree::Error;
use logtree::Hierarchy;
use logtree::Level;
use logtree::Record;
use logtree::Trap;
use logtree::append::Testing;

#[derive(Debug)]
struct Exploding;

impl Append for Exploding {
    fn append(&self, _record: &Record) -> Result<(), Error> {
        Err(Error::new("destination unreachable"))
    }
}

#[derive(Debug, Default, Clone)]
struct CollectingTrap(Arc<Mutex<Vec<String>>>);

impl Trap for CollectingTrap {
    fn trap(&self, err: &Error) {
        self.0.lock().unwrap().push(err.to_string());
    }
}

#[test]
fn a_failing_appender_does_not_suppress_healthy_ones() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("mixed");

    let trap = CollectingTrap::default();
    logger.add_appender(
        Appender::builder("broken")
            .trap(trap.clone())
            .target(Exploding)
            .build(),
    );
    let testing = Testing::default();
    let lines = testing.buffer();
    logger.add_appender(Appender::builder("healthy").target(testing).build());

    logger.info("one event");

    assert_eq!(lines.lock().unwrap().len(), 1);
    let trapped = trap.0.lock().unwrap();
    assert_eq!(trapped.len(), 1);
    assert!(trapped[0].contains("destination unreachable"));
    assert!(trapped[0].contains("broken"));
}

#[test]
fn failures_on_an_ancestor_do_not_stop_the_walk() {
    let hierarchy = Hierarchy::new();
    let parent = hierarchy.get_logger("walk");
    let child = hierarchy.get_logger("walk.leaf");

    let trap = CollectingTrap::default();
    child.add_appender(
        Appender::builder("broken")
            .trap(trap.clone())
            .target(Exploding)
            .build(),
    );
    let testing = Testing::default();
    let lines = testing.buffer();
    parent.add_appender(Appender::builder("upstream").target(testing).build());

    child.warn("event");

    assert_eq!(lines.lock().unwrap().len(), 1);
    assert_eq!(trap.0.lock().unwrap().len(), 1);
}

#[test]
fn panicking_message_thunks_are_contained() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("contained");
    let testing = Testing::default();
    let lines = testing.buffer();
    logger.add_appender(Appender::builder("sink").target(testing).build());

    logger.log_with(Level::Info, || panic!("thunk exploded"));

    // the event still went out, with an empty payload
    assert_eq!(lines.lock().unwrap().len(), 1);
}

#[test]
fn panicking_display_impls_are_contained() {
    struct Grenade;

    impl std::fmt::Display for Grenade {
        fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            panic!("display exploded")
        }
    }

    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("contained.display");
    let testing = Testing::default();
    let lines = testing.buffer();
    logger.add_appender(Appender::builder("sink").target(testing).build());

    logger.error(Grenade);
    assert_eq!(lines.lock().unwrap().len(), 1);
}

#[test]
fn error_chains_ride_along_with_the_event() {
    let hierarchy = Hierarchy::new();
    let logger = hierarchy.get_logger("chains");
    let testing = Testing::default();
    let lines = testing.buffer();
    logger.add_appender(Appender::builder("sink").target(testing).build());

    let io = std::io::Error::other("connection reset");
    let wrapped = Error::new("flush failed").with_source(io);
    logger.log_error(Level::Error, "request aborted", &wrapped);

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("request aborted"));
    assert!(lines[0].contains("connection reset"));
}
