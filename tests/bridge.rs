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

//! The `log` crate bridge owns the process-global logger slot, so everything
//! lives in this one integration test binary.

use logtree::Appender;
use logtree::Hierarchy;
use logtree::LevelFilter;
use logtree::append::Testing;
use logtree::bridge::LogBridge;

#[test]
fn log_records_route_through_the_hierarchy() {
    let hierarchy = Hierarchy::new();
    let testing = Testing::default();
    let lines = testing.buffer();
    hierarchy
        .root()
        .add_appender(Appender::builder("sink").target(testing).build());
    hierarchy
        .get_logger("noisy")
        .set_level(Some(LevelFilter::Warn));

    LogBridge::new(hierarchy.clone())
        .install(log::LevelFilter::Trace)
        .unwrap();

    log::info!(target: "app.server", "accepted {}", 7);
    log::info!(target: "noisy.module", "filtered out");
    log::warn!(target: "noisy.module", "let through");
    log::trace!(target: "app.server", "below the root level");

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("app.server"));
    assert!(lines[0].contains("accepted 7"));
    assert!(lines[1].contains("let through"));

    // the bridge auto-vivified hierarchy nodes for the targets it saw
    assert!(hierarchy.exists("app.server"));
    assert!(hierarchy.exists("noisy.module"));
}
