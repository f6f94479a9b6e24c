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

//! Logtree is a hierarchical logging framework for Rust applications: named loggers
//! form a dot-separated tree, levels are inherited from ancestors, and events walk
//! the tree invoking every attached appender along the way.
//!
//! # Overview
//!
//! A [`Hierarchy`] owns the logger tree. Loggers are obtained by name; a logger
//! without an explicit level inherits the level of its nearest configured
//! ancestor. Appenders attached to a logger receive the events of that logger
//! and, by default, those of all its descendants (additivity). Layouts render
//! events to text, with [`PatternLayout`](layout::PatternLayout) compiling a
//! conversion-pattern mini-language once and reusing it for every event.
//!
//! # Examples
//!
//! Log to stdout through the process-wide hierarchy:
//!
//! ```
//! use logtree::Appender;
//! use logtree::append::Stdout;
//!
//! let logger = logtree::logger("app.server");
//! logger.add_appender(Appender::builder("console").target(Stdout::default()).build());
//!
//! logtree::info!(logger, "listening on {}", 8080);
//! ```
//!
//! Configure levels on an explicit hierarchy:
//!
//! ```
//! use logtree::Hierarchy;
//! use logtree::LevelFilter;
//!
//! let hierarchy = Hierarchy::new();
//! hierarchy.get_logger("app").set_level(Some(LevelFilter::Warn));
//!
//! let logger = hierarchy.get_logger("app.db.pool");
//! assert_eq!(logger.effective_level(), LevelFilter::Warn);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod diagnostic;
pub mod filter;
pub mod layout;
pub mod trap;

mod error;
pub use error::Error;

mod record;
pub use record::Level;
pub use record::LevelFilter;
pub use record::Record;
pub use record::RecordBuilder;

mod hierarchy;
pub use hierarchy::DefaultSelector;
pub use hierarchy::Hierarchy;
pub use hierarchy::HierarchyListener;
pub use hierarchy::Selector;
pub use hierarchy::hierarchy;
pub use hierarchy::logger;

mod logger;
pub use logger::Logger;

pub use append::Append;
pub use append::Appender;
pub use filter::Filter;
pub use layout::Layout;
pub use trap::Trap;

mod macros;
