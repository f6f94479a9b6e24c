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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;
use std::time::Instant;

use crate::Error;
use crate::Record;
use crate::append::Append;
use crate::append::Appender;

/// Creates appenders on demand for the [`Routing`] appender.
pub trait AppenderFactory: Send + Sync + 'static {
    /// Create the appender for a routing key seen for the first time.
    fn create(&self, key: &str, record: &Record) -> Result<Arc<Appender>, Error>;
}

impl<F> AppenderFactory for F
where
    F: Fn(&str, &Record) -> Result<Arc<Appender>, Error> + Send + Sync + 'static,
{
    fn create(&self, key: &str, record: &Record) -> Result<Arc<Appender>, Error> {
        self(key, record)
    }
}

struct Route {
    appender: Arc<Appender>,
    last_used: Instant,
}

/// An appender that multiplexes records over appenders keyed by a mapped
/// diagnostic context value, creating them on demand.
///
/// At most one appender is ever created per key: concurrent records carrying
/// the same previously-unseen key resolve to a single factory invocation
/// (get-or-create runs under the route map's write lock, independent of the
/// hierarchy lock).
///
/// # Examples
///
/// ```no_run
/// use logtree::Appender;
/// use logtree::append::FileBuilder;
/// use logtree::append::Routing;
///
/// let routing = Routing::new("tenant", |key: &str, _record: &logtree::Record| {
///     let target = FileBuilder::new(format!("logs/{key}.log")).build()?;
///     Ok(Appender::builder(format!("tenant-{key}")).target(target).build())
/// });
/// ```
pub struct Routing {
    key: String,
    factory: Box<dyn AppenderFactory>,
    routes: RwLock<HashMap<String, Route>>,
    fallback: Option<Arc<Appender>>,
}

impl fmt::Debug for Routing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routing")
            .field("key", &self.key)
            .field("fallback", &self.fallback.as_ref().map(|a| a.name()))
            .finish()
    }
}

impl Routing {
    /// Create a routing appender keyed on the given MDC entry.
    pub fn new(key: impl Into<String>, factory: impl AppenderFactory) -> Self {
        Self {
            key: key.into(),
            factory: Box::new(factory),
            routes: RwLock::new(HashMap::new()),
            fallback: None,
        }
    }

    /// Set the appender receiving records that carry no routing key.
    /// Without one, keyless records are reported as errors and dropped.
    pub fn with_fallback(mut self, fallback: Arc<Appender>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// The number of live routes.
    pub fn route_count(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Close and evict every route that has not been used for longer than
    /// `max_idle`. Returns the number of evicted routes.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let stale: Vec<String> = routes
            .iter()
            .filter(|(_, route)| now.duration_since(route.last_used) > max_idle)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            if let Some(route) = routes.remove(key) {
                route.appender.close();
            }
        }
        stale.len()
    }

    fn select(&self, key: &str, record: &Record) -> Result<Arc<Appender>, Error> {
        if let Some(route) = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(route.appender.clone());
        }

        // single flight: the factory runs under the write lock, so a key is
        // only ever materialized once
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(route) = routes.get_mut(key) {
            route.last_used = Instant::now();
            return Ok(route.appender.clone());
        }
        let appender = self.factory.create(key, record).map_err(|err| {
            err.with_context("routing key", key)
        })?;
        routes.insert(
            key.to_string(),
            Route {
                appender: appender.clone(),
                last_used: Instant::now(),
            },
        );
        Ok(appender)
    }

    fn touch(&self, key: &str) {
        if let Some(route) = self
            .routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(key)
        {
            route.last_used = Instant::now();
        }
    }
}

impl Append for Routing {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let Some(key) = record.mdc_value(&self.key) else {
            return match &self.fallback {
                Some(fallback) => {
                    fallback.dispatch(record);
                    Ok(())
                }
                None => Err(Error::new("record carries no routing key")
                    .with_context("key", &self.key)
                    .with_context("logger", record.logger())),
            };
        };

        let key = key.to_string();
        let appender = self.select(&key, record)?;
        self.touch(&key);
        appender.dispatch(record);
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        for route in routes.values() {
            route.appender.flush();
        }
        if let Some(fallback) = &self.fallback {
            fallback.flush();
        }
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        for (_, route) in routes.drain() {
            route.appender.close();
        }
        if let Some(fallback) = &self.fallback {
            fallback.close();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::Testing;
    use crate::record::Level;

    fn record_with_key(key: Option<&str>) -> Record {
        let mut mdc = std::collections::BTreeMap::new();
        if let Some(key) = key {
            mdc.insert("tenant".to_string(), key.to_string());
        }
        Record::builder()
            .logger("app")
            .level(Level::Info)
            .payload("x")
            .mdc(mdc)
            .build()
    }

    fn testing_factory() -> impl AppenderFactory {
        |key: &str, _record: &Record| {
            Ok(Appender::builder(format!("route-{key}"))
                .target(Testing::default())
                .build())
        }
    }

    #[test]
    fn one_route_per_key() {
        let routing = Routing::new("tenant", testing_factory());
        routing.append(&record_with_key(Some("a"))).unwrap();
        routing.append(&record_with_key(Some("a"))).unwrap();
        routing.append(&record_with_key(Some("b"))).unwrap();
        assert_eq!(routing.route_count(), 2);
    }

    #[test]
    fn keyless_record_without_fallback_is_an_error() {
        let routing = Routing::new("tenant", testing_factory());
        assert!(routing.append(&record_with_key(None)).is_err());
    }

    #[test]
    fn keyless_record_reaches_fallback() {
        let testing = Testing::default();
        let lines = testing.buffer();
        let fallback = Appender::builder("fallback").target(testing).build();
        let routing = Routing::new("tenant", testing_factory()).with_fallback(fallback);
        routing.append(&record_with_key(None)).unwrap();
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn purge_evicts_stale_routes() {
        let routing = Routing::new("tenant", testing_factory());
        routing.append(&record_with_key(Some("a"))).unwrap();
        assert_eq!(routing.purge_idle(Duration::from_secs(3600)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(routing.purge_idle(Duration::ZERO), 1);
        assert_eq!(routing.route_count(), 0);
    }
}
