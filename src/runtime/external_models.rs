// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Registry of user-defined external models (e.g. scoring models).
//!
//! Models are loaded from configuration at startup and refreshed by a
//! background thread. Readers grab the currently published shared handle and
//! never wait on an in-flight reload; a failed reload keeps the previously
//! working instance.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::common::app_config::{ModelEntry, ModelsConfig};

/// A loaded, shareable external resource.
pub trait ExternalLoadable: Send + Sync {
    fn name(&self) -> &str;
}

pub type ModelPtr = Arc<dyn ExternalLoadable>;

/// Materializes one model from its configuration entry. Abstracted so the
/// refresh machinery is independent of any concrete model format.
pub trait ModelLoader: Send + Sync {
    fn load(&self, entry: &ModelEntry) -> Result<ModelPtr>;
}

struct Inner {
    loader: Box<dyn ModelLoader>,
    entries: Vec<ModelEntry>,
    models: RwLock<HashMap<String, ModelPtr>>,
    shutdown: Mutex<bool>,
    shutdown_cv: Condvar,
}

pub struct ExternalModels {
    inner: Arc<Inner>,
    refresh_thread: Option<JoinHandle<()>>,
}

impl ExternalModels {
    /// Loads every configured model immediately. A failed initial load is
    /// fatal only when `throw_on_load_error` is set; otherwise the model is
    /// simply absent until a later refresh succeeds. With a nonzero
    /// `refresh_secs` a background thread reloads all entries periodically.
    pub fn new(config: &ModelsConfig, loader: Box<dyn ModelLoader>) -> Result<Self> {
        let inner = Arc::new(Inner {
            loader,
            entries: config.entries.clone(),
            models: RwLock::new(HashMap::new()),
            shutdown: Mutex::new(false),
            shutdown_cv: Condvar::new(),
        });

        for entry in &inner.entries {
            match inner.loader.load(entry) {
                Ok(model) => {
                    publish(&inner, &entry.name, model);
                    info!("loaded external model {}", entry.name);
                }
                Err(err) if config.throw_on_load_error => {
                    return Err(err).with_context(|| format!("load model {} failed", entry.name));
                }
                Err(err) => {
                    warn!("initial load of model {} failed: {err:#}", entry.name);
                }
            }
        }

        let refresh_thread = if config.refresh_secs > 0 && !inner.entries.is_empty() {
            let inner = Arc::clone(&inner);
            let period = Duration::from_secs(config.refresh_secs);
            Some(
                thread::Builder::new()
                    .name("model-refresh".to_string())
                    .spawn(move || refresh_loop(&inner, period))
                    .context("spawn model refresh thread")?,
            )
        } else {
            None
        };

        Ok(Self {
            inner,
            refresh_thread,
        })
    }

    /// Current published handle for `name`, if any load has ever succeeded.
    pub fn get_model(&self, name: &str) -> Option<ModelPtr> {
        let map = self.inner.models.read().ok()?;
        map.get(name).cloned()
    }

    /// Forcibly reloads one model, bypassing the refresh schedule.
    pub fn reload_model(&self, name: &str) -> Result<()> {
        let entry = self
            .inner
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| anyhow!("unknown model: {name}"))?;
        let model = self
            .inner
            .loader
            .load(entry)
            .with_context(|| format!("reload model {name} failed"))?;
        publish(&self.inner, name, model);
        Ok(())
    }
}

impl Drop for ExternalModels {
    fn drop(&mut self) {
        if let Ok(mut stop) = self.inner.shutdown.lock() {
            *stop = true;
        }
        self.inner.shutdown_cv.notify_all();
        if let Some(handle) = self.refresh_thread.take() {
            let _ = handle.join();
        }
    }
}

fn publish(inner: &Inner, name: &str, model: ModelPtr) {
    if let Ok(mut map) = inner.models.write() {
        map.insert(name.to_string(), model);
    }
}

fn refresh_all(inner: &Inner) {
    for entry in &inner.entries {
        match inner.loader.load(entry) {
            Ok(model) => publish(inner, &entry.name, model),
            // Stale but available: the previously published handle stays.
            Err(err) => warn!(
                "refresh of model {} failed, keeping previous instance: {err:#}",
                entry.name
            ),
        }
    }
}

fn refresh_loop(inner: &Inner, period: Duration) {
    loop {
        {
            let mut guard = match inner.shutdown.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            // The flag must be checked before every wait: a notification sent
            // before the thread blocks would otherwise be lost and the join
            // in drop would stall for the whole period.
            loop {
                if *guard {
                    return;
                }
                let (next, timeout) = match inner.shutdown_cv.wait_timeout(guard, period) {
                    Ok(res) => res,
                    Err(_) => return,
                };
                guard = next;
                if timeout.timed_out() {
                    break;
                }
            }
        }
        refresh_all(inner);
    }
}
