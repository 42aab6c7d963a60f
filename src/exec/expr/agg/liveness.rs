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

//! Debug-build tracker of live state addresses. Catches double `destroy` and
//! data calls on regions that were never created or already destroyed.
//!
//! `mark_created` does not reject an address that is already tracked: bulk
//! release of trivially-destructible states legitimately skips `destroy`, so
//! an arena may hand the same address out again later.

#[cfg(debug_assertions)]
mod guard {
    use std::collections::HashSet;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn table() -> MutexGuard<'static, HashSet<usize>> {
        static TABLE: OnceLock<Mutex<HashSet<usize>>> = OnceLock::new();
        TABLE
            .get_or_init(|| Mutex::new(HashSet::new()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn mark_created(place: usize) {
        table().insert(place);
    }

    pub(crate) fn mark_destroyed(place: usize) {
        assert!(
            table().remove(&place),
            "aggregate state at {place:#x} destroyed twice or never created"
        );
    }

    pub(crate) fn assert_live(place: usize) {
        assert!(
            table().contains(&place),
            "aggregate state at {place:#x} accessed without create (or after destroy)"
        );
    }
}

#[cfg(debug_assertions)]
pub(super) use guard::{assert_live, mark_created, mark_destroyed};

#[cfg(not(debug_assertions))]
#[inline(always)]
pub(super) fn mark_created(_place: usize) {}

#[cfg(not(debug_assertions))]
#[inline(always)]
pub(super) fn mark_destroyed(_place: usize) {}

#[cfg(not(debug_assertions))]
#[inline(always)]
pub(super) fn assert_live(_place: usize) {}
