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
use thiserror::Error;

pub type AggResult<T> = Result<T, AggError>;

/// Errors surfaced by aggregate function descriptors. `destroy` is the one
/// operation that can never fail.
#[derive(Debug, Error)]
pub enum AggError {
    /// Unsupported argument types or invalid parameter literals. Raised only
    /// during configuration, before any state exists.
    #[error("aggregate configuration error: {0}")]
    Configuration(String),
    /// An optional capability this variant does not implement.
    #[error("{0}")]
    Unsupported(String),
    /// Malformed bytes encountered while deserializing a state.
    #[error("corrupt aggregate state: {0}")]
    CorruptState(String),
    /// Plan/runtime mismatch that a well-formed query never produces.
    #[error("internal aggregate error: {0}")]
    Internal(String),
}

impl AggError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        AggError::Configuration(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        AggError::Unsupported(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        AggError::CorruptState(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        AggError::Internal(msg.into())
    }
}
