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
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;

use super::buffer::{ByteSink, ByteSource};
use super::column::ColumnBuilder;
use super::error::{AggError, AggResult};

/// Address of one aggregation state inside caller-owned memory.
///
/// The region behind it is exactly `size_of_data()` bytes, aligned to
/// `align_of_data()`, and is never owned or freed by the descriptor.
pub type AggStatePtr = usize;
pub type ConstAggStatePtr = usize;

/// Literal configuration value for parametric aggregate functions.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Utf8(String),
}

/// Descriptor for one aggregate function variant.
///
/// An instance carries only metadata: identity, the type contract fixed by
/// `set_arguments`/`set_parameters`, and the memory contract of its state.
/// The states themselves live in memory supplied by the caller (an arena, a
/// hash table payload, the stack); every data call names one explicitly.
///
/// Configuration happens exactly once, through `&mut self`; afterwards the
/// descriptor is immutable and an `Arc<dyn AggregateFunction>` can be shared
/// across any number of threads, each driving its own state regions. A single
/// state region is not thread-safe.
///
/// Lifecycle of a region: `create` makes it live, `add`/`merge`/
/// `deserialize_merge` mutate it, `serialize`/`insert_result_into` read it,
/// `destroy` ends it. When `has_trivial_destructor()` is true the caller may
/// skip `destroy` entirely and release the backing memory in bulk.
pub trait AggregateFunction: Send + Sync {
    fn name(&self) -> &str;

    /// Fixes the input argument types. Must run exactly once, before any
    /// data-manipulating call.
    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()>;

    /// Fixes literal parameters, for parametric variants only. When used it
    /// must run before any data-manipulating call.
    fn set_parameters(&mut self, _params: &[ParamValue]) -> AggResult<()> {
        Err(AggError::unsupported(format!(
            "aggregate function {} doesn't allow parameters",
            self.name()
        )))
    }

    /// Result type of finalization. Valid only after `set_arguments`.
    fn return_type(&self) -> AggResult<DataType>;

    fn size_of_data(&self) -> usize;
    fn align_of_data(&self) -> usize;

    /// True when `destroy` has no observable effect, so callers may bulk-free
    /// the backing memory without per-state destroy calls.
    fn has_trivial_destructor(&self) -> bool;

    /// Placement-constructs a logically empty state at `place`. Any address
    /// meeting the size/alignment contract is acceptable.
    fn create(&self, place: AggStatePtr);

    /// Destructs the state at `place`. Infallible: it can run while
    /// unwinding from an unrelated failure.
    fn destroy(&self, place: AggStatePtr);

    /// Folds one input row into the state.
    fn add(&self, place: AggStatePtr, columns: &[ArrayRef], row: usize) -> AggResult<()>;

    /// Combines the state at `rhs` into `place`, in place. `rhs` is left
    /// untouched and stays valid and destroyable. Whether the combination is
    /// commutative is documented per variant.
    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()>;

    /// Writes a binary encoding of the live state. The encoding is private to
    /// this variant and only promises to round-trip through its own
    /// `deserialize_merge`. Never called on a region that was not created.
    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()>;

    /// Reads one binary encoding and merges it into the already-created state
    /// at `place`. A merge, not a replace, so a stream of partial states can
    /// be folded in without a scratch state. Repeatable on a non-empty state.
    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()>;

    fn serialize_text(&self, _place: ConstAggStatePtr, _sink: &mut dyn ByteSink) -> AggResult<()> {
        Err(AggError::unsupported(format!(
            "serialize_text is not supported for {}",
            self.name()
        )))
    }

    fn deserialize_merge_text(
        &self,
        _place: AggStatePtr,
        _source: &mut dyn ByteSource,
    ) -> AggResult<()> {
        Err(AggError::unsupported(format!(
            "deserialize_merge_text is not supported for {}",
            self.name()
        )))
    }

    /// Finalizes the state into exactly one value appended to `to`. Fails
    /// with `Unsupported` when `can_be_final()` is false.
    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()>;

    /// False for state-only combinator variants that support further merging
    /// but never finalization.
    fn can_be_final(&self) -> bool {
        true
    }
}

/// Shared handle to a configured, immutable descriptor.
pub type AggregateFunctionPtr = Arc<dyn AggregateFunction>;
