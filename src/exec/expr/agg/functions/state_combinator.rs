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
use arrow::array::ArrayRef;
use arrow::datatypes::DataType;

use super::super::buffer::{ByteSink, ByteSource};
use super::super::column::ColumnBuilder;
use super::super::error::{AggError, AggResult};
use super::super::function::{AggStatePtr, AggregateFunction, ConstAggStatePtr, ParamValue};

/// `<name>_state`: keeps the nested function's intermediate state as the
/// result. Accumulation, merging and (de)serialization behave exactly like
/// the nested function; finalization is unsupported, so downstream stages
/// can only merge further.
pub(crate) struct StateCombinator {
    name: String,
    nested: Box<dyn AggregateFunction>,
}

impl StateCombinator {
    pub(crate) fn new(nested: Box<dyn AggregateFunction>) -> Self {
        let name = format!("{}_state", nested.name());
        Self { name, nested }
    }
}

impl AggregateFunction for StateCombinator {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        self.nested.set_arguments(arguments)
    }

    fn set_parameters(&mut self, params: &[ParamValue]) -> AggResult<()> {
        self.nested.set_parameters(params)
    }

    fn return_type(&self) -> AggResult<DataType> {
        self.nested.return_type()
    }

    fn size_of_data(&self) -> usize {
        self.nested.size_of_data()
    }

    fn align_of_data(&self) -> usize {
        self.nested.align_of_data()
    }

    fn has_trivial_destructor(&self) -> bool {
        self.nested.has_trivial_destructor()
    }

    fn create(&self, place: AggStatePtr) {
        self.nested.create(place)
    }

    fn destroy(&self, place: AggStatePtr) {
        self.nested.destroy(place)
    }

    fn add(&self, place: AggStatePtr, columns: &[ArrayRef], row: usize) -> AggResult<()> {
        self.nested.add(place, columns, row)
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.nested.merge(place, rhs)
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        self.nested.serialize(place, sink)
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        self.nested.deserialize_merge(place, source)
    }

    fn serialize_text(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        self.nested.serialize_text(place, sink)
    }

    fn deserialize_merge_text(
        &self,
        place: AggStatePtr,
        source: &mut dyn ByteSource,
    ) -> AggResult<()> {
        self.nested.deserialize_merge_text(place, source)
    }

    fn insert_result_into(
        &self,
        _place: ConstAggStatePtr,
        _to: &mut ColumnBuilder,
    ) -> AggResult<()> {
        Err(AggError::unsupported(format!(
            "{} produces no final value; it only supports further merging",
            self.name
        )))
    }

    fn can_be_final(&self) -> bool {
        false
    }
}
