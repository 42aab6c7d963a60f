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
use super::super::function::{AggStatePtr, AggregateFunction, ConstAggStatePtr};
use super::super::helper::AggregateFunctionHelper;
use super::common::{is_numeric_type, numeric_value_at};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AvgState {
    sum: f64,
    count: i64,
}

/// `avg(x)` over one numeric argument, Float64 result, NULL over an empty
/// group. Merge is commutative (sum and count add independently).
pub(crate) struct AvgAgg {
    configured: bool,
}

impl AvgAgg {
    pub(crate) fn new() -> Self {
        Self { configured: false }
    }

    fn ensure_configured(&self) -> AggResult<()> {
        if !self.configured {
            return Err(AggError::configuration(
                "avg: set_arguments must run before data calls",
            ));
        }
        Ok(())
    }
}

impl AggregateFunctionHelper for AvgAgg {
    type Data = AvgState;
}

impl AggregateFunction for AvgAgg {
    fn name(&self) -> &str {
        "avg"
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        if self.configured {
            return Err(AggError::configuration("avg: arguments already set"));
        }
        let [arg] = arguments else {
            return Err(AggError::configuration(format!(
                "avg expects exactly one argument, got {}",
                arguments.len()
            )));
        };
        if !is_numeric_type(arg) {
            return Err(AggError::configuration(format!(
                "avg does not support argument type {arg:?}"
            )));
        }
        self.configured = true;
        Ok(())
    }

    fn return_type(&self) -> AggResult<DataType> {
        self.ensure_configured()?;
        Ok(DataType::Float64)
    }

    fn size_of_data(&self) -> usize {
        Self::data_size()
    }

    fn align_of_data(&self) -> usize {
        Self::data_align()
    }

    fn has_trivial_destructor(&self) -> bool {
        Self::data_is_trivially_destructible()
    }

    fn create(&self, place: AggStatePtr) {
        Self::create_data(place)
    }

    fn destroy(&self, place: AggStatePtr) {
        Self::destroy_data(place)
    }

    fn add(&self, place: AggStatePtr, columns: &[ArrayRef], row: usize) -> AggResult<()> {
        self.ensure_configured()?;
        let col = columns
            .first()
            .ok_or_else(|| AggError::internal("avg input column missing"))?;
        if let Some(v) = numeric_value_at(col, row)? {
            let state = Self::data(place);
            state.sum += v;
            state.count += 1;
        }
        Ok(())
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.ensure_configured()?;
        let rhs = *Self::data_ref(rhs);
        let state = Self::data(place);
        state.sum += rhs.sum;
        state.count += rhs.count;
        Ok(())
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        let state = Self::data_ref(place);
        sink.write_f64_le(state.sum)?;
        sink.write_i64_le(state.count)
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        let sum = source.read_f64_le()?;
        let count = source.read_i64_le()?;
        if count < 0 {
            return Err(AggError::corrupt(format!("avg: negative count {count}")));
        }
        let state = Self::data(place);
        state.sum += sum;
        state.count += count;
        Ok(())
    }

    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()> {
        self.ensure_configured()?;
        let state = Self::data_ref(place);
        if state.count == 0 {
            to.append_null();
            return Ok(());
        }
        to.append_f64(state.sum / state.count as f64)
    }
}
