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
use super::super::helper::AggregateFunctionHelper;
use super::common::{is_numeric_type, numeric_value_at};

#[derive(Debug, Default)]
pub(crate) struct QuantileState {
    samples: Vec<f64>,
}

/// Exact `quantile(x)` over one numeric argument, with an optional numeric
/// level parameter in [0, 1] (default 0.5, i.e. the median). The state keeps
/// every non-null value; finalization sorts once and picks the nearest rank.
/// Merge concatenates samples, which is order-insensitive because sorting
/// happens at finalization, so the function is effectively commutative.
pub(crate) struct QuantileAgg {
    configured: bool,
    level: f64,
}

impl QuantileAgg {
    pub(crate) fn new() -> Self {
        Self {
            configured: false,
            level: 0.5,
        }
    }

    fn ensure_configured(&self) -> AggResult<()> {
        if !self.configured {
            return Err(AggError::configuration(
                "quantile: set_arguments must run before data calls",
            ));
        }
        Ok(())
    }
}

impl AggregateFunctionHelper for QuantileAgg {
    type Data = QuantileState;
}

impl AggregateFunction for QuantileAgg {
    fn name(&self) -> &str {
        "quantile"
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        if self.configured {
            return Err(AggError::configuration("quantile: arguments already set"));
        }
        let [arg] = arguments else {
            return Err(AggError::configuration(format!(
                "quantile expects exactly one argument, got {}",
                arguments.len()
            )));
        };
        if !is_numeric_type(arg) {
            return Err(AggError::configuration(format!(
                "quantile does not support argument type {arg:?}"
            )));
        }
        self.configured = true;
        Ok(())
    }

    fn set_parameters(&mut self, params: &[ParamValue]) -> AggResult<()> {
        if self.configured {
            return Err(AggError::configuration(
                "quantile: set_parameters must run before data calls",
            ));
        }
        let [param] = params else {
            return Err(AggError::configuration(format!(
                "quantile expects exactly one parameter, got {}",
                params.len()
            )));
        };
        let level = match param {
            ParamValue::Float64(v) => *v,
            ParamValue::Int64(v) => *v as f64,
            other => {
                return Err(AggError::configuration(format!(
                    "quantile level parameter must be numeric, got {other:?}"
                )));
            }
        };
        if !(0.0..=1.0).contains(&level) {
            return Err(AggError::configuration(format!(
                "quantile level must be in [0, 1], got {level}"
            )));
        }
        self.level = level;
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
            .ok_or_else(|| AggError::internal("quantile input column missing"))?;
        if let Some(v) = numeric_value_at(col, row)? {
            Self::data(place).samples.push(v);
        }
        Ok(())
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.ensure_configured()?;
        let rhs_samples = Self::data_ref(rhs).samples.clone();
        Self::data(place).samples.extend(rhs_samples);
        Ok(())
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        let state = Self::data_ref(place);
        sink.write_u64_le(state.samples.len() as u64)?;
        for v in &state.samples {
            sink.write_f64_le(*v)?;
        }
        Ok(())
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        let count = source.read_u64_le()?;
        for _ in 0..count {
            let v = source.read_f64_le()?;
            Self::data(place).samples.push(v);
        }
        Ok(())
    }

    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()> {
        self.ensure_configured()?;
        let state = Self::data_ref(place);
        if state.samples.is_empty() {
            to.append_null();
            return Ok(());
        }
        let mut sorted = state.samples.clone();
        sorted.sort_by(f64::total_cmp);
        // Nearest-rank: the smallest index whose rank covers the level.
        let n = sorted.len();
        let rank = (self.level * n as f64).ceil() as usize;
        let idx = rank.saturating_sub(1).min(n - 1);
        to.append_f64(sorted[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_out_of_range_is_rejected() {
        let mut func = QuantileAgg::new();
        let err = func
            .set_parameters(&[ParamValue::Float64(1.5)])
            .unwrap_err();
        assert!(matches!(err, AggError::Configuration(_)));
        // The variant stays usable after a failed configuration attempt.
        func.set_parameters(&[ParamValue::Float64(0.9)]).unwrap();
        func.set_arguments(&[DataType::Float64]).unwrap();
        assert_eq!(func.return_type().unwrap(), DataType::Float64);
    }

    #[test]
    fn test_non_numeric_level_is_rejected() {
        let mut func = QuantileAgg::new();
        let err = func
            .set_parameters(&[ParamValue::Utf8("p50".to_string())])
            .unwrap_err();
        assert!(matches!(err, AggError::Configuration(_)));
    }
}
