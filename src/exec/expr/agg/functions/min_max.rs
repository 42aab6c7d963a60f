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
use std::cmp::Ordering;

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;

use super::super::buffer::{ByteSink, ByteSource};
use super::super::column::ColumnBuilder;
use super::super::error::{AggError, AggResult};
use super::super::function::{AggStatePtr, AggregateFunction, ConstAggStatePtr};
use super::super::helper::AggregateFunctionHelper;
use super::common::{
    AggScalarValue, append_scalar, compare_scalar_values, is_float_type, is_int_type, read_scalar,
    scalar_from_array, write_scalar,
};

#[derive(Debug, Default)]
pub(crate) struct MinMaxState {
    value: Option<AggScalarValue>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum MinMaxMode {
    Min,
    Max,
}

/// `min(x)` / `max(x)` over Int, Float, Boolean or Utf8 arguments. Integer
/// results widen to Int64 and float results to Float64. Merge is commutative.
/// A Utf8 state owns a String, so the destructor is not trivial.
pub(crate) struct MinMaxAgg {
    mode: MinMaxMode,
    arg_type: Option<DataType>,
}

impl MinMaxAgg {
    pub(crate) fn min() -> Self {
        Self {
            mode: MinMaxMode::Min,
            arg_type: None,
        }
    }

    pub(crate) fn max() -> Self {
        Self {
            mode: MinMaxMode::Max,
            arg_type: None,
        }
    }

    fn ensure_configured(&self) -> AggResult<()> {
        if self.arg_type.is_none() {
            return Err(AggError::configuration(format!(
                "{}: set_arguments must run before data calls",
                self.name()
            )));
        }
        Ok(())
    }

    fn scalar_matches_arg(value: &AggScalarValue, arg: &DataType) -> bool {
        match value {
            AggScalarValue::Int64(_) => is_int_type(arg),
            AggScalarValue::Float64(_) => is_float_type(arg),
            AggScalarValue::Boolean(_) => *arg == DataType::Boolean,
            AggScalarValue::Utf8(_) => *arg == DataType::Utf8,
        }
    }

    fn fold(&self, place: AggStatePtr, candidate: AggScalarValue) -> AggResult<()> {
        let state = Self::data(place);
        let keep_candidate = match &state.value {
            None => true,
            Some(current) => {
                let ord = compare_scalar_values(&candidate, current)?;
                match self.mode {
                    MinMaxMode::Min => ord == Ordering::Less,
                    MinMaxMode::Max => ord == Ordering::Greater,
                }
            }
        };
        if keep_candidate {
            state.value = Some(candidate);
        }
        Ok(())
    }
}

impl AggregateFunctionHelper for MinMaxAgg {
    type Data = MinMaxState;
}

impl AggregateFunction for MinMaxAgg {
    fn name(&self) -> &str {
        match self.mode {
            MinMaxMode::Min => "min",
            MinMaxMode::Max => "max",
        }
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        if self.arg_type.is_some() {
            return Err(AggError::configuration(format!(
                "{}: arguments already set",
                self.name()
            )));
        }
        let [arg] = arguments else {
            return Err(AggError::configuration(format!(
                "{} expects exactly one argument, got {}",
                self.name(),
                arguments.len()
            )));
        };
        let supported = is_int_type(arg)
            || is_float_type(arg)
            || matches!(arg, DataType::Boolean | DataType::Utf8);
        if !supported {
            return Err(AggError::configuration(format!(
                "{} does not support argument type {arg:?}",
                self.name()
            )));
        }
        self.arg_type = Some(arg.clone());
        Ok(())
    }

    fn return_type(&self) -> AggResult<DataType> {
        let arg = self
            .arg_type
            .as_ref()
            .ok_or_else(|| AggError::configuration("return type requested before set_arguments"))?;
        Ok(if is_int_type(arg) {
            DataType::Int64
        } else if is_float_type(arg) {
            DataType::Float64
        } else {
            arg.clone()
        })
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
            .ok_or_else(|| AggError::internal(format!("{} input column missing", self.name())))?;
        if let Some(v) = scalar_from_array(col, row)? {
            self.fold(place, v)?;
        }
        Ok(())
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.ensure_configured()?;
        if let Some(v) = Self::data_ref(rhs).value.clone() {
            self.fold(place, v)?;
        }
        Ok(())
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        write_scalar(sink, Self::data_ref(place).value.as_ref())
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        let arg = self
            .arg_type
            .as_ref()
            .ok_or_else(|| AggError::configuration("deserialize before set_arguments"))?;
        if let Some(v) = read_scalar(source)? {
            if !Self::scalar_matches_arg(&v, arg) {
                return Err(AggError::corrupt(format!(
                    "{}: state value kind does not match argument type {arg:?}",
                    self.name()
                )));
            }
            self.fold(place, v)?;
        }
        Ok(())
    }

    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()> {
        self.ensure_configured()?;
        match &Self::data_ref(place).value {
            None => {
                to.append_null();
                Ok(())
            }
            Some(v) => append_scalar(to, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::mem::MaybeUninit;
    use std::sync::Arc;

    use arrow::array::StringArray;

    use super::super::super::buffer::SliceReader;
    use super::*;

    #[test]
    fn test_min_utf8_state_is_not_trivially_destructible() {
        let mut func = MinMaxAgg::min();
        func.set_arguments(&[DataType::Utf8]).unwrap();
        assert!(!func.has_trivial_destructor());

        let col = Arc::new(StringArray::from(vec![Some("pear"), None, Some("apple")])) as ArrayRef;
        let mut state = MaybeUninit::<MinMaxState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        for row in 0..3 {
            func.add(place, std::slice::from_ref(&col), row).unwrap();
        }
        assert_eq!(
            MinMaxAgg::data_ref(place).value,
            Some(AggScalarValue::Utf8("apple".to_string()))
        );
        func.destroy(place);
    }

    #[test]
    fn test_max_int_widens_return_type() {
        let mut func = MinMaxAgg::max();
        func.set_arguments(&[DataType::Int16]).unwrap();
        assert_eq!(func.return_type().unwrap(), DataType::Int64);
    }

    #[test]
    fn test_deserialize_rejects_mismatched_value_kind() {
        let mut func = MinMaxAgg::min();
        func.set_arguments(&[DataType::Int64]).unwrap();

        // A Utf8-tagged payload must not merge into an Int64-configured state.
        let mut bytes = Vec::new();
        write_scalar(&mut bytes, Some(&AggScalarValue::Utf8("x".to_string()))).unwrap();

        let mut state = MaybeUninit::<MinMaxState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        let err = func
            .deserialize_merge(place, &mut SliceReader::new(&bytes))
            .unwrap_err();
        assert!(matches!(err, AggError::CorruptState(_)));
        assert_eq!(MinMaxAgg::data_ref(place).value, None);
        func.destroy(place);
    }
}
