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
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::DataType;

use super::super::buffer::{ByteSink, ByteSource};
use super::super::column::ColumnBuilder;
use super::super::error::{AggError, AggResult};
use super::super::function::{AggStatePtr, AggregateFunction, ConstAggStatePtr, ParamValue};
use super::super::helper::AggregateFunctionHelper;

#[derive(Debug, Default)]
pub(crate) struct GroupConcatState {
    items: Vec<String>,
}

/// `group_concat(x)` over one Utf8 argument with an optional Utf8 separator
/// parameter (default ","). Merge is NOT commutative: it appends the right
/// state's values after the left's, so combination order is deterministic
/// concatenation rather than a reordering.
pub(crate) struct GroupConcatAgg {
    configured: bool,
    separator: String,
}

impl GroupConcatAgg {
    pub(crate) fn new() -> Self {
        Self {
            configured: false,
            separator: ",".to_string(),
        }
    }

    fn ensure_configured(&self) -> AggResult<()> {
        if !self.configured {
            return Err(AggError::configuration(
                "group_concat: set_arguments must run before data calls",
            ));
        }
        Ok(())
    }
}

impl AggregateFunctionHelper for GroupConcatAgg {
    type Data = GroupConcatState;
}

impl AggregateFunction for GroupConcatAgg {
    fn name(&self) -> &str {
        "group_concat"
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        if self.configured {
            return Err(AggError::configuration(
                "group_concat: arguments already set",
            ));
        }
        let [arg] = arguments else {
            return Err(AggError::configuration(format!(
                "group_concat expects exactly one argument, got {}",
                arguments.len()
            )));
        };
        if *arg != DataType::Utf8 {
            return Err(AggError::configuration(format!(
                "group_concat does not support argument type {arg:?}"
            )));
        }
        self.configured = true;
        Ok(())
    }

    fn set_parameters(&mut self, params: &[ParamValue]) -> AggResult<()> {
        if self.configured {
            return Err(AggError::configuration(
                "group_concat: set_parameters must run before data calls",
            ));
        }
        let [param] = params else {
            return Err(AggError::configuration(format!(
                "group_concat expects exactly one parameter, got {}",
                params.len()
            )));
        };
        let ParamValue::Utf8(sep) = param else {
            return Err(AggError::configuration(
                "group_concat separator parameter must be a string",
            ));
        };
        self.separator = sep.clone();
        Ok(())
    }

    fn return_type(&self) -> AggResult<DataType> {
        self.ensure_configured()?;
        Ok(DataType::Utf8)
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
            .ok_or_else(|| AggError::internal("group_concat input column missing"))?;
        let col = col
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| AggError::internal("group_concat input is not Utf8"))?;
        if !col.is_null(row) {
            Self::data(place).items.push(col.value(row).to_string());
        }
        Ok(())
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.ensure_configured()?;
        let rhs_items = Self::data_ref(rhs).items.clone();
        Self::data(place).items.extend(rhs_items);
        Ok(())
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        let state = Self::data_ref(place);
        sink.write_u64_le(state.items.len() as u64)?;
        for item in &state.items {
            sink.write_len_prefixed(item.as_bytes())?;
        }
        Ok(())
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        let count = source.read_u64_le()?;
        for _ in 0..count {
            let bytes = source.read_len_prefixed()?;
            let item = String::from_utf8(bytes)
                .map_err(|_| AggError::corrupt("group_concat state is not valid utf8"))?;
            Self::data(place).items.push(item);
        }
        Ok(())
    }

    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()> {
        self.ensure_configured()?;
        let state = Self::data_ref(place);
        if state.items.is_empty() {
            to.append_null();
            return Ok(());
        }
        to.append_str(&state.items.join(&self.separator))
    }
}

#[cfg(test)]
mod tests {
    use std::mem::MaybeUninit;
    use std::sync::Arc;

    use super::*;

    fn add_all(func: &GroupConcatAgg, place: AggStatePtr, values: &[&str]) {
        let col = Arc::new(StringArray::from(values.to_vec())) as ArrayRef;
        for row in 0..values.len() {
            func.add(place, std::slice::from_ref(&col), row).unwrap();
        }
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let mut func = GroupConcatAgg::new();
        func.set_arguments(&[DataType::Utf8]).unwrap();

        let mut a = MaybeUninit::<GroupConcatState>::uninit();
        let mut b = MaybeUninit::<GroupConcatState>::uninit();
        let pa = a.as_mut_ptr() as AggStatePtr;
        let pb = b.as_mut_ptr() as AggStatePtr;
        func.create(pa);
        func.create(pb);
        add_all(&func, pa, &["x", "y"]);
        add_all(&func, pb, &["z"]);

        func.merge(pa, pb).unwrap();
        // rhs is untouched and still destroyable after merge.
        assert_eq!(GroupConcatAgg::data_ref(pb).items, vec!["z"]);

        let mut out = ColumnBuilder::for_data_type(&DataType::Utf8).unwrap();
        func.insert_result_into(pa, &mut out).unwrap();
        let array = out.finish();
        let array = array.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(array.value(0), "x,y,z");

        func.destroy(pa);
        func.destroy(pb);
    }

    #[test]
    fn test_separator_parameter() {
        let mut func = GroupConcatAgg::new();
        func.set_parameters(&[ParamValue::Utf8(" | ".to_string())])
            .unwrap();
        func.set_arguments(&[DataType::Utf8]).unwrap();

        let mut state = MaybeUninit::<GroupConcatState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        add_all(&func, place, &["a", "b"]);

        let mut out = ColumnBuilder::for_data_type(&DataType::Utf8).unwrap();
        func.insert_result_into(place, &mut out).unwrap();
        let array = out.finish();
        let array = array.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(array.value(0), "a | b");
        func.destroy(place);
    }

    #[test]
    fn test_invalid_parameter_kind_is_rejected() {
        let mut func = GroupConcatAgg::new();
        let err = func.set_parameters(&[ParamValue::Int64(3)]).unwrap_err();
        assert!(matches!(err, AggError::Configuration(_)));
    }
}
