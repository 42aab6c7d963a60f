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
use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;

use super::super::buffer::{ByteSink, ByteSource};
use super::super::column::ColumnBuilder;
use super::super::error::{AggError, AggResult};
use super::super::function::{AggStatePtr, AggregateFunction, ConstAggStatePtr};
use super::super::helper::AggregateFunctionHelper;
use super::common::read_text_line;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CountState {
    count: i64,
}

/// `count()` counts rows, `count(x)` counts non-null rows of `x`.
/// Merge is commutative. The state destructor is trivial.
pub(crate) struct CountAgg {
    args: Option<Vec<DataType>>,
    count_all: bool,
}

impl CountAgg {
    pub(crate) fn new() -> Self {
        Self {
            args: None,
            count_all: true,
        }
    }

    fn ensure_configured(&self) -> AggResult<()> {
        if self.args.is_none() {
            return Err(AggError::configuration(
                "count: set_arguments must run before data calls",
            ));
        }
        Ok(())
    }
}

impl AggregateFunctionHelper for CountAgg {
    type Data = CountState;
}

impl AggregateFunction for CountAgg {
    fn name(&self) -> &str {
        "count"
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        if self.args.is_some() {
            return Err(AggError::configuration("count: arguments already set"));
        }
        if arguments.len() > 1 {
            return Err(AggError::configuration(format!(
                "count expects at most one argument, got {}",
                arguments.len()
            )));
        }
        self.count_all = arguments.is_empty();
        self.args = Some(arguments.to_vec());
        Ok(())
    }

    fn return_type(&self) -> AggResult<DataType> {
        self.ensure_configured()?;
        Ok(DataType::Int64)
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
        if !self.count_all {
            let col = columns
                .first()
                .ok_or_else(|| AggError::internal("count input column missing"))?;
            if col.is_null(row) {
                return Ok(());
            }
        }
        Self::data(place).count += 1;
        Ok(())
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.ensure_configured()?;
        Self::data(place).count += Self::data_ref(rhs).count;
        Ok(())
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        sink.write_i64_le(Self::data_ref(place).count)
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        let v = source.read_i64_le()?;
        if v < 0 {
            return Err(AggError::corrupt(format!("count: negative count {v}")));
        }
        Self::data(place).count += v;
        Ok(())
    }

    fn serialize_text(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        let mut buf = itoa::Buffer::new();
        sink.write_bytes(buf.format(Self::data_ref(place).count).as_bytes())?;
        sink.write_u8(b'\n')
    }

    fn deserialize_merge_text(
        &self,
        place: AggStatePtr,
        source: &mut dyn ByteSource,
    ) -> AggResult<()> {
        let token = read_text_line(source)?
            .ok_or_else(|| AggError::corrupt("count: empty text state"))?;
        let v: i64 = token
            .trim()
            .parse()
            .map_err(|_| AggError::corrupt(format!("count: invalid text state {token:?}")))?;
        if v < 0 {
            return Err(AggError::corrupt(format!("count: negative count {v}")));
        }
        Self::data(place).count += v;
        Ok(())
    }

    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()> {
        self.ensure_configured()?;
        to.append_i64(Self::data_ref(place).count)
    }
}

#[cfg(test)]
mod tests {
    use std::mem::MaybeUninit;
    use std::sync::Arc;

    use arrow::array::Int64Array;

    use super::super::super::buffer::SliceReader;
    use super::*;

    #[test]
    fn test_count_skips_nulls() {
        let mut func = CountAgg::new();
        func.set_arguments(&[DataType::Int64]).unwrap();

        let col = Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])) as ArrayRef;
        let mut state = MaybeUninit::<CountState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        for row in 0..col.len() {
            func.add(place, std::slice::from_ref(&col), row).unwrap();
        }
        assert_eq!(CountAgg::data_ref(place).count, 2);
        func.destroy(place);
    }

    #[test]
    fn test_negative_count_is_corrupt_in_both_codecs() {
        let mut func = CountAgg::new();
        func.set_arguments(&[]).unwrap();

        let mut state = MaybeUninit::<CountState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);

        let err = func
            .deserialize_merge(place, &mut SliceReader::new(&(-1i64).to_le_bytes()))
            .unwrap_err();
        assert!(matches!(err, AggError::CorruptState(_)));

        let err = func
            .deserialize_merge_text(place, &mut SliceReader::new(b"-1\n"))
            .unwrap_err();
        assert!(matches!(err, AggError::CorruptState(_)));

        assert_eq!(CountAgg::data_ref(place).count, 0);
        func.destroy(place);
    }

    #[test]
    fn test_count_star_counts_rows() {
        let mut func = CountAgg::new();
        func.set_arguments(&[]).unwrap();

        let mut state = MaybeUninit::<CountState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        for _ in 0..4 {
            func.add(place, &[], 0).unwrap();
        }
        assert_eq!(CountAgg::data_ref(place).count, 4);
        func.destroy(place);
    }
}
