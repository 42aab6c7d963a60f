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
use super::common::{int_value_at, is_float_type, is_int_type, numeric_value_at, read_text_line};

/// `Empty` is the never-saw-a-row state and finalizes to NULL.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) enum SumState {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SumKind {
    Int,
    Float,
}

const SUM_TAG_EMPTY: u8 = 0;
const SUM_TAG_INT: u8 = 1;
const SUM_TAG_FLOAT: u8 = 2;

/// `sum(x)` over one numeric argument. Integer inputs accumulate in i64 with
/// wrapping arithmetic, floats in f64. Merge is commutative (float sums up to
/// rounding).
pub(crate) struct SumAgg {
    kind: Option<SumKind>,
}

impl SumAgg {
    pub(crate) fn new() -> Self {
        Self { kind: None }
    }

    fn kind(&self) -> AggResult<SumKind> {
        self.kind.ok_or_else(|| {
            AggError::configuration("sum: set_arguments must run before data calls")
        })
    }

    fn fold_int(state: &mut SumState, v: i64) -> AggResult<()> {
        match state {
            SumState::Empty => *state = SumState::Int(v),
            SumState::Int(acc) => *acc = acc.wrapping_add(v),
            SumState::Float(_) => return Err(AggError::internal("sum state kind mismatch")),
        }
        Ok(())
    }

    fn fold_float(state: &mut SumState, v: f64) -> AggResult<()> {
        match state {
            SumState::Empty => *state = SumState::Float(v),
            SumState::Float(acc) => *acc += v,
            SumState::Int(_) => return Err(AggError::internal("sum state kind mismatch")),
        }
        Ok(())
    }

    fn fold_state(place: AggStatePtr, rhs: SumState) -> AggResult<()> {
        match rhs {
            SumState::Empty => Ok(()),
            SumState::Int(v) => Self::fold_int(Self::data(place), v),
            SumState::Float(v) => Self::fold_float(Self::data(place), v),
        }
    }
}

impl AggregateFunctionHelper for SumAgg {
    type Data = SumState;
}

impl AggregateFunction for SumAgg {
    fn name(&self) -> &str {
        "sum"
    }

    fn set_arguments(&mut self, arguments: &[DataType]) -> AggResult<()> {
        if self.kind.is_some() {
            return Err(AggError::configuration("sum: arguments already set"));
        }
        let [arg] = arguments else {
            return Err(AggError::configuration(format!(
                "sum expects exactly one argument, got {}",
                arguments.len()
            )));
        };
        self.kind = Some(if is_int_type(arg) {
            SumKind::Int
        } else if is_float_type(arg) {
            SumKind::Float
        } else {
            return Err(AggError::configuration(format!(
                "sum does not support argument type {arg:?}"
            )));
        });
        Ok(())
    }

    fn return_type(&self) -> AggResult<DataType> {
        Ok(match self.kind()? {
            SumKind::Int => DataType::Int64,
            SumKind::Float => DataType::Float64,
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
        let kind = self.kind()?;
        let col = columns
            .first()
            .ok_or_else(|| AggError::internal("sum input column missing"))?;
        match kind {
            SumKind::Int => {
                if let Some(v) = int_value_at(col, row)? {
                    Self::fold_int(Self::data(place), v)?;
                }
            }
            SumKind::Float => {
                if let Some(v) = numeric_value_at(col, row)? {
                    Self::fold_float(Self::data(place), v)?;
                }
            }
        }
        Ok(())
    }

    fn merge(&self, place: AggStatePtr, rhs: ConstAggStatePtr) -> AggResult<()> {
        self.kind()?;
        Self::fold_state(place, *Self::data_ref(rhs))
    }

    fn serialize(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        match Self::data_ref(place) {
            SumState::Empty => sink.write_u8(SUM_TAG_EMPTY),
            SumState::Int(v) => {
                sink.write_u8(SUM_TAG_INT)?;
                sink.write_i64_le(*v)
            }
            SumState::Float(v) => {
                sink.write_u8(SUM_TAG_FLOAT)?;
                sink.write_f64_le(*v)
            }
        }
    }

    fn deserialize_merge(&self, place: AggStatePtr, source: &mut dyn ByteSource) -> AggResult<()> {
        let kind = self.kind()?;
        let rhs = match (source.read_u8()?, kind) {
            (SUM_TAG_EMPTY, _) => SumState::Empty,
            (SUM_TAG_INT, SumKind::Int) => SumState::Int(source.read_i64_le()?),
            (SUM_TAG_FLOAT, SumKind::Float) => SumState::Float(source.read_f64_le()?),
            (tag, kind) => {
                return Err(AggError::corrupt(format!(
                    "sum: state tag {tag} does not fit configured {kind:?} accumulator"
                )));
            }
        };
        Self::fold_state(place, rhs)
    }

    fn serialize_text(&self, place: ConstAggStatePtr, sink: &mut dyn ByteSink) -> AggResult<()> {
        match Self::data_ref(place) {
            SumState::Empty => sink.write_bytes(b"null")?,
            SumState::Int(v) => {
                let mut buf = itoa::Buffer::new();
                sink.write_bytes(buf.format(*v).as_bytes())?;
            }
            SumState::Float(v) => {
                let mut buf = ryu::Buffer::new();
                sink.write_bytes(buf.format(*v).as_bytes())?;
            }
        }
        sink.write_u8(b'\n')
    }

    fn deserialize_merge_text(
        &self,
        place: AggStatePtr,
        source: &mut dyn ByteSource,
    ) -> AggResult<()> {
        let kind = self.kind()?;
        let token =
            read_text_line(source)?.ok_or_else(|| AggError::corrupt("sum: empty text state"))?;
        let token = token.trim();
        if token == "null" {
            return Ok(());
        }
        let rhs = match kind {
            SumKind::Int => SumState::Int(token.parse().map_err(|_| {
                AggError::corrupt(format!("sum: invalid integer text state {token:?}"))
            })?),
            SumKind::Float => SumState::Float(token.parse().map_err(|_| {
                AggError::corrupt(format!("sum: invalid float text state {token:?}"))
            })?),
        };
        Self::fold_state(place, rhs)
    }

    fn insert_result_into(&self, place: ConstAggStatePtr, to: &mut ColumnBuilder) -> AggResult<()> {
        self.kind()?;
        match Self::data_ref(place) {
            SumState::Empty => {
                to.append_null();
                Ok(())
            }
            SumState::Int(v) => to.append_i64(*v),
            SumState::Float(v) => to.append_f64(*v),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::mem::MaybeUninit;

    use super::super::super::buffer::SliceReader;
    use super::*;

    #[test]
    fn test_deserialize_rejects_mismatched_tag() {
        let mut func = SumAgg::new();
        func.set_arguments(&[DataType::Int64]).unwrap();

        // A float-tagged encoding must not fold into an integer accumulator.
        let mut bytes = Vec::new();
        bytes.push(SUM_TAG_FLOAT);
        bytes.extend_from_slice(&1.5f64.to_le_bytes());

        let mut state = MaybeUninit::<SumState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        let err = func
            .deserialize_merge(place, &mut SliceReader::new(&bytes))
            .unwrap_err();
        assert!(matches!(err, AggError::CorruptState(_)));
        assert_eq!(*SumAgg::data_ref(place), SumState::Empty);
        func.destroy(place);
    }

    #[test]
    fn test_empty_tag_merges_into_any_kind() {
        let mut func = SumAgg::new();
        func.set_arguments(&[DataType::Float64]).unwrap();

        let mut state = MaybeUninit::<SumState>::uninit();
        let place = state.as_mut_ptr() as AggStatePtr;
        func.create(place);
        func.deserialize_merge(place, &mut SliceReader::new(&[SUM_TAG_EMPTY]))
            .unwrap();
        assert_eq!(*SumAgg::data_ref(place), SumState::Empty);
        func.destroy(place);
    }
}
