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

use arrow::array::{
    ArrayBuilder, ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::DataType;

use super::error::{AggError, AggResult};

/// Destination column for finalized aggregate results. Each
/// `insert_result_into` call appends exactly one value.
pub enum ColumnBuilder {
    Int64(Int64Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    Utf8(StringBuilder),
}

impl ColumnBuilder {
    pub fn for_data_type(data_type: &DataType) -> AggResult<Self> {
        match data_type {
            DataType::Int64 => Ok(ColumnBuilder::Int64(Int64Builder::new())),
            DataType::Float64 => Ok(ColumnBuilder::Float64(Float64Builder::new())),
            DataType::Boolean => Ok(ColumnBuilder::Boolean(BooleanBuilder::new())),
            DataType::Utf8 => Ok(ColumnBuilder::Utf8(StringBuilder::new())),
            other => Err(AggError::internal(format!(
                "unsupported result column type: {other:?}"
            ))),
        }
    }

    pub fn append_i64(&mut self, v: i64) -> AggResult<()> {
        match self {
            ColumnBuilder::Int64(b) => {
                b.append_value(v);
                Ok(())
            }
            _ => Err(AggError::internal("result column is not Int64")),
        }
    }

    pub fn append_f64(&mut self, v: f64) -> AggResult<()> {
        match self {
            ColumnBuilder::Float64(b) => {
                b.append_value(v);
                Ok(())
            }
            _ => Err(AggError::internal("result column is not Float64")),
        }
    }

    pub fn append_bool(&mut self, v: bool) -> AggResult<()> {
        match self {
            ColumnBuilder::Boolean(b) => {
                b.append_value(v);
                Ok(())
            }
            _ => Err(AggError::internal("result column is not Boolean")),
        }
    }

    pub fn append_str(&mut self, v: &str) -> AggResult<()> {
        match self {
            ColumnBuilder::Utf8(b) => {
                b.append_value(v);
                Ok(())
            }
            _ => Err(AggError::internal("result column is not Utf8")),
        }
    }

    pub fn append_null(&mut self) {
        match self {
            ColumnBuilder::Int64(b) => b.append_null(),
            ColumnBuilder::Float64(b) => b.append_null(),
            ColumnBuilder::Boolean(b) => b.append_null(),
            ColumnBuilder::Utf8(b) => b.append_null(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnBuilder::Int64(b) => b.len(),
            ColumnBuilder::Float64(b) => b.len(),
            ColumnBuilder::Boolean(b) => b.len(),
            ColumnBuilder::Utf8(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Int64(b) => Arc::new(b.finish()),
            ColumnBuilder::Float64(b) => Arc::new(b.finish()),
            ColumnBuilder::Boolean(b) => Arc::new(b.finish()),
            ColumnBuilder::Utf8(b) => Arc::new(b.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::Array;

    use super::*;

    #[test]
    fn test_len_tracks_appends_per_kind() {
        for data_type in [
            DataType::Int64,
            DataType::Float64,
            DataType::Boolean,
            DataType::Utf8,
        ] {
            let mut builder = ColumnBuilder::for_data_type(&data_type).unwrap();
            assert!(builder.is_empty(), "{data_type:?}");
            builder.append_null();
            assert_eq!(builder.len(), 1, "{data_type:?}");
            let array = builder.finish();
            assert_eq!(array.len(), 1, "{data_type:?}");
        }
    }

    #[test]
    fn test_mismatched_append_is_internal_error() {
        let mut builder = ColumnBuilder::for_data_type(&DataType::Int64).unwrap();
        let err = builder.append_str("x").unwrap_err();
        assert!(matches!(err, AggError::Internal(_)));
    }
}
