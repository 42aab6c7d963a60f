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

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, StringArray,
};
use arrow::datatypes::DataType;

use super::super::buffer::{ByteSink, ByteSource};
use super::super::column::ColumnBuilder;
use super::super::error::{AggError, AggResult};

/// Scalar value read from an input column. Integer inputs are widened to
/// Int64 and float inputs to Float64 on entry into a state.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum AggScalarValue {
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Utf8(String),
}

pub(super) fn is_int_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
    )
}

pub(super) fn is_float_type(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Float32 | DataType::Float64)
}

pub(super) fn is_numeric_type(data_type: &DataType) -> bool {
    is_int_type(data_type) || is_float_type(data_type)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> AggResult<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| AggError::internal("input array downcast mismatch"))
}

pub(super) fn int_value_at(array: &ArrayRef, row: usize) -> AggResult<Option<i64>> {
    if array.is_null(row) {
        return Ok(None);
    }
    let v = match array.data_type() {
        DataType::Int8 => downcast::<Int8Array>(array)?.value(row) as i64,
        DataType::Int16 => downcast::<Int16Array>(array)?.value(row) as i64,
        DataType::Int32 => downcast::<Int32Array>(array)?.value(row) as i64,
        DataType::Int64 => downcast::<Int64Array>(array)?.value(row),
        other => {
            return Err(AggError::internal(format!(
                "unexpected integer input type: {other:?}"
            )));
        }
    };
    Ok(Some(v))
}

pub(super) fn numeric_value_at(array: &ArrayRef, row: usize) -> AggResult<Option<f64>> {
    if array.is_null(row) {
        return Ok(None);
    }
    let v = match array.data_type() {
        DataType::Float32 => downcast::<Float32Array>(array)?.value(row) as f64,
        DataType::Float64 => downcast::<Float64Array>(array)?.value(row),
        _ => match int_value_at(array, row)? {
            Some(v) => v as f64,
            None => return Ok(None),
        },
    };
    Ok(Some(v))
}

pub(super) fn scalar_from_array(array: &ArrayRef, row: usize) -> AggResult<Option<AggScalarValue>> {
    if array.is_null(row) {
        return Ok(None);
    }
    let v = match array.data_type() {
        DataType::Boolean => AggScalarValue::Boolean(downcast::<BooleanArray>(array)?.value(row)),
        DataType::Utf8 => AggScalarValue::Utf8(downcast::<StringArray>(array)?.value(row).to_string()),
        t if is_float_type(t) => match numeric_value_at(array, row)? {
            Some(v) => AggScalarValue::Float64(v),
            None => return Ok(None),
        },
        t if is_int_type(t) => match int_value_at(array, row)? {
            Some(v) => AggScalarValue::Int64(v),
            None => return Ok(None),
        },
        other => {
            return Err(AggError::internal(format!(
                "unsupported scalar input type: {other:?}"
            )));
        }
    };
    Ok(Some(v))
}

pub(super) fn compare_scalar_values(a: &AggScalarValue, b: &AggScalarValue) -> AggResult<Ordering> {
    match (a, b) {
        (AggScalarValue::Int64(x), AggScalarValue::Int64(y)) => Ok(x.cmp(y)),
        (AggScalarValue::Float64(x), AggScalarValue::Float64(y)) => Ok(x.total_cmp(y)),
        (AggScalarValue::Boolean(x), AggScalarValue::Boolean(y)) => Ok(x.cmp(y)),
        (AggScalarValue::Utf8(x), AggScalarValue::Utf8(y)) => Ok(x.cmp(y)),
        _ => Err(AggError::internal("scalar value kind mismatch")),
    }
}

pub(super) fn append_scalar(to: &mut ColumnBuilder, v: &AggScalarValue) -> AggResult<()> {
    match v {
        AggScalarValue::Int64(v) => to.append_i64(*v),
        AggScalarValue::Float64(v) => to.append_f64(*v),
        AggScalarValue::Boolean(v) => to.append_bool(*v),
        AggScalarValue::Utf8(v) => to.append_str(v),
    }
}

const SCALAR_TAG_NONE: u8 = 0;
const SCALAR_TAG_INT64: u8 = 1;
const SCALAR_TAG_FLOAT64: u8 = 2;
const SCALAR_TAG_BOOLEAN: u8 = 3;
const SCALAR_TAG_UTF8: u8 = 4;

pub(super) fn write_scalar(
    sink: &mut dyn ByteSink,
    value: Option<&AggScalarValue>,
) -> AggResult<()> {
    match value {
        None => sink.write_u8(SCALAR_TAG_NONE),
        Some(AggScalarValue::Int64(v)) => {
            sink.write_u8(SCALAR_TAG_INT64)?;
            sink.write_i64_le(*v)
        }
        Some(AggScalarValue::Float64(v)) => {
            sink.write_u8(SCALAR_TAG_FLOAT64)?;
            sink.write_f64_le(*v)
        }
        Some(AggScalarValue::Boolean(v)) => {
            sink.write_u8(SCALAR_TAG_BOOLEAN)?;
            sink.write_u8(*v as u8)
        }
        Some(AggScalarValue::Utf8(v)) => {
            sink.write_u8(SCALAR_TAG_UTF8)?;
            sink.write_len_prefixed(v.as_bytes())
        }
    }
}

pub(super) fn read_scalar(source: &mut dyn ByteSource) -> AggResult<Option<AggScalarValue>> {
    let v = match source.read_u8()? {
        SCALAR_TAG_NONE => return Ok(None),
        SCALAR_TAG_INT64 => AggScalarValue::Int64(source.read_i64_le()?),
        SCALAR_TAG_FLOAT64 => AggScalarValue::Float64(source.read_f64_le()?),
        SCALAR_TAG_BOOLEAN => AggScalarValue::Boolean(source.read_u8()? != 0),
        SCALAR_TAG_UTF8 => {
            let bytes = source.read_len_prefixed()?;
            let s = String::from_utf8(bytes)
                .map_err(|_| AggError::corrupt("scalar state is not valid utf8"))?;
            AggScalarValue::Utf8(s)
        }
        tag => return Err(AggError::corrupt(format!("unknown scalar tag {tag}"))),
    };
    Ok(Some(v))
}

/// Reads one newline-terminated token from a textual state encoding. Returns
/// `None` at end of input; the final token may omit the terminator.
pub(super) fn read_text_line(source: &mut dyn ByteSource) -> AggResult<Option<String>> {
    let mut out = Vec::new();
    loop {
        match source.read_byte()? {
            None => break,
            Some(b'\n') => {
                return String::from_utf8(out)
                    .map(Some)
                    .map_err(|_| AggError::corrupt("text state is not valid utf8"));
            }
            Some(b) => out.push(b),
        }
    }
    if out.is_empty() {
        return Ok(None);
    }
    String::from_utf8(out)
        .map(Some)
        .map_err(|_| AggError::corrupt("text state is not valid utf8"))
}
