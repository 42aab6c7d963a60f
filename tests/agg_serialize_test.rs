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

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;

use basalt::agg::{
    AggError, AggStateArena, AggStatePtr, AggregateFunction, ColumnBuilder, SliceReader,
    get_aggregate_function,
};

fn configured(name: &str, args: &[DataType]) -> Box<dyn AggregateFunction> {
    let mut func = get_aggregate_function(name).unwrap();
    func.set_arguments(args).unwrap();
    func
}

fn add_rows(func: &dyn AggregateFunction, place: AggStatePtr, col: &ArrayRef) {
    for row in 0..col.len() {
        func.add(place, std::slice::from_ref(col), row).unwrap();
    }
}

fn finalize(func: &dyn AggregateFunction, place: AggStatePtr) -> ArrayRef {
    let mut out = ColumnBuilder::for_data_type(&func.return_type().unwrap()).unwrap();
    func.insert_result_into(place, &mut out).unwrap();
    out.finish()
}

/// Serializes a populated state and merges it into a fresh empty one; the
/// finalized outputs of both must match.
fn assert_binary_round_trip(func: &dyn AggregateFunction, col: &ArrayRef) {
    let mut arena = AggStateArena::new(4096);
    let original = arena.alloc_for(func);
    func.create(original);
    add_rows(func, original, col);

    let mut bytes = Vec::new();
    func.serialize(original, &mut bytes).unwrap();

    let restored = arena.alloc_for(func);
    func.create(restored);
    func.deserialize_merge(restored, &mut SliceReader::new(&bytes))
        .unwrap();

    assert_eq!(
        finalize(func, original).to_data(),
        finalize(func, restored).to_data()
    );
    func.destroy(original);
    func.destroy(restored);
}

#[test]
fn test_binary_round_trips() {
    let int_col = Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])) as ArrayRef;
    let float_col =
        Arc::new(Float64Array::from(vec![Some(1.5), Some(-2.5), None])) as ArrayRef;
    let utf8_col = Arc::new(StringArray::from(vec![Some("b"), Some("a"), None])) as ArrayRef;

    assert_binary_round_trip(configured("count", &[DataType::Int64]).as_ref(), &int_col);
    assert_binary_round_trip(configured("sum", &[DataType::Int64]).as_ref(), &int_col);
    assert_binary_round_trip(configured("sum", &[DataType::Float64]).as_ref(), &float_col);
    assert_binary_round_trip(configured("avg", &[DataType::Int64]).as_ref(), &int_col);
    assert_binary_round_trip(configured("min", &[DataType::Utf8]).as_ref(), &utf8_col);
    assert_binary_round_trip(configured("max", &[DataType::Float64]).as_ref(), &float_col);
    assert_binary_round_trip(
        configured("group_concat", &[DataType::Utf8]).as_ref(),
        &utf8_col,
    );
    assert_binary_round_trip(configured("quantile", &[DataType::Int64]).as_ref(), &int_col);
}

#[test]
fn test_empty_state_round_trips() {
    // A created-but-never-fed state is a valid serialization input.
    for (name, arg) in [
        ("count", DataType::Int64),
        ("sum", DataType::Int64),
        ("min", DataType::Utf8),
        ("group_concat", DataType::Utf8),
    ] {
        let func = configured(name, &[arg]);
        let mut arena = AggStateArena::new(256);
        let place = arena.alloc_for(func.as_ref());
        func.create(place);

        let mut bytes = Vec::new();
        func.serialize(place, &mut bytes).unwrap();

        let restored = arena.alloc_for(func.as_ref());
        func.create(restored);
        func.deserialize_merge(restored, &mut SliceReader::new(&bytes))
            .unwrap();
        assert_eq!(
            finalize(func.as_ref(), place).to_data(),
            finalize(func.as_ref(), restored).to_data(),
            "{name}"
        );
        func.destroy(place);
        func.destroy(restored);
    }
}

#[test]
fn test_deserialize_merge_accumulates() {
    let func = configured("count", &[DataType::Int64]);
    let col = Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(3)])) as ArrayRef;

    let mut arena = AggStateArena::new(256);
    let source_state = arena.alloc_for(func.as_ref());
    func.create(source_state);
    add_rows(func.as_ref(), source_state, &col);
    let mut bytes = Vec::new();
    func.serialize(source_state, &mut bytes).unwrap();
    func.destroy(source_state);

    // Merging the same encoding twice into a non-empty state doubles it in.
    let target = arena.alloc_for(func.as_ref());
    func.create(target);
    add_rows(func.as_ref(), target, &col);
    func.deserialize_merge(target, &mut SliceReader::new(&bytes))
        .unwrap();
    func.deserialize_merge(target, &mut SliceReader::new(&bytes))
        .unwrap();

    let out = finalize(func.as_ref(), target);
    let out = out.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(out.value(0), 9);
    func.destroy(target);
}

#[test]
fn test_text_round_trip_count_and_sum() {
    let col = Arc::new(Int64Array::from(vec![Some(4), Some(5)])) as ArrayRef;

    for name in ["count", "sum"] {
        let func = configured(name, &[DataType::Int64]);
        let mut arena = AggStateArena::new(256);
        let place = arena.alloc_for(func.as_ref());
        func.create(place);
        add_rows(func.as_ref(), place, &col);

        let mut text = Vec::new();
        func.serialize_text(place, &mut text).unwrap();
        assert!(text.ends_with(b"\n"));

        let restored = arena.alloc_for(func.as_ref());
        func.create(restored);
        func.deserialize_merge_text(restored, &mut SliceReader::new(&text))
            .unwrap();
        assert_eq!(
            finalize(func.as_ref(), place).to_data(),
            finalize(func.as_ref(), restored).to_data(),
            "{name}"
        );
        func.destroy(place);
        func.destroy(restored);
    }
}

#[test]
fn test_text_codec_defaults_to_unsupported() {
    let func = configured("avg", &[DataType::Int64]);
    let mut arena = AggStateArena::new(256);
    let place = arena.alloc_for(func.as_ref());
    func.create(place);

    let mut text = Vec::new();
    let err = func.serialize_text(place, &mut text).unwrap_err();
    assert!(matches!(err, AggError::Unsupported(_)));
    let err = func
        .deserialize_merge_text(place, &mut SliceReader::new(b"1\n"))
        .unwrap_err();
    assert!(matches!(err, AggError::Unsupported(_)));
    func.destroy(place);
}

#[test]
fn test_truncated_input_is_corrupt() {
    let func = configured("sum", &[DataType::Int64]);
    let col = Arc::new(Int64Array::from(vec![Some(42)])) as ArrayRef;

    let mut arena = AggStateArena::new(256);
    let place = arena.alloc_for(func.as_ref());
    func.create(place);
    add_rows(func.as_ref(), place, &col);
    let mut bytes = Vec::new();
    func.serialize(place, &mut bytes).unwrap();

    let target = arena.alloc_for(func.as_ref());
    func.create(target);
    let err = func
        .deserialize_merge(target, &mut SliceReader::new(&bytes[..bytes.len() - 1]))
        .unwrap_err();
    assert!(matches!(err, AggError::CorruptState(_)));
    func.destroy(place);
    func.destroy(target);
}

#[test]
fn test_unknown_tag_is_corrupt() {
    let func = configured("min", &[DataType::Int64]);
    let mut arena = AggStateArena::new(256);
    let place = arena.alloc_for(func.as_ref());
    func.create(place);

    let err = func
        .deserialize_merge(place, &mut SliceReader::new(&[0xff]))
        .unwrap_err();
    assert!(matches!(err, AggError::CorruptState(_)));
    func.destroy(place);
}

#[test]
fn test_invalid_utf8_is_corrupt() {
    let func = configured("group_concat", &[DataType::Utf8]);
    let mut arena = AggStateArena::new(256);
    let place = arena.alloc_for(func.as_ref());
    func.create(place);

    // One item whose bytes are not valid utf8.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&[0xc0, 0x80]);

    let err = func
        .deserialize_merge(place, &mut SliceReader::new(&bytes))
        .unwrap_err();
    assert!(matches!(err, AggError::CorruptState(_)));
    func.destroy(place);
}

#[test]
fn test_corrupt_text_state() {
    let func = configured("count", &[DataType::Int64]);
    let mut arena = AggStateArena::new(256);
    let place = arena.alloc_for(func.as_ref());
    func.create(place);

    let err = func
        .deserialize_merge_text(place, &mut SliceReader::new(b"not-a-number\n"))
        .unwrap_err();
    assert!(matches!(err, AggError::CorruptState(_)));
    func.destroy(place);
}
