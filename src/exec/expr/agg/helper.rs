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
use std::mem;
use std::ptr;

use super::function::{AggStatePtr, ConstAggStatePtr};
use super::liveness;

/// Binds a concrete state representation to the raw-memory contract.
///
/// A variant picks its `Data` type and gets placement construction,
/// destruction, the size/alignment contract and the triviality flag for free;
/// its `AggregateFunction` impl delegates the memory operations here instead
/// of hand-rolling pointer casts. `Data::default()` is the logically empty
/// state.
pub trait AggregateFunctionHelper {
    type Data: Default;

    fn data<'a>(place: AggStatePtr) -> &'a mut Self::Data {
        liveness::assert_live(place);
        unsafe { &mut *(place as *mut Self::Data) }
    }

    fn data_ref<'a>(place: ConstAggStatePtr) -> &'a Self::Data {
        liveness::assert_live(place);
        unsafe { &*(place as *const Self::Data) }
    }

    fn create_data(place: AggStatePtr) {
        liveness::mark_created(place);
        unsafe { ptr::write(place as *mut Self::Data, Self::Data::default()) }
    }

    fn destroy_data(place: AggStatePtr) {
        liveness::mark_destroyed(place);
        unsafe { ptr::drop_in_place(place as *mut Self::Data) }
    }

    fn data_size() -> usize {
        mem::size_of::<Self::Data>()
    }

    fn data_align() -> usize {
        mem::align_of::<Self::Data>()
    }

    fn data_is_trivially_destructible() -> bool {
        !mem::needs_drop::<Self::Data>()
    }
}
