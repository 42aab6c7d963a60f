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
use super::function::{AggStatePtr, AggregateFunction};

/// Bump allocator for aggregation state regions.
///
/// The arena owns the raw bytes only, never the logical states inside them:
/// callers still `create` and `destroy` through the descriptor. Dropping the
/// arena without per-state `destroy` is sound exactly when every state in it
/// reports a trivial destructor. Blocks stay at fixed addresses until drop.
#[derive(Debug)]
pub struct AggStateArena {
    blocks: Vec<Box<[u8]>>,
    cursor: usize,
    block_size: usize,
}

impl AggStateArena {
    pub fn new(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            cursor: 0,
            block_size: block_size.max(1),
        }
    }

    /// Reserves `size` bytes at an address aligned to `align` (a power of
    /// two) and returns that address.
    pub fn alloc(&mut self, size: usize, align: usize) -> AggStatePtr {
        debug_assert!(align.is_power_of_two());
        let needed = size.max(1);
        let align_mask = align.max(1) - 1;
        loop {
            if let Some(block) = self.blocks.last_mut() {
                let base = block.as_mut_ptr() as usize;
                let addr = (base + self.cursor + align_mask) & !align_mask;
                if addr + needed <= base + block.len() {
                    self.cursor = addr + needed - base;
                    return addr;
                }
            }
            let block_size = self.block_size.max(needed + align_mask);
            self.blocks.push(vec![0u8; block_size].into_boxed_slice());
            self.block_size = self.block_size.max(block_size);
            self.cursor = 0;
        }
    }

    /// Reserves one state region satisfying `func`'s memory contract.
    pub fn alloc_for(&mut self, func: &dyn AggregateFunction) -> AggStatePtr {
        self.alloc(func.size_of_data(), func.align_of_data())
    }

    pub fn allocated_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_respects_alignment() {
        let mut arena = AggStateArena::new(256);
        for align in [1usize, 2, 4, 8, 16, 64] {
            let ptr = arena.alloc(3, align);
            assert_eq!(ptr % align, 0, "align {align}");
        }
    }

    #[test]
    fn test_alloc_larger_than_block() {
        let mut arena = AggStateArena::new(16);
        let ptr = arena.alloc(1024, 8);
        assert_eq!(ptr % 8, 0);
        assert!(arena.allocated_bytes() >= 1024);
    }

    #[test]
    fn test_allocations_do_not_overlap() {
        let mut arena = AggStateArena::new(64);
        let a = arena.alloc(16, 8);
        let b = arena.alloc(16, 8);
        assert!(b >= a + 16 || a >= b + 16);
    }
}
