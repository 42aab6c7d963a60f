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
use super::error::{AggError, AggResult};
use super::function::AggregateFunction;
use super::functions::{
    AvgAgg, CountAgg, GroupConcatAgg, MinMaxAgg, QuantileAgg, StateCombinator, SumAgg,
};

/// Resolves a function name to an unconfigured descriptor. The caller then
/// runs `set_parameters` (optional) and `set_arguments` before wrapping it in
/// an `Arc` for sharing. A `_state` suffix wraps any known variant in the
/// state combinator.
pub fn get_aggregate_function(name: &str) -> AggResult<Box<dyn AggregateFunction>> {
    if let Some(base) = name.strip_suffix("_state") {
        let nested = get_aggregate_function(base)?;
        return Ok(Box::new(StateCombinator::new(nested)));
    }
    match name {
        "count" => Ok(Box::new(CountAgg::new())),
        "sum" => Ok(Box::new(SumAgg::new())),
        "avg" => Ok(Box::new(AvgAgg::new())),
        "min" => Ok(Box::new(MinMaxAgg::min())),
        "max" => Ok(Box::new(MinMaxAgg::max())),
        "group_concat" | "string_agg" => Ok(Box::new(GroupConcatAgg::new())),
        "quantile" | "median" => Ok(Box::new(QuantileAgg::new())),
        other => Err(AggError::configuration(format!(
            "unknown aggregate function: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_resolve() {
        for name in [
            "count",
            "sum",
            "avg",
            "min",
            "max",
            "group_concat",
            "string_agg",
            "quantile",
            "median",
        ] {
            assert!(get_aggregate_function(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_state_suffix_wraps() {
        let func = get_aggregate_function("sum_state").unwrap();
        assert_eq!(func.name(), "sum_state");
        assert!(!func.can_be_final());
    }

    #[test]
    fn test_unknown_name_is_configuration_error() {
        match get_aggregate_function("no_such_agg") {
            Err(AggError::Configuration(_)) => {}
            Err(other) => panic!("unexpected error kind: {other}"),
            Ok(_) => panic!("unknown name resolved"),
        }
    }
}
