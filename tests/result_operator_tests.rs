use proptest::prelude::*;
use quarry::{
    ExecutionStrategy, InMemoryData, InMemoryOperator, QueryError, ResultOperator,
    SkipResultOperator, TakeResultOperator, Value, apply_in_memory,
};

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Integer).collect()
}

fn all_operators() -> Vec<ResultOperator> {
    vec![
        ResultOperator::take(2),
        ResultOperator::skip(2),
        ResultOperator::distinct(),
        ResultOperator::reverse(),
        ResultOperator::first(),
        ResultOperator::first_or_default(),
        ResultOperator::count(),
        ResultOperator::sum(),
        ResultOperator::min(),
        ResultOperator::max(),
    ]
}

#[test]
fn test_take_keeps_prefix() {
    let result = ResultOperator::take(3)
        .execute_in_memory(Some(ints(&[1, 2, 3, 4, 5])))
        .unwrap();
    assert_eq!(result, InMemoryData::Sequence(ints(&[1, 2, 3])));
}

#[test]
fn test_take_clamps_counts() {
    let take = |count| {
        TakeResultOperator::new(count)
            .execute_in_memory(Some(ints(&[1, 2, 3])))
            .unwrap()
    };
    assert_eq!(take(0), InMemoryData::Sequence(vec![]));
    assert_eq!(take(-4), InMemoryData::Sequence(vec![]));
    assert_eq!(take(10), InMemoryData::Sequence(ints(&[1, 2, 3])));
    assert_eq!(take(i64::MAX), InMemoryData::Sequence(ints(&[1, 2, 3])));
}

#[test]
fn test_skip_drops_prefix() {
    let skip = |count| {
        SkipResultOperator::new(count)
            .execute_in_memory(Some(ints(&[1, 2, 3])))
            .unwrap()
    };
    assert_eq!(skip(1), InMemoryData::Sequence(ints(&[2, 3])));
    assert_eq!(skip(-1), InMemoryData::Sequence(ints(&[1, 2, 3])));
    assert_eq!(skip(5), InMemoryData::Sequence(vec![]));
}

#[test]
fn test_absent_items_is_an_argument_error_for_every_operator() {
    for operator in all_operators() {
        let err = operator.execute_in_memory(None).unwrap_err();
        match err {
            QueryError::Argument { parameter, .. } => assert_eq!(parameter, "items", "{}", operator),
            other => panic!("{} returned {:?}", operator, other),
        }
    }
}

#[test]
fn test_strategy_matches_result_shape() {
    let items = ints(&[3, 1, 2]);
    for operator in all_operators() {
        let result = operator.execute_in_memory(Some(items.clone())).unwrap();
        assert_eq!(
            operator.strategy().yields_sequence(),
            result.as_sequence().is_some(),
            "{}",
            operator
        );
    }
}

#[test]
fn test_strategies_are_fixed_by_kind() {
    assert_eq!(TakeResultOperator::STRATEGY, ExecutionStrategy::Collection);
    assert_eq!(ResultOperator::take(-1).strategy(), ExecutionStrategy::Collection);
    assert_eq!(ResultOperator::first().strategy(), ExecutionStrategy::Single);
    assert_eq!(ResultOperator::max().strategy(), ExecutionStrategy::Single);
    assert_eq!(ResultOperator::count().strategy(), ExecutionStrategy::Scalar);
    assert_eq!(ResultOperator::sum().strategy(), ExecutionStrategy::Scalar);
}

#[test]
fn test_display() {
    let rendered: Vec<String> = all_operators().iter().map(|op| op.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "Take(2)",
            "Skip(2)",
            "Distinct()",
            "Reverse()",
            "First()",
            "FirstOrDefault()",
            "Count()",
            "Sum()",
            "Min()",
            "Max()",
        ]
    );
    assert_eq!(ResultOperator::take(-3).to_string(), "Take(-3)");
}

#[test]
fn test_distinct_keeps_first_occurrence() {
    let result = ResultOperator::distinct()
        .execute_in_memory(Some(ints(&[3, 1, 3, 2, 1])))
        .unwrap();
    assert_eq!(result, InMemoryData::Sequence(ints(&[3, 1, 2])));
}

#[test]
fn test_first_on_empty_sequence() {
    let err = ResultOperator::first()
        .execute_in_memory(Some(vec![]))
        .unwrap_err();
    assert!(err.is_invalid_operation());

    let result = ResultOperator::first_or_default()
        .execute_in_memory(Some(vec![]))
        .unwrap();
    assert_eq!(result, InMemoryData::Value(Value::Null));
}

#[test]
fn test_aggregates() {
    let items = ints(&[4, 9, 2]);
    let run = |op: ResultOperator| op.execute_in_memory(Some(items.clone())).unwrap().into_value();
    assert_eq!(run(ResultOperator::count()), Value::Integer(3));
    assert_eq!(run(ResultOperator::sum()), Value::Integer(15));
    assert_eq!(run(ResultOperator::min()), Value::Integer(2));
    assert_eq!(run(ResultOperator::max()), Value::Integer(9));
}

#[test]
fn test_sum_mixes_integers_and_floats_exactly() {
    let items = vec![Value::Float(0.1), Value::Float(0.2), Value::Integer(1), Value::Null];
    let result = ResultOperator::sum()
        .execute_in_memory(Some(items))
        .unwrap()
        .into_value();
    assert_eq!(result, Value::Float(1.3));
}

#[test]
fn test_sum_rejects_non_numbers() {
    let err = ResultOperator::sum()
        .execute_in_memory(Some(vec![Value::String("a".into())]))
        .unwrap_err();
    assert!(err.is_invalid_operation());
}

#[test]
fn test_sum_beyond_decimal_range_falls_back_to_float() {
    let sum = |items: Vec<Value>| {
        ResultOperator::sum()
            .execute_in_memory(Some(items))
            .unwrap()
            .into_value()
    };
    assert_eq!(sum(vec![Value::Float(1e30)]), Value::Float(1e30));
    assert_eq!(
        sum(vec![Value::Integer(5), Value::Float(1e30)]),
        Value::Float(1e30 + 5.0)
    );
    assert_eq!(sum(vec![Value::Float(f64::INFINITY), Value::Integer(1)]), Value::Float(f64::INFINITY));
}

#[test]
fn test_sum_ignores_nulls() {
    let result = ResultOperator::sum()
        .execute_in_memory(Some(vec![Value::Null, Value::Integer(2), Value::Null]))
        .unwrap()
        .into_value();
    assert_eq!(result, Value::Integer(2));

    let result = ResultOperator::sum()
        .execute_in_memory(Some(vec![Value::Null]))
        .unwrap()
        .into_value();
    assert_eq!(result, Value::Integer(0));
}

#[test]
fn test_min_max_with_nan_do_not_depend_on_order() {
    let orders = [
        vec![Value::Float(3.0), Value::Float(f64::NAN), Value::Integer(1)],
        vec![Value::Float(f64::NAN), Value::Float(3.0), Value::Integer(1)],
        vec![Value::Integer(1), Value::Float(3.0), Value::Float(f64::NAN)],
    ];
    for items in orders {
        let min = ResultOperator::min()
            .execute_in_memory(Some(items.clone()))
            .unwrap()
            .into_value();
        assert_eq!(min, Value::Integer(1));

        let max = ResultOperator::max()
            .execute_in_memory(Some(items))
            .unwrap()
            .into_value();
        assert!(matches!(max, Value::Float(n) if n.is_nan()));
    }
}

#[test]
fn test_min_max_on_empty_sequence() {
    for operator in [ResultOperator::min(), ResultOperator::max()] {
        let err = operator.execute_in_memory(Some(vec![])).unwrap_err();
        assert!(err.is_invalid_operation());
    }
}

#[test]
fn test_pipeline_runs_left_to_right() {
    let items = ints(&[1, 2, 3, 4, 5]);

    let result = apply_in_memory(&[ResultOperator::skip(1), ResultOperator::take(2)], items.clone())
        .unwrap();
    assert_eq!(result, InMemoryData::Sequence(ints(&[2, 3])));

    let result = apply_in_memory(&[ResultOperator::take(2), ResultOperator::skip(1)], items.clone())
        .unwrap();
    assert_eq!(result, InMemoryData::Sequence(ints(&[2])));

    let result = apply_in_memory(&[ResultOperator::reverse(), ResultOperator::first()], items).unwrap();
    assert_eq!(result, InMemoryData::Value(Value::Integer(5)));
}

#[test]
fn test_collection_operator_after_scalar_is_rejected() {
    let err = apply_in_memory(
        &[ResultOperator::count(), ResultOperator::take(1)],
        ints(&[1, 2]),
    )
    .unwrap_err();
    assert!(err.is_argument());
}

#[test]
fn test_with_count_builds_a_replacement() {
    let take = TakeResultOperator::new(3);
    let replacement = take.with_count(1);
    assert_eq!(take.count(), 3);
    assert_eq!(replacement.count(), 1);
}

proptest! {
    #[test]
    fn prop_take_length_is_clamped(items in prop::collection::vec(any::<i64>(), 0..50), count in -20i64..80) {
        let result = TakeResultOperator::new(count)
            .execute_in_memory(Some(ints(&items)))
            .unwrap();
        let taken = result.as_sequence().unwrap();
        let expected = count.clamp(0, items.len() as i64) as usize;
        prop_assert_eq!(taken.len(), expected);
        prop_assert_eq!(taken, &ints(&items)[..expected]);
    }

    #[test]
    fn prop_take_accepts_any_count(items in prop::collection::vec(any::<i64>(), 0..20), count in any::<i64>()) {
        let items = ints(&items);
        let taken = TakeResultOperator::new(count)
            .execute_in_memory(Some(items.clone()))
            .unwrap()
            .into_sequence()
            .unwrap();
        if count <= 0 {
            prop_assert!(taken.is_empty());
        } else if count as u64 >= items.len() as u64 {
            prop_assert_eq!(taken, items);
        } else {
            prop_assert_eq!(taken, items[..count as usize].to_vec());
        }
    }

    #[test]
    fn prop_take_and_skip_partition(items in prop::collection::vec(any::<i64>(), 0..50), count in -20i64..80) {
        let items = ints(&items);
        let taken = TakeResultOperator::new(count)
            .execute_in_memory(Some(items.clone()))
            .unwrap()
            .into_sequence()
            .unwrap();
        let skipped = SkipResultOperator::new(count)
            .execute_in_memory(Some(items.clone()))
            .unwrap()
            .into_sequence()
            .unwrap();
        let mut joined = taken;
        joined.extend(skipped);
        prop_assert_eq!(joined, items);
    }

    #[test]
    fn prop_count_matches_length(items in prop::collection::vec(any::<i64>(), 0..50)) {
        let result = ResultOperator::count()
            .execute_in_memory(Some(ints(&items)))
            .unwrap();
        prop_assert_eq!(result, InMemoryData::Value(Value::Integer(items.len() as i64)));
    }
}
