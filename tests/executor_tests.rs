use std::collections::HashMap;

use quarry::{
    BinOp, Clause, DataSource, ExecutionLimits, Expr, FromClause, InMemoryData,
    InMemoryDataSource, InMemoryExecutor, ItemType, JoinClause, OrderByClause, Ordering,
    QueryError, QueryModel, ResultOperator, Value, WhereClause,
};

fn json_object(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::Object(map)
}

fn student(id: i64, name: &str, age: i64) -> Value {
    json_object(vec![
        ("id", Value::Integer(id)),
        ("name", Value::String(name.into())),
        ("age", Value::Integer(age)),
    ])
}

fn course(student_id: i64, title: &str) -> Value {
    json_object(vec![
        ("student_id", Value::Integer(student_id)),
        ("title", Value::String(title.into())),
    ])
}

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|s| Value::String(s.to_string())).collect()
}

fn school() -> InMemoryDataSource {
    InMemoryDataSource::new()
        .with_source(
            "Students",
            vec![
                student(1, "Ada", 22),
                student(2, "Brian", 19),
                student(3, "Cleo", 25),
                student(4, "Dev", 19),
                student(5, "Eve", 30),
            ],
        )
        .with_source(
            "Courses",
            vec![
                course(1, "Math"),
                course(3, "Art"),
                course(1, "Physics"),
                course(9, "Orphan"),
            ],
        )
}

fn students_model() -> QueryModel {
    QueryModel::new(
        FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap(),
    )
    .unwrap()
}

fn field(model: &QueryModel, name: &str) -> Expr {
    Expr::member(Expr::query_source(model.main_clause_id()), name)
}

fn names(result: InMemoryData) -> Vec<Value> {
    result.into_sequence().unwrap()
}

#[test]
fn test_take_on_students() {
    let source = InMemoryDataSource::new().with_source("Students", strings(&["s1", "s2", "s3", "s4", "s5"]));
    let mut model = students_model();
    model.add_result_operator(ResultOperator::take(3));

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(result, InMemoryData::Sequence(strings(&["s1", "s2", "s3"])));
}

#[test]
fn test_no_operators_returns_projected_items() {
    let source = school();
    let mut model = students_model();
    model.set_selector(field(&model, "name")).unwrap();

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(names(result), strings(&["Ada", "Brian", "Cleo", "Dev", "Eve"]));
}

#[test]
fn test_where_and_order_by() {
    let source = school();
    let mut model = students_model();
    model
        .add_body_clause(Clause::Where(WhereClause::new(Expr::binary(
            BinOp::LessThan,
            field(&model, "age"),
            Expr::Integer(26),
        ))))
        .unwrap();
    model
        .add_body_clause(Clause::OrderBy(
            OrderByClause::new(vec![
                Ordering::ascending(field(&model, "age")),
                Ordering::descending(field(&model, "name")),
            ])
            .unwrap(),
        ))
        .unwrap();
    model.set_selector(field(&model, "name")).unwrap();

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(names(result), strings(&["Dev", "Brian", "Ada", "Cleo"]));
}

#[test]
fn test_order_by_is_stable() {
    let source = school();
    let mut model = students_model();
    model
        .add_body_clause(Clause::OrderBy(
            OrderByClause::new(vec![Ordering::ascending(field(&model, "age"))]).unwrap(),
        ))
        .unwrap();
    model.set_selector(field(&model, "name")).unwrap();

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(names(result), strings(&["Brian", "Dev", "Ada", "Cleo", "Eve"]));
}

#[test]
fn test_join_matches_keys() {
    let source = school();
    let mut model = students_model();
    let s = model.main_clause_id();
    let c = model
        .add_join(s, |c| {
            JoinClause::new(
                "c",
                ItemType::named("Course"),
                Expr::source("Courses"),
                Expr::member(Expr::query_source(s), "id"),
                Expr::member(Expr::query_source(c), "student_id"),
            )
        })
        .unwrap();
    model
        .set_selector(Expr::binary(
            BinOp::Add,
            Expr::binary(
                BinOp::Add,
                Expr::member(Expr::query_source(s), "name"),
                Expr::string(":"),
            ),
            Expr::member(Expr::query_source(c), "title"),
        ))
        .unwrap();

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(names(result), strings(&["Ada:Math", "Ada:Physics", "Cleo:Art"]));
}

#[test]
fn test_additional_from_is_a_cross_product() {
    let source = InMemoryDataSource::new()
        .with_source("Letters", strings(&["a", "b"]))
        .with_source("Digits", strings(&["1", "2", "3"]));
    let mut model = QueryModel::new(
        FromClause::new("l", ItemType::String, Expr::source("Letters")).unwrap(),
    )
    .unwrap();
    let l = model.main_clause_id();
    let d = model
        .add_body_clause(Clause::AdditionalFrom(
            FromClause::new("d", ItemType::String, Expr::source("Digits")).unwrap(),
        ))
        .unwrap();
    model
        .set_selector(Expr::binary(BinOp::Add, Expr::query_source(l), Expr::query_source(d)))
        .unwrap();

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(names(result), strings(&["a1", "a2", "a3", "b1", "b2", "b3"]));
}

#[test]
fn test_additional_from_over_a_member() {
    let source = InMemoryDataSource::new().with_source(
        "Students",
        vec![
            json_object(vec![("friends", Value::Array(strings(&["x", "y"])))]),
            json_object(vec![("friends", Value::Array(vec![]))]),
            json_object(vec![("friends", Value::Array(strings(&["z"])))]),
        ],
    );
    let mut model = students_model();
    let f = model
        .add_body_clause(Clause::AdditionalFrom(
            FromClause::new("f", ItemType::Any, field(&model, "friends")).unwrap(),
        ))
        .unwrap();
    model.set_selector(Expr::query_source(f)).unwrap();

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(names(result), strings(&["x", "y", "z"]));
}

#[test]
fn test_operators_apply_after_projection_in_order() {
    let source = school();
    let mut model = students_model();
    model.set_selector(field(&model, "age")).unwrap();
    model.add_result_operator(ResultOperator::distinct());
    model.add_result_operator(ResultOperator::skip(1));
    model.add_result_operator(ResultOperator::sum());

    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    // distinct ages: 22, 19, 25, 30; skip 1 leaves 19 + 25 + 30
    assert_eq!(result, InMemoryData::Value(Value::Integer(74)));
}

#[test]
fn test_scalar_then_collection_operator_fails() {
    let source = school();
    let mut model = students_model();
    model.add_result_operator(ResultOperator::count());
    model.add_result_operator(ResultOperator::take(1));

    let err = InMemoryExecutor::new(&source).execute(&model).unwrap_err();
    assert!(err.is_argument());
}

#[test]
fn test_first_on_filtered_empty_result() {
    let source = school();
    let mut model = students_model();
    model
        .add_body_clause(Clause::Where(WhereClause::new(Expr::Boolean(false))))
        .unwrap();
    model.add_result_operator(ResultOperator::first());

    let err = InMemoryExecutor::new(&source).execute(&model).unwrap_err();
    assert!(err.is_invalid_operation());

    model
        .replace_result_operator(0, ResultOperator::first_or_default())
        .unwrap();
    let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
    assert_eq!(result, InMemoryData::Value(Value::Null));
}

#[test]
fn test_unknown_source_is_an_evaluation_error() {
    let source = InMemoryDataSource::new();
    let model = students_model();
    let err = InMemoryExecutor::new(&source).execute(&model).unwrap_err();
    assert!(matches!(err, QueryError::Eval(_)));
}

#[test]
fn test_source_limit() {
    let source = school();
    let model = students_model();
    let limits = ExecutionLimits {
        max_source_items: 4,
        ..ExecutionLimits::default()
    };

    let err = InMemoryExecutor::with_limits(&source, limits)
        .execute(&model)
        .unwrap_err();
    assert!(matches!(err, QueryError::LimitExceeded(_)));
}

#[test]
fn test_row_limit() {
    let source = InMemoryDataSource::new().with_source("Numbers", (0..10).map(Value::Integer).collect());
    let mut model = QueryModel::new(
        FromClause::new("a", ItemType::Integer, Expr::source("Numbers")).unwrap(),
    )
    .unwrap();
    model
        .add_body_clause(Clause::AdditionalFrom(
            FromClause::new("b", ItemType::Integer, Expr::source("Numbers")).unwrap(),
        ))
        .unwrap();
    let limits = ExecutionLimits {
        max_rows: 50,
        ..ExecutionLimits::default()
    };

    let err = InMemoryExecutor::with_limits(&source, limits.clone())
        .execute(&model)
        .unwrap_err();
    assert!(matches!(err, QueryError::LimitExceeded(_)));

    let result = InMemoryExecutor::with_limits(&source, ExecutionLimits::unbounded())
        .execute(&model)
        .unwrap();
    assert_eq!(names(result).len(), 100);
}

#[test]
fn test_join_stops_once_the_row_limit_is_passed() {
    let keyed: Vec<Value> = (0..300).map(|_| json_object(vec![("key", Value::Integer(1))])).collect();
    let source = InMemoryDataSource::new()
        .with_source("Left", keyed.clone())
        .with_source("Right", keyed);
    let mut model = QueryModel::new(
        FromClause::new("l", ItemType::Any, Expr::source("Left")).unwrap(),
    )
    .unwrap();
    let l = model.main_clause_id();
    model
        .add_join(l, |r| {
            JoinClause::new(
                "r",
                ItemType::Any,
                Expr::source("Right"),
                Expr::member(Expr::query_source(l), "key"),
                Expr::member(Expr::query_source(r), "key"),
            )
        })
        .unwrap();
    let limits = ExecutionLimits {
        max_rows: 500,
        ..ExecutionLimits::unbounded()
    };

    let err = InMemoryExecutor::with_limits(&source, limits)
        .execute(&model)
        .unwrap_err();
    match err {
        QueryError::LimitExceeded(message) => {
            assert!(message.contains("produced 501 rows"), "{message}")
        }
        other => panic!("expected a limit error, got {other:?}"),
    }
}

#[test]
fn test_order_by_places_nan_after_numbers() {
    let items: Vec<Value> = (0..200)
        .map(|i| {
            if i % 3 == 0 {
                Value::Float(f64::NAN)
            } else {
                Value::Float(((i * 7919) % 211) as f64 / 4.0)
            }
        })
        .collect();
    let source = InMemoryDataSource::new().with_source("Readings", items);
    let mut model = QueryModel::new(
        FromClause::new("r", ItemType::Float, Expr::source("Readings")).unwrap(),
    )
    .unwrap();
    let r = model.main_clause_id();
    model
        .add_body_clause(Clause::OrderBy(
            OrderByClause::new(vec![Ordering::ascending(Expr::query_source(r))]).unwrap(),
        ))
        .unwrap();

    let sorted: Vec<f64> = names(InMemoryExecutor::new(&source).execute(&model).unwrap())
        .iter()
        .filter_map(Value::as_float)
        .collect();
    assert_eq!(sorted.len(), 200);
    let numbers = sorted.iter().take_while(|n| !n.is_nan()).count();
    assert_eq!(numbers, 133);
    assert!(sorted[..numbers].windows(2).all(|w| w[0] <= w[1]));
    assert!(sorted[numbers..].iter().all(|n| n.is_nan()));
}

#[test]
fn test_project_ignores_operators() {
    let source = school();
    let mut model = students_model();
    model.set_selector(field(&model, "id")).unwrap();
    model.add_result_operator(ResultOperator::count());

    let executor = InMemoryExecutor::new(&source);
    let projected = executor.project(&model).unwrap();
    assert_eq!(projected.len(), 5);
    assert_eq!(
        executor.execute(&model).unwrap(),
        InMemoryData::Value(Value::Integer(5))
    );
}

#[test]
fn test_clone_executes_identically() {
    let source = school();
    let mut model = students_model();
    model
        .add_body_clause(Clause::Where(WhereClause::new(Expr::binary(
            BinOp::Equal,
            field(&model, "age"),
            Expr::Integer(19),
        ))))
        .unwrap();
    model.set_selector(field(&model, "name")).unwrap();
    let copy = model.clone_model().unwrap();

    let executor = InMemoryExecutor::new(&source);
    assert_eq!(executor.execute(&copy).unwrap(), executor.execute(&model).unwrap());
}

#[test]
fn test_custom_data_source() {
    struct Countdown;

    impl DataSource for Countdown {
        fn scan(&self, name: &str) -> Option<Vec<Value>> {
            let n: i64 = name.strip_prefix("from")?.parse().ok()?;
            Some((0..=n).rev().map(Value::Integer).collect())
        }
    }

    let model = QueryModel::new(
        FromClause::new("n", ItemType::Integer, Expr::source("from3")).unwrap(),
    )
    .unwrap();
    let result = InMemoryExecutor::new(&Countdown).execute(&model).unwrap();
    assert_eq!(
        names(result),
        vec![Value::Integer(3), Value::Integer(2), Value::Integer(1), Value::Integer(0)]
    );
}
