#![cfg(feature = "cli")]

use quarry::cli::{
    CliError, ExplainOptions, RunOptions, execute_explain, execute_run, json_to_value,
    model_from_json, value_to_json,
};
use quarry::{ExecutionLimits, Value};
use serde_json::json;

const MODEL: &str = r#"{
    "from": {
        "name": "s", "type": "Student", "in": {"source": "Students"},
        "joins": [{
            "name": "c", "type": "Course", "in": {"source": "Courses"},
            "on": {"path": "s.id"}, "equals": {"path": "c.student_id"}
        }]
    },
    "body": [
        {"where": {"op": ">=", "left": {"path": "s.age"}, "right": 20}},
        {"orderby": [{"by": {"path": "c.title"}, "direction": "desc"}]}
    ],
    "select": {"object": {"student": {"path": "s.name"}, "course": {"path": "c.title"}}},
    "operators": [{"take": 2}]
}"#;

const INPUT: &str = r#"{
    "Students": [
        {"id": 1, "name": "Ada", "age": 22},
        {"id": 2, "name": "Brian", "age": 19},
        {"id": 3, "name": "Cleo", "age": 25}
    ],
    "Courses": [
        {"student_id": 1, "title": "Math"},
        {"student_id": 2, "title": "Art"},
        {"student_id": 3, "title": "Physics"},
        {"student_id": 1, "title": "Biology"}
    ]
}"#;

fn run(model: &str, input: Option<&str>) -> Result<serde_json::Value, CliError> {
    execute_run(&RunOptions {
        model: model.to_string(),
        input: input.map(str::to_string),
        limits: ExecutionLimits::default(),
    })
}

#[test]
fn test_explain() {
    let text = execute_explain(&ExplainOptions {
        model: MODEL.to_string(),
        strategies: false,
    })
    .unwrap();
    assert_eq!(
        text,
        "from Student s in Students \
         join Course c in Courses on s.id equals c.student_id \
         where (s.age >= 20) \
         orderby c.title desc \
         select { course: c.title, student: s.name } => Take(2)"
    );
}

#[test]
fn test_explain_strategies() {
    let model = r#"{"from": {"name": "n", "in": {"source": "Numbers"}},
                    "operators": ["distinct", "count"]}"#;
    let text = execute_explain(&ExplainOptions {
        model: model.to_string(),
        strategies: true,
    })
    .unwrap();
    assert_eq!(
        text,
        "from n in Numbers select n => Distinct() => Count()\n  0: Distinct() [collection]\n  1: Count() [scalar]"
    );
}

#[test]
fn test_run() {
    let output = run(MODEL, Some(INPUT)).unwrap();
    assert_eq!(
        output,
        json!([
            {"student": "Cleo", "course": "Physics"},
            {"student": "Ada", "course": "Math"}
        ])
    );
}

#[test]
fn test_run_scalar() {
    let model = r#"{"from": {"name": "s", "in": {"source": "Students"}},
                    "select": {"path": "s.age"},
                    "operators": ["max"]}"#;
    assert_eq!(run(model, Some(INPUT)).unwrap(), json!(25));
}

#[test]
fn test_run_additional_from_with_method_call() {
    let model = r#"{
        "from": {"name": "s", "in": {"source": "Students"}},
        "body": [
            {"from": {"name": "c", "in": {"source": "Courses"}}},
            {"where": {"op": "and",
                       "left": {"op": "==", "left": {"path": "s.id"}, "right": {"path": "c.student_id"}},
                       "right": {"call": "startswith", "on": {"path": "c.title"}, "args": ["B"]}}}
        ],
        "select": {"call": "upper", "on": {"path": "s.name"}}
    }"#;
    assert_eq!(run(model, Some(INPUT)).unwrap(), json!(["ADA"]));
}

#[test]
fn test_run_requires_input() {
    let err = run(MODEL, None).unwrap_err();
    assert!(matches!(err, CliError::NoInput));
}

#[test]
fn test_run_rejects_non_array_source() {
    let err = run(MODEL, Some(r#"{"Students": 3}"#)).unwrap_err();
    assert!(matches!(err, CliError::Model(_)));
}

#[test]
fn test_invalid_json() {
    let err = model_from_json("{").unwrap_err();
    assert!(matches!(err, CliError::Json(_)));
}

#[test]
fn test_join_key_can_only_see_earlier_items() {
    let model = r#"{
        "from": {
            "name": "s", "in": {"source": "Students"},
            "joins": [{"name": "c", "in": {"source": "Courses"},
                       "on": {"path": "c.student_id"}, "equals": {"path": "s.id"}}]
        }
    }"#;
    let err = model_from_json(model).unwrap_err();
    assert!(err.to_string().contains("unknown item 'c'"));
}

#[test]
fn test_limits_are_applied() {
    let err = execute_run(&RunOptions {
        model: MODEL.to_string(),
        input: Some(INPUT.to_string()),
        limits: ExecutionLimits {
            max_source_items: 2,
            ..ExecutionLimits::default()
        },
    })
    .unwrap_err();
    assert!(err.to_string().contains("limit"));
}

#[test]
fn test_value_conversion() {
    let value = json_to_value(json!({"a": [1, 2.5, null, true, "x"]}));
    let Value::Object(map) = &value else {
        panic!("expected an object, got {:?}", value);
    };
    assert_eq!(
        map["a"],
        Value::Array(vec![
            Value::Integer(1),
            Value::Float(2.5),
            Value::Null,
            Value::Boolean(true),
            Value::String("x".into()),
        ])
    );
    assert_eq!(value_to_json(value), json!({"a": [1, 2.5, null, true, "x"]}));
    assert_eq!(value_to_json(Value::Float(f64::NAN)), serde_json::Value::Null);
}
