//! JSON model descriptions.
//!
//! ```json
//! {
//!   "from": { "name": "s", "type": "Student", "in": { "source": "Students" },
//!             "joins": [ { "name": "c", "type": "Course", "in": { "source": "Courses" },
//!                          "on": { "path": "s.id" }, "equals": { "path": "c.student_id" } } ] },
//!   "body": [
//!     { "where": { "op": ">", "left": { "path": "s.age" }, "right": 20 } },
//!     { "orderby": [ { "by": { "path": "s.name" }, "direction": "desc" } ] }
//!   ],
//!   "select": { "path": "s.name" },
//!   "operators": [ { "take": 3 }, "distinct" ]
//! }
//! ```
//!
//! Expressions are JSON literals or single-purpose objects: `ref`, `path`,
//! `source`, `op`/`left`/`right`, `not`, `call`/`on`/`args`, `get`/`key`,
//! `array` and `object`.

use serde_json::{Map, Value as Json};

use super::CliError;
use crate::{
    BinOp, Clause, ClauseId, Expr, FromClause, ItemType, JoinClause, OrderByClause, Ordering,
    OrderingDirection, QueryError, QueryModel, ResultOperator, WhereClause,
};

/// Item names in scope, innermost last.
#[derive(Debug, Clone, Default)]
struct Scope {
    items: Vec<(String, ClauseId)>,
}

impl Scope {
    fn bind(&mut self, name: &str, id: ClauseId) {
        self.items.push((name.to_string(), id));
    }

    fn resolve(&self, name: &str) -> Result<ClauseId, CliError> {
        self.items
            .iter()
            .rev()
            .find(|(item, _)| item == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| CliError::model(format!("unknown item '{}'", name)))
    }
}

/// Build a query model from its JSON description.
pub fn model_from_json(text: &str) -> Result<QueryModel, CliError> {
    let json: Json = serde_json::from_str(text)?;
    let root = as_object(&json, "model")?;

    let main_json = as_object(field(root, "from")?, "from")?;
    let mut scope = Scope::default();
    let main = from_clause(main_json, &scope)?;
    let main_name = main.item_name().to_string();
    let mut model = QueryModel::new(main)?;
    let main_id = model.main_clause_id();
    scope.bind(&main_name, main_id);
    add_joins(&mut model, main_id, main_json, &mut scope)?;

    for entry in optional_array(root, "body")? {
        add_body_clause(&mut model, entry, &mut scope)?;
    }

    if let Some(select) = root.get("select") {
        model.set_selector(expr(select, &scope)?)?;
    }

    for operator in optional_array(root, "operators")? {
        model.add_result_operator(result_operator(operator)?);
    }

    Ok(model)
}

fn add_body_clause(model: &mut QueryModel, entry: &Json, scope: &mut Scope) -> Result<(), CliError> {
    let entry = as_object(entry, "body clause")?;
    if let Some(from_json) = entry.get("from") {
        let from_json = as_object(from_json, "from")?;
        let from = from_clause(from_json, scope)?;
        let name = from.item_name().to_string();
        let id = model.add_body_clause(Clause::AdditionalFrom(from))?;
        scope.bind(&name, id);
        add_joins(model, id, from_json, scope)
    } else if let Some(predicate) = entry.get("where") {
        model.add_body_clause(Clause::Where(WhereClause::new(expr(predicate, scope)?)))?;
        Ok(())
    } else if let Some(orderings) = entry.get("orderby") {
        let orderings = as_array(orderings, "orderby")?
            .iter()
            .map(|o| ordering(o, scope))
            .collect::<Result<Vec<_>, _>>()?;
        model.add_body_clause(Clause::OrderBy(OrderByClause::new(orderings)?))?;
        Ok(())
    } else {
        Err(CliError::model(
            "a body clause needs one of 'from', 'where' or 'orderby'",
        ))
    }
}

fn from_clause(json: &Map<String, Json>, scope: &Scope) -> Result<FromClause, CliError> {
    Ok(FromClause::new(
        string_field(json, "name")?,
        item_type(json)?,
        expr(field(json, "in")?, scope)?,
    )?)
}

fn add_joins(
    model: &mut QueryModel,
    owner: ClauseId,
    json: &Map<String, Json>,
    scope: &mut Scope,
) -> Result<(), CliError> {
    for join_json in optional_array(json, "joins")? {
        let join_json = as_object(join_json, "join")?;
        let name = string_field(join_json, "name")?;
        let item_type = item_type(join_json)?;
        let inner_sequence = expr(field(join_json, "in")?, scope)?;
        let outer_key = expr(field(join_json, "on")?, scope)?;
        let equals = field(join_json, "equals")?;

        let id = model.add_join(owner, |id| {
            let mut inner_scope = scope.clone();
            inner_scope.bind(name, id);
            let inner_key = expr(equals, &inner_scope)
                .map_err(|e| QueryError::argument("inner_key", e.to_string()))?;
            JoinClause::new(name, item_type, inner_sequence, outer_key, inner_key)
        })?;
        scope.bind(name, id);
    }
    Ok(())
}

fn ordering(json: &Json, scope: &Scope) -> Result<Ordering, CliError> {
    let json = as_object(json, "ordering")?;
    let direction = match json.get("direction").and_then(Json::as_str) {
        None | Some("asc") => OrderingDirection::Ascending,
        Some("desc") => OrderingDirection::Descending,
        Some(other) => {
            return Err(CliError::model(format!("unknown direction '{}'", other)));
        }
    };
    Ok(Ordering::new(expr(field(json, "by")?, scope)?, direction))
}

fn result_operator(json: &Json) -> Result<ResultOperator, CliError> {
    if let Some(name) = json.as_str() {
        return match name {
            "distinct" => Ok(ResultOperator::distinct()),
            "reverse" => Ok(ResultOperator::reverse()),
            "first" => Ok(ResultOperator::first()),
            "first_or_default" => Ok(ResultOperator::first_or_default()),
            "count" => Ok(ResultOperator::count()),
            "sum" => Ok(ResultOperator::sum()),
            "min" => Ok(ResultOperator::min()),
            "max" => Ok(ResultOperator::max()),
            other => Err(CliError::model(format!("unknown operator '{}'", other))),
        };
    }

    let object = as_object(json, "operator")?;
    if let Some(count) = object.get("take") {
        Ok(ResultOperator::take(integer(count, "take")?))
    } else if let Some(count) = object.get("skip") {
        Ok(ResultOperator::skip(integer(count, "skip")?))
    } else {
        Err(CliError::model(format!("unknown operator {}", json)))
    }
}

fn expr(json: &Json, scope: &Scope) -> Result<Expr, CliError> {
    let object = match json {
        Json::Null => return Ok(Expr::Null),
        Json::Bool(b) => return Ok(Expr::Boolean(*b)),
        Json::Number(n) => {
            return match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Expr::Integer(i)),
                (None, Some(f)) => Ok(Expr::Float(f)),
                (None, None) => Err(CliError::model(format!("unsupported number {}", n))),
            };
        }
        Json::String(s) => return Ok(Expr::string(s.as_str())),
        Json::Array(items) => {
            return items
                .iter()
                .map(|item| expr(item, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Expr::Array);
        }
        Json::Object(object) => object,
    };

    if let Some(name) = object.get("ref") {
        return Ok(Expr::query_source(scope.resolve(as_str(name, "ref")?)?));
    }
    if let Some(path) = object.get("path") {
        let mut segments = as_str(path, "path")?.split('.');
        let head = segments.next().unwrap_or_default();
        let mut result = Expr::query_source(scope.resolve(head)?);
        for segment in segments {
            result = Expr::member(result, segment);
        }
        return Ok(result);
    }
    if let Some(name) = object.get("source") {
        return Ok(Expr::source(as_str(name, "source")?));
    }
    if let Some(symbol) = object.get("op") {
        let symbol = as_str(symbol, "op")?;
        let op = BinOp::from_symbol(symbol)
            .ok_or_else(|| CliError::model(format!("unknown operator '{}'", symbol)))?;
        return Ok(Expr::binary(
            op,
            expr(field(object, "left")?, scope)?,
            expr(field(object, "right")?, scope)?,
        ));
    }
    if let Some(inner) = object.get("not") {
        return Ok(Expr::not(expr(inner, scope)?));
    }
    if let Some(method) = object.get("call") {
        let args = optional_array(object, "args")?
            .iter()
            .map(|arg| expr(arg, scope))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::call(
            expr(field(object, "on")?, scope)?,
            as_str(method, "call")?,
            args,
        ));
    }
    if let Some(target) = object.get("get") {
        return Ok(Expr::Access {
            object: Box::new(expr(target, scope)?),
            key: Box::new(expr(field(object, "key")?, scope)?),
        });
    }
    if let Some(items) = object.get("array") {
        return expr(&Json::Array(as_array(items, "array")?.clone()), scope);
    }
    if let Some(fields) = object.get("object") {
        let fields = as_object(fields, "object")?
            .iter()
            .map(|(key, value)| Ok((key.clone(), expr(value, scope)?)))
            .collect::<Result<Vec<_>, CliError>>()?;
        return Ok(Expr::Object(fields));
    }

    Err(CliError::model(format!("unrecognized expression {}", json)))
}

fn item_type(json: &Map<String, Json>) -> Result<ItemType, CliError> {
    match json.get("type") {
        None => Ok(ItemType::Any),
        Some(text) => Ok(ItemType::parse(as_str(text, "type")?)?),
    }
}

fn field<'j>(json: &'j Map<String, Json>, name: &str) -> Result<&'j Json, CliError> {
    json.get(name)
        .ok_or_else(|| CliError::model(format!("missing '{}'", name)))
}

fn string_field<'j>(json: &'j Map<String, Json>, name: &str) -> Result<&'j str, CliError> {
    as_str(field(json, name)?, name)
}

fn optional_array<'j>(json: &'j Map<String, Json>, name: &str) -> Result<&'j [Json], CliError> {
    match json.get(name) {
        None => Ok(&[]),
        Some(value) => Ok(as_array(value, name)?.as_slice()),
    }
}

fn as_object<'j>(json: &'j Json, what: &str) -> Result<&'j Map<String, Json>, CliError> {
    json.as_object()
        .ok_or_else(|| CliError::model(format!("'{}' must be an object", what)))
}

fn as_array<'j>(json: &'j Json, what: &str) -> Result<&'j Vec<Json>, CliError> {
    json.as_array()
        .ok_or_else(|| CliError::model(format!("'{}' must be an array", what)))
}

fn as_str<'j>(json: &'j Json, what: &str) -> Result<&'j str, CliError> {
    json.as_str()
        .ok_or_else(|| CliError::model(format!("'{}' must be a string", what)))
}

fn integer(json: &Json, what: &str) -> Result<i64, CliError> {
    json.as_i64()
        .ok_or_else(|| CliError::model(format!("'{}' must be an integer", what)))
}
