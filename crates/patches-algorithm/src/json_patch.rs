//! Structural application of [`Operation`]s to a `serde_json::Value`.
//!
//! Implements the handful of tags the core must interpret to compute
//! observable state: the standard JSON-Patch verbs (`add`, `remove`,
//! `replace`, `move`, `copy`, `test`) plus the two domain extensions named
//! in the spec, `@txt` (text splice) and `@inc` (numeric increment). Any
//! other tag is rejected with [`AlgorithmError::UnknownTag`] — it is still
//! composed and rebased opaquely, but this core ships no interpretation
//! for it.

use patches_types::{Operation, Path, PathSegment, tag};
use serde_json::Value;

use crate::error::{AlgorithmError, AlgorithmResult};

/// Applies `ops` to `state` in order, returning the resulting document.
pub fn apply_ops(state: &Value, ops: &[Operation]) -> AlgorithmResult<Value> {
    let mut state = state.clone();
    for op in ops {
        apply_one(&mut state, op)?;
    }
    Ok(state)
}

fn apply_one(state: &mut Value, op: &Operation) -> AlgorithmResult<()> {
    match op.op.as_str() {
        tag::ADD => add_at(state, &op.path, op.value.clone().unwrap_or(Value::Null)),
        tag::REMOVE => remove_at(state, &op.path).map(|_| ()),
        tag::REPLACE => replace_at(state, &op.path, op.value.clone().unwrap_or(Value::Null)),
        tag::MOVE => {
            let from = op
                .from
                .as_ref()
                .ok_or_else(|| AlgorithmError::PathNotFound("move without `from`".into()))?;
            let value = remove_at(state, from)?;
            add_at(state, &op.path, value)
        }
        tag::COPY => {
            let from = op
                .from
                .as_ref()
                .ok_or_else(|| AlgorithmError::PathNotFound("copy without `from`".into()))?;
            let value = get_at(state, from)?.clone();
            add_at(state, &op.path, value)
        }
        tag::TEST => {
            let actual = get_at(state, &op.path)?;
            let expected = op.value.clone().unwrap_or(Value::Null);
            if *actual == expected {
                Ok(())
            } else {
                Err(AlgorithmError::TestFailed(path_to_string(&op.path)))
            }
        }
        tag::INCREMENT => apply_increment(state, op),
        tag::TEXT_SPLICE => apply_text_splice(state, op),
        other => Err(AlgorithmError::UnknownTag(other.to_string())),
    }
}

fn add_at(state: &mut Value, path: &Path, value: Value) -> AlgorithmResult<()> {
    if path.is_empty() {
        *state = value;
        return Ok(());
    }
    let (parent_path, last) = path.split_at(path.len() - 1);
    let parent = navigate_mut(state, parent_path)?;
    match (&last[0], parent) {
        (PathSegment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(index), Value::Array(arr)) => {
            if *index > arr.len() {
                return Err(AlgorithmError::IndexOutOfBounds(*index));
            }
            arr.insert(*index, value);
            Ok(())
        }
        _ => Err(AlgorithmError::TypeMismatch {
            op: tag::ADD.to_string(),
            path: path_to_string(path),
        }),
    }
}

fn remove_at(state: &mut Value, path: &Path) -> AlgorithmResult<Value> {
    if path.is_empty() {
        return Err(AlgorithmError::PathNotFound("<root>".into()));
    }
    let (parent_path, last) = path.split_at(path.len() - 1);
    let parent = navigate_mut(state, parent_path)?;
    match (&last[0], parent) {
        (PathSegment::Key(key), Value::Object(map)) => map
            .remove(key)
            .ok_or_else(|| AlgorithmError::PathNotFound(key.clone())),
        (PathSegment::Index(index), Value::Array(arr)) => {
            if *index >= arr.len() {
                return Err(AlgorithmError::IndexOutOfBounds(*index));
            }
            Ok(arr.remove(*index))
        }
        _ => Err(AlgorithmError::TypeMismatch {
            op: tag::REMOVE.to_string(),
            path: path_to_string(path),
        }),
    }
}

fn replace_at(state: &mut Value, path: &Path, value: Value) -> AlgorithmResult<()> {
    if path.is_empty() {
        *state = value;
        return Ok(());
    }
    let target = navigate_mut(state, path)?;
    *target = value;
    Ok(())
}

fn apply_increment(state: &mut Value, op: &Operation) -> AlgorithmResult<()> {
    let delta = op
        .value
        .as_ref()
        .and_then(Value::as_f64)
        .unwrap_or_default();
    let target = navigate_mut(state, &op.path)?;
    let current = target.as_f64().ok_or_else(|| AlgorithmError::TypeMismatch {
        op: tag::INCREMENT.to_string(),
        path: path_to_string(&op.path),
    })?;
    *target = serde_json::json!(current + delta);
    Ok(())
}

/// A text splice's payload: delete `delete` chars starting at `index`, then
/// insert `insert`.
pub struct Splice {
    pub index: usize,
    pub delete: usize,
    pub insert: String,
}

pub fn parse_splice(op: &Operation) -> AlgorithmResult<Splice> {
    let value = op.value.as_ref().ok_or_else(|| AlgorithmError::TypeMismatch {
        op: tag::TEXT_SPLICE.to_string(),
        path: path_to_string(&op.path),
    })?;
    let index = value
        .get("index")
        .and_then(Value::as_u64)
        .ok_or_else(|| AlgorithmError::TypeMismatch {
            op: tag::TEXT_SPLICE.to_string(),
            path: path_to_string(&op.path),
        })? as usize;
    let delete = value.get("delete").and_then(Value::as_u64).unwrap_or(0) as usize;
    let insert = value
        .get("insert")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Ok(Splice {
        index,
        delete,
        insert,
    })
}

pub fn splice_op(path: Path, splice: &Splice) -> Operation {
    Operation::new(tag::TEXT_SPLICE, path).with_value(serde_json::json!({
        "index": splice.index,
        "delete": splice.delete,
        "insert": splice.insert,
    }))
}

fn apply_text_splice(state: &mut Value, op: &Operation) -> AlgorithmResult<()> {
    let splice = parse_splice(op)?;
    let target = navigate_mut(state, &op.path)?;
    let text = target.as_str().ok_or_else(|| AlgorithmError::TypeMismatch {
        op: tag::TEXT_SPLICE.to_string(),
        path: path_to_string(&op.path),
    })?;
    let mut chars: Vec<char> = text.chars().collect();
    let start = splice.index.min(chars.len());
    let end = (start + splice.delete).min(chars.len());
    chars.splice(start..end, splice.insert.chars());
    *target = Value::String(chars.into_iter().collect());
    Ok(())
}

fn get_at<'a>(state: &'a Value, path: &Path) -> AlgorithmResult<&'a Value> {
    let mut current = state;
    for segment in path {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map
                .get(key)
                .ok_or_else(|| AlgorithmError::PathNotFound(key.clone()))?,
            (PathSegment::Index(index), Value::Array(arr)) => arr
                .get(*index)
                .ok_or(AlgorithmError::IndexOutOfBounds(*index))?,
            _ => {
                return Err(AlgorithmError::TypeMismatch {
                    op: "navigate".to_string(),
                    path: path_to_string(path),
                });
            }
        };
    }
    Ok(current)
}

fn navigate_mut<'a>(state: &'a mut Value, path: &[PathSegment]) -> AlgorithmResult<&'a mut Value> {
    let mut current = state;
    for segment in path {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map
                .get_mut(key)
                .ok_or_else(|| AlgorithmError::PathNotFound(key.clone()))?,
            (PathSegment::Index(index), Value::Array(arr)) => arr
                .get_mut(*index)
                .ok_or(AlgorithmError::IndexOutOfBounds(*index))?,
            _ => {
                return Err(AlgorithmError::TypeMismatch {
                    op: "navigate".to_string(),
                    path: "<path>".to_string(),
                });
            }
        };
    }
    Ok(current)
}

pub fn path_to_string(path: &Path) -> String {
    path.iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use patches_types::tag;
    use serde_json::json;

    #[test]
    fn add_replace_remove_round_trip() {
        let state = json!({"title": "draft"});
        let ops = vec![
            Operation::new(tag::ADD, vec!["body".into()]).with_value(json!("hello")),
            Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("final")),
        ];
        let next = apply_ops(&state, &ops).unwrap();
        assert_eq!(next, json!({"title": "final", "body": "hello"}));

        let removed = apply_ops(
            &next,
            &[Operation::new(tag::REMOVE, vec!["body".into()])],
        )
        .unwrap();
        assert_eq!(removed, json!({"title": "final"}));
    }

    #[test]
    fn array_add_and_remove_shift_by_index() {
        let state = json!({"items": ["a", "b", "c"]});
        let next = apply_ops(
            &state,
            &[Operation::new(tag::ADD, vec!["items".into(), 1usize.into()]).with_value(json!("x"))],
        )
        .unwrap();
        assert_eq!(next, json!({"items": ["a", "x", "b", "c"]}));
    }

    #[test]
    fn increment_adds_delta_to_numeric_field() {
        let state = json!({"count": 2});
        let next = apply_ops(
            &state,
            &[Operation::new(tag::INCREMENT, vec!["count".into()]).with_value(json!(3))],
        )
        .unwrap();
        assert_eq!(next, json!({"count": 5}));
    }

    #[test]
    fn text_splice_inserts_and_deletes() {
        let state = json!({"body": "hello world"});
        let splice = Splice {
            index: 5,
            delete: 6,
            insert: " there".to_string(),
        };
        let op = splice_op(vec!["body".into()], &splice);
        let next = apply_ops(&state, &[op]).unwrap();
        assert_eq!(next, json!({"body": "hello there"}));
    }

    #[test]
    fn test_op_fails_on_mismatch() {
        let state = json!({"title": "draft"});
        let err = apply_ops(
            &state,
            &[Operation::new(tag::TEST, vec!["title".into()]).with_value(json!("final"))],
        )
        .unwrap_err();
        assert!(matches!(err, AlgorithmError::TestFailed(_)));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let state = json!({});
        let err = apply_ops(&state, &[Operation::new("@frobnicate", vec![])]).unwrap_err();
        assert!(matches!(err, AlgorithmError::UnknownTag(_)));
    }
}
