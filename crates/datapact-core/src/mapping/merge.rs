use serde_json::Value;

use crate::error::{MappingError, Result};
use crate::path::ValuePath;

/// Conflict and list policy for [`merge_with_updates`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Fail instead of replacing an existing leaf with a different value.
    pub extend_only: bool,
    /// Merge sequences positionally instead of replacing them whole.
    pub merge_lists: bool,
}

impl MergeOptions {
    pub fn extend_only() -> Self {
        Self {
            extend_only: true,
            merge_lists: false,
        }
    }

    pub fn with_merge_lists(mut self) -> Self {
        self.merge_lists = true;
        self
    }
}

/// Deep-copy `base` and apply `overrides` on top of it.
///
/// Mappings merge key by key. With `merge_lists`, sequences merge element by
/// element and surplus override elements are appended. Everything else is a
/// leaf: it is replaced, unless `extend_only` is set and the incoming value
/// differs from the existing one.
pub fn merge_with_updates(base: &Value, overrides: &Value, options: MergeOptions) -> Result<Value> {
    let mut merged = base.clone();
    merge_into(&mut merged, overrides, options, &ValuePath::root())?;
    Ok(merged)
}

fn merge_into(
    target: &mut Value,
    update: &Value,
    options: MergeOptions,
    path: &ValuePath,
) -> Result<()> {
    match (target, update) {
        (Value::Object(target), Value::Object(update)) => {
            for (key, incoming) in update {
                match target.get_mut(key) {
                    Some(existing) => merge_into(existing, incoming, options, &path.key(key))?,
                    None => {
                        target.insert(key.clone(), incoming.clone());
                    }
                }
            }
            Ok(())
        }
        (Value::Array(target), Value::Array(update)) if options.merge_lists => {
            for (index, incoming) in update.iter().enumerate() {
                match target.get_mut(index) {
                    Some(existing) => merge_into(existing, incoming, options, &path.index(index))?,
                    None => target.push(incoming.clone()),
                }
            }
            Ok(())
        }
        (target, update) => {
            if *target == *update {
                return Ok(());
            }
            if options.extend_only {
                return Err(MappingError::MergeConflict {
                    path: path.clone(),
                    existing: target.clone(),
                    incoming: update.clone(),
                });
            }
            *target = update.clone();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_are_merged() {
        let base = json!({"db": {"host": "x", "port": 1}});
        let merged =
            merge_with_updates(&base, &json!({"db": {"port": 2}}), MergeOptions::default())
                .expect("merge");
        assert_eq!(merged, json!({"db": {"host": "x", "port": 2}}));
        assert_eq!(base, json!({"db": {"host": "x", "port": 1}}));
    }

    #[test]
    fn extend_only_rejects_overlapping_leaf() {
        let base = json!({"db": {"host": "x", "port": 1}});
        let result = merge_with_updates(&base, &json!({"db": {"port": 2}}), MergeOptions::extend_only());
        match result {
            Err(MappingError::MergeConflict { path, existing, incoming }) => {
                assert_eq!(path.to_string(), "db.port");
                assert_eq!(existing, json!(1));
                assert_eq!(incoming, json!(2));
            }
            other => panic!("expected merge conflict, got {other:?}"),
        }
    }

    #[test]
    fn extend_only_accepts_new_keys_and_identical_values() {
        let base = json!({"db": {"host": "x"}});
        let merged = merge_with_updates(
            &base,
            &json!({"db": {"host": "x", "user": "app"}, "cache": true}),
            MergeOptions::extend_only(),
        )
        .expect("merge");
        assert_eq!(merged, json!({"db": {"host": "x", "user": "app"}, "cache": true}));
    }

    #[test]
    fn lists_are_replaced_by_default() {
        let base = json!({"tags": ["a", "b", "c"]});
        let merged = merge_with_updates(&base, &json!({"tags": ["z"]}), MergeOptions::default())
            .expect("merge");
        assert_eq!(merged, json!({"tags": ["z"]}));
    }

    #[test]
    fn lists_merge_positionally_when_requested() {
        let base = json!({"items": [{"id": 1, "qty": 1}, {"id": 2, "qty": 5}]});
        let update = json!({"items": [{"qty": 3}, {}, {"id": 3}]});
        let merged = merge_with_updates(&base, &update, MergeOptions::default().with_merge_lists())
            .expect("merge");
        assert_eq!(
            merged,
            json!({"items": [{"id": 1, "qty": 3}, {"id": 2, "qty": 5}, {"id": 3}]})
        );
    }
}
