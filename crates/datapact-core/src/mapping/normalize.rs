use serde_json::Value;

/// Reorder `actual` so its elements line up with `expected`.
///
/// Mapping elements are paired through `identity_keys`; mappings without any
/// identity key and all other elements pair by equality. Elements of `actual` without a counterpart keep their
/// relative order after the paired ones.
pub fn normalize(actual: &[Value], expected: &[Value], identity_keys: &[String]) -> Vec<Value> {
    normalize_refs(actual, expected, identity_keys)
        .into_iter()
        .cloned()
        .collect()
}

/// Borrowing variant of [`normalize`].
pub fn normalize_refs<'a>(
    actual: &'a [Value],
    expected: &[Value],
    identity_keys: &[String],
) -> Vec<&'a Value> {
    let mut used = vec![false; actual.len()];
    let mut ordered = Vec::with_capacity(actual.len());

    for wanted in expected {
        let found = actual
            .iter()
            .enumerate()
            .find(|(idx, candidate)| !used[*idx] && same_identity(wanted, candidate, identity_keys));
        if let Some((idx, candidate)) = found {
            used[idx] = true;
            ordered.push(candidate);
        }
    }

    ordered.extend(
        actual
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(value, _)| value),
    );
    ordered
}

/// Returns true when `actual` is the counterpart of `expected`.
///
/// For mappings, every identity key present on `expected` must be present on
/// `actual` with an equal value. A mapping carrying none of the identity keys
/// pairs by full equality, like any other element.
pub fn same_identity(expected: &Value, actual: &Value, identity_keys: &[String]) -> bool {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            let mut any = false;
            for key in identity_keys {
                let Some(wanted) = expected_map.get(key) else {
                    continue;
                };
                if actual_map.get(key) != Some(wanted) {
                    return false;
                }
                any = true;
            }
            any || expected == actual
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (expected, actual) => expected == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids() -> Vec<String> {
        vec!["id".to_string()]
    }

    #[test]
    fn reorders_by_identity_key() {
        let actual = vec![json!({"id": "b", "v": 2}), json!({"id": "a", "v": 1})];
        let expected = vec![json!({"id": "a"}), json!({"id": "b"})];
        assert_eq!(
            normalize(&actual, &expected, &ids()),
            vec![json!({"id": "a", "v": 1}), json!({"id": "b", "v": 2})]
        );
    }

    #[test]
    fn unmatched_elements_trail_in_original_order() {
        let actual = vec![
            json!({"id": 9}),
            json!({"id": 2}),
            json!({"v": true}),
            json!({"id": 1}),
        ];
        let expected = vec![json!({"id": 1}), json!({"id": 2})];
        assert_eq!(
            normalize(&actual, &expected, &ids()),
            vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 9}), json!({"v": true})]
        );
    }

    #[test]
    fn scalars_pair_by_equality_and_duplicates_are_consumed_once() {
        let actual = vec![json!(3), json!(1), json!(3), json!(2)];
        let expected = vec![json!(1), json!(2), json!(3), json!(3)];
        assert_eq!(
            normalize(&actual, &expected, &ids()),
            vec![json!(1), json!(2), json!(3), json!(3)]
        );
    }

    #[test]
    fn mappings_without_identity_keys_pair_by_equality() {
        let actual = vec![json!({"sku": "y"}), json!({"sku": "x"}), json!({"sku": "z"})];
        let expected = vec![json!({"sku": "x"}), json!({"sku": "y"})];
        assert_eq!(
            normalize(&actual, &expected, &ids()),
            vec![json!({"sku": "x"}), json!({"sku": "y"}), json!({"sku": "z"})]
        );
    }

    #[test]
    fn composite_identity_keys() {
        let keys = vec!["org".to_string(), "login".to_string()];
        let actual = vec![
            json!({"org": 1, "login": "b"}),
            json!({"org": 1, "login": "a"}),
        ];
        let expected = vec![json!({"org": 1, "login": "a"}), json!({"org": 1, "login": "b"})];
        assert_eq!(normalize(&actual, &expected, &keys), expected);
    }
}
