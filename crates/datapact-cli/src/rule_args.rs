use chrono::Duration;
use datapact_diff::{
    Changed, DecimalEq, NotNull, Rule, RuleSet, TimestampWithin, UnorderedEq, UuidShape,
    WithinTolerance,
};

use crate::CliError;

/// Build a rule set from `PATTERN=RULE[:ARG]` arguments.
///
/// Rules: `not_null`, `changed`, `uuid_shape`, `unordered_eq[:key,key]`,
/// `decimal_eq:PLACES`, `within_tolerance:DELTA`,
/// `timestamp_within:second|minute|hour|day|SECONDS`.
pub fn parse_rules(specs: &[String]) -> Result<RuleSet, CliError> {
    let mut rules = RuleSet::new();
    for spec in specs {
        let (pattern, rule) = spec
            .split_once('=')
            .ok_or_else(|| invalid(spec, "expected PATTERN=RULE"))?;
        let (name, arg) = match rule.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (rule.trim(), None),
        };
        let rule = build_rule(spec, name, arg)?;
        rules.add(pattern.trim(), rule)?;
    }
    Ok(rules)
}

fn build_rule(spec: &str, name: &str, arg: Option<&str>) -> Result<Box<dyn Rule>, CliError> {
    let rule: Box<dyn Rule> = match (name, arg) {
        ("not_null", None) => Box::new(NotNull),
        ("changed", None) => Box::new(Changed),
        ("uuid_shape", None) => Box::new(UuidShape),
        ("unordered_eq", None) => Box::new(UnorderedEq::default()),
        ("unordered_eq", Some(keys)) => Box::new(UnorderedEq::by_keys(
            keys.split(',').map(str::trim).filter(|key| !key.is_empty()),
        )),
        ("decimal_eq", Some(places)) => Box::new(DecimalEq::new(
            places
                .parse()
                .map_err(|_| invalid(spec, "decimal_eq expects a number of places"))?,
        )),
        ("within_tolerance", Some(delta)) => {
            let delta: f64 = delta
                .parse()
                .map_err(|_| invalid(spec, "within_tolerance expects a number"))?;
            Box::new(WithinTolerance::new(delta))
        }
        ("timestamp_within", Some(window)) => Box::new(match window {
            "second" => TimestampWithin::second(),
            "minute" => TimestampWithin::minute(),
            "hour" => TimestampWithin::hour(),
            "day" => TimestampWithin::day(),
            seconds => TimestampWithin::new(Duration::seconds(seconds.parse().map_err(
                |_| invalid(spec, "timestamp_within expects a preset or a number of seconds"),
            )?)),
        }),
        (name, _) => return Err(invalid(spec, &format!("unknown rule or arguments for '{name}'"))),
    };
    Ok(rule)
}

fn invalid(spec: &str, message: &str) -> CliError {
    CliError::InvalidArgument(format!("--rule '{spec}': {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapact_diff::{DiffOptions, compare};
    use serde_json::json;

    #[test]
    fn parses_rule_arguments() {
        let rules = parse_rules(&[
            "amount=within_tolerance:0.01".to_string(),
            "items[*].id=uuid_shape".to_string(),
            "tags=unordered_eq".to_string(),
            "createdAt=timestamp_within:minute".to_string(),
        ])
        .unwrap();
        assert_eq!(rules.len(), 4);

        let result = compare(
            &json!({"amount": 10.0, "tags": ["a", "b"], "createdAt": "2024-01-01T00:00:00Z", "items": []}),
            &json!({"amount": 10.004, "tags": ["b", "a"], "createdAt": "2024-01-01T00:00:30Z", "items": []}),
            &rules,
            &DiffOptions::default().allow_unapplied_rules(),
        );
        assert!(result.is_empty(), "{result}");
    }

    #[test]
    fn rejects_bad_specs() {
        for spec in ["amount", "amount=teleport", "amount=decimal_eq:x", "a[=not_null"] {
            assert!(parse_rules(&[spec.to_string()]).is_err(), "{spec}");
        }
    }
}
