//! # Rule Engine
//!
//! Pure first-match evaluation of targeting rules against a context.
//!
//! Rules are scanned in list order and the first full match wins; there is
//! no scoring and no priority field. A clause whose attribute is absent from
//! the context never matches, including the negated operators: `not_equals`,
//! `not_contains` and `not_in` negate the positive test only for an
//! attribute that is present.

use crate::model::{Condition, Context, Operator, Rule};

/// Returns the first rule whose conditions are all satisfied by `context`,
/// or `None` when no rule matches.
pub fn evaluate<'a>(rules: &'a [Rule], context: &Context) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule_matches(rule, context))
}

/// True when the rule's conjunction of clauses (or its single criteria) is
/// satisfied. A rule with no conditions matches unconditionally.
pub fn rule_matches(rule: &Rule, context: &Context) -> bool {
    if !rule.clauses.is_empty() {
        return rule.clauses.iter().all(|clause| clause_matches(clause, context));
    }
    if let Some(criteria) = &rule.criteria {
        return clause_matches(criteria, context);
    }
    true
}

fn clause_matches(clause: &Condition, context: &Context) -> bool {
    // An absent attribute never matches, negated operators included.
    let Some(attribute) = context.attribute(&clause.attribute) else {
        return false;
    };
    let values = &attribute.values;
    let target = clause.value.single();

    match clause.operator {
        Operator::Equals => any(values, target, |value, target| value == target),
        Operator::NotEquals => !any(values, target, |value, target| value == target),
        Operator::Contains => any(values, target, |value, target| value.contains(target)),
        Operator::NotContains => !any(values, target, |value, target| value.contains(target)),
        Operator::In => any_member(values, clause.value.list()),
        Operator::NotIn => !any_member(values, clause.value.list()),
        Operator::StartsWith => any(values, target, |value, target| value.starts_with(target)),
        Operator::EndsWith => any(values, target, |value, target| value.ends_with(target)),
        Operator::Gt => any_numeric(values, target, |value, target| value > target),
        Operator::Gte => any_numeric(values, target, |value, target| value >= target),
        Operator::Lt => any_numeric(values, target, |value, target| value < target),
        Operator::Lte => any_numeric(values, target, |value, target| value <= target),
        Operator::Unknown => false,
    }
}

fn any(values: &[String], target: Option<&str>, test: impl Fn(&str, &str) -> bool) -> bool {
    let Some(target) = target else {
        return false;
    };
    values.iter().any(|value| test(value, target))
}

fn any_member(values: &[String], targets: &[String]) -> bool {
    values.iter().any(|value| targets.contains(value))
}

/// Numeric comparison in string space: both sides must parse as f64, and a
/// value that fails to parse simply does not match.
fn any_numeric(values: &[String], target: Option<&str>, test: impl Fn(f64, f64) -> bool) -> bool {
    let Some(target) = target.and_then(|t| t.parse::<f64>().ok()) else {
        return false;
    };
    values
        .iter()
        .any(|value| value.parse::<f64>().is_ok_and(|value| test(value, target)))
}
