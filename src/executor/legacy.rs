//! Deprecated nested-where evaluation
//!
//! Strict left-to-right folding with no precedence between `and` and
//! `or`. Kept apart from [`ConditionEvaluator`]'s grouping rules.

use crate::document::Document;
use crate::query::{Connective, LegacyCondition, LegacyWhere, QueryResult};

use super::filters::ConditionEvaluator;

/// Evaluates legacy nested-where trees
pub struct LegacyEvaluator;

impl LegacyEvaluator {
    /// Combines the primary result with the legacy filter.
    ///
    /// With an outer `or`, a document that already passed is accepted
    /// without evaluating the legacy tree at all.
    pub fn apply(nested: &LegacyWhere, primary: bool, document: &Document) -> QueryResult<bool> {
        match nested.outer {
            Connective::Or if primary => Ok(true),
            Connective::Or => Self::evaluate(&nested.condition, document),
            Connective::And => Ok(primary && Self::evaluate(&nested.condition, document)?),
        }
    }

    pub fn evaluate(condition: &LegacyCondition, document: &Document) -> QueryResult<bool> {
        match condition {
            LegacyCondition::Leaf(leaf) => ConditionEvaluator::evaluate_leaf(leaf, document),
            LegacyCondition::Group { first, rest } => {
                let mut result = Self::evaluate(first, document)?;
                for (connective, next) in rest {
                    let next = Self::evaluate(next, document)?;
                    result = match connective {
                        Connective::And => result && next,
                        Connective::Or => result || next,
                    };
                }
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn nested(raw: Value) -> LegacyWhere {
        LegacyWhere::from_json(&raw).unwrap().unwrap()
    }

    #[test]
    fn test_left_to_right_without_precedence() {
        // ((a or b) and c): false for {a, !b, !c}; precedence would give true
        let tree = nested(json!([["a", "=", 1], "or", ["b", "=", 1], "and", ["c", "=", 1]]));
        let d = doc(json!({"a": 1}));
        assert!(!LegacyEvaluator::evaluate(&tree.condition, &d).unwrap());
    }

    #[test]
    fn test_outer_or_short_circuits() {
        // The tree would fail on evaluation; it is never evaluated
        let tree = nested(json!({"or": ["at", ">", {"$date": "2024-01-01"}]}));
        let d = doc(json!({"at": "not a date"}));
        assert!(LegacyEvaluator::apply(&tree, true, &d).unwrap());
        assert!(LegacyEvaluator::apply(&tree, false, &d).is_err());
    }

    #[test]
    fn test_outer_and_requires_both() {
        let tree = nested(json!({"and": ["a", "=", 1]}));
        let d = doc(json!({"a": 1}));
        assert!(LegacyEvaluator::apply(&tree, true, &d).unwrap());
        assert!(!LegacyEvaluator::apply(&tree, false, &d).unwrap());
    }

    #[test]
    fn test_outer_or_rescues_failed_primary() {
        let tree = nested(json!({"or": ["a", "=", 1]}));
        assert!(LegacyEvaluator::apply(&tree, false, &doc(json!({"a": 1}))).unwrap());
        assert!(!LegacyEvaluator::apply(&tree, false, &doc(json!({"a": 2}))).unwrap());
    }
}
