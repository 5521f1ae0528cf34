//! Group-by aggregation
//!
//! Documents are bucketed by their ordered group-field values. Each bucket
//! becomes one output row holding the selected group fields, an optional
//! count and the reduced aggregates. HAVING filters the reduced rows.

use std::collections::HashMap;

use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::document::{resolve_owned, Document};
use crate::query::{
    malformed_group_select, AggregateFunction, Condition, GroupBySpec, QueryError, QueryResult,
    SelectEntry, SelectField,
};

use super::filters::ConditionEvaluator;

/// Numeric aggregate input
#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    /// Numbers and numeric strings; everything else is not numeric
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Num::Int)
                .or_else(|| n.as_f64().map(Num::Float)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Num::Int)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Num::Float))
            }
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map_or(Num::Float(a as f64 + b as f64), Num::Int),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::from(i),
            Num::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        }
    }
}

/// Reduces one aggregate's collected values. Nulls are skipped; the result
/// is null when there is no non-null entry. `avg` divides by the number of
/// entries including nulls.
fn reduce(function: AggregateFunction, values: &[Option<Num>]) -> Value {
    let mut present = values.iter().flatten().copied();
    let Some(first) = present.next() else {
        return Value::Null;
    };
    let result = match function {
        AggregateFunction::Sum => present.fold(first, Num::add),
        AggregateFunction::Min => present.fold(first, |a, b| if b.as_f64() < a.as_f64() { b } else { a }),
        AggregateFunction::Max => present.fold(first, |a, b| if b.as_f64() > a.as_f64() { b } else { a }),
        AggregateFunction::Avg => {
            let sum = present.fold(first, Num::add);
            let count = values.len() as i64;
            match sum {
                Num::Int(total) if total % count == 0 => Num::Int(total / count),
                other => Num::Float(other.as_f64() / count as f64),
            }
        }
    };
    result.into_value()
}

/// One group under construction
struct Bucket {
    row: Document,
    count: u64,
    /// Collected inputs, one list per aggregate entry of the pattern
    inputs: Vec<Vec<Option<Num>>>,
}

/// Group-by executor
pub struct Aggregator<'a> {
    spec: &'a GroupBySpec,
    pattern: Vec<SelectEntry>,
}

impl<'a> Aggregator<'a> {
    /// Builds and validates the output pattern: the explicit selection, or
    /// the group fields followed by the count key. Duplicates are dropped.
    pub fn new(spec: &'a GroupBySpec, select: &[SelectEntry]) -> QueryResult<Self> {
        let candidates: Vec<SelectEntry> = if select.is_empty() {
            spec.group_by_fields
                .iter()
                .map(SelectEntry::path)
                .chain(spec.count_key_name.iter().map(SelectEntry::path))
                .collect()
        } else {
            select.to_vec()
        };

        let mut pattern: Vec<SelectEntry> = Vec::with_capacity(candidates.len());
        for entry in candidates {
            if !pattern.contains(&entry) {
                pattern.push(entry);
            }
        }

        for entry in &pattern {
            match &entry.field {
                SelectField::Path(path) => {
                    let is_count = spec.count_key_name.as_deref() == Some(path.as_str());
                    if !is_count && !spec.group_by_fields.contains(path) {
                        return Err(QueryError::invalid_argument(
                            "You can not select a field that is not grouped by.",
                        ));
                    }
                }
                SelectField::Aggregate { .. } => {
                    if entry.alias.is_none() {
                        return Err(malformed_group_select());
                    }
                }
            }
        }

        Ok(Self { spec, pattern })
    }

    fn is_count(&self, entry: &SelectEntry) -> bool {
        self.spec.count_key_name.as_deref() == Some(entry.output_name())
    }

    /// Groups `documents`, reduces each group and applies `having`
    pub fn aggregate(
        &self,
        documents: &[Document],
        having: Option<&Condition>,
    ) -> QueryResult<Vec<Document>> {
        let mut order: Vec<Bucket> = Vec::new();
        let mut index: HashMap<Vec<u8>, usize> = HashMap::new();

        for document in documents {
            let Some(key) = self.bucket_key(document)? else {
                continue;
            };
            let existing = index.get(&key).copied();
            match existing {
                Some(slot) => self.add_to(&mut order[slot], document)?,
                None => {
                    index.insert(key, order.len());
                    order.push(self.open_bucket(document)?);
                }
            }
        }

        let mut rows = Vec::with_capacity(order.len());
        for bucket in order {
            let row = self.finish(bucket);
            let keep = match having {
                Some(condition) => ConditionEvaluator::evaluate(condition, &row)?,
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Hash of the ordered group values; `None` drops the document
    fn bucket_key(&self, document: &Document) -> QueryResult<Option<Vec<u8>>> {
        let mut hasher = Sha256::new();
        for field in &self.spec.group_by_fields {
            let value = resolve_owned(document, field)?;
            if value.is_null() && !self.spec.allow_empty {
                return Ok(None);
            }
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.to_string().as_bytes());
            hasher.update([0u8]);
        }
        Ok(Some(hasher.finalize().to_vec()))
    }

    fn open_bucket(&self, document: &Document) -> QueryResult<Bucket> {
        let mut row = Document::new();
        let mut inputs = Vec::new();
        for entry in &self.pattern {
            let name = entry.output_name().to_string();
            if self.is_count(entry) {
                row.insert(name, Value::Null);
                continue;
            }
            match &entry.field {
                SelectField::Path(path) => {
                    row.insert(name, resolve_owned(document, path)?);
                }
                SelectField::Aggregate { source, .. } => {
                    row.insert(name, Value::Null);
                    inputs.push(vec![Num::from_value(&resolve_owned(document, source)?)]);
                }
            }
        }
        Ok(Bucket {
            row,
            count: 1,
            inputs,
        })
    }

    fn add_to(&self, bucket: &mut Bucket, document: &Document) -> QueryResult<()> {
        bucket.count += 1;
        let sources = self.pattern.iter().filter_map(|entry| match &entry.field {
            SelectField::Aggregate { source, .. } if !self.is_count(entry) => Some(source),
            _ => None,
        });
        for (source, list) in sources.zip(bucket.inputs.iter_mut()) {
            list.push(Num::from_value(&resolve_owned(document, source)?));
        }
        Ok(())
    }

    fn finish(&self, bucket: Bucket) -> Document {
        let Bucket {
            mut row,
            count,
            inputs,
        } = bucket;
        let mut inputs = inputs.into_iter();
        for entry in &self.pattern {
            let name = entry.output_name().to_string();
            if self.is_count(entry) {
                row.insert(name, Value::from(count));
                continue;
            }
            if let SelectField::Aggregate { function, .. } = &entry.field {
                let values = inputs.next().unwrap_or_default();
                row.insert(name, reduce(*function, &values));
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Vec<Value>) -> Vec<Document> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    // =============================================================================
    // Reduction
    // =============================================================================

    #[test]
    fn test_avg_divides_by_total_count() {
        let values = [Some(Num::Int(10)), None, Some(Num::Int(20))];
        assert_eq!(reduce(AggregateFunction::Avg, &values), json!(10));
    }

    #[test]
    fn test_avg_inexact_is_float() {
        let values = [Some(Num::Int(1)), Some(Num::Int(2))];
        assert_eq!(reduce(AggregateFunction::Avg, &values), json!(1.5));
    }

    #[test]
    fn test_all_null_reduces_to_null() {
        for function in [
            AggregateFunction::Sum,
            AggregateFunction::Min,
            AggregateFunction::Max,
            AggregateFunction::Avg,
        ] {
            assert_eq!(reduce(function, &[None, None]), Value::Null);
            assert_eq!(reduce(function, &[]), Value::Null);
        }
    }

    #[test]
    fn test_sum_min_max() {
        let values = [Some(Num::Int(3)), None, Some(Num::Float(1.5)), Some(Num::Int(-2))];
        assert_eq!(reduce(AggregateFunction::Sum, &values), json!(2.5));
        assert_eq!(reduce(AggregateFunction::Min, &values), json!(-2));
        assert_eq!(reduce(AggregateFunction::Max, &values), json!(3));
    }

    #[test]
    fn test_numeric_strings_count() {
        assert_eq!(Num::from_value(&json!(" 12 ")), Some(Num::Int(12)));
        assert_eq!(Num::from_value(&json!("1.5")), Some(Num::Float(1.5)));
        assert_eq!(Num::from_value(&json!("abc")), None);
        assert_eq!(Num::from_value(&json!(true)), None);
    }

    // =============================================================================
    // Grouping
    // =============================================================================

    #[test]
    fn test_group_with_count() {
        let spec = GroupBySpec::new(["dept"]).with_count_key("n");
        let input = docs(vec![
            json!({"_id": 1, "dept": "x"}),
            json!({"_id": 2, "dept": "x"}),
            json!({"_id": 3, "dept": "y"}),
        ]);
        let rows = Aggregator::new(&spec, &[]).unwrap().aggregate(&input, None).unwrap();
        assert_eq!(
            rows,
            docs(vec![json!({"dept": "x", "n": 2}), json!({"dept": "y", "n": 1})])
        );
    }

    #[test]
    fn test_null_group_value_dropped_unless_allowed() {
        let input = docs(vec![json!({"dept": "x"}), json!({"dept": null}), json!({})]);

        let strict = GroupBySpec::new(["dept"]).with_count_key("n");
        let rows = Aggregator::new(&strict, &[]).unwrap().aggregate(&input, None).unwrap();
        assert_eq!(rows.len(), 1);

        let lenient = strict.clone().allow_empty(true);
        let rows = Aggregator::new(&lenient, &[]).unwrap().aggregate(&input, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["n"], json!(2));
    }

    #[test]
    fn test_aggregates_in_select() {
        let spec = GroupBySpec::new(["dept"]);
        let select = vec![
            SelectEntry::path("dept"),
            SelectEntry::aggregate("avg_salary", AggregateFunction::Avg, "salary"),
            SelectEntry::aggregate("top", AggregateFunction::Max, "salary"),
        ];
        let input = docs(vec![
            json!({"dept": "x", "salary": 10}),
            json!({"dept": "x", "salary": "n/a"}),
            json!({"dept": "x", "salary": 20}),
        ]);
        let rows = Aggregator::new(&spec, &select).unwrap().aggregate(&input, None).unwrap();
        assert_eq!(rows, docs(vec![json!({"dept": "x", "avg_salary": 10, "top": 20})]));
    }

    #[test]
    fn test_having_filters_rows() {
        let spec = GroupBySpec::new(["dept"]).with_count_key("n");
        let input = docs(vec![json!({"dept": "x"}), json!({"dept": "x"}), json!({"dept": "y"})]);
        let having = Condition::leaf("n", ">", json!(1)).unwrap();
        let rows = Aggregator::new(&spec, &[])
            .unwrap()
            .aggregate(&input, Some(&having))
            .unwrap();
        assert_eq!(rows, docs(vec![json!({"dept": "x", "n": 2})]));
    }

    #[test]
    fn test_selecting_ungrouped_field_rejected() {
        let spec = GroupBySpec::new(["dept"]);
        let err = Aggregator::new(&spec, &[SelectEntry::path("name")]).err().unwrap();
        assert!(err.to_string().contains("not grouped by"));
    }

    #[test]
    fn test_aggregate_needs_alias() {
        let spec = GroupBySpec::new(["dept"]);
        let entry = SelectEntry {
            alias: None,
            field: SelectField::Aggregate {
                function: AggregateFunction::Sum,
                source: "salary".into(),
            },
        };
        assert!(Aggregator::new(&spec, &[entry]).is_err());
    }

    #[test]
    fn test_duplicate_pattern_entries_removed() {
        let spec = GroupBySpec::new(["dept", "dept"]).with_count_key("n");
        let input = docs(vec![json!({"dept": "x"})]);
        let rows = Aggregator::new(&spec, &[]).unwrap().aggregate(&input, None).unwrap();
        assert_eq!(rows[0].len(), 2);
    }
}
