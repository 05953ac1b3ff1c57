// csv2timeline - core/filter.rs
//
// Row filter expressions: parsing into a typed AST and evaluation.
// Groups are OR-combined; the conditions inside a group are AND-combined.
// Core layer: pure logic, no I/O.
//
// Grammar (whitespace around tokens is ignored):
//
//   filter    := group ( ';' group )*            -- at parenthesis depth 0
//   group     := '(' condition ( ';' condition )* ')'
//              | condition
//   condition := field '=' value                 -- case-insensitive equality
//              | field '~' value                 -- case-insensitive substring
//
// So `(status=200; url~/admin); method=POST` keeps rows that are either
// successful admin requests or POSTs. A bare `a=1; b=2` is two groups.

use crate::core::model::Row;
use crate::util::error::FilterError;

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`: whole value equal, ignoring case.
    Equals,
    /// `~`: value contains the operand, ignoring case.
    Contains,
}

impl Operator {
    pub fn token(&self) -> char {
        match self {
            Operator::Equals => '=',
            Operator::Contains => '~',
        }
    }
}

/// A single `field OP value` test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: String,
    value_lower: String,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.to_string(),
            value_lower: value.to_lowercase(),
        }
    }

    /// Parse `field=value` or `field~value`. Enclosing parentheses are
    /// stripped first.
    ///
    /// `~` takes precedence: a condition containing `~` is a substring test
    /// and its value may contain `=`. The chosen operator must occur exactly
    /// once, and both sides must be non-empty after trimming.
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let inner = strip_enclosing_parens(text);

        if inner.contains(';') {
            return Err(syntax(text, "nested groups are not supported"));
        }

        let operator = if inner.contains('~') {
            Operator::Contains
        } else {
            Operator::Equals
        };
        let token = operator.token();

        let occurrences = inner.matches(token).count();
        if occurrences == 0 {
            return Err(syntax(text, "expected 'field=value' or 'field~value'"));
        }
        if occurrences > 1 {
            return Err(syntax(text, "operator must appear exactly once"));
        }

        let (field, value) = match inner.split_once(token) {
            Some((f, v)) => (f.trim(), v.trim()),
            None => return Err(syntax(text, "expected 'field=value' or 'field~value'")),
        };
        if field.is_empty() || value.is_empty() {
            return Err(syntax(text, "field and value must both be non-empty"));
        }

        Ok(Self::new(field, operator, value))
    }

    /// Test the condition against a row. The row value is compared as-is
    /// (untrimmed), ignoring case.
    pub fn evaluate(&self, row: &Row<'_>) -> Result<bool, FilterError> {
        let actual = row.field(&self.field)?.to_lowercase();
        Ok(match self.operator {
            Operator::Equals => actual == self.value_lower,
            Operator::Contains => actual.contains(&self.value_lower),
        })
    }
}

/// AND-combined conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGroup {
    pub conditions: Vec<Condition>,
}

/// Compiled filter of a configuration: OR of AND-groups.
/// An expression with no groups accepts every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpression {
    groups: Vec<FilterGroup>,
}

impl FilterExpression {
    /// Compile the raw filter entries of a configuration. Each entry may hold
    /// several top-level groups; all groups of all entries are OR-combined.
    pub fn parse(filters: &[String]) -> Result<Self, FilterError> {
        let mut groups = Vec::new();
        for filter in filters {
            for entry in split_top_level(filter, filter)? {
                if entry.trim().is_empty() {
                    continue;
                }
                let body = strip_enclosing_parens(entry);
                let conditions = split_top_level(body, entry)?
                    .into_iter()
                    .filter(|c| !c.trim().is_empty())
                    .map(Condition::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                if !conditions.is_empty() {
                    groups.push(FilterGroup { conditions });
                }
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    /// True if the expression accepts every row.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// True iff some group has all of its conditions true.
    ///
    /// Evaluation short-circuits: a group stops at its first false condition
    /// and the expression stops at the first passing group, so a missing
    /// field is only an error if its condition is actually reached.
    pub fn evaluate(&self, row: &Row<'_>) -> Result<bool, FilterError> {
        if self.groups.is_empty() {
            return Ok(true);
        }
        for group in &self.groups {
            let mut passed = true;
            for condition in &group.conditions {
                if !condition.evaluate(row)? {
                    passed = false;
                    break;
                }
            }
            if passed {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Compile `filters` and evaluate them against `row` in one step.
pub fn evaluate(row: &Row<'_>, filters: &[String]) -> Result<bool, FilterError> {
    FilterExpression::parse(filters)?.evaluate(row)
}

// =============================================================================
// Lexical helpers
// =============================================================================

/// Split on `;` at parenthesis depth 0. `context` is the text reported in
/// errors.
fn split_top_level<'a>(text: &'a str, context: &str) -> Result<Vec<&'a str>, FilterError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(syntax(context, "unbalanced ')'"));
                }
                depth -= 1;
            }
            ';' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(syntax(context, "unbalanced '('"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

/// Remove parentheses that wrap the whole (trimmed) text, repeatedly.
/// `(a=1) ; (b=2)` is left alone because its first `(` closes early.
fn strip_enclosing_parens(text: &str) -> &str {
    let mut s = text.trim();
    while s.starts_with('(') && s.ends_with(')') && encloses_whole(s) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// True if the `(` at index 0 is closed by the `)` at the last index.
fn encloses_whole(s: &str) -> bool {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == s.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn syntax(condition: &str, reason: &'static str) -> FilterError {
    FilterError::Syntax {
        condition: condition.trim().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn row<'a>(headers: &'a [&'a str], values: &'a [&'a str]) -> Row<'a> {
        Row::new(2, headers.iter().copied(), values.iter().copied())
    }

    #[test]
    fn test_empty_filter_accepts_every_row() {
        let r = row(&["status"], &["500"]);
        assert_eq!(evaluate(&r, &[]), Ok(true));
        assert_eq!(evaluate(&r, &filters(&[""])), Ok(true));
        assert_eq!(evaluate(&r, &filters(&[" ; ; "])), Ok(true));
        let empty = Row::new(2, std::iter::empty(), std::iter::empty());
        assert_eq!(evaluate(&empty, &[]), Ok(true));
    }

    #[test]
    fn test_equals_is_case_insensitive_exact() {
        let f = filters(&["status=200"]);
        assert_eq!(evaluate(&row(&["status"], &["404"]), &f), Ok(false));
        assert_eq!(evaluate(&row(&["status"], &["200"]), &f), Ok(true));

        let f = filters(&["result=Success"]);
        assert_eq!(evaluate(&row(&["result"], &["SUCCESS"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&["result"], &["Successful"]), &f), Ok(false));
    }

    #[test]
    fn test_contains_is_case_insensitive_substring() {
        let f = filters(&["url~/admin"]);
        assert_eq!(evaluate(&row(&["url"], &["/admin/login"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&["url"], &["/ADMIN"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&["url"], &["/home"]), &f), Ok(false));
    }

    #[test]
    fn test_parenthesized_group_is_and() {
        let f = filters(&["(status=200; url~/admin)"]);
        let h = ["status", "url"];
        assert_eq!(evaluate(&row(&h, &["200", "/admin"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&h, &["200", "/home"]), &f), Ok(false));
        assert_eq!(evaluate(&row(&h, &["404", "/admin"]), &f), Ok(false));
    }

    #[test]
    fn test_top_level_groups_are_or() {
        let f = filters(&["(status=200; url~/admin); method=POST"]);
        let h = ["status", "url", "method"];
        assert_eq!(evaluate(&row(&h, &["200", "/admin", "GET"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&h, &["404", "/home", "post"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&h, &["404", "/admin", "GET"]), &f), Ok(false));

        let expr = FilterExpression::parse(&f).unwrap();
        assert_eq!(expr.groups().len(), 2);
        assert_eq!(expr.groups()[0].conditions.len(), 2);
    }

    #[test]
    fn test_bare_semicolons_are_separate_groups() {
        let f = filters(&["status=200; status=304"]);
        assert_eq!(evaluate(&row(&["status"], &["304"]), &f), Ok(true));
    }

    #[test]
    fn test_entries_are_or_combined() {
        let f = filters(&["level=error", "(level=warn; msg~disk)"]);
        let h = ["level", "msg"];
        assert_eq!(evaluate(&row(&h, &["ERROR", "x"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&h, &["warn", "Disk full"]), &f), Ok(true));
        assert_eq!(evaluate(&row(&h, &["warn", "cpu"]), &f), Ok(false));
    }

    #[test]
    fn test_parentheses_around_condition_are_stripped() {
        let c = Condition::parse(" ((user = alice)) ").unwrap();
        assert_eq!(c.field, "user");
        assert_eq!(c.operator, Operator::Equals);
        assert_eq!(c.value, "alice");

        let f = filters(&["(a=1); (b=2)"]);
        let expr = FilterExpression::parse(&f).unwrap();
        assert_eq!(expr.groups().len(), 2);
    }

    #[test]
    fn test_contains_takes_precedence_over_equals() {
        let c = Condition::parse("query~a=b").unwrap();
        assert_eq!(c.operator, Operator::Contains);
        assert_eq!(c.field, "query");
        assert_eq!(c.value, "a=b");
    }

    #[test]
    fn test_operator_count_boundaries() {
        for bad in ["status", "status==200", "a=b=c", "url~~x", "a~b~c"] {
            match Condition::parse(bad) {
                Err(FilterError::Syntax { condition, .. }) => assert_eq!(condition, bad),
                other => panic!("Expected syntax error for {bad:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_sides_rejected() {
        for bad in ["=200", "status=", " ~ x", "(=)"] {
            assert!(
                matches!(Condition::parse(bad), Err(FilterError::Syntax { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_syntax_error_is_not_silent_false() {
        let r = row(&["status"], &["200"]);
        assert!(matches!(
            evaluate(&r, &filters(&["status 200"])),
            Err(FilterError::Syntax { .. })
        ));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        for bad in ["(a=1", "a=1)", "(a=1; b=2"] {
            assert!(
                matches!(
                    FilterExpression::parse(&filters(&[bad])),
                    Err(FilterError::Syntax { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_nested_groups_rejected() {
        assert!(matches!(
            FilterExpression::parse(&filters(&["((a=1; b=2); c=3)"])),
            Err(FilterError::Syntax { .. })
        ));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let f = filters(&["status=200"]);
        assert_eq!(
            evaluate(&row(&["url"], &["/home"]), &f),
            Err(FilterError::FieldNotFound {
                field: "status".to_string()
            })
        );
    }

    #[test]
    fn test_evaluation_short_circuits() {
        // First group passes, so the unknown field in the second is never read.
        let f = filters(&["status=200; missing=x"]);
        assert_eq!(evaluate(&row(&["status"], &["200"]), &f), Ok(true));

        // First condition fails, so the group stops before the unknown field.
        let f = filters(&["(status=500; missing=x)"]);
        assert_eq!(evaluate(&row(&["status"], &["200"]), &f), Ok(false));
    }

    #[test]
    fn test_parens_inside_value() {
        let c = Condition::parse("agent~Mozilla (X11").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(c.value, "Mozilla (X11");
        let expr = FilterExpression::parse(&filters(&["agent~(X11)"])).unwrap();
        assert_eq!(expr.groups()[0].conditions[0].value, "(X11)");
    }
}
