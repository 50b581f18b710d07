//! Record predicates
//!
//! A [`Predicate`] is evaluated against any [`Record`]. Field comparisons use
//! case-sensitive LIKE matching over the whole field: `*` matches any run of
//! characters and `?` exactly one.

use std::fmt;

use crate::constants::NAME_KEY;
use crate::constants::TYPE_KEY;
use crate::Record;
use crate::RecordKind;
use crate::WatchError;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The record is of this kind
    KindIs(RecordKind),
    /// The record's `key` field LIKE-matches `pattern`
    Like { key: &'static str, pattern: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Evaluates against one record. `And` stops at its first false operand,
    /// `Or` at its first true one.
    ///
    /// Asking a record for a field its kind does not carry is a
    /// [`WatchError::PredicateFault`].
    pub fn evaluate(
        &self,
        record: &Record,
    ) -> Result<bool, WatchError> {
        match self {
            Predicate::KindIs(kind) => Ok(record.kind() == *kind),
            Predicate::Like { key, pattern } => match record.field(key) {
                Some(value) => Ok(like(pattern, value)),
                None => Err(WatchError::PredicateFault {
                    key: *key,
                    kind: record.kind(),
                }),
            },
            Predicate::And(operands) => {
                for operand in operands {
                    if !operand.evaluate(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(operands) => {
                for operand in operands {
                    if operand.evaluate(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    pub fn and(
        self,
        other: Predicate,
    ) -> Predicate {
        match self {
            Predicate::And(mut operands) => {
                operands.push(other);
                Predicate::And(operands)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(
        self,
        other: Predicate,
    ) -> Predicate {
        match self {
            Predicate::Or(mut operands) => {
                operands.push(other);
                Predicate::Or(operands)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fn join(
            f: &mut fmt::Formatter<'_>,
            operands: &[Predicate],
            op: &str,
        ) -> fmt::Result {
            write!(f, "(")?;
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{operand}")?;
            }
            write!(f, ")")
        }

        match self {
            Predicate::KindIs(kind) => write!(f, "kind == {kind}"),
            Predicate::Like { key, pattern } => write!(f, "{key} LIKE {pattern:?}"),
            Predicate::And(operands) => join(f, operands, "AND"),
            Predicate::Or(operands) => join(f, operands, "OR"),
        }
    }
}

/// One of the four filter dimensions a watch can be narrowed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Type,
    Tag,
    Group,
    Property,
}

impl Facet {
    pub fn kind(self) -> RecordKind {
        match self {
            Facet::Type => RecordKind::Node,
            Facet::Tag => RecordKind::Tag,
            Facet::Group => RecordKind::Group,
            Facet::Property => RecordKind::Property,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Facet::Type => TYPE_KEY,
            _ => NAME_KEY,
        }
    }
}

/// `kind == K AND (key LIKE v1 OR key LIKE v2 ...)`
pub fn build_facet_predicate<S: AsRef<str>>(
    kind: RecordKind,
    key: &'static str,
    values: &[S],
) -> Predicate {
    let alternatives = values
        .iter()
        .map(|value| Predicate::Like {
            key,
            pattern: value.as_ref().to_string(),
        })
        .collect();
    Predicate::And(vec![Predicate::KindIs(kind), Predicate::Or(alternatives)])
}

/// Whole-string, case-sensitive wildcard match.
pub fn like(
    pattern: &str,
    text: &str,
) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // last `*` seen, and the text position it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    p = star + 1;
                    t = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}
