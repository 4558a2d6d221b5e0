// Constraints: the closed set of field annotations
//
// `<trim|minLength:8|!startsWith:tmp_>` and `(a|b|c)` are raw syntax. This
// module turns each entry into a typed Constraint, checking the name and
// the parameter shape. Whether the constraint fits the field's type is a
// separate question answered by `accepts` and asked by the validator.
//
// Constraints come in three classes:
//
//   storage hints  isUnique indexed              (never negated)
//   transforms     trim lowercase uppercase
//                  timestampToHex                (never negated)
//   checks         everything else               (`!` inverts the check)

use std::fmt;

use serde::Serialize;

use crate::ir::ScalarType;
use crate::validate::IssueKind;

/// One constraint on a field, as carried by the IR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    #[serde(flatten)]
    pub kind: ConstraintKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConstraintKind {
    IsUnique,
    Indexed,
    Trim,
    Lowercase,
    Uppercase,
    TimestampToHex,
    IsEmail,
    MinLength { value: u64 },
    MaxLength { value: u64 },
    Length { value: u64 },
    LengthBetween { min: u64, max: u64 },
    StartsWith { prefix: String },
    EndsWith { suffix: String },
    IsAnyOf { values: Vec<String> },
    Min { value: f64 },
    Max { value: f64 },
    Between { min: f64, max: f64 },
    /// `(a|b|c)` after the type.
    Enum { values: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintClass {
    StorageHint,
    Transform,
    Check,
}

/// Parameter shape expected after `name:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Params {
    None,
    Count,
    CountPair,
    Number,
    NumberPair,
    Text,
    List,
}

/// Every annotation name, canonical spelling first.
const KNOWN: &[(&str, Params)] = &[
    ("isUnique", Params::None),
    ("indexed", Params::None),
    ("trim", Params::None),
    ("lowercase", Params::None),
    ("uppercase", Params::None),
    ("timestampToHex", Params::None),
    ("isEmail", Params::None),
    ("minLength", Params::Count),
    ("maxLength", Params::Count),
    ("length", Params::Count),
    ("lengthBetween", Params::CountPair),
    ("startsWith", Params::Text),
    ("endsWith", Params::Text),
    ("isAnyOf", Params::List),
    ("min", Params::Number),
    ("max", Params::Number),
    ("between", Params::NumberPair),
];

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            negated: false,
        }
    }

    /// Build a constraint from one `<...>` entry.
    pub fn from_annotation(
        name: &str,
        arg: Option<&str>,
        negated: bool,
        case_insensitive: bool,
    ) -> Result<Constraint, IssueKind> {
        let Some(&(canonical, params)) = KNOWN.iter().find(|(known, _)| {
            if case_insensitive {
                known.eq_ignore_ascii_case(name)
            } else {
                *known == name
            }
        }) else {
            return Err(IssueKind::UnknownConstraint {
                name: name.to_string(),
            });
        };

        let malformed = |reason: String| IssueKind::MalformedAnnotation {
            name: canonical.to_string(),
            reason,
        };

        let arg = match (params, arg) {
            (Params::None, Some(_)) => return Err(malformed("takes no argument".into())),
            (Params::None, None) => "",
            (_, None) => return Err(malformed(format!("expects {}", params.describe()))),
            (_, Some(a)) => a.trim(),
        };

        let kind = match canonical {
            "isUnique" => ConstraintKind::IsUnique,
            "indexed" => ConstraintKind::Indexed,
            "trim" => ConstraintKind::Trim,
            "lowercase" => ConstraintKind::Lowercase,
            "uppercase" => ConstraintKind::Uppercase,
            "timestampToHex" => ConstraintKind::TimestampToHex,
            "isEmail" => ConstraintKind::IsEmail,
            "minLength" => ConstraintKind::MinLength {
                value: parse_count(arg).map_err(malformed)?,
            },
            "maxLength" => ConstraintKind::MaxLength {
                value: parse_count(arg).map_err(malformed)?,
            },
            "length" => ConstraintKind::Length {
                value: parse_count(arg).map_err(malformed)?,
            },
            "lengthBetween" => {
                let (a, b) = split_pair(arg).map_err(malformed)?;
                ConstraintKind::LengthBetween {
                    min: parse_count(a).map_err(malformed)?,
                    max: parse_count(b).map_err(malformed)?,
                }
            }
            "startsWith" => ConstraintKind::StartsWith {
                prefix: parse_text(arg).map_err(malformed)?,
            },
            "endsWith" => ConstraintKind::EndsWith {
                suffix: parse_text(arg).map_err(malformed)?,
            },
            "isAnyOf" => ConstraintKind::IsAnyOf {
                values: parse_list(arg).map_err(malformed)?,
            },
            "min" => ConstraintKind::Min {
                value: parse_number(arg).map_err(malformed)?,
            },
            "max" => ConstraintKind::Max {
                value: parse_number(arg).map_err(malformed)?,
            },
            _ => {
                let (a, b) = split_pair(arg).map_err(malformed)?;
                ConstraintKind::Between {
                    min: parse_number(a).map_err(malformed)?,
                    max: parse_number(b).map_err(malformed)?,
                }
            }
        };

        let constraint = Constraint { kind, negated };
        if negated && constraint.class() != ConstraintClass::Check {
            return Err(malformed("cannot be negated".into()));
        }
        Ok(constraint)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class(&self) -> ConstraintClass {
        match self.kind {
            ConstraintKind::IsUnique | ConstraintKind::Indexed => ConstraintClass::StorageHint,
            ConstraintKind::Trim
            | ConstraintKind::Lowercase
            | ConstraintKind::Uppercase
            | ConstraintKind::TimestampToHex => ConstraintClass::Transform,
            _ => ConstraintClass::Check,
        }
    }

    /// Whether the constraint makes sense on a value of type `ty`.
    pub fn accepts(&self, ty: &ScalarType) -> bool {
        match self.kind {
            ConstraintKind::IsUnique | ConstraintKind::Indexed => {
                matches!(ty, ScalarType::String | ScalarType::Number)
            }
            ConstraintKind::Min { .. }
            | ConstraintKind::Max { .. }
            | ConstraintKind::Between { .. }
            | ConstraintKind::TimestampToHex => *ty == ScalarType::Number,
            _ => *ty == ScalarType::String,
        }
    }

    /// `(lower, upper)` when the constraint bounds a length or a value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.kind {
            ConstraintKind::LengthBetween { min, max } => Some((min as f64, max as f64)),
            ConstraintKind::Between { min, max } => Some((min, max)),
            _ => None,
        }
    }
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::IsUnique => "isUnique",
            ConstraintKind::Indexed => "indexed",
            ConstraintKind::Trim => "trim",
            ConstraintKind::Lowercase => "lowercase",
            ConstraintKind::Uppercase => "uppercase",
            ConstraintKind::TimestampToHex => "timestampToHex",
            ConstraintKind::IsEmail => "isEmail",
            ConstraintKind::MinLength { .. } => "minLength",
            ConstraintKind::MaxLength { .. } => "maxLength",
            ConstraintKind::Length { .. } => "length",
            ConstraintKind::LengthBetween { .. } => "lengthBetween",
            ConstraintKind::StartsWith { .. } => "startsWith",
            ConstraintKind::EndsWith { .. } => "endsWith",
            ConstraintKind::IsAnyOf { .. } => "isAnyOf",
            ConstraintKind::Min { .. } => "min",
            ConstraintKind::Max { .. } => "max",
            ConstraintKind::Between { .. } => "between",
            ConstraintKind::Enum { .. } => "enum",
        }
    }
}

impl Params {
    fn describe(self) -> &'static str {
        match self {
            Params::None => "no argument",
            Params::Count => "a non-negative integer",
            Params::CountPair => "two non-negative integers `a,b`",
            Params::Number => "a number",
            Params::NumberPair => "two numbers `a,b`",
            Params::Text => "a non-empty text",
            Params::List => "a comma-separated list of values",
        }
    }
}

fn parse_count(raw: &str) -> Result<u64, String> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| format!("expects a non-negative integer, found `{raw}`"))
}

fn parse_number(raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(format!("expects a number, found `{raw}`")),
    }
}

fn parse_text(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("expects a non-empty text".into());
    }
    Ok(raw.to_string())
}

fn parse_list(raw: &str) -> Result<Vec<String>, String> {
    let values: Vec<String> = raw.split(',').map(|v| v.trim().to_string()).collect();
    if values.iter().any(String::is_empty) {
        return Err(format!("expects a comma-separated list of values, found `{raw}`"));
    }
    Ok(values)
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    match raw.split(',').collect::<Vec<_>>()[..] {
        [a, b] => Ok((a, b)),
        _ => Err(format!("expects two values `a,b`, found `{raw}`")),
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", self.name())?;
        match &self.kind {
            ConstraintKind::MinLength { value }
            | ConstraintKind::MaxLength { value }
            | ConstraintKind::Length { value } => write!(f, ":{value}"),
            ConstraintKind::LengthBetween { min, max } => write!(f, ":{min},{max}"),
            ConstraintKind::Min { value } | ConstraintKind::Max { value } => write!(f, ":{value}"),
            ConstraintKind::Between { min, max } => write!(f, ":{min},{max}"),
            ConstraintKind::StartsWith { prefix } => write!(f, ":{prefix}"),
            ConstraintKind::EndsWith { suffix } => write!(f, ":{suffix}"),
            ConstraintKind::IsAnyOf { values } => write!(f, ":{}", values.join(",")),
            ConstraintKind::Enum { values } => write!(f, "({})", values.join("|")),
            _ => Ok(()),
        }
    }
}
