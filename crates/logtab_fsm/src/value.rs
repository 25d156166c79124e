//! `Value` declarations and their options.

use crate::error::{FsmError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Separator used when a `List` value is rendered into a single field.
pub const LIST_SEPARATOR: &str = "; ";

static VALUE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Value\s+(?:(?P<options>[A-Za-z,]+)\s+)?(?P<name>\w+)\s+(?P<regex>\(.*\))\s*$")
        .expect("value line pattern is valid")
});

/// Modifiers accepted between `Value` and the value name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOption {
    /// Keep the last assigned value across records.
    Filldown,
    /// Marks the value as part of the record's identity. No effect on parsing.
    Key,
    /// Discard records where this value is empty.
    Required,
    /// Accumulate every match instead of keeping the last one.
    List,
    /// Copy a newly assigned value into earlier records that left it empty.
    Fillup,
}

impl ValueOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueOption::Filldown => "Filldown",
            ValueOption::Key => "Key",
            ValueOption::Required => "Required",
            ValueOption::List => "List",
            ValueOption::Fillup => "Fillup",
        }
    }
}

impl fmt::Display for ValueOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueOption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Filldown" => Ok(ValueOption::Filldown),
            "Key" => Ok(ValueOption::Key),
            "Required" => Ok(ValueOption::Required),
            "List" => Ok(ValueOption::List),
            "Fillup" => Ok(ValueOption::Fillup),
            other => Err(format!("Unknown value option '{}'", other)),
        }
    }
}

/// One `Value` line of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDef {
    name: String,
    regex: String,
    options: Vec<ValueOption>,
}

impl ValueDef {
    /// Parse a `Value [Options] Name (regex)` line.
    pub(crate) fn parse_line(line: &str, line_num: usize) -> Result<Self> {
        let caps = VALUE_LINE.captures(line).ok_or_else(|| {
            FsmError::parse(line_num, format!("Expected 'Value [Options] Name (regex)', got '{}'", line))
        })?;

        let name = caps["name"].to_string();
        let regex = caps["regex"].to_string();

        if regex.ends_with("\\)") {
            return Err(FsmError::parse(
                line_num,
                format!("Value '{}' regex must end with an unescaped ')'", name),
            ));
        }
        Regex::new(&regex).map_err(|err| {
            FsmError::parse(line_num, format!("Invalid regex for value '{}': {}", name, err))
        })?;

        let mut options = Vec::new();
        if let Some(raw) = caps.name("options") {
            for token in raw.as_str().split(',') {
                let option: ValueOption = token
                    .parse()
                    .map_err(|msg: String| FsmError::parse(line_num, msg))?;
                if options.contains(&option) {
                    return Err(FsmError::parse(
                        line_num,
                        format!("Duplicate option '{}' on value '{}'", option, name),
                    ));
                }
                options.push(option);
            }
        }

        Ok(Self {
            name,
            regex,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared regex, outer parentheses included.
    pub fn regex(&self) -> &str {
        &self.regex
    }

    pub fn has(&self, option: ValueOption) -> bool {
        self.options.contains(&option)
    }

    /// The regex with its outer group turned into a named capture group.
    pub(crate) fn named_group(&self) -> String {
        format!("(?P<{}>{}", self.name, &self.regex[1..])
    }
}
