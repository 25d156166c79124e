//! Template compilation: value section, state blocks, rules and actions.

use crate::engine;
use crate::error::{FsmError, Result};
use crate::value::ValueDef;
use crate::RowSet;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

const START_STATE: &str = "Start";
const END_STATE: &str = "End";
const EOF_STATE: &str = "EOF";

static STATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("state name pattern is valid"));
static RULE_WITH_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<match>.*)\s->(?P<action>.*)$").expect("rule pattern is valid")
});
static LINE_OP_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s+(?P<line_op>Continue|Next|Error)(?:\.(?P<record_op>Clearall|Clear|Record|NoRecord))?(?:\s+(?P<new_state>\w+|".*"))?$"#,
    )
    .expect("line op pattern is valid")
});
static RECORD_OP_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s+(?P<record_op>Clearall|Clear|Record|NoRecord)(?:\s+(?P<new_state>\w+|".*"))?$"#)
        .expect("record op pattern is valid")
});
static STATE_ONLY_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:\s+(?P<new_state>\w+|".*"))?$"#).expect("state action pattern is valid")
});

/// What happens to the input line after a rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineOp {
    Next,
    Continue,
    Error,
}

/// What happens to the current record after a rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordOp {
    NoRecord,
    Record,
    Clear,
    Clearall,
}

/// Where the machine goes after a `Next` rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Stay,
    State(usize),
    End,
    Eof,
}

#[derive(Debug)]
pub(crate) struct Rule {
    pub(crate) regex: Regex,
    /// Indices into the template's values for every value group in `regex`.
    pub(crate) assigns: Vec<usize>,
    pub(crate) line_op: LineOp,
    pub(crate) record_op: RecordOp,
    pub(crate) transition: Transition,
    pub(crate) error_message: Option<String>,
    pub(crate) line: usize,
}

#[derive(Debug)]
pub(crate) struct State {
    pub(crate) name: String,
    pub(crate) rules: Vec<Rule>,
}

/// A compiled template. Immutable once built; parsing never mutates it.
#[derive(Debug)]
pub struct Template {
    values: Vec<ValueDef>,
    states: Vec<State>,
    start: usize,
    declares_eof: bool,
}

impl Template {
    /// Read and compile a template file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| FsmError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let template = Self::parse(&source)?;
        debug!(
            "Template '{}' - header {:?}",
            path.display(),
            template.header()
        );
        Ok(template)
    }

    /// Compile template source text.
    pub fn parse(source: &str) -> Result<Self> {
        let mut lines = source.lines().enumerate().map(|(idx, line)| (idx + 1, line)).peekable();

        let values = parse_values(&mut lines)?;
        let pending = parse_states(&mut lines, &values)?;
        build(values, pending)
    }

    /// Column names in declaration order.
    pub fn header(&self) -> Vec<String> {
        self.values.iter().map(|v| v.name().to_string()).collect()
    }

    /// Number of columns every produced row has.
    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[ValueDef] {
        &self.values
    }

    /// Run the state machine over `text` and return the emitted records.
    pub fn parse_text(&self, text: &str) -> Result<RowSet> {
        engine::run(self, text)
    }

    pub(crate) fn state(&self, idx: usize) -> &State {
        &self.states[idx]
    }

    pub(crate) fn start(&self) -> usize {
        self.start
    }

    pub(crate) fn declares_eof(&self) -> bool {
        self.declares_eof
    }
}

impl FromStr for Template {
    type Err = FsmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn parse_values<'a, I>(lines: &mut std::iter::Peekable<I>) -> Result<Vec<ValueDef>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut values: Vec<ValueDef> = Vec::new();
    let mut last_line = 0;

    for (line_num, raw) in lines.by_ref() {
        last_line = line_num;
        let line = raw.trim_end();
        if line.is_empty() {
            if values.is_empty() {
                continue;
            }
            return Ok(values);
        }
        if is_comment(line) {
            continue;
        }
        if !line.starts_with("Value ") {
            let message = if values.is_empty() {
                "No Value definitions found"
            } else {
                "Expected blank line after last Value entry"
            };
            return Err(FsmError::parse(line_num, message));
        }
        let def = ValueDef::parse_line(line, line_num)?;
        if values.iter().any(|v| v.name() == def.name()) {
            return Err(FsmError::parse(
                line_num,
                format!("Duplicate value name '{}'", def.name()),
            ));
        }
        values.push(def);
    }

    if values.is_empty() {
        return Err(FsmError::parse(last_line.max(1), "No Value definitions found"));
    }
    Ok(values)
}

/// A rule whose target state has not been resolved to an index yet.
struct PendingRule {
    regex: Regex,
    assigns: Vec<usize>,
    line_op: LineOp,
    record_op: RecordOp,
    new_state: Option<String>,
    line: usize,
}

struct PendingState {
    name: String,
    rules: Vec<PendingRule>,
    line: usize,
}

fn parse_states<'a, I>(
    lines: &mut std::iter::Peekable<I>,
    values: &[ValueDef],
) -> Result<Vec<PendingState>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut states: Vec<PendingState> = Vec::new();

    while let Some((line_num, raw)) = lines.next() {
        let line = raw.trim_end();
        if line.is_empty() || is_comment(line) {
            continue;
        }
        if !STATE_NAME.is_match(line) {
            return Err(FsmError::parse(
                line_num,
                format!("Invalid state name '{}'", line.trim()),
            ));
        }
        if states.iter().any(|s| s.name == line) {
            return Err(FsmError::parse(line_num, format!("Duplicate state name '{}'", line)));
        }

        let mut state = PendingState {
            name: line.to_string(),
            rules: Vec::new(),
            line: line_num,
        };

        while let Some((rule_num, rule_raw)) = lines.next_if(|(_, l)| !l.trim().is_empty()) {
            let rule_line = rule_raw.trim_end();
            if is_comment(rule_line) {
                continue;
            }
            state.rules.push(parse_rule(rule_line, rule_num, values)?);
        }
        states.push(state);
    }

    Ok(states)
}

fn parse_rule(line: &str, line_num: usize, values: &[ValueDef]) -> Result<PendingRule> {
    let starts_with_ws = line.starts_with(|c: char| c.is_whitespace());
    let body = line.trim_start();
    if !starts_with_ws || !body.starts_with('^') {
        return Err(FsmError::parse(
            line_num,
            "Missing white space or caret ('^') before rule",
        ));
    }

    let (pattern, action) = match RULE_WITH_ACTION.captures(body) {
        Some(caps) => (
            caps.name("match").map_or("", |m| m.as_str()).trim_end().to_string(),
            Some(caps.name("action").map_or("", |m| m.as_str()).to_string()),
        ),
        None => (body.to_string(), None),
    };

    let (line_op, record_op, new_state) = match action {
        Some(action) => parse_action(&action, line_num)?,
        None => (LineOp::Next, RecordOp::NoRecord, None),
    };

    let expanded = expand_placeholders(&pattern, values, line_num)?;
    let regex = Regex::new(&format!("^(?:{})", expanded)).map_err(|err| {
        FsmError::parse(line_num, format!("Invalid rule regex '{}': {}", pattern, err))
    })?;
    let assigns = regex
        .capture_names()
        .flatten()
        .filter_map(|name| values.iter().position(|v| v.name() == name))
        .collect();

    Ok(PendingRule {
        regex,
        assigns,
        line_op,
        record_op,
        new_state,
        line: line_num,
    })
}

fn parse_action(action: &str, line_num: usize) -> Result<(LineOp, RecordOp, Option<String>)> {
    let (line_op, record_op, new_state) = if let Some(caps) = LINE_OP_ACTION.captures(action) {
        (
            caps.name("line_op").map(|m| m.as_str()),
            caps.name("record_op").map(|m| m.as_str()),
            caps.name("new_state").map(|m| m.as_str().to_string()),
        )
    } else if let Some(caps) = RECORD_OP_ACTION.captures(action) {
        (
            None,
            caps.name("record_op").map(|m| m.as_str()),
            caps.name("new_state").map(|m| m.as_str().to_string()),
        )
    } else if let Some(caps) = STATE_ONLY_ACTION.captures(action) {
        (None, None, caps.name("new_state").map(|m| m.as_str().to_string()))
    } else {
        return Err(FsmError::parse(
            line_num,
            format!("Badly formatted rule action '{}'", action.trim()),
        ));
    };

    let line_op = match line_op {
        Some("Continue") => LineOp::Continue,
        Some("Error") => LineOp::Error,
        _ => LineOp::Next,
    };
    let record_op = match record_op {
        Some("Record") => RecordOp::Record,
        Some("Clear") => RecordOp::Clear,
        Some("Clearall") => RecordOp::Clearall,
        _ => RecordOp::NoRecord,
    };

    if line_op == LineOp::Continue && new_state.is_some() {
        return Err(FsmError::parse(
            line_num,
            "Action 'Continue' cannot be combined with a state change",
        ));
    }
    if line_op != LineOp::Error {
        if let Some(state) = &new_state {
            if state.starts_with('"') {
                return Err(FsmError::parse(
                    line_num,
                    format!("Alphanumeric characters only in state names, got {}", state),
                ));
            }
        }
    }

    Ok((line_op, record_op, new_state))
}

/// Replace `$Name` / `${Name}` with the value's named group; `$$` is a literal `$`.
fn expand_placeholders(pattern: &str, values: &[ValueDef], line_num: usize) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        let rest = &pattern[idx + 1..];
        let (name, consumed) = if rest.starts_with('$') {
            out.push('$');
            chars.next();
            continue;
        } else if let Some(braced) = rest.strip_prefix('{') {
            let close = braced.find('}').ok_or_else(|| {
                FsmError::parse(line_num, "Unterminated '${' in rule")
            })?;
            (&braced[..close], close + 2)
        } else {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if len == 0 {
                // A bare `$` is the end-of-line anchor.
                out.push('$');
                continue;
            }
            (&rest[..len], len)
        };

        let value = values.iter().find(|v| v.name() == name).ok_or_else(|| {
            FsmError::parse(line_num, format!("Unknown value '{}' referenced in rule", name))
        })?;
        out.push_str(&value.named_group());
        let end = idx + 1 + consumed;
        while chars.next_if(|(i, _)| *i < end).is_some() {}
    }

    Ok(out)
}

fn build(values: Vec<ValueDef>, pending: Vec<PendingState>) -> Result<Template> {
    for reserved in [END_STATE, EOF_STATE] {
        if let Some(state) = pending.iter().find(|s| s.name == reserved) {
            if !state.rules.is_empty() {
                return Err(FsmError::parse(
                    state.line,
                    format!("Non-empty '{}' state", reserved),
                ));
            }
        }
    }

    let declares_eof = pending.iter().any(|s| s.name == EOF_STATE);
    let pending: Vec<PendingState> = pending
        .into_iter()
        .filter(|s| s.name != END_STATE && s.name != EOF_STATE)
        .collect();

    let index: HashMap<&str, usize> = pending
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.name.as_str(), idx))
        .collect();
    let start = *index
        .get(START_STATE)
        .ok_or_else(|| FsmError::parse(1, "Missing state 'Start'"))?;

    let mut resolved = Vec::with_capacity(pending.len());
    for state in &pending {
        let mut rules = Vec::with_capacity(state.rules.len());
        for rule in &state.rules {
            let (transition, error_message) = if rule.line_op == LineOp::Error {
                let message = rule
                    .new_state
                    .as_ref()
                    .map(|s| s.trim_matches('"').to_string());
                (Transition::Stay, message)
            } else {
                let transition = match rule.new_state.as_deref() {
                    None => Transition::Stay,
                    Some(END_STATE) => Transition::End,
                    Some(EOF_STATE) => Transition::Eof,
                    Some(target) => Transition::State(*index.get(target).ok_or_else(|| {
                        FsmError::parse(rule.line, format!("State '{}' not found", target))
                    })?),
                };
                (transition, None)
            };
            rules.push(Rule {
                regex: rule.regex.clone(),
                assigns: rule.assigns.clone(),
                line_op: rule.line_op,
                record_op: rule.record_op,
                transition,
                error_message,
                line: rule.line,
            });
        }
        resolved.push(State {
            name: state.name.clone(),
            rules,
        });
    }

    Ok(Template {
        values,
        states: resolved,
        start,
        declares_eof,
    })
}
