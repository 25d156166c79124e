//! State machine runtime.
//!
//! One [`Run`] lives for exactly one `parse_text` call, so a [`Template`]
//! can be applied to any number of texts without carrying state over.

use crate::error::{FsmError, Result};
use crate::template::{LineOp, RecordOp, Template, Transition};
use crate::value::{ValueOption, LIST_SEPARATOR};
use crate::RowSet;
use tracing::trace;

/// Current contents of one value while parsing.
#[derive(Debug, Default)]
struct Slot {
    value: Option<String>,
    items: Vec<String>,
    /// Last assignment, restored on clear for `Filldown` values.
    kept: Option<String>,
}

struct Run<'t> {
    template: &'t Template,
    slots: Vec<Slot>,
    results: RowSet,
}

pub(crate) fn run(template: &Template, text: &str) -> Result<RowSet> {
    let mut run = Run {
        template,
        slots: template.values().iter().map(|_| Slot::default()).collect(),
        results: Vec::new(),
    };

    let mut state = template.start();
    let mut stopped_at = None;

    for (idx, line) in text.lines().enumerate() {
        match run.check_line(state, line, idx + 1)? {
            Transition::Stay => {}
            Transition::State(next) => {
                trace!("Line {} - entering state '{}'", idx + 1, template.state(next).name);
                state = next;
            }
            terminal @ (Transition::End | Transition::Eof) => {
                stopped_at = Some(terminal);
                break;
            }
        }
    }

    if stopped_at != Some(Transition::End) && !template.declares_eof() {
        run.append_record();
    }

    Ok(run.results)
}

impl<'t> Run<'t> {
    fn check_line(&mut self, state: usize, line: &str, line_num: usize) -> Result<Transition> {
        let template = self.template;
        for rule in &template.state(state).rules {
            let Some(caps) = rule.regex.captures(line) else {
                continue;
            };

            for &value_idx in &rule.assigns {
                let name = template.values()[value_idx].name();
                self.assign(value_idx, caps.name(name).map(|m| m.as_str()));
            }

            match rule.record_op {
                RecordOp::NoRecord => {}
                RecordOp::Record => self.append_record(),
                RecordOp::Clear => self.clear_record(),
                RecordOp::Clearall => self.clear_all(),
            }

            match rule.line_op {
                LineOp::Error => {
                    let message = rule.error_message.clone().unwrap_or_else(|| {
                        format!("State error raised by template rule at line {}", rule.line)
                    });
                    return Err(FsmError::Action {
                        line: line_num,
                        message: format!("{} (input: '{}')", message, line),
                    });
                }
                LineOp::Continue => continue,
                LineOp::Next => return Ok(rule.transition),
            }
        }
        Ok(Transition::Stay)
    }

    fn assign(&mut self, value_idx: usize, matched: Option<&str>) {
        let def = &self.template.values()[value_idx];
        let slot = &mut self.slots[value_idx];

        slot.value = matched.map(str::to_string);
        if def.has(ValueOption::Filldown) {
            slot.kept = slot.value.clone();
        }
        if def.has(ValueOption::List) {
            if let Some(item) = matched {
                slot.items.push(item.to_string());
            }
        }
        if def.has(ValueOption::Fillup) {
            if let Some(value) = matched.filter(|v| !v.is_empty()) {
                for row in self.results.iter_mut().rev() {
                    if !row[value_idx].is_empty() {
                        break;
                    }
                    row[value_idx] = value.to_string();
                }
            }
        }
    }

    fn append_record(&mut self) {
        let mut record: Vec<Option<String>> = Vec::with_capacity(self.slots.len());

        for (def, slot) in self.template.values().iter().zip(&self.slots) {
            let field = if def.has(ValueOption::List) {
                (!slot.items.is_empty()).then(|| slot.items.join(LIST_SEPARATOR))
            } else {
                slot.value.clone()
            };
            if def.has(ValueOption::Required) && field.as_deref().map_or(true, str::is_empty) {
                self.clear_record();
                return;
            }
            record.push(field);
        }

        if record.iter().all(Option::is_none) {
            return;
        }

        self.results
            .push(record.into_iter().map(Option::unwrap_or_default).collect());
        self.clear_record();
    }

    fn clear_record(&mut self) {
        for (def, slot) in self.template.values().iter().zip(self.slots.iter_mut()) {
            slot.value = None;
            if def.has(ValueOption::Filldown) {
                slot.value = slot.kept.clone();
            } else if def.has(ValueOption::List) {
                slot.items.clear();
            }
        }
    }

    fn clear_all(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::default();
        }
    }
}
