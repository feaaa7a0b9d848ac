use super::{Evaluation, RuleError, RuleKind};
use crate::context::EvalContext;
use crate::model::{DeviceModel, Rule, RuleDetail, TextRule};
use confguard_types::ids;
use regex::{Regex, RegexBuilder};

/// Evaluator for pattern-driven rules over a device attribute.
///
/// The attribute is treated as one section, or split into sections by the
/// rule's context regex (a matching line plus its more-indented
/// continuation lines). The pattern is then quantified over sections and
/// the result optionally inverted.
pub struct TextKind;

impl RuleKind for TextKind {
    fn tag(&self) -> &'static str {
        ids::KIND_TEXT
    }

    fn validate(&self, rule: &Rule) -> Result<(), RuleError> {
        let def = text_detail(rule)?;
        if def.field.trim().is_empty() {
            return Err(RuleError::Definition(
                "text rule needs a device attribute in 'field'".to_string(),
            ));
        }
        if def.pattern.is_empty() {
            return Err(RuleError::Definition(
                "text rule needs a non-empty pattern".to_string(),
            ));
        }
        if def.regex {
            compile_pattern(&def.pattern)?;
        }
        if let Some(context) = &def.context {
            compile_pattern(context)?;
        }
        Ok(())
    }

    fn evaluate(
        &self,
        rule: &Rule,
        device: &DeviceModel,
        _ctx: &mut EvalContext<'_>,
    ) -> Result<Evaluation, RuleError> {
        let def = text_detail(rule)?;

        if let Some(driver) = &def.driver {
            if driver != &device.driver {
                return Ok(Evaluation::not_applicable(format!(
                    "rule targets driver '{driver}', device runs '{}'",
                    device.driver
                )));
            }
        }

        let Some(content) = device.attribute(&def.field) else {
            return Err(RuleError::MissingAttribute(def.field.clone()));
        };

        let matcher = Matcher::for_rule(def)?;

        let blocks = match &def.context {
            None => vec![Block {
                start_line: 1,
                text: content.to_string(),
            }],
            Some(context) => {
                let context_re = compile_pattern(context)?;
                let blocks = split_blocks(content, &context_re);
                if blocks.is_empty() {
                    return Ok(Evaluation::not_applicable(format!(
                        "context '{context}' matched no section of '{}'",
                        def.field
                    )));
                }
                blocks
            }
        };

        let mut first_hit: Option<usize> = None;
        let mut first_miss: Option<usize> = None;
        let mut hits = 0usize;

        for block in &blocks {
            match matcher.find(&block.text) {
                Some(offset) => {
                    hits += 1;
                    if first_hit.is_none() {
                        first_hit = Some(block.start_line + line_of(&block.text, offset) - 1);
                    }
                }
                None => {
                    if first_miss.is_none() {
                        first_miss = Some(block.start_line);
                    }
                }
            }
        }

        let satisfied = if def.match_all {
            hits == blocks.len()
        } else {
            hits > 0
        };

        Ok(match (satisfied, def.invert) {
            (true, false) => Evaluation::conforming(found_comment(def, &blocks, first_hit)),
            (false, false) => {
                Evaluation::non_conforming(missing_comment(def, &blocks, first_miss))
            }
            (true, true) => Evaluation::non_conforming(forbidden_comment(def, first_hit)),
            (false, true) => Evaluation::conforming(format!(
                "forbidden pattern '{}' absent from '{}'",
                def.pattern, def.field
            )),
        })
    }
}

fn text_detail(rule: &Rule) -> Result<&TextRule, RuleError> {
    match &rule.detail {
        RuleDetail::Text(def) => Ok(def),
        other => Err(RuleError::Definition(format!(
            "text evaluator received a '{}' rule",
            other.kind_tag()
        ))),
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|err| RuleError::Definition(format!("bad pattern '{pattern}': {err}")))
}

enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    fn for_rule(def: &TextRule) -> Result<Self, RuleError> {
        if def.regex {
            Ok(Matcher::Pattern(compile_pattern(&def.pattern)?))
        } else {
            Ok(Matcher::Literal(def.pattern.clone()))
        }
    }

    /// Byte offset of the first hit within `text`.
    fn find(&self, text: &str) -> Option<usize> {
        match self {
            Matcher::Literal(needle) => text.find(needle.as_str()),
            Matcher::Pattern(re) => re.find(text).map(|m| m.start()),
        }
    }
}

/// One configuration section selected by the context regex.
struct Block {
    /// 1-based line number of the section's first line within the attribute.
    start_line: usize,
    text: String,
}

fn split_blocks(content: &str, context: &Regex) -> Vec<Block> {
    let mut blocks = Vec::new();
    // (start_line, heading indent, lines)
    let mut current: Option<(usize, usize, Vec<&str>)> = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        let continues = match &current {
            Some((_, block_indent, _)) => !trimmed.is_empty() && indent > *block_indent,
            None => false,
        };
        if continues {
            if let Some((_, _, lines)) = current.as_mut() {
                lines.push(line);
            }
            continue;
        }

        if let Some((start_line, _, lines)) = current.take() {
            blocks.push(Block {
                start_line,
                text: lines.join("\n"),
            });
        }
        if context.is_match(line) {
            current = Some((line_no, indent, vec![line]));
        }
    }

    if let Some((start_line, _, lines)) = current.take() {
        blocks.push(Block {
            start_line,
            text: lines.join("\n"),
        });
    }

    blocks
}

/// 1-based line number of a byte offset within `text`.
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

fn found_comment(def: &TextRule, blocks: &[Block], first_hit: Option<usize>) -> String {
    if def.match_all && def.context.is_some() {
        return format!(
            "pattern '{}' present in all {} matching sections of '{}'",
            def.pattern,
            blocks.len(),
            def.field
        );
    }
    match first_hit {
        Some(line) => format!(
            "pattern '{}' found in '{}' (line {line})",
            def.pattern, def.field
        ),
        None => format!("pattern '{}' found in '{}'", def.pattern, def.field),
    }
}

fn missing_comment(def: &TextRule, blocks: &[Block], first_miss: Option<usize>) -> String {
    if def.context.is_none() {
        return format!("pattern '{}' not found in '{}'", def.pattern, def.field);
    }
    if def.match_all {
        match first_miss {
            Some(line) => format!(
                "pattern '{}' missing from section starting at line {line}",
                def.pattern
            ),
            None => format!("pattern '{}' missing from a matching section", def.pattern),
        }
    } else {
        format!(
            "pattern '{}' not found in any of {} matching sections of '{}'",
            def.pattern,
            blocks.len(),
            def.field
        )
    }
}

fn forbidden_comment(def: &TextRule, first_hit: Option<usize>) -> String {
    match first_hit {
        Some(line) => format!(
            "forbidden pattern '{}' found in '{}' (line {line})",
            def.pattern, def.field
        ),
        None => format!(
            "forbidden pattern '{}' found in '{}'",
            def.pattern, def.field
        ),
    }
}
