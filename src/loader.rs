//! Readers for the task data file and the precedence diagram.
//!
//! Task data is one record per line: `id cycle_time metabolic_cost`,
//! separated by whitespace, commas or semicolons. The precedence diagram is
//! a Graphviz DOT digraph whose edges read "must precede".

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{PrecedenceGraph, TaskId, TaskMetrics, TaskTable};
use crate::{lblog, lblog_warn, Error, Result};

static FIELD_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,;]+").unwrap());

/// A bare DOT id or a double-quoted one (group 1 quoted, group 2 bare).
static DOT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:"((?:[^"\\]|\\.)*)"|([A-Za-z0-9_.\-]+))\s*$"#).unwrap()
});

/// Read the task data file at `path`.
pub fn read_task_data(path: &Path) -> Result<TaskTable> {
    let text = std::fs::read_to_string(path)?;
    let tasks = parse_task_data(&text, &path.display().to_string())?;
    lblog!("Loaded {} task records from {}", tasks.len(), path.display());
    Ok(tasks)
}

/// Parse task records; `source` names the input in error messages.
pub fn parse_task_data(text: &str, source: &str) -> Result<TaskTable> {
    let mut tasks = TaskTable::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let location = format!("{}:{}", source, number + 1);
        let fields: Vec<&str> = FIELD_SEPARATOR_RE
            .split(line)
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() < 3 {
            return Err(Error::invalid_input(
                location,
                format!("expected `id cycle_time metabolic_cost`, got {:?}", line),
            ));
        }

        let number_at = |index: usize, name: &str| -> Result<f64> {
            fields[index].parse::<f64>().map_err(|_| {
                Error::invalid_input(
                    location.clone(),
                    format!("{} is not a number: {:?}", name, fields[index]),
                )
            })
        };
        let id = TaskId::from(fields[0]);
        let metrics = TaskMetrics::new(number_at(1, "cycle_time")?, number_at(2, "metabolic_cost")?);
        metrics.validate(&id)?;

        if tasks.insert(id.clone(), metrics).is_some() {
            return Err(Error::invalid_input(
                id.to_string(),
                format!("duplicate task record at {}", location),
            ));
        }
    }

    Ok(tasks)
}

/// Read the DOT precedence diagram at `path`.
pub fn read_precedence(path: &Path) -> Result<PrecedenceGraph> {
    let text = std::fs::read_to_string(path)?;
    let graph = parse_precedence(&text, &path.display().to_string())?;
    if graph.is_empty() {
        lblog_warn!("No tasks found in {}", path.display());
    }
    lblog!(
        "Loaded {} tasks and {} precedences from {}",
        graph.task_count(),
        graph.precedence_count(),
        path.display()
    );
    Ok(graph)
}

/// Parse DOT text into a precedence graph.
///
/// Handles `a -> b`, chains `a -> b -> c`, quoted ids, attribute lists,
/// `//`, `/* */` and `#` comments, and bare node statements. Cycles are kept
/// as written.
pub fn parse_precedence(text: &str, source: &str) -> Result<PrecedenceGraph> {
    let mut graph = PrecedenceGraph::new();

    for statement in split_statements(text) {
        let body = statement.text.trim();
        if body.is_empty() || is_keyword_statement(body) {
            continue;
        }

        let ids = split_unquoted(body, "->")
            .into_iter()
            .map(|part| {
                parse_dot_id(part).ok_or_else(|| {
                    Error::invalid_input(
                        format!("{}:{}", source, statement.line),
                        format!("cannot read task id in {:?}", body),
                    )
                })
            })
            .collect::<Result<Vec<TaskId>>>()?;

        if let [single] = ids.as_slice() {
            graph.add_task(single.clone());
        }
        for pair in ids.windows(2) {
            graph.add_precedence(pair[0].clone(), pair[1].clone());
        }
    }

    Ok(graph)
}

/// One DOT statement and the line it starts on.
#[derive(Debug)]
struct Statement {
    line: usize,
    text: String,
}

/// Cut DOT text into statements.
///
/// Statements end at `;`, braces, or a newline that does not follow a
/// dangling `->`. Comments and `[...]` attribute lists are dropped; quoted
/// strings are copied whole, so separators inside them never split.
fn split_statements(text: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut start = 1;
    let mut line = 1;
    let mut depth = 0usize;
    let mut line_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let first_line = line;
                let mut quoted = String::from('"');
                let mut escaped = false;
                for q in chars.by_ref() {
                    if q == '\n' {
                        line += 1;
                    }
                    quoted.push(q);
                    if escaped {
                        escaped = false;
                    } else if q == '\\' {
                        escaped = true;
                    } else if q == '"' {
                        break;
                    }
                }
                if depth == 0 {
                    if current.trim().is_empty() {
                        start = first_line;
                    }
                    current.push_str(&quoted);
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.next_if(|&n| n != '\n').is_some() {}
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for b in chars.by_ref() {
                    if b == '\n' {
                        line += 1;
                    }
                    if prev == '*' && b == '/' {
                        break;
                    }
                    prev = b;
                }
            }
            '#' if line_start => {
                while chars.next_if(|&n| n != '\n').is_some() {}
            }
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '\n' => {
                line += 1;
                if depth == 0 && !current.trim_end().ends_with("->") {
                    push_statement(&mut statements, &mut current, start);
                }
            }
            _ if depth > 0 => {}
            ';' | '{' | '}' => push_statement(&mut statements, &mut current, start),
            _ => {
                if current.trim().is_empty() && !c.is_whitespace() {
                    start = line;
                }
                current.push(c);
            }
        }
        line_start = c == '\n' || (line_start && c.is_whitespace());
    }
    push_statement(&mut statements, &mut current, start);

    statements
}

fn push_statement(statements: &mut Vec<Statement>, current: &mut String, line: usize) {
    let text = std::mem::take(current);
    if !text.trim().is_empty() {
        statements.push(Statement { line, text });
    }
}

/// Split on `separator` wherever it appears outside double quotes.
fn split_unquoted<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let sep = separator.as_bytes();
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut escaped = false;
    let mut begin = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_quote = false;
            }
        } else if b == b'"' {
            in_quote = true;
        } else if bytes[i..].starts_with(sep) {
            parts.push(&text[begin..i]);
            i += sep.len();
            begin = i;
            continue;
        }
        i += 1;
    }
    parts.push(&text[begin..]);
    parts
}

fn parse_dot_id(part: &str) -> Option<TaskId> {
    let caps = DOT_ID_RE.captures(part)?;
    let id = match caps.get(1) {
        Some(quoted) => quoted.as_str().replace("\\\"", "\""),
        None => caps.get(2)?.as_str().to_string(),
    };
    Some(TaskId::from(id))
}

/// Graph headers, default attribute statements, and `key = value` lines.
fn is_keyword_statement(statement: &str) -> bool {
    let first = statement.split_whitespace().next().unwrap_or("");
    matches!(
        first.to_ascii_lowercase().as_str(),
        "digraph" | "graph" | "strict" | "node" | "edge" | "subgraph"
    ) || (split_unquoted(statement, "=").len() > 1 && split_unquoted(statement, "->").len() == 1)
}
