//! Line-oriented interactive session.
//!
//! The shell keeps one [`Session`] open, so unlike one-shot subcommands it
//! can undo the last insert, update or delete.

use std::io::{self, BufRead, Write};

use dbkeeper_core::Value;
use dbkeeper_sqlite::{QueryOutcome, Session};

use crate::render::{
    current_values, parse_assignments, render_details, render_row_set, render_table,
};

const HELP: &str = "\
Commands:
  tables                      list tables
  use <table>                 select the table for row commands
  rows [filter]               show rows, optionally filtered
  row <key>                   show one row by key
  insert col=value...         insert a row
  update <key> col=value...   update a row
  delete <key>...             delete rows
  undo                        undo the last insert, update or delete
  count                       count rows
  query <sql>                 run a statement
  history                     show executed statements
  log                         show the activity log
  help                        show this help
  exit | quit                 leave the shell";

enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    session: Session,
    table: Option<String>,
    prompt: bool,
}

impl Shell {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            table: None,
            prompt: false,
        }
    }

    /// Writes a `dbkeeper> ` prompt before each line.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Reads commands from `input` until end of input or `exit`.
    ///
    /// Command failures are written to `out` and do not stop the shell.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        if self.prompt {
            write!(out, "dbkeeper> ")?;
            out.flush()?;
        }
        for line in input.lines() {
            let line = line?;
            let tokens = match tokenize(&line) {
                Ok(tokens) => tokens,
                Err(err) => {
                    writeln!(out, "error: {err}")?;
                    continue;
                }
            };
            if !tokens.is_empty() {
                match self.execute(&tokens) {
                    Ok((Flow::Exit, _)) => break,
                    Ok((Flow::Continue, text)) if !text.is_empty() => writeln!(out, "{text}")?,
                    Ok(_) => {}
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            if self.prompt {
                write!(out, "dbkeeper> ")?;
                out.flush()?;
            }
        }
        Ok(())
    }

    fn table(&self) -> Result<&str, String> {
        self.table
            .as_deref()
            .ok_or_else(|| "no table selected; use <table> first".to_string())
    }

    fn execute(&mut self, tokens: &[String]) -> Result<(Flow, String), String> {
        let (command, args) = tokens
            .split_first()
            .ok_or_else(|| "empty command".to_string())?;
        let text = match command.as_str() {
            "exit" | "quit" => return Ok((Flow::Exit, String::new())),
            "help" => HELP.to_string(),
            "tables" => self
                .session
                .tables()
                .map_err(|e| e.to_string())?
                .join("\n"),
            "use" => {
                let [table] = args else {
                    return Err("usage: use <table>".to_string());
                };
                self.session.describe(table).map_err(|e| e.to_string())?;
                self.table = Some(table.clone());
                format!("Using {table}")
            }
            "rows" => {
                let rows = self
                    .session
                    .rows(self.table()?)
                    .map_err(|e| e.to_string())?;
                let term = args.join(" ");
                render_row_set(&rows.filter(&term))
            }
            "row" => {
                let [key] = args else {
                    return Err("usage: row <key>".to_string());
                };
                let key = Value::parse_literal(key);
                match self
                    .session
                    .row_details(self.table()?, &key)
                    .map_err(|e| e.to_string())?
                {
                    Some(details) => render_details(&details),
                    None => return Err(format!("no row with key {key}")),
                }
            }
            "insert" => {
                let table = self.table()?.to_string();
                let (columns, values) = parse_assignments(args)?;
                let rows = self
                    .session
                    .insert(&table, &columns, &values)
                    .map_err(|e| e.to_string())?;
                render_row_set(&rows)
            }
            "update" => {
                let table = self.table()?.to_string();
                let Some((key, assignments)) = args.split_first() else {
                    return Err("usage: update <key> col=value...".to_string());
                };
                let key = Value::parse_literal(key);
                let (columns, new_values) = parse_assignments(assignments)?;
                let details = self
                    .session
                    .row_details(&table, &key)
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("no row with key {key}"))?;
                let old_values = current_values(&details, &columns)?;
                let rows = self
                    .session
                    .update(&table, &key, &columns, &new_values, &old_values)
                    .map_err(|e| e.to_string())?;
                render_row_set(&rows)
            }
            "delete" => {
                let table = self.table()?.to_string();
                let keys = args
                    .iter()
                    .map(|k| Value::parse_literal(k))
                    .collect::<Vec<_>>();
                let rows = self
                    .session
                    .delete_rows(&table, &keys)
                    .map_err(|e| e.to_string())?;
                render_row_set(&rows)
            }
            "undo" => {
                let rows = self.session.undo().map_err(|e| e.to_string())?;
                self.table = Some(rows.table.clone());
                render_row_set(&rows)
            }
            "count" => self
                .session
                .row_count(self.table()?)
                .map_err(|e| e.to_string())?
                .to_string(),
            "query" => {
                let outcome = self
                    .session
                    .run_query(&args.join(" "))
                    .map_err(|e| e.to_string())?;
                render_outcome(&outcome)
            }
            "history" => self
                .session
                .history()
                .entries()
                .enumerate()
                .map(|(i, sql)| format!("{:>3}  {sql}", i + 1))
                .collect::<Vec<_>>()
                .join("\n"),
            "log" => self
                .session
                .activity()
                .entries()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            other => return Err(format!("unknown command '{other}'; try help")),
        };
        Ok((Flow::Continue, text))
    }
}

pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Rows { columns, rows } => render_table(columns, rows),
        QueryOutcome::Executed { affected } => format!("{affected} row(s) affected"),
    }
}

/// Splits a line on whitespace; double quotes group words into one token.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
