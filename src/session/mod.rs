//! Line-oriented interactive session. Every control change re-renders the
//! view, reusing the session's price cache.

use crate::dashboard::{Controls, Dashboard, Outcome};
use crate::render::{write_view, OutputFormat};
use anyhow::Result;
use clap::ValueEnum;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const HELP: &str = "\
commands:
  days N            lookback window in days (1-50)
  select A,B,...    companies to show (empty clears the selection)
  range MIN MAX     y-axis range
  format FMT        table | csv | json | vega
  show              render the current view
  list              list available companies
  stats             cache statistics
  help              this text
  quit              leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Days(i64),
    Select(Vec<String>),
    Range(f64, f64),
    Format(OutputFormat),
    Show,
    List,
    Stats,
    Help,
    Quit,
}

impl SessionCommand {
    /// Whether the command changes a control and should trigger a re-render.
    fn rerenders(&self) -> bool {
        matches!(
            self,
            SessionCommand::Days(_)
                | SessionCommand::Select(_)
                | SessionCommand::Range(..)
                | SessionCommand::Format(_)
                | SessionCommand::Show
        )
    }
}

pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match cmd.to_lowercase().as_str() {
        "days" => rest
            .parse()
            .map(SessionCommand::Days)
            .map_err(|_| format!("days: not an integer: {:?}", rest)),
        "select" => Ok(SessionCommand::Select(split_companies(rest))),
        "range" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [min, max] = parts.as_slice() else {
                return Err("range: expected MIN MAX".into());
            };
            let min: f64 = min.parse().map_err(|_| format!("range: bad number {:?}", min))?;
            let max: f64 = max.parse().map_err(|_| format!("range: bad number {:?}", max))?;
            Ok(SessionCommand::Range(min, max))
        }
        "format" => OutputFormat::from_str(rest, true)
            .map(SessionCommand::Format)
            .map_err(|_| format!("format: unknown format {:?}", rest)),
        "show" => Ok(SessionCommand::Show),
        "list" => Ok(SessionCommand::List),
        "stats" => Ok(SessionCommand::Stats),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
        "" => Err("empty command".into()),
        other => Err(format!("unknown command {:?} (try `help`)", other)),
    }
}

/// Split a comma-separated selection, dropping blanks.
pub fn split_companies(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Session {
    dashboard: Dashboard,
    controls: Controls,
    format: OutputFormat,
}

impl Session {
    pub fn new(dashboard: Dashboard, controls: Controls, format: OutputFormat) -> Self {
        Self { dashboard, controls, format }
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Render the current controls and write either the view or its message.
    pub async fn render<W: Write>(&mut self, out: &mut W) -> Result<Outcome> {
        let outcome = self.dashboard.render(&self.controls).await;
        match &outcome {
            Outcome::Rendered(view) => write_view(view, self.format, &mut *out)?,
            other => {
                if let Some(msg) = other.message() {
                    writeln!(out, "{}", msg)?;
                }
            }
        }
        Ok(outcome)
    }

    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "{}", HELP)?;
        self.render(out).await?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else { break };
            if line.trim().is_empty() {
                continue;
            }

            let cmd = match parse_command(&line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    continue;
                }
            };
            debug!("session command: {:?}", cmd);

            let rerender = cmd.rerenders();
            match cmd {
                SessionCommand::Days(d) => self.controls.days = d,
                SessionCommand::Select(c) => self.controls.companies = c,
                SessionCommand::Range(min, max) => {
                    self.controls.ymin = min;
                    self.controls.ymax = max;
                }
                SessionCommand::Format(f) => self.format = f,
                SessionCommand::Show => {}
                SessionCommand::List => {
                    for (name, symbol) in self.dashboard.tickers().iter() {
                        writeln!(out, "  {} ({})", name, symbol)?;
                    }
                }
                SessionCommand::Stats => {
                    let cache = self.dashboard.cache();
                    if cache.is_empty() {
                        writeln!(out, "cache: empty")?;
                    } else {
                        writeln!(
                            out,
                            "cache: {} tables, {} hits, {} misses",
                            cache.len(),
                            cache.hits(),
                            cache.misses()
                        )?;
                    }
                }
                SessionCommand::Help => writeln!(out, "{}", HELP)?,
                SessionCommand::Quit => break,
            }

            if rerender {
                self.render(out).await?;
            }
        }
        Ok(())
    }
}
