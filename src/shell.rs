use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use tracing::debug;

use crate::config::{MAX_CLUSTER_COUNT, MIN_CLUSTER_COUNT};
use crate::filter::{Criterion, FilterValue, Session};
use crate::models::NumericColumn;
use crate::report::{self, Format, ViewKind, ViewParams};

const HELP: &str = "\
Commands:
  show <overview|career|stats|sentiment|clusters|correlation|eda>
  filter <year|program|specialization|location> <value>[, <value>...]
  clear <criterion|all>
  filters
  reset
  load <path>
  cluster <k> [attribute...]
  help
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show(ViewKind),
    Filter(Criterion, Vec<String>),
    Clear(Option<Criterion>),
    Filters,
    Reset,
    Load(PathBuf),
    Cluster {
        k: usize,
        attributes: Vec<NumericColumn>,
    },
    Help,
    Quit,
}

fn parse_enum<T: ValueEnum>(raw: &str, what: &str) -> anyhow::Result<T> {
    T::from_str(raw, true).map_err(|_| anyhow!("unknown {what} '{raw}'"))
}

/// Parses one shell line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "" => return Ok(None),
        "show" => {
            if rest.is_empty() {
                bail!("show needs a view name");
            }
            Command::Show(parse_enum(rest, "view")?)
        }
        "filter" => {
            let (name, values) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| {
                    anyhow!("usage: filter <criterion> <value>[, <value>...]")
                })?;
            let criterion = parse_enum(name, "criterion")?;
            let values: Vec<String> = values
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                bail!("filter needs at least one value; use 'clear' to lift a restriction");
            }
            Command::Filter(criterion, values)
        }
        "clear" => match rest {
            "" => bail!("usage: clear <criterion|all>"),
            "all" => Command::Clear(None),
            name => Command::Clear(Some(parse_enum(name, "criterion")?)),
        },
        "filters" => Command::Filters,
        "reset" => Command::Reset,
        "load" => {
            if rest.is_empty() {
                bail!("usage: load <path>");
            }
            Command::Load(PathBuf::from(rest))
        }
        "cluster" => {
            let mut parts = rest.split_whitespace();
            let k = parts
                .next()
                .ok_or_else(|| anyhow!("usage: cluster <k> [attribute...]"))?;
            let k: usize = k
                .parse()
                .with_context(|| format!("cluster count '{k}' is not a number"))?;
            if !(MIN_CLUSTER_COUNT..=MAX_CLUSTER_COUNT).contains(&k) {
                bail!(
                    "cluster count must be between {MIN_CLUSTER_COUNT} and {MAX_CLUSTER_COUNT}"
                );
            }
            let attributes = parts
                .map(|name| parse_enum(name, "attribute"))
                .collect::<anyhow::Result<Vec<NumericColumn>>>()?;
            Command::Cluster { k, attributes }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}', try 'help'"),
    };

    Ok(Some(command))
}

fn execute(
    command: Command,
    session: &mut Session,
    params: &mut ViewParams,
    format: Format,
) -> anyhow::Result<String> {
    let output = match command {
        Command::Show(kind) => report::render(kind, session, params, format)?,
        Command::Filter(criterion, raw) => {
            let values = raw
                .iter()
                .map(|value| criterion.parse_value(value))
                .collect::<Result<Vec<FilterValue>, _>>()?;
            session.filters_mut().write(criterion, values)?;
            format!(
                "{} of {} respondents selected.",
                session.view().len(),
                session.dataset().len()
            )
        }
        Command::Clear(Some(criterion)) => {
            session.filters_mut().write(criterion, Vec::new())?;
            format!(
                "{} of {} respondents selected.",
                session.view().len(),
                session.dataset().len()
            )
        }
        Command::Clear(None) => {
            for criterion in Criterion::ALL {
                if session.filters().selection(criterion).is_some() {
                    session.filters_mut().write(criterion, Vec::new())?;
                }
            }
            format!(
                "{} of {} respondents selected.",
                session.view().len(),
                session.dataset().len()
            )
        }
        Command::Filters => report::render_filters(session.filters()),
        Command::Reset => {
            session.reset_filters();
            report::render_filters(session.filters())
        }
        Command::Load(path) => {
            session
                .reload(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            format!(
                "{} respondents loaded from {}. Filters were kept; use 'reset' to refresh them.",
                session.dataset().len(),
                path.display()
            )
        }
        Command::Cluster { k, attributes } => {
            params.k = k;
            params.attributes = attributes;
            report::render(ViewKind::Clusters, session, params, format)?
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}

/// Reads commands from `input` until `quit` or end of input. Command errors are
/// reported on `output` and the loop carries on.
pub fn run<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut output: W,
    format: Format,
) -> anyhow::Result<()> {
    let mut params = ViewParams::default();
    writeln!(
        output,
        "{} respondents loaded. Type 'help' for commands.",
        session.dataset().len()
    )?;

    for line in input.lines() {
        let line = line.context("failed to read shell input")?;
        debug!(line = %line, "shell command");

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(output, "error: {err:#}")?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match execute(command, session, &mut params, format) {
            Ok(text) => writeln!(output, "{}", text.trim_end())?,
            Err(err) => writeln!(output, "error: {err:#}")?,
        }
    }

    Ok(())
}
