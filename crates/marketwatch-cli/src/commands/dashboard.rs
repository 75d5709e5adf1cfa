//! Interactive dashboard driven by line commands on stdin.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `add <SYM>` | Add a symbol to the watchlist |
//! | `rm <SYM>` | Remove a symbol from the watchlist |
//! | `select <SYM>` | Show a watchlist symbol |
//! | `range <1d\|1w\|1m>` | Change the display range |
//! | `export` | Write the current view to CSV |
//! | `save` / `load` | Persist or reload the watchlist |
//! | `refresh` | Fetch the current view again |
//! | `list` | Print the watchlist |
//! | `help` / `quit` | |

use std::io::Write;
use std::sync::Arc;

use marketwatch_core::{Action, DashboardConfig, QuoteProvider, Range, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

const HELP: &str = "commands: add <SYM>, rm <SYM>, select <SYM>, range <1d|1w|1m>, \
export, save, load, refresh, list, help, quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Dispatch(Action),
    List,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let require = |argument: Option<&str>| {
        argument
            .map(str::to_owned)
            .ok_or_else(|| format!("'{command}' needs a symbol"))
    };

    let input = match command.to_ascii_lowercase().as_str() {
        "add" => Input::Dispatch(Action::AddSymbol(require(argument)?)),
        "rm" | "remove" => Input::Dispatch(Action::RemoveSymbol(require(argument)?)),
        "select" | "sel" => Input::Dispatch(Action::SelectSymbol(require(argument)?)),
        "range" => {
            let raw = argument.ok_or_else(|| String::from("'range' needs 1d, 1w or 1m"))?;
            let range = raw.parse::<Range>().map_err(|error| error.to_string())?;
            Input::Dispatch(Action::SelectRange(range))
        }
        "export" => Input::Dispatch(Action::Export),
        "save" => Input::Dispatch(Action::SaveWatchlist),
        "load" | "reload" => Input::Dispatch(Action::ReloadWatchlist),
        "refresh" => Input::Dispatch(Action::Refresh),
        "list" | "ls" => Input::List,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(input))
}

pub async fn run(
    config: &DashboardConfig,
    provider: Arc<dyn QuoteProvider>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut session = Session::from_config(config, provider).await;
    render(&mut session, format)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(format)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::List => output::render_watchlist(session.state().watchlist(), format)?,
            Input::Dispatch(action) => {
                let refetch = matches!(
                    action,
                    Action::SelectSymbol(_) | Action::SelectRange(_) | Action::Refresh
                );
                if let Err(error) = session.dispatch(action).await {
                    eprintln!("error: {error}");
                }
                print_notices(&mut session);
                if refetch {
                    render(&mut session, format)?;
                }
            }
        }
    }

    Ok(())
}

fn render(session: &mut Session, format: OutputFormat) -> Result<(), CliError> {
    print_notices(session);
    let state = session.state();
    if let Some(view) = state.view() {
        output::render_view(view, state.watchlist(), state.selected(), format)?;
    }
    Ok(())
}

fn print_notices(session: &mut Session) {
    for notice in session.take_notices() {
        eprintln!("* {notice}");
    }
}

fn prompt(format: OutputFormat) -> Result<(), CliError> {
    if format == OutputFormat::Table {
        let mut stdout = std::io::stdout();
        write!(stdout, "> ")?;
        stdout.flush()?;
    }
    Ok(())
}
