use modpanel_shared::clients::ModerationApi;
use modpanel_shared::errors::{AppError, AppResult};

use crate::dashboard::Dashboard;
use crate::notify::Notifier;

pub const HELP: &str = "\
commands:
  show                    print the panel
  refresh                 refetch reports and strikes
  expand <row>            show or hide a report's raw JSON
  reason <text>           set the strike reason for every report
  reason @<row> <text>    set the strike reason for one report
  strike <row>            issue a strike against the report's user
  act <row> <n>           run action n of a report
  help                    print this help
  quit                    leave

<row> is a report's id, or its position in the list when no id matches.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Refresh,
    Expand(String),
    Reason { row: Option<String>, text: String },
    Strike(String),
    Act { row: String, index: usize },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quiet,
    Quit,
}

fn arg<'a>(rest: &'a str, usage: &str) -> AppResult<&'a str> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(AppError::bad_request(format!("usage: {usage}")));
    }
    Ok(rest)
}

pub fn parse(line: &str) -> AppResult<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match word.to_ascii_lowercase().as_str() {
        "" | "show" | "ls" => Ok(Command::Show),
        "refresh" | "r" => Ok(Command::Refresh),
        "expand" | "x" => Ok(Command::Expand(arg(rest, "expand <row>")?.to_string())),
        "reason" => {
            let rest = rest.trim();
            match rest.strip_prefix('@') {
                Some(targeted) => {
                    let (row, text) = targeted.split_once(char::is_whitespace).unwrap_or((targeted, ""));
                    Ok(Command::Reason {
                        row: Some(arg(row, "reason @<row> <text>")?.to_string()),
                        text: text.trim().to_string(),
                    })
                }
                None => Ok(Command::Reason { row: None, text: rest.to_string() }),
            }
        }
        "strike" | "s" => Ok(Command::Strike(arg(rest, "strike <row>")?.to_string())),
        "act" | "a" => {
            let rest = arg(rest, "act <row> <n>")?;
            let mut parts = rest.split_whitespace();
            let row = parts.next().unwrap_or_default().to_string();
            let index = parts
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| AppError::bad_request("usage: act <row> <n>"))?;
            Ok(Command::Act { row, index })
        }
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(AppError::bad_request(format!("unknown command '{other}', try 'help'"))),
    }
}

/// Applies a command. Failures of the flows have already been shown by the
/// dashboard's notifier, so they are not printed again here.
pub async fn execute<A: ModerationApi, N: Notifier>(dashboard: &Dashboard<A, N>, command: Command) -> Outcome {
    match command {
        Command::Show => Outcome::Print(dashboard.render()),
        Command::Refresh => {
            dashboard.refresh().await;
            Outcome::Print(dashboard.render())
        }
        Command::Expand(row) => match dashboard.find_report(&row) {
            Ok(report) => {
                dashboard.toggle_expanded(&report.key);
                Outcome::Print(dashboard.render())
            }
            Err(e) => Outcome::Print(format!("✖ {e}")),
        },
        Command::Reason { row: None, text } => {
            dashboard.set_default_reason(&text);
            Outcome::Print(format!("strike reason set to \"{}\"", text.trim()))
        }
        Command::Reason { row: Some(row), text } => match dashboard.find_report(&row) {
            Ok(report) => {
                dashboard.set_row_reason(&report.key, &text);
                Outcome::Print(format!("strike reason for {} set to \"{}\"", report.key, text.trim()))
            }
            Err(e) => Outcome::Print(format!("✖ {e}")),
        },
        Command::Strike(row) => match dashboard.find_report(&row) {
            Ok(report) => match dashboard.issue_strike(&report).await {
                Ok(()) => Outcome::Print(dashboard.render()),
                Err(_) => Outcome::Quiet,
            },
            Err(e) => Outcome::Print(format!("✖ {e}")),
        },
        Command::Act { row, index } => match dashboard.find_report(&row) {
            Ok(report) => match dashboard.execute_nth_action(&report, index).await {
                Ok(()) => Outcome::Print(dashboard.render()),
                Err(_) => Outcome::Quiet,
            },
            Err(e) => Outcome::Print(format!("✖ {e}")),
        },
        Command::Help => Outcome::Print(HELP.to_string()),
        Command::Quit => Outcome::Quit,
    }
}
