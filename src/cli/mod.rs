mod collect;

use anyhow::{Result, bail};

use crate::core::terminal::{print_error, print_usage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Run,
    Once,
    Check,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub command: Command,
    pub config: Option<String>,
}

/// `wmibeat [run|once|check|help] [--config <path>]`. Flags may come before
/// or after the command; an unknown word is reported back as `Err`.
pub(crate) fn parse_args(args: &[String], start: usize) -> Result<CliArgs, String> {
    let mut command = None;
    let mut config = None;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    return Err(format!("{} expects a path", args[i]));
                }
            }
            "--help" | "-h" | "help" => {
                command = Some(Command::Help);
                i += 1;
            }
            word if command.is_none() => {
                command = Some(match word {
                    "run" => Command::Run,
                    "once" => Command::Once,
                    "check" => Command::Check,
                    other => return Err(format!("Unknown command: {}", other)),
                });
                i += 1;
            }
            other => return Err(format!("Unexpected argument: {}", other)),
        }
    }
    Ok(CliArgs {
        command: command.unwrap_or(Command::Run),
        config,
    })
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let parsed = match parse_args(&args, 1) {
        Ok(parsed) => parsed,
        Err(msg) => {
            print_error(&msg);
            print_usage();
            bail!("invalid arguments");
        }
    };

    match parsed.command {
        Command::Run => collect::run_collector(parsed.config.as_deref()).await,
        Command::Once => collect::run_once(parsed.config.as_deref()).await,
        Command::Check => collect::check_config(parsed.config.as_deref()).await,
        Command::Help => {
            print_usage();
            Ok(())
        }
    }
}
