use anyhow::Result;

use tower_brackets::cli::Command;
use tower_brackets::{
    handle_analyze, handle_completions, handle_enumerate, handle_record_run, handle_report, handle_schedule,
    handle_stats, interpret,
};

fn main() {
    load_env();
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn load_env() {
    dotenvy::dotenv().ok();
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Enumerate { leagues, date } => handle_enumerate(leagues, *date),
        Command::Analyze { date } => handle_analyze(*date),
        Command::Schedule => handle_schedule(),
        Command::Report {
            player,
            league,
            history,
        } => handle_report(player, league, *history),
        Command::Stats { league } => handle_stats(league),
        Command::RecordRun {
            player,
            name,
            tier,
            wave,
            at,
        } => handle_record_run(player, name, *tier, *wave, *at),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
