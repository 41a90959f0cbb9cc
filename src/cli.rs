//! CLI bindings for all internal commands and modules.
//!
//! This module focuses on the common CLI bindings required to provide easy
//! APIs and consistency across all other modules. This is where the parent
//! CLI can be found, as well as utilities for fetching common switches and
//! values.
use clap::{App, AppSettings, Arg, ArgMatches};

use std::time::Duration;

use crate::types::UtilResult;

/// Constructs a new CLI application using Clap.
///
/// This will register all subcommand modules and embed all metadata. All
/// metadata is fetched dynamically from Cargo and shouldn't require to
/// be updated (ever).
pub fn build<'a, 'b>() -> App<'a, 'b> {
    App::new("")
        .name(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .subcommand(crate::access::cmd())
        .subcommand(crate::regions::cmd())
        .subcommand(crate::upload::cmd())
        .settings(&[
            AppSettings::ArgRequiredElseHelp,
            AppSettings::DisableHelpSubcommand,
            AppSettings::SubcommandRequiredElseHelp,
            AppSettings::VersionlessSubcommands,
        ])
}

/// Executes a subcommand based on the parsed arguments from the CLI.
///
/// Each tool talks to a different AWS service, so clients are created
/// inside the subcommand rather than being passed through from here.
pub async fn exec(args: &ArgMatches<'_>) -> UtilResult<()> {
    match args.subcommand() {
        ("access-report", Some(subargs)) => crate::access::exec(subargs).await,
        ("regions", Some(subargs)) => crate::regions::exec(subargs).await,
        ("upload", Some(subargs)) => crate::upload::exec(subargs).await,
        _ => {
            build().print_help()?;
            Ok(())
        }
    }
}

/// Fetches the set of global arguments which should be attached on each command.
pub fn global_args<'a, 'b>() -> [Arg<'a, 'b>; 1] {
    [Arg::with_name("quiet")
        .help("Only prints errors during execution")
        .short("q")
        .long("quiet")]
}

/// Determines if the dry-run switch was provided in this execution.
pub fn is_dry_run(args: &ArgMatches<'_>) -> bool {
    args.is_present("dry")
}

/// Fetches a human readable duration (i.e. `1s`, `500ms`) from the arguments.
///
/// Arguments fetched through here are expected to carry a default value,
/// so an absent value falls back to a zero duration.
pub fn get_duration(args: &ArgMatches<'_>, name: &str) -> UtilResult<Duration> {
    match args.value_of(name) {
        Some(value) => Ok(humantime::parse_duration(value)?),
        None => Ok(Duration::from_secs(0)),
    }
}
