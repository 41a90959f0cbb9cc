//! Small tools to upload assets to, and gather metadata from, AWS.
//!
//! This tool should be used from a command line; each tool is exposed as a
//! subcommand and is entirely independent of the others:
//!
//! * `upload` writes a staged directory tree into an S3 bucket.
//! * `regions` prints metadata and approximate locations of AWS regions.
//! * `access-report` prints the services accessible to an organization.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html).
#[macro_use]
extern crate log as logger;

mod aws;
mod cli;
mod log;
mod types;
mod walker;

mod access;
mod regions;
mod upload;

#[tokio::main]
async fn main() -> types::UtilResult<()> {
    // build the CLI and grab all arguments
    let args = cli::build().get_matches();

    // initialize logging
    log::init(&args)?;

    // delegate to the cli mod
    cli::exec(&args).await
}
