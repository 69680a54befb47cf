//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`init`]. Each handler
//! lives in its own submodule.

pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::NoteDispatchError;

pub async fn dispatch(cli: Cli) -> Result<(), NoteDispatchError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Init(ref args)) => init::execute(args),
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  note-dispatch v{version}: CSV to HTTP note submitter\n\n  \
         No command provided. To get started:\n\n    \
         note-dispatch init                             Write a template notes.csv\n    \
         note-dispatch validate notes.csv               Check rows without sending\n    \
         note-dispatch run -i notes.csv -u <url>        Submit every row\n    \
         note-dispatch --help                           See all commands and options\n"
    );
}
