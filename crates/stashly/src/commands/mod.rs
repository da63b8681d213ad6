//! Command dispatch: bridges CLI args -> dispatcher commands -> output.

pub mod entities;
pub mod query;
pub mod save;
pub mod util;

use stashly_config::Config;
use stashly_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Run one command. Entity commands get a started controller that is shut
/// down again once the command has its completion.
pub async fn dispatch(cmd: Command, cfg: Config, global: &GlobalOpts) -> Result<(), CliError> {
    if let Command::Entities = cmd {
        entities::handle(&cfg, global);
        return Ok(());
    }

    let controller = config::build_controller(cfg, cmd.entity())?;
    controller.start().await?;

    tracing::debug!(command = ?cmd, "dispatching command");
    let result = run(cmd, &controller, global).await;

    controller.shutdown().await;
    result
}

async fn run(cmd: Command, controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::GetAll(args) => query::get_all(controller, args, global).await,
        Command::Get(args) => query::get(controller, args, global).await,
        Command::Query(args) => query::query(controller, args, global).await,
        Command::Add(args) => save::add(controller, args, global).await,
        Command::Update(args) => save::update(controller, args, global).await,
        Command::Delete(args) => save::delete(controller, args, global).await,
        Command::Entities => Ok(()),
    }
}
