//! `delete` command: removes records by id in one request.

use timetable_core::{Backend, Entity, EntityId};

use crate::cli::{DeleteArgs, GlobalOpts};
use crate::error::CliError;

use super::util;
use super::with_entity;

async fn run<E: Entity>(
    backend: &Backend,
    ids: &[EntityId],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let listed = util::join_ids(ids);
    if !util::confirm(
        &format!("Delete {} {listed}? This cannot be undone.", E::KIND),
        &format!("delete {}", E::KIND),
        global.yes,
    )? {
        return Ok(());
    }

    backend.repository::<E>().delete(ids).await?;
    if !global.quiet {
        eprintln!("Deleted {} {listed}", E::KIND);
    }
    Ok(())
}

pub async fn handle(
    backend: &Backend,
    args: &DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut ids = args.ids.clone();
    ids.sort_unstable();
    ids.dedup();
    with_entity!(args.resource, run(backend, &ids, global))
}
