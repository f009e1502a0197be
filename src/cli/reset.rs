use crate::cli::open_store;
use crate::Result;
use colored::Colorize;
use dialoguer::Confirm;

pub fn run(yes: bool) -> Result<()> {
    let store = open_store()?;
    store.ensure_initialized()?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete the pipeline state? This cannot be undone")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Reset cancelled.".yellow());
            return Ok(());
        }
    }

    store.reset()?;
    println!("{}", "Pipeline state cleared. Re-run init to start again.".green());
    Ok(())
}
