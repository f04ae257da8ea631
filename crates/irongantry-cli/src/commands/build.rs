use super::{json_pretty, with_spinner, CommandError, EXIT_SUCCESS};
use irongantry_core::Engine;

pub fn run(engine: &Engine, json: bool) -> Result<u8, CommandError> {
    let built = with_spinner(
        json,
        "building environment...",
        "environment built",
        "build failed",
        || engine.materialize(),
    )?;

    if json {
        println!("{}", json_pretty(&built)?);
    } else {
        println!("environment: {}", built.env_path.display());
        if built.installed.is_empty() {
            println!("no packages to install");
        } else {
            println!("installed:");
            for pkg in &built.installed {
                println!("  {pkg}");
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
