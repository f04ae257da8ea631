use super::{forwarded_exit_code, json_pretty, CommandError};
use irongantry_core::Engine;

/// The process exits with the entrypoint's own status.
pub fn run(engine: &Engine, json: bool) -> Result<u8, CommandError> {
    let executed = engine.execute()?;
    if json {
        println!("{}", json_pretty(&executed)?);
    }
    Ok(forwarded_exit_code(executed.exit_code))
}
