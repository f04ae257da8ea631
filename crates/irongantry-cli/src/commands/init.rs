use super::{highlight, json_pretty, CommandError, EXIT_SUCCESS};
use irongantry_core::Engine;

pub fn run(engine: &Engine, name: &str, json: bool) -> Result<u8, CommandError> {
    let declared = engine.declare(name)?;
    if json {
        println!("{}", json_pretty(&declared)?);
    } else {
        println!(
            "created {} for project '{}'",
            declared.manifest_path.display(),
            highlight(&declared.project)
        );
        match &declared.python {
            Some(v) => println!("python: {v}"),
            None => println!("python: not pinned (no host interpreter found)"),
        }
    }
    Ok(EXIT_SUCCESS)
}
