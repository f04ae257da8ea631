use super::{highlight, json_pretty, with_spinner, CommandError, EXIT_SUCCESS};
use irongantry_core::Engine;

pub fn run(engine: &Engine, json: bool) -> Result<u8, CommandError> {
    let exported = with_spinner(
        json,
        "packaging project...",
        "archive written",
        "ship failed",
        || engine.export(),
    )?;

    if json {
        println!("{}", json_pretty(&exported)?);
    } else {
        println!(
            "shipped {} ({} entries)",
            highlight(&exported.archive_path.display().to_string()),
            exported.file_count
        );
        println!("blake3: {}", exported.digest);
        println!("recipients run: python bootstrap.py");
    }
    Ok(EXIT_SUCCESS)
}
