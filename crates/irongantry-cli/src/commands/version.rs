use super::{json_pretty, CommandError, EXIT_SUCCESS};

pub fn run(json: bool) -> Result<u8, CommandError> {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        let payload = serde_json::json!({ "name": "IronGantry", "version": version });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("IronGantry v{version}");
    }
    Ok(EXIT_SUCCESS)
}
