use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn venv_module_works(interpreter: &std::path::Path) -> bool {
    Command::new(interpreter)
        .args(["-c", "import venv, ensurepip"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check that the host can create environments.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_python_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    let interpreter = which::which("python3").or_else(|_| which::which("python"));
    match interpreter {
        Err(_) => missing.push(MissingPrereq {
            name: "python3",
            purpose: "creating isolated environments",
            install_hint:
                "apt install python3 | dnf install python3 | zypper install python3 | brew install python",
        }),
        Ok(path) if !venv_module_works(&path) => missing.push(MissingPrereq {
            name: "venv/ensurepip",
            purpose: "creating environments with pip bootstrapped",
            install_hint: "apt install python3-venv (other distributions ship it with python3)",
        }),
        Ok(_) => {}
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nIronGantry needs a host Python with the venv module to build environments.");
    msg
}
