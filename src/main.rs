//! `fs-jail` command-line entry point.
//!
//! ```text
//! fs-jail [-W dir] [-T secs] [-t secs] [-l file] [-L file]
//!         [-r path]... [-w path]... [-b path]... [-D] [@file] -- command [arg...]
//! ```
//!
//! Environment:
//! - `FS_JAIL_LOG`: tracing filter for diagnostics on stderr (default `warn`)
//! - `FS_JAIL_POSTURE`: `deny` (default) or `read`, the policy for unlisted paths

use fs_jail::{parse_or_exit, write_usage, Launcher, PathResolver, Posture, ProcessResult};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FS_JAIL_LOG";
const POSTURE_ENV: &str = "FS_JAIL_POSTURE";

fn main() {
    init_logging();

    let program_name = program_name();
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let resolver = match PathResolver::from_current_dir() {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("cannot determine current directory: {e}");
            std::process::exit(1);
        }
    };

    let posture = match std::env::var(POSTURE_ENV) {
        Ok(value) => match value.parse::<Posture>() {
            Ok(posture) => posture,
            Err(e) => {
                eprintln!("{e}");
                let _ = write_usage(&mut std::io::stderr(), &program_name);
                std::process::exit(1);
            }
        },
        Err(_) => Posture::default(),
    };

    let options = parse_or_exit(&args, &resolver, &program_name);

    let mut launcher = Launcher::host()
        .posture(posture)
        .current_dir(resolver.base());

    match launcher.launch_blocking(&options) {
        Ok(result) => std::process::exit(exit_code(&result)),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fs-jail".to_string())
}

/// The child's own exit code, or 1 if it was ended by a signal.
fn exit_code(result: &ProcessResult) -> i32 {
    result.exit_code.unwrap_or(1)
}
