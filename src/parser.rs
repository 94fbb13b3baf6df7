//! Command-line option parsing.
//!
//! Flags may start with `-` or `/` and are matched on the whole remainder of
//! the token, so `-W` is the working directory flag but `-Wfoo` is unknown.
//! Options end at a mandatory `--`; everything after it is the command,
//! taken verbatim.

use crate::arg_file::expand_arg_files;
use crate::canonical::PathResolver;
use crate::error::UsageError;
use crate::options::SandboxOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// `-h` was given: print usage and exit 0.
    Help,
    /// Options are complete and the command is non-empty.
    Run(SandboxOptions),
}

/// Parse a raw token list into [`SandboxOptions`].
///
/// `@file` tokens before the first `--` are expanded first. Relative paths
/// are resolved with `resolver`.
///
/// # Errors
///
/// Any `UsageError`; no partially-built options are returned.
pub fn parse_args(args: &[String], resolver: &PathResolver) -> Result<ParseOutcome, UsageError> {
    let args = expand_arg_files(args, resolver)?;
    let mut options = SandboxOptions::new(Vec::new());

    let mut tokens = args.iter().enumerate();
    let mut terminator = None;

    while let Some((i, arg)) = tokens.next() {
        if arg == "--" {
            terminator = Some(i);
            break;
        }

        let name = match flag_name(arg) {
            Some(name) => name,
            None => {
                return Err(UsageError::UnknownArgument {
                    argument: arg.clone(),
                })
            }
        };

        let mut value = || {
            tokens
                .next()
                .map(|(_, value)| value.as_str())
                .ok_or_else(|| UsageError::MissingValue {
                    option: arg.clone(),
                })
        };

        match name {
            "h" => return Ok(ParseOutcome::Help),
            "W" => options.working_dir = Some(resolve(resolver, value()?)?),
            "T" => options.timeout = parse_seconds(value()?)?,
            "t" => options.kill_delay = parse_seconds(value()?)?,
            "l" => options.stdout_path = Some(resolve(resolver, value()?)?),
            "L" => options.stderr_path = Some(resolve(resolver, value()?)?),
            "w" => options.writable_paths.push(resolve(resolver, value()?)?),
            "r" => options.readonly_paths.push(resolve(resolver, value()?)?),
            "b" => options.blocked_paths.push(resolve(resolver, value()?)?),
            "D" => options.debug = true,
            _ => {
                return Err(UsageError::UnknownOption {
                    option: arg.clone(),
                })
            }
        }
    }

    let command = match terminator {
        Some(i) if i + 1 < args.len() => args[i + 1..].to_vec(),
        _ => return Err(UsageError::MissingCommand),
    };
    options.command = command;

    tracing::debug!(
        readonly = options.readonly_paths.len(),
        writable = options.writable_paths.len(),
        blocked = options.blocked_paths.len(),
        "parsed sandbox options for {}",
        options.program()
    );

    Ok(ParseOutcome::Run(options))
}

/// Parse `args`, handling help and errors the way the CLI does.
///
/// On `-h` the usage text goes to stdout and the process exits with 0.
/// On any error the message and the usage text go to stderr and the process
/// exits with 1. Only a complete set of options is ever returned.
pub fn parse_or_exit(args: &[String], resolver: &PathResolver, program_name: &str) -> SandboxOptions {
    match parse_args(args, resolver) {
        Ok(ParseOutcome::Run(options)) => options,
        Ok(ParseOutcome::Help) => {
            let _ = write_usage(&mut std::io::stdout(), program_name);
            std::process::exit(0);
        }
        Err(err) => {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{err}");
            let _ = write_usage(&mut stderr, program_name);
            std::process::exit(1);
        }
    }
}

/// Write the usage text.
pub fn write_usage(out: &mut dyn Write, program_name: &str) -> std::io::Result<()> {
    write!(
        out,
        "\nUsage: {program_name} [option...] -- command [arg...]\n\
         \nPossible arguments:\n\
         \x20 -W <working-dir>  working directory (uses current directory if not specified)\n\
         \x20 -T <timeout>  timeout after which the child process will be terminated with SIGTERM\n\
         \x20 -t <timeout>  in case timeout occurs, how long to wait before killing the child with SIGKILL\n\
         \x20 -l <file>  redirect stdout to a file\n\
         \x20 -L <file>  redirect stderr to a file\n\
         \x20 -w <file>  make a file or directory read/writable for the sandboxed process\n\
         \x20 -r <file>  make a file or directory readonly for the sandboxed process\n\
         \x20 -b <file>  make a file or directory inaccessible for the sandboxed process\n\
         \x20 -D  print debug messages to stderr\n\
         \x20 @FILE  read newline-separated arguments from FILE\n\
         \x20 --  command to run inside sandbox, followed by arguments\n"
    )
}

fn flag_name(arg: &str) -> Option<&str> {
    if arg.len() > 1 && (arg.starts_with('-') || arg.starts_with('/')) {
        Some(&arg[1..])
    } else {
        None
    }
}

fn resolve(resolver: &PathResolver, raw: &str) -> Result<PathBuf, UsageError> {
    Ok(resolver.resolve(raw)?)
}

/// Parse a whole number of seconds; `0` means "not set".
fn parse_seconds(raw: &str) -> Result<Option<Duration>, UsageError> {
    let secs: u32 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        UsageError::InvalidNumber {
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok((secs != 0).then(|| Duration::from_secs(u64::from(secs))))
}
