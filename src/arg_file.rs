//! `@file` argument expansion.
//!
//! A token `@path` (longer than one character) is replaced in place by the
//! lines of `path`. Lines read from a file are taken literally: they are not
//! expanded again. Expansion stops at the first `--` in the original token
//! list; that token and everything after it is passed through untouched.

use crate::canonical::PathResolver;
use crate::error::UsageError;

/// Expand `@file` tokens in `args`.
///
/// Relative file names are resolved with `resolver`.
///
/// # Errors
///
/// - `UsageError::Path` if the file name cannot be resolved
/// - `UsageError::ArgFile` if the file cannot be read
pub fn expand_arg_files(args: &[String], resolver: &PathResolver) -> Result<Vec<String>, UsageError> {
    let mut expanded = Vec::with_capacity(args.len());

    for (i, arg) in args.iter().enumerate() {
        if arg == "--" {
            expanded.extend_from_slice(&args[i..]);
            break;
        }

        match arg.strip_prefix('@') {
            Some(name) if !name.is_empty() => {
                let path = resolver.resolve(name)?;
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| UsageError::ArgFile { path, source })?;
                expanded.extend(contents.lines().map(str::to_string));
            }
            _ => expanded.push(arg.clone()),
        }
    }

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_file_lines_spliced_in_place() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("params"), "-r\n/data\r\n-D\n").unwrap();
        let resolver = PathResolver::new(tmp.path());

        let expanded =
            expand_arg_files(&args(&["-w", "/out", "@params", "--", "tool"]), &resolver).unwrap();
        assert_eq!(expanded, args(&["-w", "/out", "-r", "/data", "-D", "--", "tool"]));
    }

    #[test]
    fn test_no_expansion_after_double_dash() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("params"), "-D\n").unwrap();
        let resolver = PathResolver::new(tmp.path());

        let input = args(&["@params", "--", "tool", "@params"]);
        let expanded = expand_arg_files(&input, &resolver).unwrap();
        assert_eq!(expanded, args(&["-D", "--", "tool", "@params"]));
    }

    #[test]
    fn test_expanded_lines_not_reexpanded() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("outer"), "@inner\n").unwrap();
        let resolver = PathResolver::new(tmp.path());

        let expanded = expand_arg_files(&args(&["@outer"]), &resolver).unwrap();
        assert_eq!(expanded, args(&["@inner"]));
    }

    #[test]
    fn test_double_dash_inside_file_does_not_stop_expansion() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a"), "--\n").unwrap();
        std::fs::write(tmp.path().join("b"), "tool\n").unwrap();
        let resolver = PathResolver::new(tmp.path());

        let expanded = expand_arg_files(&args(&["@a", "@b"]), &resolver).unwrap();
        assert_eq!(expanded, args(&["--", "tool"]));
    }

    #[test]
    fn test_lone_at_sign_untouched() {
        let resolver = PathResolver::new("/");
        let expanded = expand_arg_files(&args(&["@", "--", "x"]), &resolver).unwrap();
        assert_eq!(expanded, args(&["@", "--", "x"]));
    }

    #[test]
    fn test_missing_file_reported() {
        let tmp = TempDir::new().unwrap();
        let resolver = PathResolver::new(tmp.path());

        let result = expand_arg_files(&args(&["@nope"]), &resolver);
        assert!(matches!(result, Err(UsageError::ArgFile { .. })));
    }
}
