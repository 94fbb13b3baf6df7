//! Property tests for quoting, argument-file expansion and policy precedence.

use fs_jail::{
    expand_arg_files, parse_args, quote_args, split_command_line, Accessibility, ParseOutcome,
    PathResolver, PolicyCompiler, Posture, SandboxOptions, ScopePath,
};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn subtree() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec("[a-z]{1,8}", 1..4)
        .prop_map(|segments| Path::new("/data").join(segments.join("/")))
}

fn compile(options: &SandboxOptions) -> fs_jail::ScopePolicy {
    PolicyCompiler::new(Posture::DenyAll)
        .compile(options, Path::new("/usr/bin/tool"), Path::new("/work"), None)
        .unwrap()
}

proptest! {
    #[test]
    fn quoting_round_trips(args in prop::collection::vec(any::<String>(), 0..8)) {
        let line = quote_args(&args);
        prop_assert_eq!(split_command_line(&line), args);
    }

    #[test]
    fn quoted_args_without_specials_are_unchanged(args in prop::collection::vec("[A-Za-z0-9_./:=\\\\-]{1,12}", 1..6)) {
        prop_assert_eq!(quote_args(&args), args.join(" "));
    }

    #[test]
    fn tokens_after_terminator_never_expanded(tail in prop::collection::vec("@?[a-z ]{0,10}", 0..6)) {
        let resolver = PathResolver::new("/fs-jail-nonexistent");
        let mut args = vec!["-D".to_string(), "--".to_string()];
        args.extend(tail.iter().cloned());

        prop_assert_eq!(expand_arg_files(&args, &resolver).unwrap(), args);
    }

    #[test]
    fn command_is_everything_after_terminator(command in prop::collection::vec("[a-z@/-]{1,10}", 1..6)) {
        let resolver = PathResolver::new("/work");
        let mut args = vec!["-r".to_string(), "/usr".to_string(), "--".to_string()];
        args.extend(command.iter().cloned());

        match parse_args(&args, &resolver).unwrap() {
            ParseOutcome::Run(options) => prop_assert_eq!(options.command, command),
            ParseOutcome::Help => prop_assert!(false, "unexpected help"),
        }
    }

    #[test]
    fn declarations_follow_fixed_order(
        readonly in prop::collection::vec(subtree(), 0..4),
        writable in prop::collection::vec(subtree(), 0..4),
        blocked in prop::collection::vec(subtree(), 0..4),
    ) {
        let mut options = SandboxOptions::new(vec!["tool".to_string()]);
        options.readonly_paths = readonly.clone();
        options.writable_paths = writable.clone();
        options.blocked_paths = blocked.clone();

        let policy = compile(&options);
        let scopes = policy.scopes();
        prop_assert_eq!(scopes.len(), 3 + readonly.len() + writable.len() + blocked.len());
        prop_assert_eq!(&scopes[0].path, &ScopePath::Root);
        prop_assert_eq!(&scopes[1].path, &ScopePath::Path(PathBuf::from("/work")));
        prop_assert_eq!(&scopes[2].path, &ScopePath::Path(PathBuf::from("/usr/bin/tool")));

        let expected: Vec<(PathBuf, Accessibility)> = readonly
            .iter()
            .map(|p| (p.clone(), Accessibility::ReadOnly))
            .chain(writable.iter().map(|p| (p.clone(), Accessibility::ReadWrite)))
            .chain(blocked.iter().map(|p| (p.clone(), Accessibility::Denied)))
            .collect();
        let actual: Vec<(PathBuf, Accessibility)> = scopes[3..]
            .iter()
            .map(|scope| match &scope.path {
                ScopePath::Path(p) => (p.clone(), scope.access),
                ScopePath::Root => (PathBuf::from("<root>"), scope.access),
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn blocked_wins_over_same_path(path in subtree(), child in "[a-z]{1,8}") {
        let options = SandboxOptions::new(vec!["tool".to_string()])
            .with_readonly(path.clone())
            .with_writable(path.clone())
            .with_blocked(path.clone());

        let policy = compile(&options);
        prop_assert_eq!(policy.access(&path), Accessibility::Denied);
        prop_assert_eq!(policy.access(&path.join(child)), Accessibility::Denied);
    }

    #[test]
    fn deeper_scope_wins_over_shallower(path in subtree(), sub in "[a-z]{1,8}", leaf in "[a-z]{1,8}") {
        let inner = path.join(&sub);
        let options = SandboxOptions::new(vec!["tool".to_string()])
            .with_writable(inner.clone())
            .with_readonly(path.clone());

        let policy = compile(&options);
        prop_assert_eq!(policy.access(&inner.join(&leaf)), Accessibility::ReadWrite);
        prop_assert_eq!(policy.access(&path), Accessibility::ReadOnly);
        prop_assert_eq!(policy.access(Path::new("/elsewhere")), Accessibility::Denied);
    }
}
