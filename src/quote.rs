//! Windows-style command-line quoting.
//!
//! Process-creation APIs that take a single command-line string leave the
//! child to split it back into arguments. The rules implemented here are the
//! Microsoft C runtime rules: whitespace separates arguments, double quotes
//! group, and backslashes are literal unless they precede a double quote.
//! [`quote_args`] and [`split_command_line`] are exact inverses for any list
//! of arguments.

/// Join `args` into a single command-line string.
///
/// Arguments are separated by one space; each is quoted by [`quote_arg_into`].
pub fn quote_args<S: AsRef<str>>(args: &[S]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        quote_arg_into(arg.as_ref(), &mut out);
    }
    out
}

/// Append one quoted argument to `out`.
///
/// - An empty argument becomes `""`.
/// - An argument without space, tab, newline, vertical tab or double quote is
///   appended unchanged.
/// - Anything else is wrapped in double quotes. A run of N backslashes
///   becomes 2N+1 backslashes when followed by a quote, 2N when it ends the
///   argument, and stays N otherwise.
pub fn quote_arg_into(arg: &str, out: &mut String) {
    if arg.is_empty() {
        out.push_str("\"\"");
        return;
    }

    if !arg.chars().any(needs_quoting) {
        out.push_str(arg);
        return;
    }

    out.push('"');
    let mut chars = arg.chars().peekable();
    loop {
        let mut backslashes = 0;
        while chars.next_if_eq(&'\\').is_some() {
            backslashes += 1;
        }

        match chars.next() {
            None => {
                push_backslashes(out, backslashes * 2);
                break;
            }
            Some('"') => {
                push_backslashes(out, backslashes * 2 + 1);
                out.push('"');
            }
            Some(c) => {
                push_backslashes(out, backslashes);
                out.push(c);
            }
        }
    }
    out.push('"');
}

/// Split a command line into arguments using the Windows convention.
///
/// This is the argument-parsing half of the C runtime rules (the program
/// name special case does not apply, since only the tail of the command is
/// quoted).
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| is_separator(*c)).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut arg = String::new();
        let mut in_quotes = false;
        loop {
            let mut backslashes = 0;
            while chars.next_if_eq(&'\\').is_some() {
                backslashes += 1;
            }

            match chars.peek().copied() {
                Some('"') => {
                    push_backslashes(&mut arg, backslashes / 2);
                    chars.next();
                    if backslashes % 2 == 1 {
                        arg.push('"');
                    } else if in_quotes && chars.next_if_eq(&'"').is_some() {
                        // `""` inside quotes is a literal quote.
                        arg.push('"');
                    } else {
                        in_quotes = !in_quotes;
                    }
                }
                Some(c) if !in_quotes && is_separator(c) => {
                    push_backslashes(&mut arg, backslashes);
                    break;
                }
                Some(c) => {
                    push_backslashes(&mut arg, backslashes);
                    arg.push(c);
                    chars.next();
                }
                None => {
                    push_backslashes(&mut arg, backslashes);
                    break;
                }
            }
        }
        args.push(arg);
    }

    args
}

fn needs_quoting(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '"')
}

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat('\\').take(count));
}
