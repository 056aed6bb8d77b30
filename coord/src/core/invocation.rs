use common::constants::{DIR_FLAGS, MAINTENANCE_FLAG, SERVER_BIN, START_SUBCOMMAND};
use common::error::BootError;

/// The server command line this coordinator was asked to run, e.g.
/// `voltdb start -c 3 -D /voltdbroot`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
}

impl Invocation {
    /// Accepts only `voltdb start ...`.
    pub fn parse(args: Vec<String>) -> Result<Self, BootError> {
        match args.as_slice() {
            [bin, sub, ..] if bin == SERVER_BIN && sub == START_SUBCOMMAND => Ok(Self { args }),
            _ => Err(BootError::Usage { found: args }),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn server_name(&self) -> &str {
        &self.args[0]
    }

    pub fn is_maintenance(&self) -> bool {
        self.args.iter().any(|a| a == MAINTENANCE_FLAG)
    }

    /// Value of the first `-D`/`--dir`/`--directory` flag.
    pub fn directory_override(&self) -> Option<&str> {
        flag_value(&self.args, DIR_FLAGS)
    }
}

/// How a single token spells one of a set of flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagMatch<'a> {
    /// `-X` or `--long`; the value, if any, is the next token.
    Separate,
    /// `-Xvalue` or `--long=value`. `prefix` is everything before the value.
    Inline { prefix: &'a str, value: &'a str },
}

pub fn match_flag<'a>(arg: &'a str, flags: &[&str]) -> Option<FlagMatch<'a>> {
    if flags.contains(&arg) {
        return Some(FlagMatch::Separate);
    }

    if arg.starts_with("--") {
        let (name, value) = arg.split_once('=')?;
        return flags.contains(&name).then(|| FlagMatch::Inline {
            prefix: &arg[..=name.len()],
            value,
        });
    }

    flags
        .iter()
        .filter(|f| f.len() == 2 && f.starts_with('-'))
        .find(|f| arg.len() > 2 && arg.starts_with(**f))
        .map(|_| FlagMatch::Inline {
            prefix: &arg[..2],
            value: &arg[2..],
        })
}

/// A token following a separate flag is its value unless it is a flag itself.
pub fn is_flag_value(token: &str) -> bool {
    !token.starts_with('-')
}

/// Value of the first occurrence of any of `flags`, accepting `-X value`,
/// `-Xvalue`, `--long value` and `--long=value`.
pub fn flag_value<'a>(args: &'a [String], flags: &[&str]) -> Option<&'a str> {
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match match_flag(arg, flags) {
            Some(FlagMatch::Separate) => {
                return iter.next_if(|next| is_flag_value(next)).map(String::as_str);
            }
            Some(FlagMatch::Inline { value, .. }) => return Some(value),
            None => {}
        }
    }
    None
}

pub fn has_flag(args: &[String], flags: &[&str]) -> bool {
    args.iter().any(|arg| match_flag(arg, flags).is_some())
}
