//! Built-in command set installed at startup.

/// Built-ins carry their command name as a constant.
pub trait Builtin {
    const NAME: &'static str;
}

macro_rules! builtin {
    ($ty:ident, $name:literal) => {
        pub struct $ty;

        impl $crate::commands::Builtin for $ty {
            const NAME: &'static str = $name;
        }
    };
}
pub(crate) use builtin;

pub mod fs;
pub mod math;
pub mod meta;

use std::sync::Arc;

use crate::handler::{CommandError, CommandHandler, Handler};
use crate::registry::CommandRegistry;

pub fn builtins() -> Vec<(&'static str, Handler)> {
    vec![
        entry(fs::ListDir),
        entry(meta::ListCommands),
        entry(fs::MakeDir),
        entry(fs::Remove),
        entry(fs::Touch),
        entry(fs::ChangeDir),
        entry(fs::WorkDir),
        entry(math::Add),
        entry(meta::Pipe),
        entry(meta::Alias),
    ]
}

fn entry<H: Builtin + CommandHandler + 'static>(handler: H) -> (&'static str, Handler) {
    (H::NAME, Arc::new(handler))
}

pub fn builtin_registry() -> CommandRegistry {
    CommandRegistry::from_entries(builtins())
}

pub(crate) fn required<'a>(
    args: &'a [String],
    index: usize,
    name: &'static str,
) -> Result<&'a str, CommandError> {
    args.get(index)
        .map(String::as_str)
        .ok_or(CommandError::MissingArgument(name))
}
