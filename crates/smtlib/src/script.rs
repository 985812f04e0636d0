use crate::command::Command;
use crate::sort::Sort;
use crate::term::Term;

/// An SMT-LIB script: a sequence of commands.
///
/// Queries are assembled by appending to a script that already holds the
/// shared program encoding, so a script is cheap to clone per goal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn extend(&mut self, cmds: impl IntoIterator<Item = Command>) {
        self.commands.extend(cmds);
    }

    /// `(declare-const name sort)`.
    pub fn declare(&mut self, name: impl Into<String>, sort: Sort) {
        self.push(Command::DeclareConst(name.into(), sort));
    }

    /// `(assert term)`.
    pub fn assert(&mut self, term: Term) {
        self.push(Command::Assert(term));
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(Command::Comment(text.into()));
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn has_check_sat(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::CheckSat))
    }

    pub fn has_get_model(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::GetModel))
    }

    /// Names of every declared constant, in declaration order.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            Command::DeclareConst(name, _) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Append `(check-sat)` and `(get-model)` unless already present.
    pub fn finish_query(&mut self) {
        if !self.has_check_sat() {
            self.push(Command::CheckSat);
        }
        if !self.has_get_model() {
            self.push(Command::GetModel);
        }
    }
}
