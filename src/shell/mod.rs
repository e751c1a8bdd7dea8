//! Shell parsing for RUN commands.
//!
//! Provides:
//! - POSIX-style word splitting with quote removal
//! - Splitting on the control operators `&`, `&&`, `|`, `||` and `;`
//! - Package-manager invocation detection (apt-get, apt, dnf, yum, apk)

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ShellError;

/// Tokens such as `-y`, `--no-install-recommends`, `--quiet=2`.
static FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{1,2}\S+$").expect("valid flag regex"));

/// Check if a token is a command-line flag.
pub fn is_flag(token: &str) -> bool {
    FLAG.is_match(token)
}

/// A lexical token of a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word, quotes removed.
    Word(String),
    /// An unquoted control operator.
    Operator(&'static str),
}

/// Parsed shell command information.
#[derive(Debug, Clone, Default)]
pub struct ParsedShell {
    /// Simple commands, split on control operators.
    pub commands: Vec<Command>,
}

impl ParsedShell {
    /// Parse a shell command string.
    pub fn parse(script: &str) -> Result<Self, ShellError> {
        let tokens = tokenize(script)?;
        let commands = split_commands(tokens)
            .into_iter()
            .map(Command::from_words)
            .collect();

        Ok(Self { commands })
    }

    /// All package-manager invocations, in command order.
    pub fn package_invocations(&self) -> Vec<PackageInvocation> {
        self.commands
            .iter()
            .filter_map(Command::package_invocation)
            .collect()
    }
}

/// A single simple command extracted from a shell script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// All words, including the program name.
    pub words: Vec<String>,
}

impl Command {
    fn from_words(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Detect a package-manager invocation.
    ///
    /// The manager may follow a prefix such as `sudo` or `VAR=value`. After the
    /// manager, flags are skipped and the first install or removal subcommand
    /// determines the action; every non-flag word after it is a package.
    pub fn package_invocation(&self) -> Option<PackageInvocation> {
        let (index, manager) = self
            .words
            .iter()
            .enumerate()
            .find_map(|(i, w)| PackageManager::from_name(w).map(|m| (i, m)))?;

        let rest = &self.words[index + 1..];
        for (k, word) in rest.iter().enumerate() {
            if is_flag(word) {
                continue;
            }
            let action = if manager.install_subcommands().contains(&word.as_str()) {
                PackageAction::Install
            } else if manager.remove_subcommands().contains(&word.as_str()) {
                PackageAction::Remove
            } else {
                continue;
            };
            let packages = rest[k + 1..]
                .iter()
                .filter(|w| !is_flag(w))
                .map(|w| package_name(w).to_string())
                .filter(|p| !p.is_empty())
                .collect();
            return Some(PackageInvocation {
                manager,
                action: Some(action),
                packages,
            });
        }

        Some(PackageInvocation {
            manager,
            action: None,
            packages: Vec::new(),
        })
    }
}

/// Strip a version pin (`curl=7.68.0-1`) from a package argument.
pub fn package_name(arg: &str) -> &str {
    arg.split_once('=').map(|(name, _)| name).unwrap_or(arg)
}

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    AptGet,
    Apt,
    Dnf,
    Yum,
    Apk,
}

impl PackageManager {
    /// Recognise a package manager by program name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "apt-get" => Some(Self::AptGet),
            "apt" => Some(Self::Apt),
            "dnf" => Some(Self::Dnf),
            "yum" => Some(Self::Yum),
            "apk" => Some(Self::Apk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AptGet => "apt-get",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Apk => "apk",
        }
    }

    /// Subcommands that install packages.
    pub fn install_subcommands(&self) -> &'static [&'static str] {
        match self {
            Self::Apk => &["add"],
            _ => &["install"],
        }
    }

    /// Subcommands that remove packages.
    pub fn remove_subcommands(&self) -> &'static [&'static str] {
        match self {
            Self::AptGet | Self::Apt => &["remove", "purge"],
            Self::Dnf => &["remove", "autoremove"],
            Self::Yum => &["remove", "erase", "autoremove"],
            Self::Apk => &["del"],
        }
    }
}

/// What a package-manager invocation does to its packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAction {
    Install,
    Remove,
}

/// One detected call to a package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInvocation {
    pub manager: PackageManager,
    /// `None` for subcommands that neither install nor remove (e.g. `update`).
    pub action: Option<PackageAction>,
    pub packages: Vec<String>,
}

/// Split a shell string into words and control operators.
///
/// Quotes are removed the way a POSIX shell does. Operators inside quotes
/// or glued to a word (`curl;`) are recognised only when unquoted.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ShellError> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    let flush = |tokens: &mut Vec<Token>, word: &mut String, in_word: &mut bool| {
        if *in_word {
            tokens.push(Token::Word(std::mem::take(word)));
            *in_word = false;
        }
    };

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => flush(&mut tokens, &mut word, &mut in_word),
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some('\n') => {}
                    Some(next) => word.push(next),
                    None => word.push('\\'),
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => word.push(ch),
                        None => return Err(ShellError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.peek() {
                            Some(&next) if matches!(next, '$' | '`' | '"' | '\\' | '\n') => {
                                chars.next();
                                if next != '\n' {
                                    word.push(next);
                                }
                            }
                            _ => word.push('\\'),
                        },
                        Some(ch) => word.push(ch),
                        None => return Err(ShellError::UnterminatedQuote('"')),
                    }
                }
            }
            '&' | '|' | ';' => {
                flush(&mut tokens, &mut word, &mut in_word);
                let op = match (c, chars.peek().copied()) {
                    ('&', Some('&')) => {
                        chars.next();
                        "&&"
                    }
                    ('|', Some('|')) => {
                        chars.next();
                        "||"
                    }
                    ('&', _) => "&",
                    ('|', _) => "|",
                    _ => ";",
                };
                tokens.push(Token::Operator(op));
            }
            _ => {
                in_word = true;
                word.push(c);
            }
        }
    }
    flush(&mut tokens, &mut word, &mut in_word);

    Ok(tokens)
}

/// Group words into simple commands, dropping empty ones.
pub fn split_commands(tokens: Vec<Token>) -> Vec<Vec<String>> {
    let mut commands = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        match token {
            Token::Word(w) => current.push(w),
            Token::Operator(_) => {
                if !current.is_empty() {
                    commands.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        commands.push(current);
    }
    commands
}
