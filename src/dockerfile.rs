//! The parsed Dockerfile and the views rules evaluate against.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::ParseError;
use crate::parser::{
    lookup, normalize, parse_dockerfile, Arguments, BaseImage, Directive, DirectiveKind,
    DirectivePos, Port, RunArgs, TransferArgs, UserGroup,
};

/// An ordered sequence of directives, exactly in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dockerfile {
    path: Option<PathBuf>,
    directives: Vec<DirectivePos>,
}

impl Dockerfile {
    /// Create an empty Dockerfile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read, normalise and parse the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let not_a_dockerfile = |reason: String| ParseError::NotADockerfile {
            path: path.to_path_buf(),
            reason,
        };

        if path.is_dir() {
            return Err(not_a_dockerfile("is a directory".to_string()));
        }
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_a_dockerfile("does not exist".to_string()),
            io::ErrorKind::InvalidData => not_a_dockerfile("is not valid UTF-8".to_string()),
            _ => not_a_dockerfile(e.to_string()),
        })?;

        let normalized = normalize(&content);
        if normalized.is_empty() {
            return Err(ParseError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        let directives = parse_dockerfile(&normalized)?;
        debug!("Parsed {} directives from {}", directives.len(), path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            directives,
        })
    }

    /// Normalise and parse Dockerfile text.
    pub fn parse_str(text: &str) -> Result<Self, ParseError> {
        let directives = parse_dockerfile(&normalize(text))?;
        Ok(Self {
            path: None,
            directives,
        })
    }

    /// Append a directive. No validation against earlier directives.
    pub fn add_directive(&mut self, directive: DirectivePos) {
        self.directives.push(directive);
    }

    pub fn directives(&self) -> &[DirectivePos] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Path the Dockerfile was read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name without directories. `"Dockerfile"` for parsed strings.
    pub fn filename(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Dockerfile".to_string())
    }

    /// Group directives by kind, each group in source order.
    pub fn grouped_by_kind(&self) -> BTreeMap<DirectiveKind, Vec<&DirectivePos>> {
        let mut groups: BTreeMap<DirectiveKind, Vec<&DirectivePos>> = BTreeMap::new();
        for pos in &self.directives {
            groups.entry(pos.kind()).or_default().push(pos);
        }
        groups
    }

    /// Split into build stages, each starting at a FROM. Directives before
    /// the first FROM belong to no stage.
    pub fn stages(&self) -> Vec<&[DirectivePos]> {
        let starts: Vec<usize> = self
            .directives
            .iter()
            .enumerate()
            .filter(|(_, pos)| pos.directive.is_from())
            .map(|(i, _)| i)
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or(self.directives.len());
                &self.directives[start..end]
            })
            .collect()
    }

    /// Maintainers of the image.
    ///
    /// The first MAINTAINER directive wins, its names joined with `", "`.
    /// Without one, the first LABEL key equal to `maintainer` or `MAINTAINER`
    /// is used.
    pub fn maintainers(&self) -> Option<String> {
        let explicit = self.directives.iter().find_map(|pos| match &pos.directive {
            Directive::Maintainer(names) => Some(names.join(", ")),
            _ => None,
        });
        if explicit.is_some() {
            return explicit;
        }

        self.directives.iter().find_map(|pos| match &pos.directive {
            Directive::Label(pairs) => pairs
                .iter()
                .find(|(key, _)| key == "maintainer" || key == "MAINTAINER")
                .map(|(_, value)| value.clone()),
            _ => None,
        })
    }

    /// RUN directives after the last FROM, in source order.
    pub fn run_directives_in_last_stage(&self) -> Vec<&DirectivePos> {
        let mut runs: Vec<&DirectivePos> = self
            .directives
            .iter()
            .rev()
            .take_while(|pos| !pos.directive.is_from())
            .filter(|pos| pos.directive.is_run())
            .collect();
        runs.reverse();
        runs
    }

    /// Look up an ENV value; the last definition in the file wins.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.directives
            .iter()
            .rev()
            .find_map(|pos| match &pos.directive {
                Directive::Env(pairs) => lookup(pairs, key),
                _ => None,
            })
    }

    /// Build the typed per-kind view rules evaluate against.
    pub fn view(&self) -> DirectiveView<'_> {
        let mut view = DirectiveView::default();

        for pos in &self.directives {
            match &pos.directive {
                Directive::From(image) => view.from.push(Located::new(image, pos)),
                Directive::User(user) => view.user.push(Located::new(user, pos)),
                Directive::Run(run) => view.run.push(Located::new(run, pos)),
                Directive::Cmd(args) => view.cmd.push(Located::new(args, pos)),
                Directive::Entrypoint(args) => view.entrypoint.push(Located::new(args, pos)),
                Directive::Label(pairs) => view.labels.push(Located::new(pairs, pos)),
                Directive::Env(pairs) => view.env.push(Located::new(pairs, pos)),
                Directive::Expose(ports) => view.expose.push(Located::new(ports, pos)),
                Directive::Maintainer(names) => view.maintainers.push(Located::new(names, pos)),
                Directive::Add(args) => view.add.push(Located::new(args, pos)),
                Directive::Copy(args) => view.copy.push(Located::new(args, pos)),
                Directive::Workdir(path) => view.workdir.push(Located::new(path, pos)),
                Directive::Volume(paths) => view.volume.push(Located::new(paths, pos)),
                Directive::Shell(shell) => view.shell.push(Located::new(shell, pos)),
                Directive::Stopsignal(signal) => view.stopsignal.push(Located::new(signal, pos)),
                Directive::Arg(_)
                | Directive::Onbuild(_)
                | Directive::Healthcheck(_)
                | Directive::Comment(_) => {}
            }
        }

        view.run_last_stage = self
            .run_directives_in_last_stage()
            .into_iter()
            .filter_map(|pos| match &pos.directive {
                Directive::Run(run) => Some(Located::new(run, pos)),
                _ => None,
            })
            .collect();

        view
    }
}

/// A typed directive payload together with its source record.
#[derive(Debug)]
pub struct Located<'a, T> {
    pub item: &'a T,
    pub pos: &'a DirectivePos,
}

impl<'a, T> Located<'a, T> {
    fn new(item: &'a T, pos: &'a DirectivePos) -> Self {
        Self { item, pos }
    }

    /// Normalised source text of the directive.
    pub fn raw_text(&self) -> &'a str {
        &self.pos.raw_text
    }

    pub fn line(&self) -> u32 {
        self.pos.line_number
    }
}

impl<T> Clone for Located<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Located<'_, T> {}

/// Directives grouped by kind, borrowed from a `Dockerfile`.
///
/// Derived on demand; never stored.
#[derive(Debug)]
pub struct DirectiveView<'a> {
    pub from: Vec<Located<'a, BaseImage>>,
    pub user: Vec<Located<'a, UserGroup>>,
    pub run: Vec<Located<'a, RunArgs>>,
    pub cmd: Vec<Located<'a, Arguments>>,
    pub entrypoint: Vec<Located<'a, Arguments>>,
    pub labels: Vec<Located<'a, Vec<(String, String)>>>,
    pub env: Vec<Located<'a, Vec<(String, String)>>>,
    pub expose: Vec<Located<'a, Vec<Port>>>,
    pub maintainers: Vec<Located<'a, Vec<String>>>,
    pub add: Vec<Located<'a, TransferArgs>>,
    pub copy: Vec<Located<'a, TransferArgs>>,
    pub workdir: Vec<Located<'a, String>>,
    pub volume: Vec<Located<'a, Vec<String>>>,
    pub shell: Vec<Located<'a, Vec<String>>>,
    pub stopsignal: Vec<Located<'a, String>>,
    /// RUN directives of the final build stage.
    pub run_last_stage: Vec<Located<'a, RunArgs>>,
}

impl Default for DirectiveView<'_> {
    fn default() -> Self {
        Self {
            from: Vec::new(),
            user: Vec::new(),
            run: Vec::new(),
            cmd: Vec::new(),
            entrypoint: Vec::new(),
            labels: Vec::new(),
            env: Vec::new(),
            expose: Vec::new(),
            maintainers: Vec::new(),
            add: Vec::new(),
            copy: Vec::new(),
            workdir: Vec::new(),
            volume: Vec::new(),
            shell: Vec::new(),
            stopsignal: Vec::new(),
            run_last_stage: Vec::new(),
        }
    }
}

impl<'a> DirectiveView<'a> {
    /// Resolve an ENV key across all ENV directives; the last definition wins.
    pub fn env_value(&self, key: &str) -> Option<&'a str> {
        self.env.iter().rev().find_map(|env| lookup(env.item, key))
    }

    /// ADD and COPY directives, in source order.
    pub fn transfers(&self) -> Vec<Located<'a, TransferArgs>> {
        let mut all: Vec<Located<'a, TransferArgs>> =
            self.add.iter().chain(self.copy.iter()).copied().collect();
        all.sort_by_key(|t| t.line());
        all
    }
}
