//! Dockerfile directive types.
//!
//! These types are the typed projection of a parsed Dockerfile line. Every
//! parsed line becomes a `DirectivePos`: the `Directive` itself, plus the
//! normalised source fragment it came from.

use std::fmt;

/// Registry reported for images without an explicit registry prefix.
pub const DEFAULT_REGISTRY: &str = "Docker Hub";

/// Tag reported for images with neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// A directive together with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectivePos {
    /// The parsed directive.
    pub directive: Directive,
    /// Line number in the text handed to the parser (1-indexed). For a
    /// `Dockerfile` read from disk this is the line of the normalised text,
    /// which drops comments, blank lines and continuations, so it can be
    /// lower than the line in the original file. Used for ordering and for
    /// error messages.
    pub line_number: u32,
    /// Normalised source text of the directive, continuations joined.
    pub raw_text: String,
}

impl DirectivePos {
    /// Create a new positioned directive.
    pub fn new(directive: Directive, line_number: u32, raw_text: impl Into<String>) -> Self {
        Self {
            directive,
            line_number,
            raw_text: raw_text.into(),
        }
    }

    /// Get the directive kind.
    pub fn kind(&self) -> DirectiveKind {
        self.directive.kind()
    }
}

/// Tag identifying a directive variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectiveKind {
    From,
    Run,
    Cmd,
    Label,
    Maintainer,
    Expose,
    Env,
    Add,
    Copy,
    Entrypoint,
    Volume,
    User,
    Workdir,
    Arg,
    Onbuild,
    Stopsignal,
    Healthcheck,
    Shell,
    Comment,
}

impl DirectiveKind {
    /// Get the Dockerfile keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::From => "FROM",
            Self::Run => "RUN",
            Self::Cmd => "CMD",
            Self::Label => "LABEL",
            Self::Maintainer => "MAINTAINER",
            Self::Expose => "EXPOSE",
            Self::Env => "ENV",
            Self::Add => "ADD",
            Self::Copy => "COPY",
            Self::Entrypoint => "ENTRYPOINT",
            Self::Volume => "VOLUME",
            Self::User => "USER",
            Self::Workdir => "WORKDIR",
            Self::Arg => "ARG",
            Self::Onbuild => "ONBUILD",
            Self::Stopsignal => "STOPSIGNAL",
            Self::Healthcheck => "HEALTHCHECK",
            Self::Shell => "SHELL",
            Self::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dockerfile directives.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// FROM directive
    From(BaseImage),
    /// RUN directive
    Run(RunArgs),
    /// CMD directive
    Cmd(Arguments),
    /// LABEL directive
    Label(Vec<(String, String)>),
    /// MAINTAINER directive (deprecated)
    Maintainer(Vec<String>),
    /// EXPOSE directive
    Expose(Vec<Port>),
    /// ENV directive
    Env(Vec<(String, String)>),
    /// ADD directive
    Add(TransferArgs),
    /// COPY directive
    Copy(TransferArgs),
    /// ENTRYPOINT directive
    Entrypoint(Arguments),
    /// VOLUME directive
    Volume(Vec<String>),
    /// USER directive
    User(UserGroup),
    /// WORKDIR directive
    Workdir(String),
    /// ARG directive
    Arg(ArgSpec),
    /// ONBUILD directive (wraps another directive)
    Onbuild(Box<Directive>),
    /// STOPSIGNAL directive
    Stopsignal(String),
    /// HEALTHCHECK directive
    Healthcheck(HealthCheck),
    /// SHELL directive
    Shell(Vec<String>),
    /// Comment line
    Comment(String),
}

impl Directive {
    /// Get the kind tag of this directive.
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::From(_) => DirectiveKind::From,
            Self::Run(_) => DirectiveKind::Run,
            Self::Cmd(_) => DirectiveKind::Cmd,
            Self::Label(_) => DirectiveKind::Label,
            Self::Maintainer(_) => DirectiveKind::Maintainer,
            Self::Expose(_) => DirectiveKind::Expose,
            Self::Env(_) => DirectiveKind::Env,
            Self::Add(_) => DirectiveKind::Add,
            Self::Copy(_) => DirectiveKind::Copy,
            Self::Entrypoint(_) => DirectiveKind::Entrypoint,
            Self::Volume(_) => DirectiveKind::Volume,
            Self::User(_) => DirectiveKind::User,
            Self::Workdir(_) => DirectiveKind::Workdir,
            Self::Arg(_) => DirectiveKind::Arg,
            Self::Onbuild(_) => DirectiveKind::Onbuild,
            Self::Stopsignal(_) => DirectiveKind::Stopsignal,
            Self::Healthcheck(_) => DirectiveKind::Healthcheck,
            Self::Shell(_) => DirectiveKind::Shell,
            Self::Comment(_) => DirectiveKind::Comment,
        }
    }

    /// Check if this is a FROM directive.
    pub fn is_from(&self) -> bool {
        matches!(self, Self::From(_))
    }

    /// Check if this is a RUN directive.
    pub fn is_run(&self) -> bool {
        matches!(self, Self::Run(_))
    }
}

/// Look up a key in an ordered list of pairs. The last occurrence wins.
pub fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Base image in a FROM directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseImage {
    /// Registry prefix (e.g., "gcr.io", "http://registry.local:5000").
    pub registry: Option<String>,
    /// Image name, including any namespace (e.g., "library/ubuntu").
    pub image: String,
    /// Explicit tag.
    pub tag: Option<String>,
    /// Explicit digest.
    pub digest: Option<Digest>,
    /// Target platform (--platform=...).
    pub platform: Option<String>,
    /// Stage alias (AS name).
    pub alias: Option<String>,
}

impl BaseImage {
    /// Create a new base image with just a name.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            registry: None,
            image: image.into(),
            tag: None,
            digest: None,
            platform: None,
            alias: None,
        }
    }

    /// Registry the image is pulled from, or the public default.
    pub fn registry(&self) -> &str {
        self.registry.as_deref().unwrap_or(DEFAULT_REGISTRY)
    }

    /// Effective tag. A digest pins the image and wins over any tag; with
    /// neither present the tag is `latest`.
    pub fn tag(&self) -> Option<&str> {
        match (&self.tag, &self.digest) {
            (_, Some(_)) => None,
            (Some(tag), None) => Some(tag),
            (None, None) => Some(DEFAULT_TAG),
        }
    }

    /// Check if this is the scratch image.
    pub fn is_scratch(&self) -> bool {
        self.image == "scratch"
    }
}

/// Content digest of an image (`algorithm:hash`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    pub algorithm: String,
    pub hash: String,
}

/// Arguments in shell form or exec form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    /// Shell form: RUN apt-get update
    Text(String),
    /// Exec form: RUN ["apt-get", "update"]
    List(Vec<String>),
}

impl Arguments {
    /// The command as one string: shell form as-is, exec form joined with spaces.
    pub fn command(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(v) => v.join(" "),
        }
    }
}

/// RUN directive arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// The command arguments.
    pub arguments: Arguments,
    /// BuildKit flags (--mount=..., --network=..., --security=...), verbatim.
    pub flags: Vec<String>,
}

impl RunArgs {
    /// The normalised command string.
    pub fn command(&self) -> String {
        self.arguments.command()
    }
}

/// `user[:group]`, as used by USER and `--chown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserGroup {
    /// User name or numeric uid.
    pub user: String,
    /// Group name or numeric gid.
    pub group: Option<String>,
}

impl UserGroup {
    pub fn new(user: impl Into<String>, group: Option<String>) -> Self {
        Self {
            user: user.into(),
            group,
        }
    }

    /// Check if the user is root, by name or uid.
    pub fn is_root(&self) -> bool {
        self.user == "root" || self.user == "0"
    }
}

/// ADD/COPY arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    /// Source paths/URLs, never empty.
    pub sources: Vec<String>,
    /// Destination path.
    pub destination: String,
    /// Flags given before the paths.
    pub flags: TransferFlags,
}

impl TransferArgs {
    /// Create new transfer args without flags.
    pub fn new(sources: Vec<String>, destination: impl Into<String>) -> Self {
        Self {
            sources,
            destination: destination.into(),
            flags: TransferFlags::default(),
        }
    }
}

/// ADD/COPY flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferFlags {
    /// --chown=<user[:group]>
    pub chown: Option<UserGroup>,
    /// --chmod=<mode>
    pub chmod: Option<String>,
    /// --from=<stage> (COPY only)
    pub from: Option<String>,
    /// --checksum=<checksum> (ADD only)
    pub checksum: Option<String>,
    /// --link
    pub link: bool,
    /// --keep-git-dir (ADD only)
    pub keep_git_dir: bool,
}

/// Port specification in EXPOSE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Port {
    /// Port as written: a number, a range, or a `$VAR`/`${VAR}` reference.
    pub port: String,
    /// Protocol (tcp/udp).
    pub protocol: PortProtocol,
}

impl Port {
    /// Create a TCP port.
    pub fn tcp(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            protocol: PortProtocol::Tcp,
        }
    }

    /// Numeric value of a literal port; the lower bound for a range.
    pub fn number(&self) -> Option<u32> {
        parse_port_number(&self.port)
    }

    /// Variable name if the port is a `$VAR` or `${VAR}` reference.
    pub fn env_reference(&self) -> Option<&str> {
        let name = self.port.strip_prefix('$')?;
        let name = match name.strip_prefix('{') {
            Some(inner) => inner.strip_suffix('}')?,
            None => name,
        };
        if name.is_empty() { None } else { Some(name) }
    }
}

/// Parse `80` or `8000-8010` (lower bound) into a number.
pub fn parse_port_number(s: &str) -> Option<u32> {
    let s = s.trim();
    let low = s.split_once('-').map(|(low, _)| low).unwrap_or(s);
    low.parse().ok()
}

/// Port protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortProtocol {
    #[default]
    Tcp,
    Udp,
}

impl PortProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// ARG directive: name with optional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub default: Option<String>,
}

/// HEALTHCHECK directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheck {
    /// HEALTHCHECK NONE
    None,
    /// HEALTHCHECK [OPTIONS] CMD ...
    Cmd {
        /// The command to run.
        cmd: Arguments,
        /// Interval between checks.
        interval: Option<String>,
        /// Timeout for each check.
        timeout: Option<String>,
        /// Start period before checks begin.
        start_period: Option<String>,
        /// Interval between checks during the start period.
        start_interval: Option<String>,
        /// Number of retries before unhealthy.
        retries: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_image_defaults() {
        let img = BaseImage::new("python");
        assert_eq!(img.registry(), DEFAULT_REGISTRY);
        assert_eq!(img.tag(), Some("latest"));
        assert!(!img.is_scratch());

        let pinned = BaseImage {
            digest: Some(Digest {
                algorithm: "sha256".to_string(),
                hash: "a".repeat(64),
            }),
            ..BaseImage::new("python")
        };
        assert_eq!(pinned.tag(), None);
        assert!(BaseImage::new("scratch").is_scratch());
    }

    #[test]
    fn test_arguments() {
        let shell = Arguments::Text("apt-get update".to_string());
        assert_eq!(shell.command(), "apt-get update");

        let exec = Arguments::List(vec!["apt-get".to_string(), "update".to_string()]);
        assert_eq!(exec.command(), "apt-get update");
    }

    #[test]
    fn test_port_resolution_helpers() {
        assert_eq!(Port::tcp("80").number(), Some(80));
        assert_eq!(Port::tcp("8000-8010").number(), Some(8000));
        assert_eq!(Port::tcp("$PORT").number(), None);
        assert_eq!(Port::tcp("$PORT").env_reference(), Some("PORT"));
        assert_eq!(Port::tcp("${PORT}").env_reference(), Some("PORT"));
        assert_eq!(Port::tcp("80").env_reference(), None);
    }

    #[test]
    fn test_lookup_last_wins() {
        let pairs = vec![
            ("PORT".to_string(), "80".to_string()),
            ("HOST".to_string(), "x".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        assert_eq!(lookup(&pairs, "PORT"), Some("8080"));
        assert_eq!(lookup(&pairs, "MISSING"), None);
    }

    #[test]
    fn test_user_group() {
        assert!(UserGroup::new("root", None).is_root());
        assert!(UserGroup::new("0", Some("0".to_string())).is_root());
        assert!(!UserGroup::new("app", None).is_root());
    }
}
