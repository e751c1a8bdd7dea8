//! Dockerfile parser using nom.
//!
//! Parses Dockerfile content into a list of `DirectivePos` elements. Input is
//! processed one logical line at a time; any line the grammar does not
//! consume completely is a `ParseError::Malformed`.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till1, take_while1},
    character::complete::{char, space0, space1},
    combinator::{eof, opt, peek},
    multi::separated_list1,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use super::directive::*;
use crate::error::ParseError;

const KEYWORDS: [&str; 19] = [
    "FROM",
    "RUN",
    "CMD",
    "LABEL",
    "MAINTAINER",
    "EXPOSE",
    "ENV",
    "ADD",
    "COPY",
    "ENTRYPOINT",
    "VOLUME",
    "USER",
    "WORKDIR",
    "ARG",
    "ONBUILD",
    "STOPSIGNAL",
    "HEALTHCHECK",
    "SHELL",
    "#",
];

/// Parse a Dockerfile string into a list of positioned directives.
///
/// Accepts normalised text as well as raw text; `\`-newline continuations are
/// joined into one logical line.
pub fn parse_dockerfile(input: &str) -> Result<Vec<DirectivePos>, ParseError> {
    let mut directives = Vec::new();
    let lines: Vec<&str> = input.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let start_line = (i + 1) as u32;
        let mut combined = String::new();

        // Collect lines with continuations. Blank and comment lines inside a
        // continuation are skipped.
        while i < lines.len() {
            let trimmed = lines[i].trim();
            i += 1;
            if !combined.is_empty() && (trimmed.is_empty() || trimmed.starts_with('#')) {
                continue;
            }
            if combined.is_empty() && trimmed.starts_with('#') {
                combined.push_str(trimmed);
                break;
            }
            match trimmed.strip_suffix('\\') {
                Some(head) => {
                    combined.push_str(head.trim_end());
                    combined.push(' ');
                }
                None => {
                    combined.push_str(trimmed);
                    break;
                }
            }
        }

        let logical = combined.trim();
        if logical.is_empty() {
            continue;
        }

        let directive = parse_line(logical).map_err(|message| ParseError::Malformed {
            line: start_line,
            message,
        })?;
        directives.push(DirectivePos::new(directive, start_line, logical));
    }

    Ok(directives)
}

/// Parse one logical line, requiring that all of it is consumed.
fn parse_line(line: &str) -> Result<Directive, String> {
    match terminated(parse_directive, pair(space0, eof))(line) {
        Ok((_, directive)) => Ok(directive),
        Err(_) => {
            let keyword = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            if KEYWORDS.contains(&keyword.as_str()) || keyword.starts_with('#') {
                Err(format!("malformed {} directive: {}", keyword, line))
            } else {
                Err(format!("unknown instruction: {}", keyword))
            }
        }
    }
}

/// Parse a single directive.
fn parse_directive(input: &str) -> IResult<&str, Directive> {
    alt((
        parse_from,
        parse_run,
        parse_copy,
        parse_add,
        parse_env,
        parse_label,
        parse_expose,
        parse_arg,
        parse_entrypoint,
        parse_cmd,
        parse_shell,
        parse_user,
        parse_workdir,
        parse_volume,
        parse_maintainer,
        parse_healthcheck,
        parse_onbuild,
        parse_stopsignal,
        parse_comment,
    ))(input)
}

/// Match a keyword (case-insensitive) followed by at least one blank.
fn keyword<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(name), space1)
}

fn fail<T>(input: &str) -> IResult<&str, T> {
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Verify,
    )))
}

/// A whitespace-delimited token.
fn word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

/// Parse FROM directive.
fn parse_from(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("FROM")(input)?;

    // Parse optional --platform flag
    let (input, platform) = opt(terminated(
        preceded(tag("--platform="), word),
        space1,
    ))(input)?;

    // Parse image reference
    let (input, image_ref) = word(input)?;
    let Some(mut base) = parse_image_reference(image_ref) else {
        return fail(input);
    };

    // Parse optional AS alias
    let (input, alias) = opt(preceded(
        tuple((space1, tag_no_case("AS"), space1)),
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'),
    ))(input)?;

    base.platform = platform.map(str::to_string);
    base.alias = alias.map(str::to_string);
    Ok((input, Directive::From(base)))
}

/// Split an image reference into registry, name, tag and digest.
///
/// Returns `None` when any part falls outside the image-reference grammar.
fn parse_image_reference(image_ref: &str) -> Option<BaseImage> {
    let (name_part, digest) = match image_ref.split_once('@') {
        Some((name, digest)) => (name, Some(parse_digest(digest)?)),
        None => (image_ref, None),
    };

    let (registry, path) = split_registry(name_part)?;

    let last_slash = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (image, tag) = match rfind_outside_braces(&path[last_slash..], ':') {
        Some(pos) => {
            let pos = last_slash + pos;
            (&path[..pos], Some(&path[pos + 1..]))
        }
        None => (path, None),
    };

    if !is_image_name(image) {
        return None;
    }
    if let Some(tag) = tag {
        if !is_tag(tag) {
            return None;
        }
    }

    Some(BaseImage {
        registry: registry.map(str::to_string),
        tag: tag.map(str::to_string),
        digest,
        ..BaseImage::new(image)
    })
}

/// Split a leading registry host from the image path.
///
/// A registry is present when the first path component has a scheme, a dot,
/// a port, or is `localhost`.
fn split_registry(name: &str) -> Option<(Option<&str>, &str)> {
    let scheme_len = ["http://", "https://"]
        .iter()
        .find(|scheme| name.starts_with(*scheme))
        .map(|scheme| scheme.len());

    if let Some(scheme_len) = scheme_len {
        let slash = name[scheme_len..].find('/')? + scheme_len;
        let host = &name[scheme_len..slash];
        if !is_host(host) {
            return None;
        }
        return Some((Some(&name[..slash]), &name[slash + 1..]));
    }

    if let Some(slash) = name.find('/') {
        let candidate = &name[..slash];
        if (candidate.contains('.') || candidate.contains(':') || candidate == "localhost")
            && !candidate.starts_with('$')
        {
            if !is_host(candidate) {
                return None;
            }
            return Some((Some(candidate), &name[slash + 1..]));
        }
    }
    Some((None, name))
}

fn parse_digest(s: &str) -> Option<Digest> {
    let (algorithm, hash) = s.split_once(':')?;
    let algorithm_ok = !algorithm.is_empty()
        && algorithm
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '_' | '-'));
    let hash_ok = hash.len() >= 32
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if algorithm_ok && hash_ok {
        Some(Digest {
            algorithm: algorithm.to_string(),
            hash: hash.to_string(),
        })
    } else {
        None
    }
}

/// `host[:port]` with alphanumerics, dots and dashes.
fn is_host(s: &str) -> bool {
    let (host, port) = match s.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (s, None),
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let port_ok = port.is_none_or(|p| {
        (1..=5).contains(&p.len()) && p.chars().all(|c| c.is_ascii_digit())
    });
    host_ok && port_ok
}

fn is_reference_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '$' | '{' | '}')
}

fn is_image_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('/')
        && !s.ends_with('/')
        && s.chars().all(|c| is_reference_char(c) || c == '/' || c == ':')
        && rfind_outside_braces(s, ':').is_none()
}

fn is_tag(s: &str) -> bool {
    !s.is_empty() && s.len() <= 128 && s.chars().all(|c| is_reference_char(c) || c == ':')
}

/// Last position of `needle` that is not inside a `${...}` reference.
fn rfind_outside_braces(s: &str, needle: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut found = None;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if c == needle && depth == 0 => found = Some(i),
            _ => {}
        }
    }
    found
}

/// Parse RUN directive.
fn parse_run(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("RUN")(input)?;

    // Parse flags (--mount, --network, --security)
    let mut flags = Vec::new();
    let mut remaining = input;
    loop {
        let flag: IResult<&str, &str> = terminated(
            alt((
                parse_flag("--mount"),
                parse_flag("--network"),
                parse_flag("--security"),
            )),
            space1,
        )(remaining);
        match flag {
            Ok((input, raw)) => {
                flags.push(raw.to_string());
                remaining = input;
            }
            Err(_) => break,
        }
    }

    // Parse arguments (exec form or shell form)
    let (input, arguments) = parse_arguments(remaining)?;

    Ok((input, Directive::Run(RunArgs { arguments, flags })))
}

/// Recognise `--flag=value` and return the whole flag text.
fn parse_flag<'a>(flag: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, _) = tuple((tag(flag), char('='), word))(input)?;
        Ok((rest, &input[..input.len() - rest.len()]))
    }
}

/// Parse the value of `--flag=value`.
fn parse_flag_value<'a>(input: &'a str, flag: &str) -> IResult<&'a str, &'a str> {
    let (input, _) = tag(flag)(input)?;
    let (input, _) = char('=')(input)?;
    word(input)
}

/// Parse arguments (exec form or shell form).
fn parse_arguments(input: &str) -> IResult<&str, Arguments> {
    // Try exec form first
    if let Ok((_, list)) = terminated(parse_json_array, pair(space0, eof))(input) {
        return Ok(("", Arguments::List(list)));
    }

    // Fall back to shell form
    let text = input.trim();
    if text.is_empty() {
        return fail(input);
    }
    Ok(("", Arguments::Text(text.to_string())))
}

/// Parse JSON-like array for exec form. Items may use double or single quotes.
fn parse_json_array(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = char('[')(input)?;
    let (input, _) = space0(input)?;
    let (input, items) = separated_list1(
        tuple((space0, char(','), space0)),
        alt((parse_quoted('"'), parse_quoted('\''))),
    )(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, items))
}

/// Parse a quoted string, handling backslash escapes.
fn parse_quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    move |input: &'a str| {
        let (input, _) = char(quote)(input)?;
        let mut result = String::new();
        let mut chars = input.char_indices();

        while let Some((i, c)) = chars.next() {
            if c == quote {
                return Ok((&input[i + c.len_utf8()..], result));
            } else if c == '\\' {
                if let Some((_, next)) = chars.next() {
                    match next {
                        'n' => result.push('\n'),
                        't' => result.push('\t'),
                        'r' => result.push('\r'),
                        '\\' => result.push('\\'),
                        c if c == quote => result.push(c),
                        _ => {
                            result.push('\\');
                            result.push(next);
                        }
                    }
                }
            } else {
                result.push(c);
            }
        }

        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )))
    }
}

/// Parse COPY directive.
fn parse_copy(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("COPY")(input)?;
    let (input, args) = parse_transfer(input)?;
    Ok((input, Directive::Copy(args)))
}

/// Parse ADD directive.
fn parse_add(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("ADD")(input)?;
    let (input, args) = parse_transfer(input)?;
    if args.flags.from.is_some() {
        return fail(input);
    }
    Ok((input, Directive::Add(args)))
}

/// Parse ADD/COPY flags, then sources and destination.
fn parse_transfer(input: &str) -> IResult<&str, TransferArgs> {
    let (input, flags) = parse_transfer_flags(input)?;
    let (input, mut args) = parse_transfer_paths(input)?;
    args.flags = flags;
    Ok((input, args))
}

/// Parse ADD/COPY flags in any order.
fn parse_transfer_flags(input: &str) -> IResult<&str, TransferFlags> {
    let mut flags = TransferFlags::default();
    let mut remaining = input;

    loop {
        let (input, _) = space0(remaining)?;

        if let Ok((input, chown)) = parse_flag_value(input, "--chown") {
            let Some(owner) = parse_user_group(chown) else {
                return fail(input);
            };
            flags.chown = Some(owner);
            remaining = input;
            continue;
        }
        if let Ok((input, chmod)) = parse_flag_value(input, "--chmod") {
            flags.chmod = Some(chmod.to_string());
            remaining = input;
            continue;
        }
        if let Ok((input, from)) = parse_flag_value(input, "--from") {
            flags.from = Some(from.to_string());
            remaining = input;
            continue;
        }
        if let Ok((input, checksum)) = parse_flag_value(input, "--checksum") {
            flags.checksum = Some(checksum.to_string());
            remaining = input;
            continue;
        }
        if let Ok((input, value)) = parse_bool_flag(input, "--link") {
            flags.link = value;
            remaining = input;
            continue;
        }
        if let Ok((input, value)) = parse_bool_flag(input, "--keep-git-dir") {
            flags.keep_git_dir = value;
            remaining = input;
            continue;
        }

        break;
    }

    Ok((remaining, flags))
}

/// Parse `--flag` or `--flag=true|false`.
fn parse_bool_flag<'a>(input: &'a str, flag: &str) -> IResult<&'a str, bool> {
    let (input, _) = tag(flag)(input)?;
    if let Ok((input, value)) = preceded(
        char::<&str, nom::error::Error<&str>>('='),
        alt((tag_no_case("true"), tag_no_case("false"))),
    )(input)
    {
        let (input, _) = peek(alt((space1, eof)))(input)?;
        return Ok((input, value.eq_ignore_ascii_case("true")));
    }
    let (input, _) = peek(alt((space1, eof)))(input)?;
    Ok((input, true))
}

/// Parse ADD/COPY sources and destination.
fn parse_transfer_paths(input: &str) -> IResult<&str, TransferArgs> {
    let (input, _) = space0(input)?;

    // Try exec form first
    if let Ok((_, mut items)) = terminated(parse_json_array, pair(space0, eof))(input) {
        if items.len() >= 2 {
            let destination = items.pop().unwrap_or_default();
            return Ok(("", TransferArgs::new(items, destination)));
        }
        return fail(input);
    }

    // Shell form: paths split on unescaped whitespace
    let mut parts = split_unescaped(input);
    if parts.len() < 2 {
        return fail(input);
    }
    let destination = parts.pop().unwrap_or_default();
    Ok(("", TransferArgs::new(parts, destination)))
}

/// Split on whitespace that is not preceded by a backslash.
fn split_unescaped(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next.is_whitespace() => current.push(next),
                Some(next) => {
                    current.push(c);
                    current.push(next);
                }
                None => current.push(c),
            }
        } else if c.is_whitespace() {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Parse ENV directive.
fn parse_env(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("ENV")(input)?;

    // ENV can be KEY=VALUE or KEY VALUE
    match parse_key_value_pairs(input, true) {
        Some(pairs) => Ok(("", Directive::Env(pairs))),
        None => fail(input),
    }
}

/// Parse LABEL directive.
fn parse_label(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("LABEL")(input)?;

    match parse_key_value_pairs(input, false) {
        Some(pairs) => Ok(("", Directive::Label(pairs))),
        None => fail(input),
    }
}

/// Parse key=value pairs. With `allow_legacy`, a first key without `=` takes
/// the rest of the line as its value.
fn parse_key_value_pairs(input: &str, allow_legacy: bool) -> Option<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut remaining = input.trim();

    while !remaining.is_empty() {
        // Find key
        let (key, rest) = take_kv_token(remaining, true)?;
        remaining = rest;

        // Check for = sign
        if let Some(rest) = remaining.strip_prefix('=') {
            let (value, rest) = if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                (String::new(), rest)
            } else {
                take_kv_token(rest, false)?
            };
            pairs.push((key, value));
            remaining = rest.trim_start();
        } else if allow_legacy && pairs.is_empty() {
            // Legacy format: KEY VALUE (no =)
            let value = remaining.trim();
            if value.is_empty() {
                return None;
            }
            let value = match take_kv_token(value, false) {
                Some((unquoted, "")) => unquoted,
                _ => value.to_string(),
            };
            pairs.push((key, value));
            break;
        } else {
            return None;
        }
    }

    if pairs.is_empty() { None } else { Some(pairs) }
}

/// Take one key or value token, unquoting `"..."`/`'...'` parts and
/// `\`-escapes. A key stops at `=`; both stop at unquoted whitespace.
fn take_kv_token(input: &str, is_key: bool) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut quote: Option<char> = None;
    let mut iter = input.char_indices().peekable();

    while let Some(&(i, c)) = iter.peek() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                iter.next();
            }
            Some(q) if c == '\\' && q == '"' => {
                iter.next();
                match iter.next() {
                    Some((_, next)) => out.push(next),
                    None => out.push(c),
                }
            }
            Some(_) => {
                out.push(c);
                iter.next();
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                iter.next();
            }
            None if c == '\\' => {
                iter.next();
                match iter.next() {
                    Some((_, next)) => out.push(next),
                    None => out.push(c),
                }
            }
            None if c.is_whitespace() || (is_key && c == '=') => {
                return if is_key && out.is_empty() {
                    None
                } else {
                    Some((out, &input[i..]))
                };
            }
            None => {
                out.push(c);
                iter.next();
            }
        }
    }

    if quote.is_some() || (is_key && out.is_empty()) {
        return None;
    }
    Some((out, ""))
}

/// Parse EXPOSE directive.
fn parse_expose(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("EXPOSE")(input)?;

    let mut ports = Vec::new();
    for part in input.split_whitespace() {
        match parse_port_spec(part) {
            Some(port) => ports.push(port),
            None => return fail(input),
        }
    }
    if ports.is_empty() {
        return fail(input);
    }

    Ok(("", Directive::Expose(ports)))
}

/// Parse a port specification like "80", "80/tcp", "53/udp", "8000-8010",
/// "$PORT" or "${PORT}/udp".
fn parse_port_spec(s: &str) -> Option<Port> {
    let (port, protocol) = match s.split_once('/') {
        Some((port, proto)) if proto.eq_ignore_ascii_case("tcp") => (port, PortProtocol::Tcp),
        Some((port, proto)) if proto.eq_ignore_ascii_case("udp") => (port, PortProtocol::Udp),
        Some(_) => return None,
        None => (s, PortProtocol::Tcp),
    };

    let is_number = |p: &str| !p.is_empty() && p.len() <= 5 && p.chars().all(|c| c.is_ascii_digit());
    let valid = match port.split_once('-') {
        _ if port.starts_with('$') => Port::tcp(port).env_reference().is_some(),
        Some((low, high)) => is_number(low) && is_number(high),
        None => is_number(port),
    };

    valid.then(|| Port {
        port: port.to_string(),
        protocol,
    })
}

/// Parse ARG directive.
fn parse_arg(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("ARG")(input)?;

    let content = input.trim();
    let (name, default) = match content.split_once('=') {
        Some((name, default)) => (name, Some(default.to_string())),
        None => (content, None),
    };
    if name.is_empty() || name.contains(char::is_whitespace) {
        return fail(input);
    }
    Ok((
        "",
        Directive::Arg(ArgSpec {
            name: name.to_string(),
            default,
        }),
    ))
}

/// Parse ENTRYPOINT directive.
fn parse_entrypoint(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("ENTRYPOINT")(input)?;
    let (input, arguments) = parse_arguments(input)?;
    Ok((input, Directive::Entrypoint(arguments)))
}

/// Parse CMD directive.
fn parse_cmd(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("CMD")(input)?;
    let (input, arguments) = parse_arguments(input)?;
    Ok((input, Directive::Cmd(arguments)))
}

/// Parse SHELL directive. Only the exec form is valid.
fn parse_shell(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("SHELL")(input)?;
    let (input, list) = parse_json_array(input)?;
    Ok((input, Directive::Shell(list)))
}

/// Parse USER directive.
fn parse_user(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("USER")(input)?;
    let (input, spec) = word(input)?;
    match parse_user_group(spec) {
        Some(user) => Ok((input, Directive::User(user))),
        None => fail(input),
    }
}

/// Parse `user[:group]`.
fn parse_user_group(s: &str) -> Option<UserGroup> {
    let (user, group) = match s.split_once(':') {
        Some((user, group)) => (user, Some(group)),
        None => (s, None),
    };
    let valid = |part: &str| !part.is_empty() && !part.contains(':');
    if !valid(user) || group.is_some_and(|g| !valid(g)) {
        return None;
    }
    Some(UserGroup::new(user, group.map(str::to_string)))
}

/// Parse WORKDIR directive.
fn parse_workdir(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("WORKDIR")(input)?;
    let path = input.trim();
    if path.is_empty() {
        return fail(input);
    }
    Ok(("", Directive::Workdir(path.to_string())))
}

/// Parse VOLUME directive: JSON array or space-separated paths.
fn parse_volume(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("VOLUME")(input)?;

    if let Ok((_, list)) = terminated(parse_json_array, pair(space0, eof))(input) {
        return Ok(("", Directive::Volume(list)));
    }
    let paths = split_unescaped(input);
    if paths.is_empty() {
        return fail(input);
    }
    Ok(("", Directive::Volume(paths)))
}

/// Parse MAINTAINER directive (deprecated). Several names may be given
/// separated by commas.
fn parse_maintainer(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("MAINTAINER")(input)?;

    let names: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return fail(input);
    }
    Ok(("", Directive::Maintainer(names)))
}

/// Parse HEALTHCHECK directive.
fn parse_healthcheck(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("HEALTHCHECK")(input)?;

    // Check for NONE
    if let Ok((rest, _)) = terminated(
        tag_no_case::<&str, &str, nom::error::Error<&str>>("NONE"),
        pair(space0, eof),
    )(input)
    {
        return Ok((rest, Directive::Healthcheck(HealthCheck::None)));
    }

    // Parse options
    let mut interval = None;
    let mut timeout = None;
    let mut start_period = None;
    let mut start_interval = None;
    let mut retries = None;
    let mut remaining = input;

    loop {
        if let Ok((rest, value)) = terminated(
            |i| parse_flag_value(i, "--interval"),
            space1,
        )(remaining)
        {
            interval = Some(value.to_string());
            remaining = rest;
        } else if let Ok((rest, value)) =
            terminated(|i| parse_flag_value(i, "--timeout"), space1)(remaining)
        {
            timeout = Some(value.to_string());
            remaining = rest;
        } else if let Ok((rest, value)) =
            terminated(|i| parse_flag_value(i, "--start-period"), space1)(remaining)
        {
            start_period = Some(value.to_string());
            remaining = rest;
        } else if let Ok((rest, value)) =
            terminated(|i| parse_flag_value(i, "--start-interval"), space1)(remaining)
        {
            start_interval = Some(value.to_string());
            remaining = rest;
        } else if let Ok((rest, value)) =
            terminated(|i| parse_flag_value(i, "--retries"), space1)(remaining)
        {
            let Ok(count) = value.parse() else {
                return fail(remaining);
            };
            retries = Some(count);
            remaining = rest;
        } else {
            break;
        }
    }

    // Parse CMD
    let (remaining, _) = keyword("CMD")(remaining)?;
    let (rest, cmd) = parse_arguments(remaining)?;

    Ok((
        rest,
        Directive::Healthcheck(HealthCheck::Cmd {
            cmd,
            interval,
            timeout,
            start_period,
            start_interval,
            retries,
        }),
    ))
}

/// Parse ONBUILD directive. It may not wrap ONBUILD, FROM or MAINTAINER.
fn parse_onbuild(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("ONBUILD")(input)?;

    let (remaining, inner) = parse_directive(input)?;
    match inner {
        Directive::Onbuild(_) | Directive::From(_) | Directive::Maintainer(_) | Directive::Comment(_) => {
            fail(input)
        }
        inner => Ok((remaining, Directive::Onbuild(Box::new(inner)))),
    }
}

/// Parse STOPSIGNAL directive.
fn parse_stopsignal(input: &str) -> IResult<&str, Directive> {
    let (input, _) = keyword("STOPSIGNAL")(input)?;
    let (input, signal) = word(input)?;
    Ok((input, Directive::Stopsignal(signal.to_string())))
}

/// Parse comment.
fn parse_comment(input: &str) -> IResult<&str, Directive> {
    let (input, _) = char('#')(input)?;
    Ok(("", Directive::Comment(input.trim().to_string())))
}
