//! Logic-less template engine
//!
//! Supported syntax:
//! - `{{path}}` and `{{{path}}}`: value lookup (output is never escaped)
//! - `{{! comment }}` and `{{!-- comment --}}`
//! - `{{#each path}}`, `{{#if path}}`, `{{#unless path}}` with an optional
//!   `{{else}}` branch, closed by `{{/each}}` etc.
//! - `this` / `.`, `../` to reach the enclosing `each` scope, and the loop
//!   variables `@index`, `@first`, `@last`, `@key`
//!
//! A block tag alone on its line removes that whole line from the output.
//! Falsy values are missing, `null`, `false`, `0`, `""` and `[]`.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Helper {
    Each,
    If,
    Unless,
}

impl Helper {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "each" => Some(Helper::Each),
            "if" => Some(Helper::If),
            "unless" => Some(Helper::Unless),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Helper::Each => "each",
            Helper::If => "if",
            Helper::Unless => "unless",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Var(String),
    Open(Helper, String),
    Else,
    Close(String),
    Comment,
}

impl Token {
    fn is_standalone_candidate(&self) -> bool {
        matches!(
            self,
            Token::Open(..) | Token::Else | Token::Close(_) | Token::Comment
        )
    }
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Var(String),
    Block(Block),
}

#[derive(Debug, Clone)]
struct Block {
    helper: Helper,
    path: String,
    body: Vec<Node>,
    inverse: Vec<Node>,
}

/// A compiled template
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Compile template source, rejecting unbalanced or unknown blocks
    pub fn compile(source: &str) -> Result<Self> {
        let mut tokens = tokenize(source)?;
        strip_standalone(&mut tokens);
        let nodes = parse(tokens)?;
        Ok(Self { nodes })
    }

    /// Render against a JSON data context
    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        let mut scopes = vec![Scope {
            value: data,
            frame: None,
        }];
        render_nodes(&self.nodes, &mut scopes, &mut out);
        out
    }

    /// Render any serializable value
    pub fn render_serialize(&self, data: &impl Serialize) -> Result<String> {
        let value = serde_json::to_value(data)
            .map_err(|e| Error::template(format!("cannot serialize template data: {}", e)))?;
        Ok(self.render(&value))
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let tag = &rest[start..];

        let (token, consumed) = if let Some(body) = tag.strip_prefix("{{{") {
            let end = body.find("}}}").ok_or_else(|| unclosed_tag(tag))?;
            (Token::Var(non_empty(body[..end].trim(), tag)?), 3 + end + 3)
        } else if let Some(body) = tag.strip_prefix("{{!--") {
            let end = body.find("--}}").ok_or_else(|| unclosed_tag(tag))?;
            (Token::Comment, 5 + end + 4)
        } else {
            let body = &tag[2..];
            let end = body.find("}}").ok_or_else(|| unclosed_tag(tag))?;
            (parse_tag(body[..end].trim(), tag)?, 2 + end + 2)
        };

        tokens.push(token);
        rest = &tag[consumed..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

fn parse_tag(inner: &str, tag: &str) -> Result<Token> {
    if inner.starts_with('!') {
        return Ok(Token::Comment);
    }

    if let Some(open) = inner.strip_prefix('#') {
        let mut parts = open.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let helper = Helper::parse(name)
            .ok_or_else(|| Error::template(format!("unknown block helper `{}`", name)))?;
        let path = match (parts.next(), parts.next()) {
            (Some(path), None) => path.to_string(),
            _ => {
                return Err(Error::template(format!(
                    "`{{{{#{}}}}}` takes exactly one argument",
                    name
                )));
            }
        };
        return Ok(Token::Open(helper, path));
    }

    if let Some(close) = inner.strip_prefix('/') {
        return Ok(Token::Close(close.trim().to_string()));
    }

    if inner == "else" {
        return Ok(Token::Else);
    }

    Ok(Token::Var(non_empty(inner, tag)?))
}

fn non_empty(inner: &str, tag: &str) -> Result<String> {
    if inner.is_empty() {
        return Err(Error::template(format!("empty tag near `{}`", preview(tag))));
    }
    Ok(inner.to_string())
}

fn unclosed_tag(tag: &str) -> Error {
    Error::template(format!("unclosed tag `{}`", preview(tag)))
}

fn preview(tag: &str) -> &str {
    match tag.char_indices().nth(24) {
        Some((idx, _)) => &tag[..idx],
        None => tag,
    }
}

/// Remove the lines that hold nothing but a block tag
fn strip_standalone(tokens: &mut [Token]) {
    let last = tokens.len().saturating_sub(1);
    let standalone: Vec<bool> = (0..tokens.len())
        .map(|i| {
            if !tokens[i].is_standalone_candidate() {
                return false;
            }
            let starts_line = match i.checked_sub(1).map(|prev| &tokens[prev]) {
                None => true,
                Some(Token::Text(text)) => {
                    let (tail, has_newline) = match text.rfind('\n') {
                        Some(pos) => (&text[pos + 1..], true),
                        None => (text.as_str(), false),
                    };
                    is_blank(tail) && (has_newline || i == 1)
                }
                Some(_) => false,
            };
            let ends_line = match tokens.get(i + 1) {
                None => true,
                Some(Token::Text(text)) => {
                    let (head, has_newline) = match text.find('\n') {
                        Some(pos) => (&text[..pos], true),
                        None => (text.as_str(), false),
                    };
                    is_blank(head) && (has_newline || i + 1 == last)
                }
                Some(_) => false,
            };
            starts_line && ends_line
        })
        .collect();

    for (i, is_standalone) in standalone.into_iter().enumerate() {
        if !is_standalone {
            continue;
        }
        if i > 0
            && let Token::Text(text) = &mut tokens[i - 1]
        {
            let keep = text.rfind('\n').map(|pos| pos + 1).unwrap_or(0);
            text.truncate(keep);
        }
        if let Some(Token::Text(text)) = tokens.get_mut(i + 1) {
            let drop = text.find('\n').map(|pos| pos + 1).unwrap_or(text.len());
            text.replace_range(..drop, "");
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c == ' ' || c == '\t' || c == '\r')
}

struct OpenBlock {
    helper: Helper,
    path: String,
    body: Vec<Node>,
    inverse: Option<Vec<Node>>,
}

fn parse(tokens: Vec<Token>) -> Result<Vec<Node>> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) if text.is_empty() => {}
            Token::Text(text) => insertion_point(&mut root, &mut stack).push(Node::Text(text)),
            Token::Var(path) => insertion_point(&mut root, &mut stack).push(Node::Var(path)),
            Token::Comment => {}
            Token::Open(helper, path) => stack.push(OpenBlock {
                helper,
                path,
                body: Vec::new(),
                inverse: None,
            }),
            Token::Else => match stack.last_mut() {
                Some(open) if open.inverse.is_none() => open.inverse = Some(Vec::new()),
                Some(open) => {
                    return Err(Error::template(format!(
                        "duplicate `{{{{else}}}}` in `{{{{#{} {}}}}}`",
                        open.helper.name(),
                        open.path
                    )));
                }
                None => return Err(Error::template("`{{else}}` outside of a block")),
            },
            Token::Close(name) => {
                let open = stack.pop().ok_or_else(|| {
                    Error::template(format!("`{{{{/{}}}}}` closes nothing", name))
                })?;
                if open.helper.name() != name {
                    return Err(Error::template(format!(
                        "`{{{{#{} {}}}}}` closed by `{{{{/{}}}}}`",
                        open.helper.name(),
                        open.path,
                        name
                    )));
                }
                let block = Block {
                    helper: open.helper,
                    path: open.path,
                    body: open.body,
                    inverse: open.inverse.unwrap_or_default(),
                };
                insertion_point(&mut root, &mut stack).push(Node::Block(block));
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(Error::template(format!(
            "unclosed block `{{{{#{} {}}}}}`",
            open.helper.name(),
            open.path
        )));
    }
    Ok(root)
}

fn insertion_point<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenBlock]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(open) => match &mut open.inverse {
            Some(inverse) => inverse,
            None => &mut open.body,
        },
        None => root,
    }
}

struct LoopFrame {
    index: usize,
    len: usize,
    key: Option<String>,
}

struct Scope<'a> {
    value: &'a Value,
    frame: Option<LoopFrame>,
}

fn render_nodes<'a>(nodes: &[Node], scopes: &mut Vec<Scope<'a>>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(path) => {
                if let Some(value) = resolve(path, scopes) {
                    out.push_str(&display(&value));
                }
            }
            Node::Block(block) => render_block(block, scopes, out),
        }
    }
}

fn render_block<'a>(block: &Block, scopes: &mut Vec<Scope<'a>>, out: &mut String) {
    let target = resolve(&block.path, scopes);

    match block.helper {
        Helper::If | Helper::Unless => {
            let truthy = is_truthy(target.as_deref());
            let take_body = truthy == (block.helper == Helper::If);
            let branch = if take_body { &block.body } else { &block.inverse };
            render_nodes(branch, scopes, out);
        }
        Helper::Each => match target {
            Some(Cow::Borrowed(Value::Array(items))) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    scopes.push(Scope {
                        value: item,
                        frame: Some(LoopFrame {
                            index,
                            len: items.len(),
                            key: None,
                        }),
                    });
                    render_nodes(&block.body, scopes, out);
                    scopes.pop();
                }
            }
            Some(Cow::Borrowed(Value::Object(map))) if !map.is_empty() => {
                for (index, (key, item)) in map.iter().enumerate() {
                    scopes.push(Scope {
                        value: item,
                        frame: Some(LoopFrame {
                            index,
                            len: map.len(),
                            key: Some(key.clone()),
                        }),
                    });
                    render_nodes(&block.body, scopes, out);
                    scopes.pop();
                }
            }
            _ => render_nodes(&block.inverse, scopes, out),
        },
    }
}

fn resolve<'a>(path: &str, scopes: &[Scope<'a>]) -> Option<Cow<'a, Value>> {
    let mut depth = scopes.len().checked_sub(1)?;
    let mut path = path;
    while let Some(rest) = path.strip_prefix("../") {
        depth = depth.saturating_sub(1);
        path = rest;
    }

    if let Some(name) = path.strip_prefix('@') {
        let frame = scopes[..=depth]
            .iter()
            .rev()
            .find_map(|scope| scope.frame.as_ref())?;
        return match name {
            "index" => Some(Cow::Owned(Value::from(frame.index))),
            "first" => Some(Cow::Owned(Value::Bool(frame.index == 0))),
            "last" => Some(Cow::Owned(Value::Bool(frame.index + 1 == frame.len))),
            "key" => frame.key.clone().map(|key| Cow::Owned(Value::String(key))),
            _ => None,
        };
    }

    let mut current = scopes[depth].value;
    if path == "this" || path == "." {
        return Some(Cow::Borrowed(current));
    }

    let path = path
        .strip_prefix("this.")
        .or_else(|| path.strip_prefix("this/"))
        .or_else(|| path.strip_prefix("./"))
        .unwrap_or(path);

    for segment in path.split(['.', '/']).filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(Cow::Borrowed(current))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
