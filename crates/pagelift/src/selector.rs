//! Selector subset evaluated through a [`PageAccessor`].
//!
//! Patterns and exporters describe descendants with selector strings such as
//! `.slick-slide img` or `ul > li a[href]`. Matching runs against whatever the
//! accessor reports, so the same selector works on a live page and on a
//! snapshot.
//!
//! Supported grammar: comma-separated lists of compound selectors joined by
//! descendant (whitespace) or child (`>`) combinators. A compound is an
//! optional tag name or `*` followed by any number of `.class`, `#id` and
//! attribute tests (`[a]`, `[a=v]`, `[a*=v]`, `[a^=v]`, `[a$=v]`, `[a~=v]`).

use std::collections::BTreeMap;
use std::fmt;

use crate::accessor::{AccessResult, PageAccessor};
use crate::types::{NodeId, PageliftError, PageliftResult};

/// Deepest descendant level a query will walk below its scope.
const MAX_QUERY_DEPTH: usize = 256;

// ── AST ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
    Includes(String),
}

#[derive(Debug, Clone, PartialEq)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

/// Tag and attributes of one node, as matching needs them.
#[derive(Debug, Clone)]
struct NodeInfo {
    tag: String,
    attrs: BTreeMap<String, String>,
}

impl NodeInfo {
    fn read(page: &dyn PageAccessor, node: NodeId) -> AccessResult<Self> {
        Ok(Self {
            tag: page.tag_name(node)?,
            attrs: page.attributes(node)?,
        })
    }
}

/// A node matched by [`select_with_ancestors`], with its ancestor chain
/// from the query scope (inclusive, outermost first) down to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorMatch {
    pub node: NodeId,
    pub ancestors: Vec<NodeId>,
}

// ── Parsing ──────────────────────────────────────────────────────────────────

impl Selector {
    pub fn parse(source: &str) -> PageliftResult<Self> {
        let invalid = |reason: &str| PageliftError::InvalidSelector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        let mut alternatives = Vec::new();
        for part in split_top_level(source, ',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty selector in list"));
            }
            alternatives.push(parse_complex(part).map_err(|r| invalid(&r))?);
        }
        if alternatives.is_empty() {
            return Err(invalid("empty selector"));
        }
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn matches_info(&self, subject: &NodeInfo, ancestors: &[NodeInfo]) -> bool {
        self.alternatives
            .iter()
            .any(|c| match_complex(c, subject, ancestors))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on `sep` outside of `[...]` and quotes.
fn split_top_level(source: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in source.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&source[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn parse_complex(source: &str) -> Result<Complex, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;

    loop {
        let mut saw_space = false;
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
            saw_space = true;
        }
        if pos >= chars.len() {
            break;
        }
        if chars[pos] == '>' {
            if compounds.is_empty() || pending == Some(Combinator::Child) {
                return Err("dangling '>' combinator".into());
            }
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }
        if !compounds.is_empty() {
            let combinator = match pending.take() {
                Some(c) => c,
                None if saw_space => Combinator::Descendant,
                None => return Err(format!("unexpected character '{}'", chars[pos])),
            };
            combinators.push(combinator);
        }
        let compound = parse_compound(&chars, &mut pos)?;
        compounds.push(compound);
    }

    if compounds.is_empty() {
        return Err("empty selector".into());
    }
    if pending.is_some() {
        return Err("selector ends with a combinator".into());
    }
    Ok(Complex {
        compounds,
        combinators,
    })
}

fn parse_compound(chars: &[char], pos: &mut usize) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let start = *pos;

    if *pos < chars.len() && chars[*pos] == '*' {
        *pos += 1;
    } else if *pos < chars.len() && is_ident_char(chars[*pos]) {
        compound.tag = Some(read_ident(chars, pos).to_ascii_lowercase());
    }

    while *pos < chars.len() {
        match chars[*pos] {
            '.' => {
                *pos += 1;
                let class = read_ident(chars, pos);
                if class.is_empty() {
                    return Err("'.' without class name".into());
                }
                compound.classes.push(class);
            }
            '#' => {
                *pos += 1;
                let id = read_ident(chars, pos);
                if id.is_empty() {
                    return Err("'#' without id".into());
                }
                compound.ids.push(id);
            }
            '[' => {
                *pos += 1;
                compound.attrs.push(parse_attr(chars, pos)?);
            }
            c if c.is_whitespace() || c == '>' => break,
            c => return Err(format!("unexpected character '{c}'")),
        }
    }

    if *pos == start {
        return Err("expected a compound selector".into());
    }
    Ok(compound)
}

fn parse_attr(chars: &[char], pos: &mut usize) -> Result<AttrTest, String> {
    skip_ws(chars, pos);
    let name = read_ident(chars, pos).to_ascii_lowercase();
    if name.is_empty() {
        return Err("attribute test without a name".into());
    }
    skip_ws(chars, pos);

    let op_kind = match chars.get(*pos) {
        Some(']') => {
            *pos += 1;
            return Ok(AttrTest {
                name,
                op: AttrOp::Exists,
            });
        }
        Some('=') => {
            *pos += 1;
            '='
        }
        Some(&c @ ('*' | '^' | '$' | '~')) if chars.get(*pos + 1) == Some(&'=') => {
            *pos += 2;
            c
        }
        _ => return Err(format!("malformed attribute test for '{name}'")),
    };

    skip_ws(chars, pos);
    let value = match chars.get(*pos) {
        Some(&q @ ('"' | '\'')) => {
            *pos += 1;
            let begin = *pos;
            while *pos < chars.len() && chars[*pos] != q {
                *pos += 1;
            }
            if *pos >= chars.len() {
                return Err("unterminated quoted attribute value".into());
            }
            let v: String = chars[begin..*pos].iter().collect();
            *pos += 1;
            v
        }
        _ => read_ident(chars, pos),
    };
    skip_ws(chars, pos);
    if chars.get(*pos) != Some(&']') {
        return Err(format!("missing ']' after attribute '{name}'"));
    }
    *pos += 1;

    let op = match op_kind {
        '=' => AttrOp::Equals(value),
        '*' => AttrOp::Contains(value),
        '^' => AttrOp::Prefix(value),
        '$' => AttrOp::Suffix(value),
        _ => AttrOp::Includes(value),
    };
    Ok(AttrTest { name, op })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let begin = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[begin..*pos].iter().collect()
}

fn skip_ws(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

// ── Matching ─────────────────────────────────────────────────────────────────

impl Compound {
    fn matches(&self, info: &NodeInfo) -> bool {
        if let Some(tag) = &self.tag {
            if !info.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        let id = info.attrs.get("id").map(|s| s.as_str()).unwrap_or("");
        if self.ids.iter().any(|want| want != id) {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = info.attrs.get("class").map(|s| s.as_str()).unwrap_or("");
            let present: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|test| {
            let Some(value) = info.attrs.get(&test.name) else {
                return false;
            };
            match &test.op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => value == v,
                AttrOp::Contains(v) => value.contains(v.as_str()),
                AttrOp::Prefix(v) => value.starts_with(v.as_str()),
                AttrOp::Suffix(v) => value.ends_with(v.as_str()),
                AttrOp::Includes(v) => value.split_whitespace().any(|w| w == v),
            }
        })
    }
}

fn match_complex(complex: &Complex, subject: &NodeInfo, ancestors: &[NodeInfo]) -> bool {
    let last = complex.compounds.len() - 1;
    complex.compounds[last].matches(subject) && match_ancestors(complex, last, ancestors)
}

/// `compounds[idx]` is already matched; match the rest against `ancestors`
/// (outermost first).
fn match_ancestors(complex: &Complex, idx: usize, ancestors: &[NodeInfo]) -> bool {
    if idx == 0 {
        return true;
    }
    let target = &complex.compounds[idx - 1];
    match complex.combinators[idx - 1] {
        Combinator::Child => match ancestors.split_last() {
            Some((parent, rest)) => {
                target.matches(parent) && match_ancestors(complex, idx - 1, rest)
            }
            None => false,
        },
        Combinator::Descendant => (0..ancestors.len()).rev().any(|i| {
            target.matches(&ancestors[i]) && match_ancestors(complex, idx - 1, &ancestors[..i])
        }),
    }
}

// ── Queries ──────────────────────────────────────────────────────────────────

/// Does `node` itself match? Combinators can only see `node`, so only the
/// rightmost compound of each alternative is meaningful here.
pub fn matches(page: &dyn PageAccessor, node: NodeId, selector: &Selector) -> AccessResult<bool> {
    let info = NodeInfo::read(page, node)?;
    Ok(selector.matches_info(&info, &[]))
}

/// All descendants of `scope` (exclusive) matching `selector`, in document
/// order. `scope` itself counts as an ancestor for combinators.
pub fn select_all(
    page: &dyn PageAccessor,
    scope: NodeId,
    selector: &Selector,
) -> AccessResult<Vec<NodeId>> {
    Ok(select_with_ancestors(page, scope, selector)?
        .into_iter()
        .map(|m| m.node)
        .collect())
}

/// First matching descendant of `scope` in document order.
pub fn select_first(
    page: &dyn PageAccessor,
    scope: NodeId,
    selector: &Selector,
) -> AccessResult<Option<NodeId>> {
    let mut found = None;
    walk(page, scope, selector, &mut |m| {
        found = Some(m.node);
        false
    })?;
    Ok(found)
}

/// Does any descendant of `scope` match?
pub fn has_match(page: &dyn PageAccessor, scope: NodeId, selector: &Selector) -> AccessResult<bool> {
    Ok(select_first(page, scope, selector)?.is_some())
}

/// Like [`select_all`], keeping each match's ancestor chain.
pub fn select_with_ancestors(
    page: &dyn PageAccessor,
    scope: NodeId,
    selector: &Selector,
) -> AccessResult<Vec<SelectorMatch>> {
    let mut out = Vec::new();
    walk(page, scope, selector, &mut |m| {
        out.push(m);
        true
    })?;
    Ok(out)
}

/// Count direct children of `node`, optionally only those matching.
pub fn count_children(
    page: &dyn PageAccessor,
    node: NodeId,
    selector: Option<&Selector>,
) -> AccessResult<usize> {
    let children = page.children(node)?;
    let Some(selector) = selector else {
        return Ok(children.len());
    };
    let parent = NodeInfo::read(page, node)?;
    let mut count = 0;
    for child in children {
        let info = NodeInfo::read(page, child)?;
        if selector.matches_info(&info, std::slice::from_ref(&parent)) {
            count += 1;
        }
    }
    Ok(count)
}

/// Depth-first walk below `scope`; `visit` returns `false` to stop early.
fn walk(
    page: &dyn PageAccessor,
    scope: NodeId,
    selector: &Selector,
    visit: &mut dyn FnMut(SelectorMatch) -> bool,
) -> AccessResult<()> {
    let mut infos = vec![NodeInfo::read(page, scope)?];
    let mut ids = vec![scope];
    walk_inner(page, scope, selector, &mut infos, &mut ids, visit)?;
    Ok(())
}

fn walk_inner(
    page: &dyn PageAccessor,
    node: NodeId,
    selector: &Selector,
    infos: &mut Vec<NodeInfo>,
    ids: &mut Vec<NodeId>,
    visit: &mut dyn FnMut(SelectorMatch) -> bool,
) -> AccessResult<bool> {
    // `true` means keep walking: a subtree past the ceiling yields no
    // matches, and its siblings are still visited.
    if ids.len() > MAX_QUERY_DEPTH {
        return Ok(true);
    }
    for child in page.children(node)? {
        let info = NodeInfo::read(page, child)?;
        if selector.matches_info(&info, infos) {
            let keep_going = visit(SelectorMatch {
                node: child,
                ancestors: ids.clone(),
            });
            if !keep_going {
                return Ok(false);
            }
        }
        infos.push(info);
        ids.push(child);
        let keep_going = walk_inner(page, child, selector, infos, ids, visit)?;
        infos.pop();
        ids.pop();
        if !keep_going {
            return Ok(false);
        }
    }
    Ok(true)
}

// ── Selector suggestion ──────────────────────────────────────────────────────

/// Suggest a selector that identifies `target` below `root`.
///
/// Uses `#id` when the target (or its closest ancestor) has one, otherwise a
/// `>`-joined chain of `tag.class` steps from the root's children down. Returns
/// `None` when `target` is not inside `root`.
pub fn suggest_selector(
    page: &dyn PageAccessor,
    root: NodeId,
    target: NodeId,
) -> AccessResult<Option<String>> {
    let Some(path) = path_to(page, root, target, 0)? else {
        return Ok(None);
    };

    let mut steps: Vec<String> = Vec::new();
    for node in path.iter().rev() {
        let attrs = page.attributes(*node)?;
        if let Some(id) = attrs.get("id").filter(|id| is_plain_ident(id)) {
            steps.push(format!("#{id}"));
            break;
        }
        let mut step = page.tag_name(*node)?;
        if let Some(class) = attrs.get("class") {
            for c in class.split_whitespace().filter(|c| is_plain_ident(c)).take(2) {
                step.push('.');
                step.push_str(c);
            }
        }
        steps.push(step);
    }
    steps.reverse();
    Ok(Some(steps.join(" > ")))
}

fn is_plain_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char) && !s.starts_with(|c: char| c.is_ascii_digit())
}

/// Path from `root` (exclusive) to `target` (inclusive).
fn path_to(
    page: &dyn PageAccessor,
    node: NodeId,
    target: NodeId,
    depth: usize,
) -> AccessResult<Option<Vec<NodeId>>> {
    if depth > MAX_QUERY_DEPTH {
        return Ok(None);
    }
    for child in page.children(node)? {
        if child == target {
            return Ok(Some(vec![child]));
        }
        if let Some(mut rest) = path_to(page, child, target, depth + 1)? {
            rest.insert(0, child);
            return Ok(Some(rest));
        }
    }
    Ok(None)
}
