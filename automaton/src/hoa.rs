//! Reader for the Hanoi Omega-Automata text format.

use std::fmt;

use bitvec::slice::BitSlice;
use chumsky::error::Simple;
use chumsky::primitive::{choice, end, filter, just};
use chumsky::recursive::recursive;
use chumsky::text::{self, TextParser};
use chumsky::Parser;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HoaError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("missing `{0}` header item")]
    MissingItem(&'static str),
    #[error("the producer aborted the automaton")]
    Aborted,
    #[error("unexpected end of input, expected `--END--`")]
    UnexpectedEnd,
}

/// Boolean combination of atomic propositions, referenced by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Guard {
    True,
    False,
    Ap(usize),
    Not(Box<Guard>),
    And(Vec<Guard>),
    Or(Vec<Guard>),
}

impl Guard {
    pub fn eval(&self, valuation: &BitSlice) -> bool {
        match self {
            Guard::True => true,
            Guard::False => false,
            Guard::Ap(ap) => valuation.get(*ap).is_some_and(|bit| *bit),
            Guard::Not(inner) => !inner.eval(valuation),
            Guard::And(guards) => guards.iter().all(|g| g.eval(valuation)),
            Guard::Or(guards) => guards.iter().any(|g| g.eval(valuation)),
        }
    }

    fn max_ap(&self) -> Option<usize> {
        match self {
            Guard::True | Guard::False => None,
            Guard::Ap(ap) => Some(*ap),
            Guard::Not(inner) => inner.max_ap(),
            Guard::And(guards) | Guard::Or(guards) => guards.iter().filter_map(Guard::max_ap).max(),
        }
    }
}

/// Acceptance condition over numbered acceptance sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Acceptance {
    True,
    False,
    Inf(u32),
    Fin(u32),
    And(Vec<Acceptance>),
    Or(Vec<Acceptance>),
}

impl Acceptance {
    /// Whether a run visiting exactly the sets in `inf` infinitely often is accepted.
    pub fn accepts(&self, inf: &impl Fn(u32) -> bool) -> bool {
        match self {
            Acceptance::True => true,
            Acceptance::False => false,
            Acceptance::Inf(set) => inf(*set),
            Acceptance::Fin(set) => !inf(*set),
            Acceptance::And(conds) => conds.iter().all(|c| c.accepts(inf)),
            Acceptance::Or(conds) => conds.iter().any(|c| c.accepts(inf)),
        }
    }

    fn max_set(&self) -> Option<u32> {
        match self {
            Acceptance::True | Acceptance::False => None,
            Acceptance::Inf(set) | Acceptance::Fin(set) => Some(*set),
            Acceptance::And(conds) | Acceptance::Or(conds) => {
                conds.iter().filter_map(Acceptance::max_set).max()
            }
        }
    }
}

impl fmt::Display for Acceptance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, conds: &[Acceptance], op| {
            f.write_str("(")?;
            for (i, cond) in conds.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{cond}")?;
            }
            f.write_str(")")
        };
        match self {
            Acceptance::True => f.write_str("t"),
            Acceptance::False => f.write_str("f"),
            Acceptance::Inf(set) => write!(f, "Inf({set})"),
            Acceptance::Fin(set) => write!(f, "Fin({set})"),
            Acceptance::And(conds) => join(f, conds, '&'),
            Acceptance::Or(conds) => join(f, conds, '|'),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hoa {
    pub name: Option<String>,
    pub state_count: usize,
    pub start: Vec<usize>,
    pub aps: Vec<String>,
    /// `acc-name` split into its words, e.g. `["parity", "min", "even", "3"]`.
    pub acc_name: Vec<String>,
    pub acceptance_sets: u32,
    pub acceptance: Acceptance,
    pub properties: Vec<String>,
    /// Header items without a dedicated field, kept verbatim.
    pub other: Vec<(String, String)>,
    pub states: Vec<HoaState>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HoaState {
    pub id: usize,
    pub name: Option<String>,
    /// Acceptance sets of a state-based acceptance condition.
    pub marks: Vec<u32>,
    pub edges: Vec<HoaEdge>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HoaEdge {
    pub guard: Guard,
    pub target: usize,
    pub marks: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Int(usize),
    Str(String),
    Ident(String),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Int(n) => n.to_string(),
            Token::Str(s) | Token::Ident(s) => s.clone(),
        }
    }
}

fn int() -> impl Parser<char, usize, Error = Simple<char>> + Clone {
    text::int(10).try_map(|n: String, span| {
        n.parse::<usize>().map_err(|e| Simple::custom(span, e.to_string()))
    })
}

fn tokens_parser() -> impl Parser<char, Vec<Token>, Error = Simple<char>> {
    let escape = just('\\').ignore_then(filter(|_: &char| true));
    let string = escape
        .or(filter(|c: &char| *c != '"' && *c != '\\'))
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .map(Token::Str);
    let ident = filter(|c: &char| c.is_alphanumeric() || matches!(c, '_' | '-' | '@' | '.'))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(|s| match s.parse() {
            Ok(n) => Token::Int(n),
            Err(_) => Token::Ident(s),
        });
    choice((string, ident)).padded().repeated().then_ignore(end())
}

fn flatten<T>(mut items: Vec<T>, combine: fn(Vec<T>) -> T) -> T {
    match items.len() {
        1 => items.remove(0),
        _ => combine(items),
    }
}

// label-expr ::= 't' | 'f' | INT | '!' label-expr | '(' label-expr ')'
//              | label-expr '&' label-expr | label-expr '|' label-expr
fn guard_parser() -> impl Parser<char, Guard, Error = Simple<char>> {
    recursive(|guard| {
        let atom = choice((
            just('t').to(Guard::True),
            just('f').to(Guard::False),
            int().map(Guard::Ap),
            guard.delimited_by(just('('), just(')')),
        ))
        .padded();
        let not = just('!')
            .padded()
            .repeated()
            .then(atom)
            .foldr(|_, g| Guard::Not(Box::new(g)))
            .boxed();
        let and = not.separated_by(just('&').padded()).at_least(1).map(|g| flatten(g, Guard::And));
        and.separated_by(just('|').padded()).at_least(1).map(|g| flatten(g, Guard::Or))
    })
    .then_ignore(end())
}

// acceptance-cond ::= 't' | 'f' | 'Inf' '(' INT ')' | 'Fin' '(' INT ')' | '(' acceptance-cond ')'
//                   | acceptance-cond '&' acceptance-cond | acceptance-cond '|' acceptance-cond
fn acceptance_parser() -> impl Parser<char, (u32, Acceptance), Error = Simple<char>> {
    let set = || {
        int()
            .try_map(|n, span| u32::try_from(n).map_err(|e| Simple::custom(span, e.to_string())))
            .padded()
            .delimited_by(just('('), just(')'))
    };
    let cond = recursive(|cond| {
        let atom = choice((
            text::keyword("Inf").ignore_then(set()).map(Acceptance::Inf),
            text::keyword("Fin").ignore_then(set()).map(Acceptance::Fin),
            just('t').to(Acceptance::True),
            just('f').to(Acceptance::False),
            cond.delimited_by(just('('), just(')')),
        ))
        .padded()
        .boxed();
        let and =
            atom.separated_by(just('&').padded()).at_least(1).map(|c| flatten(c, Acceptance::And));
        and.separated_by(just('|').padded()).at_least(1).map(|c| flatten(c, Acceptance::Or))
    });
    let count = int()
        .try_map(|n, span| u32::try_from(n).map_err(|e| Simple::custom(span, e.to_string())))
        .padded();
    count.then(cond).then_ignore(end())
}

fn first_error(errors: Vec<Simple<char>>) -> String {
    match errors.into_iter().next() {
        Some(error) => error.to_string(),
        None => "invalid syntax".to_string(),
    }
}

/// Position of the first `{` outside of a quoted state name.
fn unquoted_brace(s: &str) -> Option<usize> {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            '{' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

/// Splits `{0 1}` off the end of `s`.
fn split_marks(s: &str, line: usize) -> Result<(&str, Vec<u32>), HoaError> {
    let syntax = |message: String| HoaError::Syntax { line, message };
    let Some(open) = unquoted_brace(s) else { return Ok((s.trim(), Vec::new())) };
    let (rest, marks) = (&s[..open], &s[open + 1..]);
    let marks = marks.trim_end().strip_suffix('}').ok_or_else(|| syntax("expected '}'".into()))?;
    let mut marks = marks
        .split_whitespace()
        .map(|m| m.parse().map_err(|_| syntax(format!("invalid acceptance set `{m}`"))))
        .collect::<Result<Vec<u32>, _>>()?;
    marks.sort_unstable();
    marks.dedup();
    Ok((rest.trim(), marks))
}

/// Parses a single automaton in HOA format. Only explicit edge labels, single
/// (non-alternating) targets and aliases-free guards are supported.
pub fn parse_hoa(source: &str) -> Result<Hoa, HoaError> {
    let mut lines = source.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));
    let tokens = tokens_parser();

    let mut name = None;
    let mut state_count = None;
    let mut start = Vec::new();
    let mut aps = None;
    let mut acc_name = Vec::new();
    let mut acceptance = None;
    let mut properties = Vec::new();
    let mut other = Vec::new();

    let mut seen_version = false;
    loop {
        let Some((line, text)) = lines.next() else { return Err(HoaError::UnexpectedEnd) };
        let syntax = |message: String| HoaError::Syntax { line, message };
        if text.is_empty() {
            continue;
        }
        if text == "--BODY--" {
            break;
        }
        if text == "--ABORT--" {
            return Err(HoaError::Aborted);
        }

        let (key, value) =
            text.split_once(':').ok_or_else(|| syntax("expected a header item".into()))?;
        let value = value.trim();
        if !seen_version {
            if key != "HOA" {
                return Err(syntax("expected `HOA:`".into()));
            }
            seen_version = true;
            continue;
        }

        if key == "Acceptance" {
            let parsed = acceptance_parser().parse(value).map_err(|e| syntax(first_error(e)))?;
            acceptance = Some(parsed);
            continue;
        }

        let values = tokens.parse(value).map_err(|e| syntax(first_error(e)))?;
        let ints = || {
            values
                .iter()
                .map(|t| match t {
                    Token::Int(n) => Ok(*n),
                    _ => Err(syntax(format!("expected a number in `{key}`"))),
                })
                .collect::<Result<Vec<_>, _>>()
        };
        match key {
            "name" => match values.as_slice() {
                [Token::Str(s)] => name = Some(s.clone()),
                _ => return Err(syntax("expected a quoted name".into())),
            },
            "States" => match ints()?.as_slice() {
                [n] => state_count = Some(*n),
                _ => return Err(syntax("expected the number of states".into())),
            },
            "Start" => {
                if value.contains('&') {
                    return Err(syntax("alternating initial states are not supported".into()));
                }
                start.extend(ints()?);
            }
            "AP" => {
                let (count, names) = match values.split_first() {
                    Some((Token::Int(count), names)) => (*count, names),
                    _ => return Err(syntax("expected the number of propositions".into())),
                };
                let names = names
                    .iter()
                    .map(|t| match t {
                        Token::Str(s) => Ok(s.clone()),
                        _ => Err(syntax("expected a quoted proposition".into())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if names.len() != count {
                    return Err(syntax(format!("expected {count} propositions")));
                }
                aps = Some(names);
            }
            "acc-name" => acc_name = values.iter().map(Token::text).collect(),
            "properties" => properties.extend(values.iter().map(Token::text)),
            "Alias" => return Err(syntax("aliases are not supported".into())),
            _ => other.push((key.to_string(), value.to_string())),
        }
    }

    let (acceptance_sets, acceptance) = acceptance.ok_or(HoaError::MissingItem("Acceptance"))?;
    let aps = aps.unwrap_or_default();

    let mut states: Vec<HoaState> = Vec::new();
    loop {
        let Some((line, text)) = lines.next() else { return Err(HoaError::UnexpectedEnd) };
        let syntax = |message: String| HoaError::Syntax { line, message };
        if text.is_empty() {
            continue;
        }
        if text == "--END--" {
            break;
        }
        if text == "--ABORT--" {
            return Err(HoaError::Aborted);
        }

        if let Some(rest) = text.strip_prefix("State:") {
            let (rest, marks) = split_marks(rest, line)?;
            if rest.starts_with('[') {
                return Err(syntax("state labels are not supported".into()));
            }
            let values = tokens.parse(rest).map_err(|e| syntax(first_error(e)))?;
            let (id, name) = match values.as_slice() {
                [Token::Int(id)] => (*id, None),
                [Token::Int(id), Token::Str(name)] => (*id, Some(name.clone())),
                _ => return Err(syntax("expected a state number".into())),
            };
            states.push(HoaState { id, name, marks, edges: Vec::new() });
            continue;
        }

        let state = states.last_mut().ok_or_else(|| syntax("edge outside of a state".into()))?;
        let rest = text
            .strip_prefix('[')
            .ok_or_else(|| syntax("implicit edge labels are not supported".into()))?;
        let (guard, rest) =
            rest.split_once(']').ok_or_else(|| syntax("expected ']'".into()))?;
        let guard = guard_parser().parse(guard).map_err(|e| syntax(first_error(e)))?;
        let (target, marks) = split_marks(rest, line)?;
        if target.contains('&') {
            return Err(syntax("alternating edges are not supported".into()));
        }
        let target = target.parse().map_err(|_| syntax(format!("invalid target `{target}`")))?;
        if let Some(ap) = guard.max_ap().filter(|&ap| ap >= aps.len()) {
            return Err(syntax(format!("proposition {ap} is not declared")));
        }
        state.edges.push(HoaEdge { guard, target, marks });
    }

    let state_count = state_count.unwrap_or_else(|| {
        let ids = states.iter().map(|s| s.id);
        let targets = states.iter().flat_map(|s| s.edges.iter().map(|e| e.target));
        ids.chain(targets).chain(start.iter().copied()).max().map_or(0, |max| max + 1)
    });
    let in_range = |id: usize| id < state_count;
    let mut ids = states.iter().map(|s| s.id).chain(start.iter().copied());
    if let Some(id) = ids.find(|&id| !in_range(id)) {
        return Err(HoaError::Syntax { line: 0, message: format!("state {id} is out of range") });
    }
    let mut targets = states.iter().flat_map(|s| s.edges.iter().map(|e| e.target));
    if let Some(id) = targets.find(|&id| !in_range(id)) {
        return Err(HoaError::Syntax { line: 0, message: format!("state {id} is out of range") });
    }
    let marks = states
        .iter()
        .flat_map(|s| s.marks.iter().chain(s.edges.iter().flat_map(|e| &e.marks)));
    let mut sets = marks.copied().chain(acceptance.max_set());
    if let Some(set) = sets.find(|&set| set >= acceptance_sets) {
        return Err(HoaError::Syntax {
            line: 0,
            message: format!("acceptance set {set} is out of range"),
        });
    }

    Ok(Hoa {
        name,
        state_count,
        start,
        aps,
        acc_name,
        acceptance_sets,
        acceptance,
        properties,
        other,
        states,
    })
}
