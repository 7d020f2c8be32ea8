
use solver::Set;

/// A temporal formula over named atomic propositions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    True,
    False,
    Prop(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Next(Box<Formula>),
    Finally(Box<Formula>),
    Globally(Box<Formula>),
    Until(Box<Formula>, Box<Formula>),
    Release(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn prop(name: impl Into<String>) -> Self {
        Formula::Prop(name.into())
    }
}

/// A formula in the textual syntax of the synthesis tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// `propositions[i]` is the proposition renamed to `ap{i}`.
    pub propositions: Vec<String>,
}

/// Renders `formula` fully parenthesized, renaming propositions to
/// `ap0, ap1, ...` in order of first occurrence.
pub fn render(formula: &Formula) -> Rendered {
    let mut propositions = Set::default();
    let mut text = String::new();
    write_formula(formula, &mut propositions, &mut text);
    Rendered { text, propositions: propositions.into_iter().collect() }
}

fn write_formula(formula: &Formula, props: &mut Set<String>, out: &mut String) {
    let binary = |op: &str, l: &Formula, r: &Formula, props: &mut Set<String>, out: &mut String| {
        out.push('(');
        write_formula(l, props, out);
        out.push(' ');
        out.push_str(op);
        out.push(' ');
        write_formula(r, props, out);
        out.push(')');
    };
    let unary = |op: &str, f: &Formula, props: &mut Set<String>, out: &mut String| {
        out.push('(');
        out.push_str(op);
        write_formula(f, props, out);
        out.push(')');
    };

    match formula {
        Formula::True => out.push_str("true"),
        Formula::False => out.push_str("false"),
        Formula::Prop(name) => {
            let (index, _) = props.insert_full(name.clone());
            out.push_str(&format!("ap{index}"));
        }
        Formula::Not(f) => unary("!", f, props, out),
        Formula::Next(f) => unary("X ", f, props, out),
        Formula::Finally(f) => unary("F ", f, props, out),
        Formula::Globally(f) => unary("G ", f, props, out),
        Formula::And(l, r) => binary("&", l, r, props, out),
        Formula::Or(l, r) => binary("|", l, r, props, out),
        Formula::Iff(l, r) => binary("<=>", l, r, props, out),
        Formula::Implies(l, r) => binary("=>", l, r, props, out),
        Formula::Until(l, r) => binary("U", l, r, props, out),
        Formula::Release(l, r) => binary("R", l, r, props, out),
    }
}
