use std::fmt;

use serde::Serialize;

use crate::sexp::{self, SExpr};

/// A model (counterexample) from the solver.
///
/// Values are kept as the raw SMT-LIB text the solver printed and decoded on
/// demand with [`Model::value`]. Non-nullary definitions (`k!0` helpers that
/// Z3 uses for `as-array` values) are kept alongside so array values can be
/// resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    /// Constant assignments: `(name, value_text)` pairs in solver order.
    pub assignments: Vec<(String, String)>,
    /// Function definitions with parameters.
    pub functions: Vec<FunctionDef>,
}

/// `(define-fun name ((p S) ...) S body)` with at least one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
}

/// A decoded model value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ModelValue {
    Int(i128),
    Bool(bool),
    Array(ArrayValue),
    /// Anything not representable above, as raw SMT-LIB text.
    Other(String),
}

/// A finite description of an `(Array Int Int)` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArrayValue {
    /// Explicit `index -> value` entries, sorted by index, no duplicates.
    pub entries: Vec<(i128, i128)>,
    /// Value at every other index, when the solver fixed one.
    pub default: Option<i128>,
}

impl ArrayValue {
    pub fn constant(default: i128) -> Self {
        Self {
            entries: Vec::new(),
            default: Some(default),
        }
    }

    /// Value stored at `index`, if the model determines it.
    pub fn get(&self, index: i128) -> Option<i128> {
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, v)| *v)
            .or(self.default)
    }

    /// Set `index` to `value`, replacing any earlier entry.
    pub fn set(&mut self, index: i128, value: i128) {
        match self.entries.binary_search_by_key(&index, |(i, _)| *i) {
            Ok(pos) => self.entries[pos].1 = value,
            Err(pos) => self.entries.insert(pos, (index, value)),
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model from `(name, value_text)` pairs.
    pub fn with_assignments(assignments: Vec<(String, String)>) -> Self {
        Self {
            assignments,
            functions: Vec::new(),
        }
    }

    pub fn with_functions(mut self, functions: Vec<FunctionDef>) -> Self {
        self.functions = functions;
        self
    }

    /// Raw value text of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Names of all assigned constants, in solver order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Decoded value of `name`.
    pub fn value(&self, name: &str) -> Option<ModelValue> {
        let raw = self.get(name)?;
        let Ok(expr) = sexp::parse_one(raw) else {
            return Some(ModelValue::Other(raw.to_string()));
        };
        Some(self.decode(&expr).unwrap_or_else(|| ModelValue::Other(raw.to_string())))
    }

    /// Integer value of `name`, if it has one.
    pub fn int(&self, name: &str) -> Option<i128> {
        match self.value(name)? {
            ModelValue::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Array value of `name`, if it has one.
    pub fn array(&self, name: &str) -> Option<ArrayValue> {
        match self.value(name)? {
            ModelValue::Array(a) => Some(a),
            _ => None,
        }
    }

    fn decode(&self, expr: &SExpr) -> Option<ModelValue> {
        if let Some(n) = decode_int(expr) {
            return Some(ModelValue::Int(n));
        }
        match expr.as_atom() {
            Some("true") => return Some(ModelValue::Bool(true)),
            Some("false") => return Some(ModelValue::Bool(false)),
            _ => {}
        }
        self.decode_array(expr).map(ModelValue::Array)
    }

    fn decode_array(&self, expr: &SExpr) -> Option<ArrayValue> {
        let items = expr.as_list()?;
        // ((as const (Array Int Int)) v)
        if let [head, value] = items {
            if head.is_call("as") {
                let head_items = head.as_list()?;
                if head_items.get(1).and_then(SExpr::as_atom) == Some("const") {
                    return Some(ArrayValue::constant(decode_int(value)?));
                }
            }
        }
        // (store base i v)
        if expr.is_call("store") {
            let [_, base, index, value] = items else {
                return None;
            };
            let mut array = self.decode_array(base)?;
            array.set(decode_int(index)?, decode_int(value)?);
            return Some(array);
        }
        // (_ as-array f)
        if expr.is_call("_") && items.get(1).and_then(SExpr::as_atom) == Some("as-array") {
            let fname = items.get(2)?.as_atom()?;
            let def = self.functions.iter().find(|d| d.name == fname)?;
            let [param] = def.params.as_slice() else {
                return None;
            };
            let body = sexp::parse_one(&def.body).ok()?;
            return decode_ite_chain(param, &body);
        }
        // (lambda ((x Int)) body)
        if expr.is_call("lambda") {
            let [_, params, body] = items else {
                return None;
            };
            let [binding] = params.as_list()? else {
                return None;
            };
            let param = binding.as_list()?.first()?.as_atom()?;
            return decode_ite_chain(param, body);
        }
        None
    }
}

fn decode_int(expr: &SExpr) -> Option<i128> {
    match expr {
        SExpr::Atom(a) => a.parse().ok(),
        SExpr::List(items) => match items.as_slice() {
            [op, inner] if op.as_atom() == Some("-") => decode_int(inner)?.checked_neg(),
            _ => None,
        },
    }
}

/// Decode `(ite (= p k1) v1 (ite (= p k2) v2 ... d))` into entries plus
/// default.
fn decode_ite_chain(param: &str, body: &SExpr) -> Option<ArrayValue> {
    let mut array = ArrayValue::default();
    let mut current = body;
    // Earlier branches shadow later ones.
    let mut seen = Vec::new();
    loop {
        if let Some(n) = decode_int(current) {
            array.default = Some(n);
            break;
        }
        let items = current.as_list()?;
        if !current.is_call("ite") || items.len() != 4 {
            return None;
        }
        let index = decode_index_test(param, &items[1])?;
        let value = decode_int(&items[2])?;
        if !seen.contains(&index) {
            seen.push(index);
            array.set(index, value);
        }
        current = &items[3];
    }
    Some(array)
}

/// `(= p k)`, `(= k p)`, or `(and (= p k))` as produced by Z3.
fn decode_index_test(param: &str, cond: &SExpr) -> Option<i128> {
    let items = cond.as_list()?;
    if cond.is_call("and") && items.len() == 2 {
        return decode_index_test(param, &items[1]);
    }
    if !cond.is_call("=") || items.len() != 3 {
        return None;
    }
    match (&items[1], &items[2]) {
        (SExpr::Atom(p), k) | (k, SExpr::Atom(p)) if p == param => decode_int(k),
        _ => None,
    }
}

impl fmt::Display for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelValue::Int(n) => write!(f, "{n}"),
            ModelValue::Bool(b) => write!(f, "{b}"),
            ModelValue::Array(a) => write!(f, "{a}"),
            ModelValue::Other(raw) => write!(f, "{raw}"),
        }
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (index, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}: {value}")?;
        }
        if let Some(default) = self.default {
            if !self.entries.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "_: {default}")?;
        }
        write!(f, "]")
    }
}
