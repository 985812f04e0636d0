use crate::error::SolverError;
use crate::model::{FunctionDef, Model};
use crate::result::SolverResult;
use crate::sexp::{self, SExpr};

/// Parse the solver's stdout into a `SolverResult`.
///
/// Expected output: a status atom (`sat`, `unsat`, `unknown`), then for
/// `sat` the `(get-model)` response. Z3 prints the model either as a bare
/// list of `define-fun`s or wrapped in `(model ...)`; both are accepted.
/// `(error ...)` forms after `unsat`/`unknown` (e.g. "model is not
/// available") are ignored; before the status they are fatal.
pub fn parse_solver_output(stdout: &str, stderr: &str) -> Result<SolverResult, SolverError> {
    if stdout.trim().is_empty() {
        if stderr.contains("timeout") {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }
        return Err(SolverError::ParseError(format!(
            "Empty solver output. stderr: {}",
            stderr.trim()
        )));
    }

    let exprs = sexp::parse_all(stdout)?;
    let mut rest = exprs.iter();

    let status = loop {
        match rest.next() {
            Some(SExpr::Atom(status)) => break status.as_str(),
            Some(err) if err.is_call("error") => {
                return Err(SolverError::ProcessError(error_message(err)));
            }
            // `success` lists and other chatter before the status.
            Some(_) => continue,
            None => {
                return Err(SolverError::ParseError(format!(
                    "No status in solver output: {}",
                    stdout.trim()
                )));
            }
        }
    };

    match status {
        "unsat" => Ok(SolverResult::Unsat),
        "sat" => {
            let model = rest
                .find(|e| !e.is_call("error") && e.as_list().is_some())
                .map(parse_model)
                .transpose()?;
            Ok(SolverResult::Sat(model.filter(|m| !m.is_empty() || !m.functions.is_empty())))
        }
        "unknown" => Ok(SolverResult::Unknown(unknown_reason(rest.as_slice(), stderr))),
        "timeout" => Ok(SolverResult::Unknown("timeout".to_string())),
        other => Err(SolverError::ParseError(format!(
            "Unexpected solver output: {other}"
        ))),
    }
}

fn error_message(err: &SExpr) -> String {
    err.as_list()
        .and_then(|items| items.get(1))
        .and_then(SExpr::as_atom)
        .map(|msg| msg.trim_matches('"').to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Reason for an `unknown` answer.
///
/// Uses a `(:reason-unknown ...)` response or a parenthesized reason such as
/// `(timeout)` when present, then stderr, then the plain word `unknown`.
fn unknown_reason(rest: &[SExpr], stderr: &str) -> String {
    for expr in rest {
        let Some(items) = expr.as_list() else {
            continue;
        };
        match items {
            [key, value] if key.as_atom() == Some(":reason-unknown") => {
                return value.to_string().trim_matches('"').to_string();
            }
            [SExpr::Atom(reason)] => return reason.clone(),
            _ => {}
        }
    }
    let stderr = stderr.trim();
    if stderr.contains("timeout") {
        "timeout".to_string()
    } else if !stderr.is_empty() {
        stderr.to_string()
    } else {
        "unknown".to_string()
    }
}

/// Parse a `(get-model)` response.
fn parse_model(expr: &SExpr) -> Result<Model, SolverError> {
    let items = expr
        .as_list()
        .ok_or_else(|| SolverError::ParseError(format!("Model is not a list: {expr}")))?;
    let defs = if expr.is_call("model") {
        &items[1..]
    } else {
        items
    };

    let mut assignments = Vec::new();
    let mut functions = Vec::new();
    for def in defs {
        if !def.is_call("define-fun") {
            continue;
        }
        let [_, name, params, _sort, body] = def.as_list().unwrap_or_default() else {
            return Err(SolverError::ParseError(format!(
                "Malformed define-fun: {def}"
            )));
        };
        let name = name
            .as_atom()
            .ok_or_else(|| SolverError::ParseError(format!("Malformed define-fun name: {def}")))?
            .to_string();
        let params = params.as_list().unwrap_or_default();
        if params.is_empty() {
            assignments.push((name, body.to_string()));
        } else {
            let params = params
                .iter()
                .filter_map(|p| p.as_list()?.first()?.as_atom().map(str::to_string))
                .collect();
            functions.push(FunctionDef {
                name,
                params,
                body: body.to_string(),
            });
        }
    }

    Ok(Model::with_assignments(assignments).with_functions(functions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelValue;

    #[test]
    fn parse_unsat() {
        let result = parse_solver_output("unsat\n", "").unwrap();
        assert_eq!(result, SolverResult::Unsat);
    }

    #[test]
    fn unsat_followed_by_model_error() {
        let out = "unsat\n(error \"line 9 column 10: model is not available\")\n";
        assert_eq!(parse_solver_output(out, "").unwrap(), SolverResult::Unsat);
    }

    #[test]
    fn parse_sat_no_model() {
        let result = parse_solver_output("sat\n", "").unwrap();
        assert_eq!(result, SolverResult::Sat(None));
    }

    #[test]
    fn parse_sat_with_bare_model() {
        let out = "sat\n(\n  (define-fun x@0 () Int\n    5)\n  (define-fun y@0 () Int\n    (- 2))\n)\n";
        let result = parse_solver_output(out, "").unwrap();
        let model = result.model().unwrap();
        assert_eq!(model.get("x@0"), Some("5"));
        assert_eq!(model.int("y@0"), Some(-2));
    }

    #[test]
    fn parse_sat_with_model_keyword() {
        let out = "sat\n(model\n  (define-fun x () Int 1)\n)\n";
        let result = parse_solver_output(out, "").unwrap();
        assert_eq!(result.model().unwrap().int("x"), Some(1));
    }

    #[test]
    fn parse_z3_as_array_model() {
        let out = "sat\n(\n  (define-fun a@0 () (Array Int Int)\n    (_ as-array k!0))\n  (define-fun k!0 ((x!0 Int)) Int\n    (ite (= x!0 3) 0 1))\n)\n";
        let model = parse_solver_output(out, "").unwrap().model().cloned().unwrap();
        let array = model.array("a@0").unwrap();
        assert_eq!(array.get(3), Some(0));
        assert_eq!(array.get(8), Some(1));
        assert!(matches!(model.value("a@0"), Some(ModelValue::Array(_))));
    }

    #[test]
    fn parse_unknown() {
        let result = parse_solver_output("unknown\n", "").unwrap();
        assert_eq!(result, SolverResult::Unknown("unknown".to_string()));
    }

    #[test]
    fn parse_unknown_with_reason() {
        let result = parse_solver_output("unknown\n(timeout)\n", "").unwrap();
        assert_eq!(result, SolverResult::Unknown("timeout".to_string()));

        let result = parse_solver_output("unknown\n(:reason-unknown \"incomplete\")\n", "").unwrap();
        assert_eq!(result, SolverResult::Unknown("incomplete".to_string()));
    }

    #[test]
    fn parse_timeout_only_on_stderr() {
        let result = parse_solver_output("", "timeout\n").unwrap();
        assert_eq!(result, SolverResult::Unknown("timeout".to_string()));
    }

    #[test]
    fn parse_empty_output_error() {
        assert!(parse_solver_output("", "").is_err());
    }

    #[test]
    fn parse_unexpected_output_error() {
        assert!(parse_solver_output("garbage output\n", "").is_err());
    }

    #[test]
    fn error_before_status_is_process_error() {
        let out = "(error \"line 1 column 8: unknown constant z\")\nsat\n";
        assert_eq!(
            parse_solver_output(out, ""),
            Err(SolverError::ProcessError(
                "line 1 column 8: unknown constant z".to_string()
            ))
        );
    }
}
