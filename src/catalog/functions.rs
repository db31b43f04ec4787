//! Builtin function table and overload resolution.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};
use crate::semantic::coercion::can_coerce_implicitly;
use crate::types::DataType;

use super::Volatility;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub arg_types: Vec<DataType>,
    pub result: DataType,
    pub returns_set: bool,
    pub is_aggregate: bool,
    pub is_window: bool,
    pub volatility: Volatility,
}

impl FunctionSignature {
    fn scalar(name: &str, arg_types: Vec<DataType>, result: DataType) -> Self {
        Self {
            name: name.to_string(),
            arg_types,
            result,
            returns_set: false,
            is_aggregate: false,
            is_window: false,
            volatility: Volatility::Immutable,
        }
    }

    fn aggregate(name: &str, arg_types: Vec<DataType>, result: DataType) -> Self {
        Self {
            is_aggregate: true,
            ..Self::scalar(name, arg_types, result)
        }
    }

    fn window(name: &str, result: DataType) -> Self {
        Self {
            is_window: true,
            ..Self::scalar(name, Vec::new(), result)
        }
    }

    fn volatility(mut self, v: Volatility) -> Self {
        self.volatility = v;
        self
    }

    fn set_returning(mut self) -> Self {
        self.returns_set = true;
        self
    }
}

/// Outcome of matching call arguments against candidate signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateMatch {
    Exact(usize),
    Unique(usize),
    Ambiguous,
    None,
}

/// Best-match selection over candidate argument lists: an exact match wins
/// outright; otherwise implicitly-coercible candidates compete on the number
/// of exactly-matching positions, then on accepting the preferred type of
/// its category at positions where the input is untyped. A surviving tie is
/// ambiguous.
pub fn match_candidates(input: &[DataType], candidates: &[&[DataType]]) -> CandidateMatch {
    for (i, cand) in candidates.iter().enumerate() {
        if cand.len() == input.len() && input.iter().zip(cand.iter()).all(|(a, b)| a == b) {
            return CandidateMatch::Exact(i);
        }
    }

    let coercible: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, cand)| {
            cand.len() == input.len()
                && input
                    .iter()
                    .zip(cand.iter())
                    .all(|(a, b)| can_coerce_implicitly(a, b))
        })
        .map(|(i, _)| i)
        .collect();

    match coercible.len() {
        0 => return CandidateMatch::None,
        1 => return CandidateMatch::Unique(coercible[0]),
        _ => {}
    }

    let exact_count = |i: usize| {
        input
            .iter()
            .zip(candidates[i].iter())
            .filter(|(a, b)| a == b)
            .count()
    };
    let best = coercible.iter().map(|&i| exact_count(i)).max().unwrap_or(0);
    let survivors: Vec<usize> = coercible
        .into_iter()
        .filter(|&i| exact_count(i) == best)
        .collect();
    if survivors.len() == 1 {
        return CandidateMatch::Unique(survivors[0]);
    }

    let preferred_count = |i: usize| {
        input
            .iter()
            .zip(candidates[i].iter())
            .filter(|(a, b)| **a == DataType::Unknown && b.is_preferred())
            .count()
    };
    let best = survivors
        .iter()
        .map(|&i| preferred_count(i))
        .max()
        .unwrap_or(0);
    let survivors: Vec<usize> = survivors
        .into_iter()
        .filter(|&i| preferred_count(i) == best)
        .collect();
    match survivors.as_slice() {
        [single] => CandidateMatch::Unique(*single),
        _ => CandidateMatch::Ambiguous,
    }
}

pub fn format_signature(name: &str, args: &[DataType]) -> String {
    let rendered: Vec<String> = args.iter().map(|t| t.to_string()).collect();
    format!("{}({})", name, rendered.join(", "))
}

fn builtin_overloads(name: &str) -> Vec<FunctionSignature> {
    use DataType::*;
    match name {
        "length" => vec![
            FunctionSignature::scalar("length", vec![Text], Int32),
            FunctionSignature::scalar("length", vec![Bytea], Int32),
        ],
        "upper" => vec![FunctionSignature::scalar("upper", vec![Text], Text)],
        "lower" => vec![FunctionSignature::scalar("lower", vec![Text], Text)],
        "abs" => vec![
            FunctionSignature::scalar("abs", vec![Int16], Int16),
            FunctionSignature::scalar("abs", vec![Int32], Int32),
            FunctionSignature::scalar("abs", vec![Int64], Int64),
            FunctionSignature::scalar("abs", vec![Numeric], Numeric),
            FunctionSignature::scalar("abs", vec![Float64], Float64),
        ],
        "now" => vec![
            FunctionSignature::scalar("now", vec![], TimestampTz).volatility(Volatility::Stable)
        ],
        "random" => vec![
            FunctionSignature::scalar("random", vec![], Float64).volatility(Volatility::Volatile)
        ],
        "generate_series" => vec![
            FunctionSignature::scalar("generate_series", vec![Int32, Int32], Int32)
                .set_returning(),
            FunctionSignature::scalar("generate_series", vec![Int64, Int64], Int64)
                .set_returning(),
        ],
        "count" => vec![FunctionSignature::aggregate("count", vec![], Int64)],
        "sum" => vec![
            FunctionSignature::aggregate("sum", vec![Int16], Int64),
            FunctionSignature::aggregate("sum", vec![Int32], Int64),
            FunctionSignature::aggregate("sum", vec![Int64], Numeric),
            FunctionSignature::aggregate("sum", vec![Numeric], Numeric),
            FunctionSignature::aggregate("sum", vec![Float32], Float32),
            FunctionSignature::aggregate("sum", vec![Float64], Float64),
            FunctionSignature::aggregate("sum", vec![Interval], Interval),
        ],
        "avg" => vec![
            FunctionSignature::aggregate("avg", vec![Int16], Numeric),
            FunctionSignature::aggregate("avg", vec![Int32], Numeric),
            FunctionSignature::aggregate("avg", vec![Int64], Numeric),
            FunctionSignature::aggregate("avg", vec![Numeric], Numeric),
            FunctionSignature::aggregate("avg", vec![Float32], Float64),
            FunctionSignature::aggregate("avg", vec![Float64], Float64),
            FunctionSignature::aggregate("avg", vec![Interval], Interval),
        ],
        "row_number" => vec![FunctionSignature::window("row_number", Int64)],
        "rank" => vec![FunctionSignature::window("rank", Int64)],
        _ => Vec::new(),
    }
}

pub fn resolve(name: &str, args: &[DataType]) -> Result<FunctionSignature> {
    let name = name.to_ascii_lowercase();

    // count(x) and count(*) accept anything
    if name == "count" && args.len() <= 1 {
        return Ok(FunctionSignature::aggregate("count", args.to_vec(), DataType::Int64));
    }

    // min/max are identity aggregates over any orderable type
    if (name == "min" || name == "max") && args.len() == 1 {
        let arg = match &args[0] {
            DataType::Unknown => DataType::Text,
            other => other.clone(),
        };
        return Ok(FunctionSignature::aggregate(&name, vec![arg.clone()], arg));
    }

    let overloads = builtin_overloads(&name);
    if overloads.is_empty() {
        return Err(ErrorKind::UndefinedFunction(format_signature(&name, args)).into());
    }
    let candidate_args: Vec<&[DataType]> =
        overloads.iter().map(|f| f.arg_types.as_slice()).collect();
    match match_candidates(args, &candidate_args) {
        CandidateMatch::Exact(i) | CandidateMatch::Unique(i) => Ok(overloads[i].clone()),
        CandidateMatch::Ambiguous => {
            Err(ErrorKind::AmbiguousFunction(format_signature(&name, args)).into())
        }
        CandidateMatch::None => {
            Err(ErrorKind::UndefinedFunction(format_signature(&name, args)).into())
        }
    }
}
