//! Text scenario scripts.
//!
//! ```text
//! Node_id Neighbours
//! 1 2 6
//! 2 3 1
//! ...
//! ELECT 1 3
//! FAIL 6
//! ```
//!
//! | Line | Meaning |
//! |------|---------|
//! | `Node_id ...` | header, ignored |
//! | `<id> <neighbor>...` | ring declaration, in ring order |
//! | `ELECT <round> <id>...` | listed nodes start an election in `<round>` |
//! | `FAIL <id>` | fail `<id>` once the system is quiescent |
//! | `FAIL <round> <id>...` | queue failures when `<round>` is reached |
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::error::ScenarioError;

use super::{Scenario, ScenarioBuilder};

const HEADER: &str = "Node_id";
const ELECT: &str = "ELECT";
const FAIL: &str = "FAIL";

/// Round assigned to `FAIL <id>` lines that carry no round.
const IMMEDIATE_ROUND: u64 = 1;

/// Parse a complete script.
pub fn parse(text: &str) -> Result<Scenario, ScenarioError> {
    let mut builder = Scenario::builder();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        builder = match tokens[0] {
            HEADER => builder,
            ELECT => parse_elect(builder, line, &tokens[1..])?,
            FAIL => parse_fail(builder, line, &tokens[1..])?,
            _ => parse_declaration(builder, line, &tokens)?,
        };
    }

    builder.build()
}

fn parse_declaration(
    builder: ScenarioBuilder,
    line: usize,
    tokens: &[&str],
) -> Result<ScenarioBuilder, ScenarioError> {
    let ids = integers(line, tokens)?;
    Ok(builder.declare(ids[0], &ids[1..]))
}

fn parse_elect(
    builder: ScenarioBuilder,
    line: usize,
    args: &[&str],
) -> Result<ScenarioBuilder, ScenarioError> {
    if args.len() < 2 {
        return Err(missing(line, ELECT));
    }
    let values = integers(line, args)?;
    let round = checked_round(line, values[0])?;
    Ok(builder.elect(round, &values[1..]))
}

fn parse_fail(
    builder: ScenarioBuilder,
    line: usize,
    args: &[&str],
) -> Result<ScenarioBuilder, ScenarioError> {
    let values = integers(line, args)?;
    match values.as_slice() {
        [] => Err(missing(line, FAIL)),
        [node] => Ok(builder.fail(IMMEDIATE_ROUND, *node)),
        [round, nodes @ ..] => {
            let round = checked_round(line, *round)?;
            Ok(nodes
                .iter()
                .fold(builder, |builder, node| builder.fail(round, *node)))
        }
    }
}

fn integers(line: usize, tokens: &[&str]) -> Result<Vec<u64>, ScenarioError> {
    tokens
        .iter()
        .map(|token| {
            token.parse::<u64>().map_err(|_| ScenarioError::InvalidInteger {
                line,
                token: (*token).to_string(),
            })
        })
        .collect()
}

fn checked_round(line: usize, round: u64) -> Result<u64, ScenarioError> {
    if round == 0 {
        Err(ScenarioError::InvalidRound { line, round })
    } else {
        Ok(round)
    }
}

fn missing(line: usize, directive: &str) -> ScenarioError {
    ScenarioError::MissingArgument {
        line,
        directive: directive.to_string(),
    }
}
