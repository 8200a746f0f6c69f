//! Action table and handlers
//!
//! The table is built once on first use and never changes afterwards.

use std::collections::HashMap;

use dfumt_common::{constants, DispatchError, FormulaNode, Result};
use dfumt_metabolism::SynthesisMode;
use dfumt_seed::MappingKind;
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{json, Value};

use super::coercion::{self, Arguments};
use crate::config::FacadeSettings;
use crate::engine::FormulaEngine;
use crate::pipeline::{constant_leaf, PipelineOptions};

/// Static description of one action
#[derive(Debug, Clone, Serialize)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: &'static [&'static str],
}

lazy_static! {
    static ref ACTIONS: Vec<ActionSpec> = vec![
        ActionSpec {
            name: "seed.extend",
            description: "Expand an origin into its zero-centered sequence",
            required: &["origin"],
        },
        ActionSpec {
            name: "seed.extend_recursive",
            description: "Ladder of extensions re-seeded from each level's first term",
            required: &["origin"],
        },
        ActionSpec {
            name: "seed.contract",
            description: "Contract values to their mean with an imbalance ratio",
            required: &["values"],
        },
        ActionSpec {
            name: "seed.cancel_duals",
            description: "Cancel opposite pairs and sum what survives",
            required: &["values"],
        },
        ActionSpec {
            name: "seed.elevate",
            description: "Raise a vector to a higher dimension",
            required: &["vector"],
        },
        ActionSpec {
            name: "seed.reduce",
            description: "Block-average a vector to a lower dimension",
            required: &["vector"],
        },
        ActionSpec {
            name: "metabolism.evaluate_constants",
            description: "Registered constants with their π-extended and φ-spiral values",
            required: &[],
        },
        ActionSpec {
            name: "metabolism.synthesize",
            description: "Combine two constants and reduce the result",
            required: &["a", "b"],
        },
        ActionSpec {
            name: "selection.verify",
            description: "Consistency scores of the sum of the given values",
            required: &["values"],
        },
        ActionSpec {
            name: "engine.run",
            description: "Run the Seed, Metabolism and Selection pipeline",
            required: &["vector"],
        },
        ActionSpec {
            name: "engine.reset",
            description: "Clear the extension cache and the generation history",
            required: &[],
        },
        ActionSpec {
            name: "constants.list",
            description: "List the constant registry",
            required: &[],
        },
    ];
    static ref BY_NAME: HashMap<&'static str, usize> = ACTIONS
        .iter()
        .enumerate()
        .map(|(i, a)| (a.name, i))
        .collect();
}

/// Every action in table order
pub fn all() -> &'static [ActionSpec] {
    &ACTIONS
}

pub fn lookup(name: &str) -> Option<&'static ActionSpec> {
    BY_NAME.get(name).map(|&i| &ACTIONS[i])
}

/// First required argument that is missing or null
pub fn check_required(
    spec: &ActionSpec,
    args: &Arguments,
) -> std::result::Result<(), DispatchError> {
    match spec.required.iter().find(|key| !coercion::is_present(args, key)) {
        Some(missing) => Err(DispatchError::MissingArgument {
            action: spec.name.to_string(),
            argument: missing.to_string(),
        }),
        None => Ok(()),
    }
}

/// Output of a handler: payload plus a one-line summary
pub struct ActionOutput {
    pub data: Value,
    pub summary: String,
}

/// Run one action against `engine`. Required arguments must already be checked.
pub fn execute(
    engine: &mut FormulaEngine,
    spec: &ActionSpec,
    args: &Arguments,
    settings: &FacadeSettings,
) -> Result<ActionOutput> {
    let max_len = settings.max_vector_len;

    match spec.name {
        "seed.extend" => {
            let origin = coercion::number(args, "origin", 0.0);
            let depth = coercion::integer(args, "depth", settings.default_depth);
            let extension = engine.seed_mut().extend(origin, depth)?;
            Ok(ActionOutput {
                summary: format!("Extended {} to {} terms", origin, extension.expanded.len()),
                data: serde_json::to_value(&extension)?,
            })
        }
        "seed.extend_recursive" => {
            let origin = coercion::number(args, "origin", 0.0);
            let depth = coercion::integer(args, "depth", settings.default_depth);
            let ladder = engine.seed_mut().extend_recursive(origin, depth)?;
            Ok(ActionOutput {
                summary: format!("Built {} extension levels from {}", ladder.len(), origin),
                data: serde_json::to_value(&ladder)?,
            })
        }
        "seed.contract" => {
            let values = coercion::vector(args, "values", max_len);
            let contraction = engine.seed().contract(&values);
            Ok(ActionOutput {
                summary: format!(
                    "Contracted {} values to {}",
                    values.len(),
                    contraction.contracted
                ),
                data: serde_json::to_value(&contraction)?,
            })
        }
        "seed.cancel_duals" => {
            let values = coercion::vector(args, "values", max_len);
            let contraction = engine.seed().cancel_duals(&values);
            Ok(ActionOutput {
                summary: format!(
                    "Cancelled duals: {} remains (loss ratio {:.2})",
                    contraction.contracted, contraction.loss_ratio
                ),
                data: serde_json::to_value(&contraction)?,
            })
        }
        "seed.elevate" => {
            let vector = coercion::vector(args, "vector", max_len);
            let target = coercion::bounded_integer(
                args,
                "target",
                vector.len() * 2,
                settings.max_target_dim,
            )?;
            let elevated = engine.seed().elevate(&vector, target)?;
            let mapping = engine.seed().create_mapping(vector.len(), target, MappingKind::Dfumt);
            Ok(ActionOutput {
                summary: format!("Elevated {} -> {}", vector.len(), elevated.len()),
                data: json!({ "vector": elevated, "mapping": mapping }),
            })
        }
        "seed.reduce" => {
            let vector = coercion::vector(args, "vector", max_len);
            let target = coercion::bounded_integer(
                args,
                "target",
                (vector.len() / 2).max(1),
                settings.max_target_dim,
            )?;
            let reduced = engine.seed().reduce(&vector, target)?;
            let mapping = engine.seed().create_mapping(vector.len(), target, MappingKind::Dfumt);
            Ok(ActionOutput {
                summary: format!("Reduced {} -> {}", vector.len(), reduced.len()),
                data: json!({ "vector": reduced, "mapping": mapping }),
            })
        }
        "metabolism.evaluate_constants" => {
            let turns = coercion::bounded_integer(args, "turns", 1, settings.max_turns)?;
            let metabolism = engine.metabolism();
            let entries: Vec<Value> = constants::all()
                .iter()
                .map(|entry| {
                    let leaf = FormulaNode::labeled_constant(entry.value, entry.symbol);
                    json!({
                        "id": entry.id,
                        "symbol": entry.symbol,
                        "value": entry.value,
                        "pi_extended": metabolism.pi_extend(&leaf).value,
                        "phi_spiral": metabolism.phi_spiral(&leaf, turns).value,
                    })
                })
                .collect();
            Ok(ActionOutput {
                summary: format!("Evaluated {} constants over {} φ turns", entries.len(), turns),
                data: Value::Array(entries),
            })
        }
        "metabolism.synthesize" => {
            let a = constant_leaf(coercion::number(args, "a", 0.0));
            let b = constant_leaf(coercion::number(args, "b", 0.0));
            let mode_name = coercion::string(args, "mode", "add");
            let mode: SynthesisMode = mode_name.parse().map_err(|_| DispatchError::InvalidArgument {
                argument: "mode".to_string(),
                reason: format!("unknown synthesis mode '{}'", mode_name),
            })?;
            let synthesis = engine.metabolism().synthesize(&a, &b, mode);
            let reduction = engine.metabolism().reduce_default(&synthesis.formula);
            Ok(ActionOutput {
                summary: format!(
                    "{} reduced to {} in {} steps",
                    synthesis.formula,
                    reduction.output,
                    reduction.steps.len()
                ),
                data: json!({ "synthesis": synthesis, "reduction": reduction }),
            })
        }
        "selection.verify" => {
            let values = coercion::vector(args, "values", max_len);
            let formula = values
                .iter()
                .map(|v| constant_leaf(*v))
                .reduce(|acc, leaf| FormulaNode::binary("+", acc, leaf))
                .ok_or_else(|| DispatchError::InvalidArgument {
                    argument: "values".to_string(),
                    reason: "expected at least one number".to_string(),
                })?;
            let math = engine.check_math_consistency(&formula);
            let dfumt = engine.check_dfumt_consistency(&formula);
            let score = engine.verify(&formula);
            Ok(ActionOutput {
                summary: format!("{} verified with score {:.2}", formula, score),
                data: json!({
                    "formula": formula.to_string(),
                    "math": math,
                    "dfumt": dfumt,
                    "score": score,
                }),
            })
        }
        "engine.run" => {
            let vector = coercion::vector(args, "vector", max_len);
            let mode_name = coercion::string(args, "mode", "add");
            let mode: SynthesisMode = mode_name.parse().map_err(|_| DispatchError::InvalidArgument {
                argument: "mode".to_string(),
                reason: format!("unknown synthesis mode '{}'", mode_name),
            })?;
            let options = PipelineOptions {
                depth: coercion::integer(args, "depth", settings.default_depth),
                mode,
                generations: coercion::bounded_integer(
                    args,
                    "generations",
                    settings.default_generations,
                    settings.max_generations,
                )?,
            };
            let result = engine.run(&vector, options)?;
            Ok(ActionOutput {
                summary: result.summary.clone(),
                data: serde_json::to_value(&result)?,
            })
        }
        "engine.reset" => {
            let before = engine.stats();
            engine.reset();
            Ok(ActionOutput {
                summary: format!(
                    "Cleared {} cached extensions and {} generations",
                    before.cache_entries, before.history_len
                ),
                data: json!({ "before": before, "after": engine.stats() }),
            })
        }
        "constants.list" => Ok(ActionOutput {
            summary: format!("{} constants", constants::all().len()),
            data: serde_json::to_value(constants::all())?,
        }),
        other => Err(DispatchError::UnknownAction(other.to_string()).into()),
    }
}
