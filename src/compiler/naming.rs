//! Component naming.
//!
//! Every distinct [`TypeIdentity`] is bound to exactly one component name for the
//! lifetime of a run. The binding is computed once, under a single lock, so concurrent
//! callers always observe the same name for the same type.

use crate::config::{CollisionPolicy, NamingConfig, NamingStrategy};
use crate::error::{Error, Result};
use crate::types::{last_segment, TypeIdentity, CRATE_ROOT};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Name allocator shared by every lowering in a run
pub struct SchemaNaming {
    strategy: NamingStrategy,
    collision: CollisionPolicy,
    state: Mutex<NamingState>,
}

#[derive(Default)]
struct NamingState {
    /// Type description to bound name
    type_to_name: HashMap<String, String>,
    /// Bound name to the description of the type that first took it
    name_to_type: HashMap<String, String>,
    /// Last suffix handed out per base name
    counters: HashMap<String, usize>,
}

impl SchemaNaming {
    pub fn new(config: &NamingConfig) -> Self {
        debug!(
            "Initializing SchemaNaming with strategy {:?} and collision policy {:?}",
            config.strategy, config.collision
        );
        Self {
            strategy: config.strategy,
            collision: config.collision,
            state: Mutex::new(NamingState::default()),
        }
    }

    /// Return the component name bound to `ty`, binding one if needed.
    ///
    /// Fails only under [`CollisionPolicy::Error`]; a failed binding is not recorded.
    pub fn name_for(&self, ty: &TypeIdentity) -> Result<String> {
        let type_id = ty.describe();
        let mut state = self.state.lock();
        if let Some(existing) = state.type_to_name.get(&type_id) {
            return Ok(existing.clone());
        }

        let base = self.base_name(ty);
        let name = self.ensure_unique(&mut state, base, &type_id)?;
        debug!("Bound schema name {} to {}", name, type_id);
        state.type_to_name.insert(type_id, name.clone());
        Ok(name)
    }

    /// Name a type would get from the strategy alone, before collision handling
    pub fn base_name(&self, ty: &TypeIdentity) -> String {
        let Some(path) = ty.qualified_name() else {
            return sanitize(&ty.describe());
        };
        let raw = match self.strategy {
            NamingStrategy::Fqn => strip_crate_root(path).to_string(),
            NamingStrategy::Simple => last_segment(path).to_string(),
            NamingStrategy::SimpleWithArgs => with_args(last_segment(path), ty.type_arguments()),
            NamingStrategy::FqnWithArgs => with_args(strip_crate_root(path), ty.type_arguments()),
        };
        sanitize(&raw)
    }

    fn ensure_unique(&self, state: &mut NamingState, base: String, type_id: &str) -> Result<String> {
        let existing = match state.name_to_type.get(&base) {
            None => {
                state.name_to_type.insert(base.clone(), type_id.to_string());
                return Ok(base);
            }
            Some(existing) if existing == type_id => return Ok(base),
            Some(existing) => existing.clone(),
        };

        match self.collision {
            CollisionPolicy::SuffixNumber => {
                let mut counter = state.counters.get(&base).copied().unwrap_or(0);
                let candidate = loop {
                    counter += 1;
                    let candidate = format!("{}_{}", base, counter);
                    if !state.name_to_type.contains_key(&candidate) {
                        break candidate;
                    }
                };
                state.counters.insert(base, counter);
                state
                    .name_to_type
                    .insert(candidate.clone(), type_id.to_string());
                Ok(candidate)
            }
            CollisionPolicy::Error => Err(Error::NameCollision {
                name: base,
                existing,
                incoming: type_id.to_string(),
            }),
            CollisionPolicy::FirstWinsLog => {
                warn!(
                    "Schema name collision for {} between {} and {}",
                    base, existing, type_id
                );
                Ok(base)
            }
        }
    }
}

fn strip_crate_root(path: &str) -> &str {
    path.strip_prefix(CRATE_ROOT)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(path)
}

/// Append `_`-joined short names of the type arguments
fn with_args(base: &str, args: &[TypeIdentity]) -> String {
    if args.is_empty() {
        return base.to_string();
    }
    let short: Vec<String> = args.iter().map(short_name).collect();
    format!("{}_{}", base, short.join("_"))
}

fn short_name(ty: &TypeIdentity) -> String {
    match ty.simple_name() {
        Some(name) => name.to_string(),
        None => ty.describe(),
    }
}

/// Reduce a raw name to characters that are safe in a component key
pub fn sanitize(raw: &str) -> String {
    let mut out = raw.replace("::", "_");
    out.retain(|c| !matches!(c, ' ' | '&' | '\''));
    let out: String = out
        .chars()
        .map(|c| match c {
            '<' | '>' | ',' | '.' | '[' | ']' | ';' => '_',
            other => other,
        })
        .collect();
    out.trim_end_matches('_').to_string()
}
