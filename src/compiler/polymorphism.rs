//! Discriminated-union composition for polymorphic base types.

use crate::config::{PolymorphismConfig, PolymorphismStrategy};
use crate::error::Result;
use crate::schema::{ref_path, Discriminator, SchemaKind, SchemaNode};
use crate::types::{SubtypeDeclaration, TypeIdentity};
use indexmap::IndexMap;
use log::debug;

pub struct PolymorphismResolver {
    enabled: bool,
    discriminator_property: String,
}

impl PolymorphismResolver {
    pub fn new(config: &PolymorphismConfig) -> Self {
        Self {
            enabled: config.strategy != PolymorphismStrategy::Disabled,
            discriminator_property: config.discriminator_property.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn `base` into a `oneOf` over its subtypes.
    ///
    /// Returns `base` untouched when disabled or when there are no subtypes. The base
    /// only goes into `allOf` if it contributes properties. `lower` compiles a subtype
    /// and is expected to return a component reference; subtypes that lower to anything
    /// else stay in `oneOf` but get no mapping entry.
    pub fn apply<F>(
        &self,
        base_ty: &TypeIdentity,
        base: SchemaNode,
        subtypes: &[SubtypeDeclaration],
        mut lower: F,
    ) -> Result<SchemaNode>
    where
        F: FnMut(&TypeIdentity) -> Result<SchemaNode>,
    {
        if !self.enabled || subtypes.is_empty() {
            return Ok(base);
        }
        debug!(
            "Composing {} from {} subtypes",
            base_ty.describe(),
            subtypes.len()
        );

        let keeps_base = match &base.kind {
            SchemaKind::Object { properties, .. } => !properties.is_empty(),
            _ => true,
        };
        let all_of = if keeps_base { vec![base] } else { Vec::new() };

        let mut one_of = Vec::with_capacity(subtypes.len());
        let mut mapping = IndexMap::new();
        for subtype in subtypes {
            let child = lower(&subtype.ty)?;
            match child.reference_name() {
                Some(name) => {
                    mapping.insert(subtype.alias.clone(), ref_path(name));
                }
                None => debug!(
                    "Subtype {} of {} is not a component; no mapping for {}",
                    subtype.ty.describe(),
                    base_ty.describe(),
                    subtype.alias
                ),
            }
            one_of.push(child);
        }

        Ok(SchemaNode::new(SchemaKind::Composed {
            all_of,
            one_of,
            discriminator: Some(Discriminator {
                property_name: self.discriminator_property.clone(),
                mapping,
            }),
        }))
    }
}
