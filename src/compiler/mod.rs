//! Type-to-schema compiler.
//!
//! [`SchemaCompiler`] lowers a [`TypeIdentity`] into a [`SchemaNode`]. Named object and
//! enum types become components in a shared [`ComponentRegistry`] and are referenced
//! with `$ref`; everything else is lowered inline. One compiler is shared by every
//! caller in a run, from any number of threads.

pub mod naming;
pub mod polymorphism;
pub mod registry;
pub mod validation;
pub mod wrapper;

use crate::catalog::TypeCatalog;
use crate::config::{CompilerConfig, LimitsConfig};
use crate::error::Result;
use crate::schema::{PrimitiveKind, SchemaKind, SchemaNode};
use crate::types::{Declaration, FieldDescriptor, ScalarFormat, TypeIdentity, TypeShape};
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use naming::SchemaNaming;
use polymorphism::PolymorphismResolver;
use registry::{Claim, ComponentRegistry};

/// Shared schema compiler for one run
pub struct SchemaCompiler {
    catalog: Arc<dyn TypeCatalog>,
    limits: LimitsConfig,
    naming: SchemaNaming,
    registry: ComponentRegistry,
    polymorphism: PolymorphismResolver,
    /// Types already reported as unresolvable
    unresolved: Mutex<HashSet<String>>,
}

impl SchemaCompiler {
    pub fn new(config: &CompilerConfig, catalog: Arc<dyn TypeCatalog>) -> Self {
        debug!(
            "Initializing SchemaCompiler (max depth {}, max properties {})",
            config.limits.max_depth, config.limits.max_properties
        );
        Self {
            catalog,
            limits: config.limits.clone(),
            naming: SchemaNaming::new(&config.naming),
            registry: ComponentRegistry::new(),
            polymorphism: PolymorphismResolver::new(&config.polymorphism),
            unresolved: Mutex::new(HashSet::new()),
        }
    }

    /// Lower a root type
    pub fn compile(&self, ty: &TypeIdentity) -> Result<SchemaNode> {
        debug!("Compiling schema for {}", ty);
        self.lower(ty, 0)
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn naming(&self) -> &SchemaNaming {
        &self.naming
    }

    /// Every registered component in registration order
    pub fn components(&self) -> IndexMap<String, SchemaNode> {
        self.registry.snapshot()
    }

    pub fn into_components(self) -> IndexMap<String, SchemaNode> {
        self.registry.into_schemas()
    }

    /// Lower `ty` found `depth` levels below a root.
    ///
    /// Only a name collision under the `error` policy fails; every other problem
    /// degrades to an opaque schema.
    pub fn lower(&self, ty: &TypeIdentity, depth: usize) -> Result<SchemaNode> {
        if depth > self.limits.max_depth {
            warn!(
                "Maximum depth {} exceeded at {}; emitting an opaque schema",
                self.limits.max_depth, ty
            );
            return Ok(SchemaNode::opaque());
        }

        match ty.shape() {
            TypeShape::Primitive(primitive) => Ok(scalar(primitive.schema_format())),
            TypeShape::Array(inner) => Ok(SchemaNode::array(self.lower(inner, depth + 1)?)),
            TypeShape::Optional(inner) => Ok(self.lower_optional(inner, depth)?.nullable()),
            TypeShape::Transparent(inner) => self.lower_optional(inner, depth),
            TypeShape::Collection(inner) => {
                Ok(SchemaNode::array(self.lower_optional(inner, depth)?))
            }
            TypeShape::Map(value) => Ok(SchemaNode::map(self.lower_optional(value, depth)?)),
            TypeShape::KnownScalar(format) => Ok(scalar(format)),
            TypeShape::Unknown => Ok(SchemaNode::opaque()),
            TypeShape::Declared => self.lower_declared(ty, depth),
        }
    }

    /// Lower a type argument that may be missing
    fn lower_optional(&self, inner: Option<&TypeIdentity>, depth: usize) -> Result<SchemaNode> {
        match inner {
            Some(inner) => self.lower(inner, depth + 1),
            None => Ok(SchemaNode::opaque()),
        }
    }

    fn lower_declared(&self, ty: &TypeIdentity, depth: usize) -> Result<SchemaNode> {
        let Some(declaration) = self.catalog.declaration(ty) else {
            self.report_unresolved(ty);
            return Ok(SchemaNode::opaque());
        };

        match declaration {
            Declaration::Transparent(inner) => self.lower(&inner, depth + 1),
            Declaration::Enum { constants } => {
                let name = self.naming.name_for(ty)?;
                self.registry
                    .register_once(&name, SchemaNode::string_enum(constants));
                Ok(SchemaNode::reference(name))
            }
            Declaration::Object { fields } => self.lower_object(ty, &fields, depth),
        }
    }

    fn lower_object(
        &self,
        ty: &TypeIdentity,
        fields: &[FieldDescriptor],
        depth: usize,
    ) -> Result<SchemaNode> {
        let name = self.naming.name_for(ty)?;
        let guard = match self.registry.claim(&name) {
            Claim::Registered | Claim::Reentrant => return Ok(SchemaNode::reference(name)),
            Claim::Acquired(guard) => guard,
        };
        debug!("Building object schema {} for {}", name, ty);

        let mut properties: IndexMap<String, SchemaNode> = IndexMap::new();
        let mut required: IndexSet<String> = IndexSet::new();
        for field in fields.iter().filter(|f| !f.is_static) {
            let attributes = self.catalog.field_attributes(field);
            if attributes.ignored {
                continue;
            }
            let property = attributes.rename.unwrap_or_else(|| field.name.clone());
            if properties.contains_key(&property) {
                debug!("Duplicate property {} on {}; keeping the first", property, ty);
                continue;
            }
            if properties.len() >= self.limits.max_properties {
                warn!(
                    "{} has more than {} properties; remaining fields dropped",
                    ty, self.limits.max_properties
                );
                break;
            }

            let mut schema = self.lower(&field.ty, depth + 1)?;
            validation::apply(&property, &attributes.validation, &mut schema, &mut required);
            properties.insert(property, schema);
        }

        let base = SchemaNode::object(properties, required);
        let subtypes = self.catalog.subtypes(ty);
        let body = if subtypes.is_empty() {
            base
        } else if self.polymorphism.is_enabled() {
            self.polymorphism
                .apply(ty, base, &subtypes, |sub| self.lower(sub, depth + 1))?
        } else if base.has_properties() {
            base
        } else {
            // A data enum has no shape of its own besides its variants
            let one_of = subtypes
                .iter()
                .map(|sub| self.lower(&sub.ty, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            SchemaNode::new(SchemaKind::Composed {
                all_of: Vec::new(),
                one_of,
                discriminator: None,
            })
        };

        guard.complete(body);
        Ok(SchemaNode::reference(name))
    }

    fn report_unresolved(&self, ty: &TypeIdentity) {
        if self.unresolved.lock().insert(ty.describe()) {
            debug!("No declaration found for {}; emitting an opaque schema", ty);
        }
    }
}

fn scalar(format: ScalarFormat) -> SchemaNode {
    match PrimitiveKind::parse(format.schema_type) {
        Some(kind) => SchemaNode::primitive(kind, format.format),
        None => SchemaNode::opaque(),
    }
}
