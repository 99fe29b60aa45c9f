//! Declaration catalog.
//!
//! The schema compiler never looks at syntax. It asks a [`TypeCatalog`] for the
//! declaration behind a [`TypeIdentity`], for the serialization and validation
//! attributes of each field, and for the subtypes of a polymorphic base.
//!
//! [`SourceCatalog`] answers those questions from parsed Rust sources. It indexes every
//! struct, enum and type alias under its `crate::`-rooted path, records `use` imports per
//! module, and lowers each declaration to plain data up front so the catalog can be shared
//! across threads.

use crate::source::SourceFile;
use crate::types::{
    Declaration, FieldDescriptor, PrimitiveType, SubtypeDeclaration, TypeIdentity, TypeShape,
    CRATE_ROOT,
};
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::debug;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Fields, Item, LitStr, Token, UseTree};

/// Source of declarations and attributes for the schema compiler
pub trait TypeCatalog: Send + Sync {
    /// Declaration of a named type with its type arguments substituted
    fn declaration(&self, ty: &TypeIdentity) -> Option<Declaration>;

    /// Serialization and validation attributes of one field
    fn field_attributes(&self, field: &FieldDescriptor) -> FieldAttributes;

    /// Subtypes of a polymorphic base, in declaration order
    fn subtypes(&self, ty: &TypeIdentity) -> Vec<SubtypeDeclaration>;
}

/// Attributes that shape how a field appears in its schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAttributes {
    /// Serialized name, if different from the field name
    pub rename: Option<String>,
    /// Field never appears in serialized output
    pub ignored: bool,
    pub validation: ValidationFacts,
    /// Literal returned by the field's `#[serde(default = "...")]` function
    pub default_value: Option<Value>,
}

/// Validation constraints declared on a field.
///
/// Literal values are kept as written; they are interpreted when applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationFacts {
    pub not_null: bool,
    pub not_blank: bool,
    pub not_empty: bool,
    pub size: Option<SizeBounds>,
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub pattern: Option<String>,
    /// String format implied by a validator such as `email` or `url`
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeBounds {
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Names that always mean the prelude type, even if some module declares its own
const PRELUDE: &[&str] = &["String", "Vec", "Option", "Result", "Box"];

/// Catalog built from parsed project sources
pub struct SourceCatalog {
    index: SymbolIndex,
    templates: HashMap<String, TypeTemplate>,
    /// Keyed by declaring type path and field name
    attributes: HashMap<(String, String), FieldAttributes>,
}

#[derive(Default)]
struct SymbolIndex {
    items: HashSet<String>,
    /// Simple name to every item path carrying it
    by_name: HashMap<String, Vec<String>>,
    modules: HashSet<String>,
    /// Module path to its `use` imports
    imports: HashMap<String, ModuleImports>,
    /// Zero-argument functions whose body is a literal, by path
    defaults: HashMap<String, Value>,
}

#[derive(Default)]
struct ModuleImports {
    /// Local alias to the imported path as written
    named: HashMap<String, Vec<String>>,
    globs: Vec<Vec<String>>,
}

/// Generic declaration with type parameters left as type variables
struct TypeTemplate {
    params: Vec<String>,
    body: TemplateBody,
}

enum TemplateBody {
    Struct(Vec<FieldTemplate>),
    /// Newtype struct, transparent struct or type alias
    Newtype(TypeIdentity),
    /// Fieldless enum with serialized variant names
    Enum(Vec<String>),
    /// Enum whose variants each wrap one type
    Union(Vec<SubtypeDeclaration>),
    Unsupported,
}

struct FieldTemplate {
    name: String,
    ty: TypeIdentity,
    flatten: bool,
    is_static: bool,
}

struct PendingDecl<'a> {
    path: String,
    module: Vec<String>,
    item: &'a Item,
}

/// Resolution context for type expressions inside one declaration
struct Scope<'a> {
    module: &'a [String],
    generics: &'a [String],
    self_ty: Option<&'a TypeIdentity>,
}

#[derive(Default)]
struct ContainerAttrs {
    rename_all: Option<String>,
    default: bool,
    transparent: bool,
}

#[derive(Default)]
struct SerdeFieldAttrs {
    rename: Option<String>,
    skip: bool,
    flatten: bool,
    default: bool,
    /// Function named by `default = "..."`
    default_fn: Option<String>,
    skip_serializing_if: bool,
}

impl SourceCatalog {
    /// Index every declaration in `files`
    pub fn new(files: &[SourceFile]) -> Self {
        debug!("Initializing SourceCatalog with {} files", files.len());
        let mut index = SymbolIndex::default();
        index.modules.insert(CRATE_ROOT.to_string());
        let mut pending = Vec::new();

        for file in files {
            let mut prefix = Vec::new();
            for segment in &file.module_path {
                prefix.push(segment.clone());
                index.modules.insert(module_key(&prefix));
            }
            collect_items(&file.syntax.items, &file.module_path, &mut index, &mut pending);
        }

        let mut catalog = Self {
            index,
            templates: HashMap::new(),
            attributes: HashMap::new(),
        };
        for decl in &pending {
            if catalog.templates.contains_key(&decl.path) {
                debug!("Duplicate declaration of {}; keeping the first", decl.path);
                continue;
            }
            let template = catalog.build_template(decl);
            catalog.templates.insert(decl.path.clone(), template);
        }

        debug!("Indexed {} declarations", catalog.templates.len());
        catalog
    }

    /// Number of indexed declarations
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolve a type expression written in `module`
    pub fn resolve_type(&self, ty: &syn::Type, module: &[String]) -> TypeIdentity {
        let scope = Scope {
            module,
            generics: &[],
            self_ty: None,
        };
        self.resolve(ty, &scope)
    }

    fn resolve(&self, ty: &syn::Type, scope: &Scope) -> TypeIdentity {
        match ty {
            syn::Type::Path(type_path) if type_path.qself.is_none() => {
                self.resolve_path(&type_path.path, scope)
            }
            syn::Type::Reference(r) => self.resolve(&r.elem, scope),
            syn::Type::Ptr(p) => self.resolve(&p.elem, scope),
            syn::Type::Paren(p) => self.resolve(&p.elem, scope),
            syn::Type::Group(g) => self.resolve(&g.elem, scope),
            syn::Type::Slice(s) => TypeIdentity::Array(Box::new(self.resolve(&s.elem, scope))),
            syn::Type::Array(a) => TypeIdentity::Array(Box::new(self.resolve(&a.elem, scope))),
            syn::Type::Tuple(t) if t.elems.is_empty() => TypeIdentity::Unit,
            _ => TypeIdentity::Wildcard,
        }
    }

    fn resolve_path(&self, path: &syn::Path, scope: &Scope) -> TypeIdentity {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let Some(last) = path.segments.last() else {
            return TypeIdentity::Wildcard;
        };

        if segments.len() == 1 && path.leading_colon.is_none() {
            let name = segments[0].as_str();
            if scope.generics.iter().any(|g| g == name) {
                return TypeIdentity::TypeVariable(name.to_string());
            }
            if let Some(primitive) = PrimitiveType::parse(name) {
                return TypeIdentity::Primitive(primitive);
            }
            if name == "Self" {
                if let Some(self_ty) = scope.self_ty {
                    return self_ty.clone();
                }
            }
        }

        let mut args = Vec::new();
        if let syn::PathArguments::AngleBracketed(bracketed) = &last.arguments {
            for arg in &bracketed.args {
                if let syn::GenericArgument::Type(inner) = arg {
                    args.push(self.resolve(inner, scope));
                }
            }
        }

        let resolved = if path.leading_colon.is_some() {
            segments.join("::")
        } else {
            self.index.resolve_segments(scope.module, &segments)
        };
        TypeIdentity::generic(resolved, args)
    }

    fn build_template(&mut self, decl: &PendingDecl) -> TypeTemplate {
        match decl.item {
            Item::Struct(item) => {
                let params = type_params(&item.generics);
                let self_ty = self_identity(&decl.path, &params);
                let scope = Scope {
                    module: &decl.module,
                    generics: &params,
                    self_ty: Some(&self_ty),
                };
                let container = parse_container_attrs(&item.attrs);
                let body = self.struct_body(&decl.path, &item.fields, &container, &scope);
                TypeTemplate { params, body }
            }
            Item::Enum(item) => {
                let params = type_params(&item.generics);
                let self_ty = self_identity(&decl.path, &params);
                let scope = Scope {
                    module: &decl.module,
                    generics: &params,
                    self_ty: Some(&self_ty),
                };
                let container = parse_container_attrs(&item.attrs);
                let body = self.enum_body(item, &container, &scope);
                TypeTemplate { params, body }
            }
            Item::Type(item) => {
                let params = type_params(&item.generics);
                let scope = Scope {
                    module: &decl.module,
                    generics: &params,
                    self_ty: None,
                };
                let target = self.resolve(&item.ty, &scope);
                TypeTemplate {
                    params,
                    body: TemplateBody::Newtype(target),
                }
            }
            _ => TypeTemplate {
                params: Vec::new(),
                body: TemplateBody::Unsupported,
            },
        }
    }

    fn struct_body(
        &mut self,
        path: &str,
        fields: &Fields,
        container: &ContainerAttrs,
        scope: &Scope,
    ) -> TemplateBody {
        match fields {
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                TemplateBody::Newtype(self.resolve(&unnamed.unnamed[0].ty, scope))
            }
            Fields::Named(named) if container.transparent => {
                let data: Vec<TypeIdentity> = named
                    .named
                    .iter()
                    .map(|f| self.resolve(&f.ty, scope))
                    .filter(|ty| !is_phantom(ty))
                    .collect();
                match data.as_slice() {
                    [inner] => TemplateBody::Newtype(inner.clone()),
                    _ => TemplateBody::Unsupported,
                }
            }
            Fields::Named(named) => {
                let mut templates = Vec::with_capacity(named.named.len());
                for field in &named.named {
                    let Some(ident) = &field.ident else { continue };
                    let name = syn::ext::IdentExt::unraw(ident).to_string();
                    let ty = self.resolve(&field.ty, scope);
                    let serde = parse_serde_field(&field.attrs);

                    if !serde.flatten {
                        let mut attributes = field_attributes_for(&name, &ty, &serde, container, &field.attrs);
                        attributes.default_value = serde
                            .default_fn
                            .as_deref()
                            .and_then(|function| self.index.default_value(scope.module, function));
                        self.attributes.insert((path.to_string(), name.clone()), attributes);
                    }
                    if serde.flatten && serde.skip {
                        continue;
                    }

                    templates.push(FieldTemplate {
                        is_static: is_phantom(&ty),
                        name,
                        ty,
                        flatten: serde.flatten,
                    });
                }
                debug!("Parsed {} fields of {}", templates.len(), path);
                TemplateBody::Struct(templates)
            }
            _ => TemplateBody::Unsupported,
        }
    }

    fn enum_body(
        &self,
        item: &syn::ItemEnum,
        container: &ContainerAttrs,
        scope: &Scope,
    ) -> TemplateBody {
        let variants: Vec<(&syn::Variant, SerdeFieldAttrs)> = item
            .variants
            .iter()
            .map(|v| (v, parse_serde_field(&v.attrs)))
            .filter(|(_, attrs)| !attrs.skip)
            .collect();

        if variants.iter().all(|(v, _)| matches!(v.fields, Fields::Unit)) {
            let constants = variants
                .iter()
                .map(|(v, attrs)| {
                    let ident = v.ident.to_string();
                    attrs.rename.clone().unwrap_or_else(|| match &container.rename_all {
                        Some(rule) => apply_rename_rule(rule, &ident),
                        None => ident,
                    })
                })
                .collect();
            return TemplateBody::Enum(constants);
        }

        let mut subtypes = Vec::with_capacity(variants.len());
        for (variant, attrs) in &variants {
            let Fields::Unnamed(unnamed) = &variant.fields else {
                return TemplateBody::Unsupported;
            };
            if unnamed.unnamed.len() != 1 {
                return TemplateBody::Unsupported;
            }
            let ty = self.resolve(&unnamed.unnamed[0].ty, scope);
            let alias = attrs.rename.clone().unwrap_or_else(|| {
                ty.simple_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| variant.ident.to_string())
            });
            subtypes.push(SubtypeDeclaration { ty, alias });
        }
        TemplateBody::Union(subtypes)
    }

    /// Append the fields of `fields` (flattened fields expanded in place) to `out`
    fn expand_fields(
        &self,
        owner: &TypeIdentity,
        fields: &[FieldTemplate],
        bindings: &HashMap<String, TypeIdentity>,
        out: &mut Vec<FieldDescriptor>,
        visited: &mut HashSet<String>,
    ) {
        for field in fields {
            let ty = substitute(&field.ty, bindings);
            if !field.flatten {
                out.push(FieldDescriptor {
                    declaring_type: owner.clone(),
                    name: field.name.clone(),
                    ty,
                    is_static: field.is_static,
                });
                continue;
            }

            let inner = ty
                .qualified_name()
                .and_then(|path| self.templates.get(path).map(|t| (path, t)));
            match inner {
                Some((path, template)) => {
                    let TemplateBody::Struct(inner_fields) = &template.body else {
                        debug!("Flattened field {} is not a struct; skipped", field.name);
                        continue;
                    };
                    if !visited.insert(path.to_string()) {
                        debug!("Recursive flatten through {}; skipped", path);
                        continue;
                    }
                    let inner_bindings = template.bind(ty.type_arguments());
                    self.expand_fields(&ty, inner_fields, &inner_bindings, out, visited);
                }
                None => debug!(
                    "Flattened field {} has no struct declaration; skipped",
                    field.name
                ),
            }
        }
    }
}

impl TypeCatalog for SourceCatalog {
    fn declaration(&self, ty: &TypeIdentity) -> Option<Declaration> {
        let path = ty.qualified_name()?;
        let template = self.templates.get(path)?;
        let bindings = template.bind(ty.type_arguments());
        match &template.body {
            TemplateBody::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                let mut visited = HashSet::from([path.to_string()]);
                self.expand_fields(ty, fields, &bindings, &mut out, &mut visited);
                Some(Declaration::Object { fields: out })
            }
            TemplateBody::Newtype(inner) => Some(Declaration::Transparent(substitute(inner, &bindings))),
            TemplateBody::Enum(constants) => Some(Declaration::Enum {
                constants: constants.clone(),
            }),
            TemplateBody::Union(_) => Some(Declaration::Object { fields: Vec::new() }),
            TemplateBody::Unsupported => None,
        }
    }

    fn field_attributes(&self, field: &FieldDescriptor) -> FieldAttributes {
        field
            .declaring_type
            .qualified_name()
            .and_then(|path| {
                self.attributes
                    .get(&(path.to_string(), field.name.clone()))
                    .cloned()
            })
            .unwrap_or_default()
    }

    fn subtypes(&self, ty: &TypeIdentity) -> Vec<SubtypeDeclaration> {
        let Some(template) = ty.qualified_name().and_then(|p| self.templates.get(p)) else {
            return Vec::new();
        };
        let TemplateBody::Union(subtypes) = &template.body else {
            return Vec::new();
        };
        let bindings = template.bind(ty.type_arguments());
        subtypes
            .iter()
            .map(|s| SubtypeDeclaration {
                ty: substitute(&s.ty, &bindings),
                alias: s.alias.clone(),
            })
            .collect()
    }
}

impl TypeTemplate {
    fn bind(&self, args: &[TypeIdentity]) -> HashMap<String, TypeIdentity> {
        self.params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect()
    }
}

impl SymbolIndex {
    /// Canonical path for a path written inside `module`
    fn resolve_segments(&self, module: &[String], segments: &[String]) -> String {
        if let [name] = segments {
            return self.resolve_name(module, name);
        }
        let first = segments[0].as_str();
        if matches!(first, "crate" | "self" | "super") {
            return relative_path(module, segments);
        }
        if let Some(target) = self.imports_of(module).and_then(|i| i.named.get(first)) {
            let mut full = split_path(&self.resolve_import(module, target));
            full.extend(segments[1..].iter().cloned());
            return full.join("::");
        }
        self.local_or_external(module, segments)
    }

    fn resolve_name(&self, module: &[String], name: &str) -> String {
        if let Some(target) = self.imports_of(module).and_then(|i| i.named.get(name)) {
            return self.resolve_import(module, target);
        }
        let local = format!("{}::{}", module_key(module), name);
        if self.items.contains(&local) {
            return local;
        }
        if PRELUDE.contains(&name) {
            return name.to_string();
        }
        if let Some(imports) = self.imports_of(module) {
            for glob in &imports.globs {
                let candidate = format!("{}::{}", self.resolve_import(module, glob), name);
                if self.items.contains(&candidate) {
                    return candidate;
                }
            }
        }
        match self.by_name.get(name).map(Vec::as_slice) {
            Some([only]) => only.clone(),
            _ => name.to_string(),
        }
    }

    fn resolve_import(&self, module: &[String], segments: &[String]) -> String {
        match segments.first().map(String::as_str) {
            Some("crate" | "self" | "super") => relative_path(module, segments),
            Some(_) => self.local_or_external(module, segments),
            None => String::new(),
        }
    }

    /// Child module of `module`, then top-level module, then external crate
    fn local_or_external(&self, module: &[String], segments: &[String]) -> String {
        let child = format!("{}::{}", module_key(module), segments[0]);
        if self.modules.contains(&child) {
            return format!("{}::{}", module_key(module), segments.join("::"));
        }
        let top = format!("{}::{}", CRATE_ROOT, segments[0]);
        if self.modules.contains(&top) {
            return format!("{}::{}", CRATE_ROOT, segments.join("::"));
        }
        segments.join("::")
    }

    fn imports_of(&self, module: &[String]) -> Option<&ModuleImports> {
        self.imports.get(&module_key(module))
    }

    /// Literal value of a default function referenced from `module`
    fn default_value(&self, module: &[String], function: &str) -> Option<Value> {
        let segments = split_path(function.trim());
        let path = match segments.as_slice() {
            [name] => match self.imports_of(module).and_then(|i| i.named.get(name)) {
                Some(target) => self.resolve_import(module, target),
                None => format!("{}::{}", module_key(module), name),
            },
            _ => self.resolve_segments(module, &segments),
        };
        let value = self.defaults.get(&path).cloned();
        if value.is_none() {
            debug!("Default function {} has no literal body", path);
        }
        value
    }
}

fn collect_items<'a>(
    items: &'a [Item],
    module: &[String],
    index: &mut SymbolIndex,
    pending: &mut Vec<PendingDecl<'a>>,
) {
    for item in items {
        let ident = match item {
            Item::Struct(s) => Some(&s.ident),
            Item::Enum(e) => Some(&e.ident),
            Item::Type(t) => Some(&t.ident),
            _ => None,
        };
        if let Some(ident) = ident {
            let name = ident.to_string();
            let path = format!("{}::{}", module_key(module), name);
            index.items.insert(path.clone());
            let entries = index.by_name.entry(name).or_default();
            if !entries.contains(&path) {
                entries.push(path.clone());
            }
            pending.push(PendingDecl {
                path,
                module: module.to_vec(),
                item,
            });
            continue;
        }

        match item {
            Item::Use(item_use) => {
                let imports = index.imports.entry(module_key(module)).or_default();
                collect_use(&item_use.tree, Vec::new(), imports);
            }
            Item::Fn(func) => {
                if let Some(value) = literal_body(func) {
                    let path = format!("{}::{}", module_key(module), func.sig.ident);
                    index.defaults.insert(path, value);
                }
            }
            Item::Mod(item_mod) => {
                let mut child = module.to_vec();
                child.push(item_mod.ident.to_string());
                index.modules.insert(module_key(&child));
                if let Some((_, content)) = &item_mod.content {
                    collect_items(content, &child, index, pending);
                }
            }
            _ => {}
        }
    }
}

fn collect_use(tree: &UseTree, mut prefix: Vec<String>, imports: &mut ModuleImports) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use(&path.tree, prefix, imports);
        }
        UseTree::Name(name) => {
            if name.ident == "self" {
                if let Some(alias) = prefix.last().cloned() {
                    imports.named.insert(alias, prefix);
                }
            } else {
                let alias = name.ident.to_string();
                prefix.push(alias.clone());
                imports.named.insert(alias, prefix);
            }
        }
        UseTree::Rename(rename) => {
            if rename.ident != "self" {
                prefix.push(rename.ident.to_string());
            }
            imports.named.insert(rename.rename.to_string(), prefix);
        }
        UseTree::Glob(_) => imports.globs.push(prefix),
        UseTree::Group(group) => {
            for item in &group.items {
                collect_use(item, prefix.clone(), imports);
            }
        }
    }
}

/// `crate`, `self` and `super` paths made absolute
fn relative_path(module: &[String], segments: &[String]) -> String {
    let mut base: Vec<String> = module.to_vec();
    let mut rest = segments;
    match segments.first().map(String::as_str) {
        Some("crate") => {
            base.clear();
            rest = &segments[1..];
        }
        Some("self") => rest = &segments[1..],
        _ => {
            while let Some((first, tail)) = rest.split_first() {
                if first != "super" {
                    break;
                }
                base.pop();
                rest = tail;
            }
        }
    }
    base.extend(rest.iter().cloned());
    module_key(&base)
}

fn module_key(module: &[String]) -> String {
    if module.is_empty() {
        CRATE_ROOT.to_string()
    } else {
        format!("{}::{}", CRATE_ROOT, module.join("::"))
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split("::").map(str::to_string).collect()
}

fn type_params(generics: &syn::Generics) -> Vec<String> {
    generics.type_params().map(|p| p.ident.to_string()).collect()
}

fn self_identity(path: &str, params: &[String]) -> TypeIdentity {
    TypeIdentity::generic(
        path,
        params
            .iter()
            .map(|p| TypeIdentity::TypeVariable(p.clone()))
            .collect(),
    )
}

fn is_phantom(ty: &TypeIdentity) -> bool {
    !ty.is_project_type() && ty.simple_name() == Some("PhantomData")
}

/// Replace bound type variables throughout `ty`
fn substitute(ty: &TypeIdentity, bindings: &HashMap<String, TypeIdentity>) -> TypeIdentity {
    if bindings.is_empty() {
        return ty.clone();
    }
    match ty {
        TypeIdentity::TypeVariable(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        TypeIdentity::Array(inner) => TypeIdentity::Array(Box::new(substitute(inner, bindings))),
        TypeIdentity::Reference { path, args } => TypeIdentity::generic(
            path.clone(),
            args.iter().map(|a| substitute(a, bindings)).collect(),
        ),
        other => other.clone(),
    }
}

fn field_attributes_for(
    name: &str,
    ty: &TypeIdentity,
    serde: &SerdeFieldAttrs,
    container: &ContainerAttrs,
    attrs: &[Attribute],
) -> FieldAttributes {
    let rename = serde.rename.clone().or_else(|| {
        container
            .rename_all
            .as_deref()
            .map(|rule| apply_rename_rule(rule, name))
            .filter(|renamed| renamed != name)
    });

    let mut validation = parse_validation(attrs);
    let optional = matches!(ty.shape(), TypeShape::Optional(_));
    let may_be_absent = optional || serde.default || serde.skip_serializing_if || container.default;
    if !may_be_absent {
        validation.not_null = true;
    }

    FieldAttributes {
        rename,
        ignored: serde.skip,
        validation,
        default_value: None,
    }
}

/// Convert a Rust identifier according to a serde `rename_all` rule
fn apply_rename_rule(rule: &str, name: &str) -> String {
    match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_upper_camel_case(),
        "camelCase" => name.to_lower_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_shouty_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_shouty_kebab_case(),
        _ => name.to_string(),
    }
}

fn parse_container_attrs(attrs: &[Attribute]) -> ContainerAttrs {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                out.rename_all = parse_serialize_name(&meta)?;
            } else if meta.path.is_ident("default") {
                out.default = true;
                skip_value(&meta)?;
            } else if meta.path.is_ident("transparent") {
                out.transparent = true;
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            debug!("Ignoring malformed serde attribute: {}", e);
        }
    }
    out
}

fn parse_serde_field(attrs: &[Attribute]) -> SerdeFieldAttrs {
    let mut out = SerdeFieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                out.rename = parse_serialize_name(&meta)?;
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                out.skip = true;
            } else if meta.path.is_ident("flatten") {
                out.flatten = true;
            } else if meta.path.is_ident("default") {
                out.default = true;
                if meta.input.peek(Token![=]) {
                    let function: LitStr = meta.value()?.parse()?;
                    out.default_fn = Some(function.value());
                }
            } else if meta.path.is_ident("skip_serializing_if") {
                out.skip_serializing_if = true;
                skip_value(&meta)?;
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            debug!("Ignoring malformed serde attribute: {}", e);
        }
    }
    out
}

/// `name = "x"` or `name(serialize = "x", deserialize = "y")`
fn parse_serialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        let value: LitStr = meta.value()?.parse()?;
        return Ok(Some(value.value()));
    }
    let mut serialize = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            let value: LitStr = inner.value()?.parse()?;
            serialize = Some(value.value());
        } else {
            skip_value(&inner)?;
        }
        Ok(())
    })?;
    Ok(serialize)
}

/// Consume the value of a nested meta item we do not interpret
fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_value(&inner))?;
    }
    Ok(())
}

fn parse_validation(attrs: &[Attribute]) -> ValidationFacts {
    let mut facts = ValidationFacts::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("required") {
                facts.not_null = true;
            } else if meta.path.is_ident("not_blank") {
                facts.not_blank = true;
            } else if meta.path.is_ident("not_empty") {
                facts.not_empty = true;
            } else if meta.path.is_ident("email") {
                facts.format = Some("email".to_string());
                skip_value(&meta)?;
            } else if meta.path.is_ident("url") {
                facts.format = Some("uri".to_string());
                skip_value(&meta)?;
            } else if meta.path.is_ident("length") {
                let mut size = SizeBounds::default();
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("min") {
                        size.min = literal_text(&inner.value()?.parse()?);
                    } else if inner.path.is_ident("max") {
                        size.max = literal_text(&inner.value()?.parse()?);
                    } else if inner.path.is_ident("equal") {
                        let exact = literal_text(&inner.value()?.parse()?);
                        size.min = exact.clone();
                        size.max = exact;
                    } else {
                        skip_value(&inner)?;
                    }
                    Ok(())
                })?;
                facts.size = Some(size);
            } else if meta.path.is_ident("range") {
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("min") {
                        facts.minimum = literal_text(&inner.value()?.parse()?);
                    } else if inner.path.is_ident("max") {
                        facts.maximum = literal_text(&inner.value()?.parse()?);
                    } else {
                        skip_value(&inner)?;
                    }
                    Ok(())
                })?;
            } else if meta.path.is_ident("regex") || meta.path.is_ident("pattern") {
                if meta.input.peek(Token![=]) {
                    let expr: Expr = meta.value()?.parse()?;
                    facts.pattern = string_literal(&expr);
                } else {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("pattern") {
                            let expr: Expr = inner.value()?.parse()?;
                            facts.pattern = string_literal(&expr);
                        } else {
                            skip_value(&inner)?;
                        }
                        Ok(())
                    })?;
                }
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            debug!("Ignoring malformed validate attribute: {}", e);
        }
    }
    facts
}

/// Source text of a literal, with negation folded in
fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Int(i) => Some(i.base10_digits().to_string()),
            syn::Lit::Float(f) => Some(f.base10_digits().to_string()),
            syn::Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            literal_text(&unary.expr).map(|text| format!("-{}", text))
        }
        Expr::Paren(paren) => literal_text(&paren.expr),
        Expr::Group(group) => literal_text(&group.expr),
        _ => None,
    }
}

/// Value of a function taking no arguments whose body is a single literal
fn literal_body(func: &syn::ItemFn) -> Option<Value> {
    if !func.sig.inputs.is_empty() {
        return None;
    }
    match func.block.stmts.as_slice() {
        [syn::Stmt::Expr(expr, _)] => literal_value(expr),
        _ => None,
    }
}

/// JSON value of a literal expression, looking through `.to_string()`, `From::from` and
/// `return`
fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Str(s) => Some(Value::String(s.value())),
            syn::Lit::Int(i) => i.base10_parse::<i64>().ok().map(Value::from),
            syn::Lit::Float(f) => f
                .base10_parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            syn::Lit::Bool(b) => Some(Value::Bool(b.value)),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            match literal_value(&unary.expr)? {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Some(Value::from(-i)),
                    None => n.as_f64().and_then(|f| serde_json::Number::from_f64(-f)).map(Value::Number),
                },
                _ => None,
            }
        }
        Expr::MethodCall(call)
            if call.args.is_empty()
                && matches!(call.method.to_string().as_str(), "to_string" | "to_owned" | "into") =>
        {
            literal_value(&call.receiver)
        }
        Expr::Call(call) if call.args.len() == 1 => match call.func.as_ref() {
            Expr::Path(path) if path.path.segments.last().is_some_and(|s| s.ident == "from") => {
                literal_value(&call.args[0])
            }
            _ => None,
        },
        Expr::Return(ret) => ret.expr.as_deref().and_then(literal_value),
        Expr::Paren(paren) => literal_value(&paren.expr),
        Expr::Group(group) => literal_value(&group.expr),
        _ => None,
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}
