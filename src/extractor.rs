//! Route extraction for attribute-routed handlers.
//!
//! Handlers are recognized by actix-style route macros (`#[get("/users/{id}")]`,
//! `#[route("/x", method = "GET")]`). Each one becomes an [`Endpoint`] whose parameter,
//! request and response types are resolved through the [`SourceCatalog`], so they carry
//! the same identities the schema compiler sees.

use crate::catalog::{SourceCatalog, TypeCatalog};
use crate::source::SourceFile;
use crate::types::{Declaration, TypeIdentity, TypeShape};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;
use syn::punctuated::Punctuated;
use syn::visit::Visit;
use syn::{Attribute, Expr, Lit, Pat, Token};

/// One operation of the service
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// OpenAPI path template, e.g. `/users/{id}`
    pub path: String,
    pub method: HttpMethod,
    /// Unique per run; the handler name, module-qualified on clashes
    pub operation_id: String,
    pub parameters: Vec<EndpointParam>,
    /// Request body type as taken by the handler
    pub request_body: Option<TypeIdentity>,
    /// Wire encoding of the request body
    pub body_kind: BodyKind,
    /// Return type as written; envelopes are stripped later
    pub response: Option<TypeIdentity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointParam {
    pub name: String,
    pub location: ParameterLocation,
    pub ty: TypeIdentity,
    pub required: bool,
    /// Value of the field's `#[serde(default = "...")]` function, when it is a literal
    pub example: Option<serde_json::Value>,
}

/// How a request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// `Json<T>`; emitted under the configured media type
    #[default]
    Json,
    /// `Form<T>`
    Form,
    /// `MultipartForm<T>` or a raw `Multipart` stream
    Multipart,
}

impl BodyKind {
    /// Content key for a body of this kind
    pub fn media_type<'a>(&self, configured: &'a str) -> &'a str {
        match self {
            BodyKind::Json => configured,
            BodyKind::Form => "application/x-www-form-urlencoded",
            BodyKind::Multipart => "multipart/form-data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl HttpMethod {
    /// Parse a route macro name or a `method = "..."` value
    pub fn parse(method: &str) -> Option<HttpMethod> {
        match method.to_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "head" => Some(HttpMethod::Head),
            "options" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Lowercase name as used for OpenAPI path item keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Extractor for route-macro handlers
pub struct RouteExtractor;

impl RouteExtractor {
    /// Extract every endpoint declared in `files`
    pub fn extract(&self, files: &[SourceFile], catalog: &SourceCatalog) -> Vec<Endpoint> {
        let mut found = Vec::new();
        for file in files {
            let mut visitor = HandlerVisitor {
                catalog,
                module: file.module_path.clone(),
                found: Vec::new(),
            };
            visitor.visit_file(&file.syntax);
            debug!(
                "Found {} handlers in {}",
                visitor.found.len(),
                file.path.display()
            );
            found.extend(visitor.found);
        }

        let endpoints = assign_operation_ids(found);
        debug!("Extracted {} endpoints", endpoints.len());
        endpoints
    }
}

/// Endpoint before operation ids are made unique
struct FoundHandler {
    module: Vec<String>,
    handler: String,
    endpoint: Endpoint,
}

struct HandlerVisitor<'a> {
    catalog: &'a SourceCatalog,
    module: Vec<String>,
    found: Vec<FoundHandler>,
}

impl<'ast> Visit<'ast> for HandlerVisitor<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.handler(&node.attrs, &node.sig);
        syn::visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.handler(&node.attrs, &node.sig);
        syn::visit::visit_impl_item_fn(self, node);
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        self.module.push(node.ident.to_string());
        syn::visit::visit_item_mod(self, node);
        self.module.pop();
    }
}

impl HandlerVisitor<'_> {
    fn handler(&mut self, attrs: &[Attribute], sig: &syn::Signature) {
        let routes: Vec<(HttpMethod, String)> = attrs.iter().flat_map(parse_route_attr).collect();
        if routes.is_empty() {
            return;
        }

        let handler = sig.ident.to_string();
        let response = match &sig.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => Some(self.resolve(ty)),
        };

        for (method, raw_path) in routes {
            let (path, placeholders) = normalize_path(&raw_path);
            debug!("Handler {} serves {} {}", handler, method, path);
            let mut parameters: Vec<EndpointParam> = placeholders
                .into_iter()
                .map(|name| EndpointParam {
                    name,
                    location: ParameterLocation::Path,
                    ty: TypeIdentity::named("String"),
                    required: true,
                    example: None,
                })
                .collect();
            let body = self.read_arguments(sig, &mut parameters);
            let (request_body, body_kind) = match body {
                Some((ty, kind)) => (Some(ty), kind),
                None => (None, BodyKind::default()),
            };

            self.found.push(FoundHandler {
                module: self.module.clone(),
                handler: handler.clone(),
                endpoint: Endpoint {
                    path,
                    method,
                    operation_id: handler.clone(),
                    parameters,
                    request_body,
                    body_kind,
                    response: response.clone(),
                },
            });
        }
    }

    /// Apply the handler's extractor arguments; returns the request body type and encoding
    fn read_arguments(
        &self,
        sig: &syn::Signature,
        parameters: &mut Vec<EndpointParam>,
    ) -> Option<(TypeIdentity, BodyKind)> {
        let mut request_body = None;
        for input in &sig.inputs {
            let syn::FnArg::Typed(pat_type) = input else {
                continue;
            };
            if is_multipart_stream(&pat_type.ty) {
                request_body = Some((self.resolve(&pat_type.ty), BodyKind::Multipart));
                continue;
            }
            let Some((extractor, inner)) = extractor_parts(&pat_type.ty) else {
                continue;
            };
            let binding = binding_name(&pat_type.pat);
            match extractor.as_str() {
                "Json" => request_body = Some((self.resolve(inner), BodyKind::Json)),
                "Form" => request_body = Some((self.resolve(inner), BodyKind::Form)),
                "MultipartForm" => request_body = Some((self.resolve(inner), BodyKind::Multipart)),
                "Path" => self.type_path_params(inner, parameters),
                "Query" => self.add_query_params(inner, binding, parameters),
                "Header" => parameters.push(EndpointParam {
                    name: binding.unwrap_or_else(|| "header".to_string()),
                    location: ParameterLocation::Header,
                    ty: self.resolve(inner),
                    required: true,
                    example: None,
                }),
                _ => {}
            }
        }
        request_body
    }

    /// Retype `{name}` placeholders from a `Path<T>` extractor
    fn type_path_params(&self, inner: &syn::Type, parameters: &mut [EndpointParam]) {
        if let syn::Type::Tuple(tuple) = inner {
            let path_params = parameters
                .iter_mut()
                .filter(|p| p.location == ParameterLocation::Path);
            for (param, elem) in path_params.zip(tuple.elems.iter()) {
                param.ty = self.resolve(elem);
            }
            return;
        }

        let ty = self.resolve(inner);
        if let Some(Declaration::Object { fields }) = self.catalog.declaration(&ty) {
            for field in fields {
                let name = self
                    .catalog
                    .field_attributes(&field)
                    .rename
                    .unwrap_or_else(|| field.name.clone());
                if let Some(param) = parameters.iter_mut().find(|p| p.name == name) {
                    param.ty = field.ty;
                }
            }
            return;
        }

        let mut path_params = parameters
            .iter_mut()
            .filter(|p| p.location == ParameterLocation::Path);
        if let (Some(param), None) = (path_params.next(), path_params.next()) {
            param.ty = ty;
        }
    }

    /// A struct expands to one parameter per field; anything else is a single parameter
    fn add_query_params(
        &self,
        inner: &syn::Type,
        binding: Option<String>,
        parameters: &mut Vec<EndpointParam>,
    ) {
        let ty = self.resolve(inner);
        if let Some(Declaration::Object { fields }) = self.catalog.declaration(&ty) {
            if !fields.is_empty() {
                for field in fields.iter().filter(|f| !f.is_static) {
                    let attributes = self.catalog.field_attributes(field);
                    if attributes.ignored {
                        continue;
                    }
                    // A defaulted field may be left out of the query string
                    let required = !is_optional(&field.ty) && attributes.default_value.is_none();
                    parameters.push(EndpointParam {
                        name: attributes.rename.unwrap_or_else(|| field.name.clone()),
                        location: ParameterLocation::Query,
                        required,
                        ty: field.ty.clone(),
                        example: attributes.default_value,
                    });
                }
                return;
            }
        }

        parameters.push(EndpointParam {
            name: binding.unwrap_or_else(|| "query".to_string()),
            location: ParameterLocation::Query,
            required: !is_optional(&ty),
            ty,
            example: None,
        });
    }

    fn resolve(&self, ty: &syn::Type) -> TypeIdentity {
        self.catalog.resolve_type(ty, &self.module)
    }
}

fn is_optional(ty: &TypeIdentity) -> bool {
    matches!(ty.shape(), TypeShape::Optional(_))
}

/// Method and path of a route macro, if `attr` is one
fn parse_route_attr(attr: &Attribute) -> Vec<(HttpMethod, String)> {
    let Some(name) = attr.path().segments.last().map(|s| s.ident.to_string()) else {
        return Vec::new();
    };
    let fixed = HttpMethod::parse(&name);
    if fixed.is_none() && name != "route" {
        return Vec::new();
    }

    let args = match attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
        Ok(args) => args,
        Err(e) => {
            debug!("Ignoring route attribute #[{}]: {}", name, e);
            return Vec::new();
        }
    };
    let Some(path) = args.first().and_then(string_literal) else {
        return Vec::new();
    };

    match fixed {
        Some(method) => vec![(method, path)],
        None => args
            .iter()
            .filter_map(|arg| match arg {
                Expr::Assign(assign) if is_ident(&assign.left, "method") => {
                    string_literal(&assign.right).and_then(|m| HttpMethod::parse(&m))
                }
                _ => None,
            })
            .map(|method| (method, path.clone()))
            .collect(),
    }
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Path(p) if p.path.is_ident(name))
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit_str) => Some(lit_str.value()),
            _ => None,
        },
        _ => None,
    }
}

/// Strip `{name:regex}` patterns down to `{name}`; returns the placeholder names
fn normalize_path(raw: &str) -> (String, Vec<String>) {
    let mut path = String::with_capacity(raw.len());
    let mut names = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find('{') {
        let Some(close) = matching_brace(&rest[open..]) else {
            break;
        };
        path.push_str(&rest[..open]);
        let inner = &rest[open + 1..open + close];
        let name = inner.split(':').next().unwrap_or(inner).trim().to_string();
        path.push('{');
        path.push_str(&name);
        path.push('}');
        names.push(name);
        rest = &rest[open + close + 1..];
    }
    path.push_str(rest);
    (path, names)
}

/// Offset of the brace closing the one at the start of `s`
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extractor name and its type argument, e.g. `web::Json<User>` gives `("Json", User)`
fn extractor_parts(ty: &syn::Type) -> Option<(String, &syn::Type)> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let name = segment.ident.to_string();
    if !matches!(
        name.as_str(),
        "Json" | "Form" | "MultipartForm" | "Path" | "Query" | "Header"
    ) {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(inner) => Some((name.clone(), inner)),
        _ => None,
    })
}

/// A bare `Multipart` argument streams the body without a typed payload
fn is_multipart_stream(ty: &syn::Type) -> bool {
    let syn::Type::Path(type_path) = ty else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .is_some_and(|s| s.ident == "Multipart" && s.arguments.is_none())
}

/// Variable name bound by an argument pattern, looking through `Query(q)` style patterns
fn binding_name(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(ident) => Some(ident.ident.to_string()),
        Pat::TupleStruct(tuple) if tuple.elems.len() == 1 => binding_name(&tuple.elems[0]),
        Pat::Type(typed) => binding_name(&typed.pat),
        _ => None,
    }
}

/// Handler names become operation ids; clashing names get their module prefixed
fn assign_operation_ids(found: Vec<FoundHandler>) -> Vec<Endpoint> {
    let mut modules: HashMap<&str, HashSet<&[String]>> = HashMap::new();
    for handler in &found {
        modules
            .entry(handler.handler.as_str())
            .or_default()
            .insert(handler.module.as_slice());
    }
    let clashing: HashSet<String> = modules
        .into_iter()
        .filter(|(_, modules)| modules.len() > 1)
        .map(|(name, _)| name.to_string())
        .collect();

    let mut taken: HashMap<String, usize> = HashMap::new();
    found
        .into_iter()
        .map(|handler| {
            let mut endpoint = handler.endpoint;
            let mut id = handler.handler.clone();
            if clashing.contains(&handler.handler) && !handler.module.is_empty() {
                id = format!("{}_{}", handler.module.join("_"), handler.handler);
            }
            let seen = taken.entry(id.clone()).or_default();
            *seen += 1;
            if *seen > 1 {
                id = format!("{}_{}", id, endpoint.method.as_str());
            }
            endpoint.operation_id = id;
            endpoint
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;
    use pretty_assertions::assert_eq;

    fn extract(sources: &[(&str, &str)]) -> Vec<Endpoint> {
        let files: Vec<SourceFile> = sources
            .iter()
            .map(|(module, code)| {
                let segments: Vec<&str> = module.split("::").filter(|s| !s.is_empty()).collect();
                SourceFile::parse_str(&segments, code).unwrap()
            })
            .collect();
        let catalog = SourceCatalog::new(&files);
        RouteExtractor.extract(&files, &catalog)
    }

    #[test]
    fn test_simple_get_route() {
        let endpoints = extract(&[(
            "",
            r#"
            use actix_web::{get, HttpResponse};

            #[get("/hello")]
            async fn hello() -> HttpResponse {
                HttpResponse::Ok().body("Hello, World!")
            }

            fn not_a_handler() {}
            "#,
        )]);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/hello");
        assert_eq!(endpoints[0].method, HttpMethod::Get);
        assert_eq!(endpoints[0].operation_id, "hello");
        assert_eq!(
            endpoints[0].response,
            Some(TypeIdentity::named("actix_web::HttpResponse"))
        );
    }

    #[test]
    fn test_multiple_http_methods() {
        let endpoints = extract(&[(
            "",
            r#"
            #[get("/resource")] async fn get_resource() {}
            #[post("/resource")] async fn create_resource() {}
            #[put("/resource")] async fn update_resource() {}
            #[delete("/resource")] async fn delete_resource() {}
            #[patch("/resource")] async fn patch_resource() {}
            #[actix_web::head("/resource")] async fn head_resource() {}
            "#,
        )]);
        let methods: Vec<HttpMethod> = endpoints.iter().map(|e| e.method).collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Put,
                HttpMethod::Delete,
                HttpMethod::Patch,
                HttpMethod::Head
            ]
        );
        assert!(endpoints.iter().all(|e| e.response.is_none()));
    }

    #[test]
    fn test_route_macro_with_methods() {
        let endpoints = extract(&[(
            "",
            r#"
            #[route("/ping", method = "GET", method = "HEAD", wrap = "Logger")]
            async fn ping() -> &'static str { "pong" }
            "#,
        )]);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].operation_id, "ping");
        assert_eq!(endpoints[1].operation_id, "ping_head");
        assert_eq!(endpoints[1].response, Some(TypeIdentity::named("str")));
    }

    #[test]
    fn test_path_parameters_from_tuple() {
        let endpoints = extract(&[(
            "",
            r#"
            use actix_web::web;
            #[get("/users/{user_id}/posts/{slug:[a-z-]+}")]
            async fn get_post(path: web::Path<(u64, String)>) -> String { todo!() }
            "#,
        )]);
        let endpoint = &endpoints[0];
        assert_eq!(endpoint.path, "/users/{user_id}/posts/{slug}");
        assert_eq!(
            endpoint.parameters,
            vec![
                EndpointParam {
                    name: "user_id".into(),
                    location: ParameterLocation::Path,
                    ty: TypeIdentity::Primitive(PrimitiveType::U64),
                    required: true,
                    example: None,
                },
                EndpointParam {
                    name: "slug".into(),
                    location: ParameterLocation::Path,
                    ty: TypeIdentity::named("String"),
                    required: true,
                    example: None,
                },
            ]
        );
    }

    #[test]
    fn test_path_parameters_from_struct_and_scalar() {
        let endpoints = extract(&[(
            "",
            r#"
            pub struct Ids { pub org: uuid::Uuid, pub team: u32 }
            #[get("/orgs/{org}/teams/{team}")]
            async fn team(ids: Path<Ids>) {}
            #[delete("/items/{id}")]
            async fn remove(Path(id): Path<i64>) {}
            "#,
        )]);
        assert_eq!(endpoints[0].parameters[0].ty, TypeIdentity::named("uuid::Uuid"));
        assert_eq!(
            endpoints[0].parameters[1].ty,
            TypeIdentity::Primitive(PrimitiveType::U32)
        );
        assert_eq!(
            endpoints[1].parameters[0].ty,
            TypeIdentity::Primitive(PrimitiveType::I64)
        );
    }

    #[test]
    fn test_query_header_and_body() {
        let endpoints = extract(&[
            (
                "models",
                r#"
                pub struct Paging { pub page: u32, #[serde(rename = "per_page")] pub size: Option<u32> }
                pub struct NewUser { pub name: String }
                pub struct User { pub id: u64 }
                "#,
            ),
            (
                "handlers",
                r#"
                use crate::models::{NewUser, Paging, User};
                use actix_web::{web, HttpRequest};

                #[post("/users")]
                async fn create(
                    req: HttpRequest,
                    paging: web::Query<Paging>,
                    search: web::Query<Option<String>>,
                    agent: web::Header<String>,
                    body: web::Json<NewUser>,
                ) -> Result<web::Json<User>, Error> {
                    todo!()
                }
                "#,
            ),
        ]);
        let endpoint = &endpoints[0];
        let params: Vec<(&str, ParameterLocation, bool)> = endpoint
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location, p.required))
            .collect();
        assert_eq!(
            params,
            vec![
                ("page", ParameterLocation::Query, true),
                ("per_page", ParameterLocation::Query, false),
                ("search", ParameterLocation::Query, false),
                ("agent", ParameterLocation::Header, true),
            ]
        );
        assert_eq!(
            endpoint.request_body,
            Some(TypeIdentity::named("crate::models::NewUser"))
        );
        assert_eq!(endpoint.body_kind, BodyKind::Json);
        assert_eq!(
            endpoint.response,
            Some(TypeIdentity::generic(
                "Result",
                vec![
                    TypeIdentity::generic(
                        "actix_web::web::Json",
                        vec![TypeIdentity::named("crate::models::User")]
                    ),
                    TypeIdentity::named("Error"),
                ]
            ))
        );
    }

    #[test]
    fn test_form_and_multipart_bodies() {
        let endpoints = extract(&[(
            "",
            r#"
            use actix_multipart::Multipart;
            use actix_web::web::Form;

            pub struct Login { pub user: String, pub password: String }
            pub struct Upload { pub name: String }

            #[post("/login")]
            async fn login(f: Form<Login>) -> String { todo!() }
            #[post("/upload")]
            async fn upload(form: MultipartForm<Upload>) {}
            #[post("/stream")]
            async fn stream(payload: Multipart) {}
            #[get("/plain")]
            async fn plain() {}
            "#,
        )]);
        let bodies: Vec<(Option<TypeIdentity>, BodyKind)> = endpoints
            .iter()
            .map(|e| (e.request_body.clone(), e.body_kind))
            .collect();
        assert_eq!(
            bodies,
            vec![
                (Some(TypeIdentity::named("crate::Login")), BodyKind::Form),
                (Some(TypeIdentity::named("crate::Upload")), BodyKind::Multipart),
                (
                    Some(TypeIdentity::named("actix_multipart::Multipart")),
                    BodyKind::Multipart
                ),
                (None, BodyKind::Json),
            ]
        );
        assert_eq!(
            BodyKind::Form.media_type("application/json"),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(BodyKind::Multipart.media_type("text/plain"), "multipart/form-data");
        assert_eq!(BodyKind::Json.media_type("application/vnd.api+json"), "application/vnd.api+json");
    }

    #[test]
    fn test_query_field_default_becomes_example() {
        let endpoints = extract(&[(
            "",
            r#"
            fn default_page() -> u32 { 1 }
            fn default_sort() -> String { "name".to_string() }

            pub struct Listing {
                #[serde(default = "default_page")]
                pub page: u32,
                #[serde(default = "default_sort")]
                pub sort: String,
                pub filter: String,
            }

            #[get("/items")]
            async fn list(q: Query<Listing>) {}
            "#,
        )]);
        let params: Vec<(&str, bool, Option<serde_json::Value>)> = endpoints[0]
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.required, p.example.clone()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("page", false, Some(serde_json::json!(1))),
                ("sort", false, Some(serde_json::json!("name"))),
                ("filter", true, None),
            ]
        );
    }

    #[test]
    fn test_handlers_in_inline_modules_and_impls() {
        let endpoints = extract(&[(
            "api",
            r#"
            pub mod v1 {
                pub struct Item { pub id: u32 }
                #[get("/v1/items")]
                async fn list() -> Vec<Item> { vec![] }
            }
            pub struct Handlers;
            impl Handlers {
                #[get("/v2/items")]
                async fn list() -> Vec<v1::Item> { vec![] }
            }
            "#,
        )]);
        assert_eq!(endpoints.len(), 2);
        let item = TypeIdentity::named("crate::api::v1::Item");
        for endpoint in &endpoints {
            assert_eq!(
                endpoint.response,
                Some(TypeIdentity::generic("Vec", vec![item.clone()]))
            );
        }
        assert_eq!(endpoints[0].operation_id, "api_v1_list");
        assert_eq!(endpoints[1].operation_id, "api_list");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/a/{id}/b/{tail:.*}"),
            ("/a/{id}/b/{tail}".to_string(), vec!["id".to_string(), "tail".to_string()])
        );
        assert_eq!(
            normalize_path("/n/{num:\\d{2,3}}"),
            ("/n/{num}".to_string(), vec!["num".to_string()])
        );
        assert_eq!(normalize_path("/plain"), ("/plain".to_string(), vec![]));
    }

    #[test]
    fn test_normalize_path_keeps_unbalanced_brace() {
        assert_eq!(normalize_path("/a/{id"), ("/a/{id".to_string(), vec![]));
        assert_eq!(
            normalize_path("/a/{id}/b/{rest"),
            ("/a/{id}/b/{rest".to_string(), vec!["id".to_string()])
        );

        let endpoints = extract(&[("", r#"#[get("/a/{id")] async fn broken() {}"#)]);
        assert_eq!(endpoints[0].path, "/a/{id");
        assert!(endpoints[0].parameters.is_empty());
    }

    #[test]
    fn test_malformed_route_is_ignored() {
        let endpoints = extract(&[(
            "",
            r#"
            #[get(path)] async fn a() {}
            #[get] async fn b() {}
            #[route("/x")] async fn c() {}
            "#,
        )]);
        assert!(endpoints.is_empty());
    }
}
