use crate::catalog::TypeCatalog;
use crate::compiler::wrapper::{apply_template, EnvelopeMeta, Payload, WrapperStripper};
use crate::compiler::SchemaCompiler;
use crate::config::{glob_patterns, CompilerConfig, IgnoreConfig, MediaTypeNormalize};
use crate::error::Result;
use crate::extractor::{Endpoint, EndpointParam, HttpMethod};
use glob::Pattern;
use crate::schema::{PayloadSchema, SchemaNode};
use crate::types::{TypeIdentity, TypeShape};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

pub const OPENAPI_VERSION: &str = "3.0.3";

/// OpenAPI document builder
pub struct OpenApiBuilder {
    info: Info,
    /// Media type of JSON bodies; form and multipart bodies use their own
    media_type: String,
    media_type_normalize: MediaTypeNormalize,
    ignore: IgnoreConfig,
    ignored_paths: Vec<Pattern>,
    compiler: SchemaCompiler,
    stripper: WrapperStripper,
    endpoints: Vec<Endpoint>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: SchemaNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaType {
    pub schema: PayloadSchema,
    /// Metadata of the envelope the payload was taken out of
    #[serde(rename = "x-envelope", skip_serializing_if = "Option::is_none")]
    pub envelope: Option<EnvelopeExtension>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnvelopeExtension {
    #[serde(rename = "type")]
    pub wrapper_type: String,
    pub metadata: Value,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Components {
    pub schemas: BTreeMap<String, SchemaNode>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiBuilder {
    pub fn new(config: &CompilerConfig, catalog: Arc<dyn TypeCatalog>) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: config.title.clone(),
                version: config.version.clone(),
            },
            media_type: config.media_type.clone(),
            media_type_normalize: config.media_type_normalize.clone(),
            ignore: config.ignore.clone(),
            ignored_paths: glob_patterns(&config.ignore.paths),
            compiler: SchemaCompiler::new(config, catalog),
            stripper: WrapperStripper::new(&config.wrappers),
            endpoints: Vec::new(),
        }
    }

    /// Queue an endpoint for the document, unless its path is ignored
    pub fn add_endpoint(&mut self, endpoint: Endpoint) {
        if self.ignored_paths.iter().any(|p| p.matches(&endpoint.path)) {
            debug!("Ignoring endpoint: {} {}", endpoint.method, endpoint.path);
            return;
        }
        debug!("Adding endpoint: {} {}", endpoint.method, endpoint.path);
        self.endpoints.push(endpoint);
    }

    pub fn add_endpoints(&mut self, endpoints: impl IntoIterator<Item = Endpoint>) {
        for endpoint in endpoints {
            self.add_endpoint(endpoint);
        }
    }

    /// Compile every payload type and assemble the document.
    ///
    /// Distinct root types are compiled in parallel against the shared compiler; the
    /// document itself is assembled in a fixed order so output does not depend on
    /// scheduling.
    pub fn build(self) -> Result<OpenApiDocument> {
        debug!("Building final OpenAPI document");
        let plans: Vec<OperationPlan> = self
            .endpoints
            .iter()
            .map(|endpoint| self.plan(endpoint))
            .collect();

        let roots: BTreeSet<&TypeIdentity> = plans.iter().flat_map(OperationPlan::types).collect();
        info!("Compiling {} root types", roots.len());
        let compiled: HashMap<TypeIdentity, SchemaNode> = roots
            .into_par_iter()
            .map(|ty| self.compiler.compile(ty).map(|schema| (ty.clone(), schema)))
            .collect::<Result<_>>()?;

        let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
        for plan in &plans {
            let operation = self.operation(plan, &compiled);
            let item = paths.entry(plan.endpoint.path.clone()).or_default();
            let slot = match plan.endpoint.method {
                HttpMethod::Get => &mut item.get,
                HttpMethod::Put => &mut item.put,
                HttpMethod::Post => &mut item.post,
                HttpMethod::Delete => &mut item.delete,
                HttpMethod::Options => &mut item.options,
                HttpMethod::Head => &mut item.head,
                HttpMethod::Patch => &mut item.patch,
            };
            if slot.is_some() {
                warn!(
                    "Duplicate operation {} {}; keeping the first",
                    plan.endpoint.method,
                    plan.endpoint.path
                );
                continue;
            }
            *slot = Some(operation);
        }

        let schemas: BTreeMap<String, SchemaNode> = self.compiler.into_components().into_iter().collect();
        let components = if schemas.is_empty() {
            None
        } else {
            Some(Components { schemas })
        };

        Ok(OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            paths,
            components,
        })
    }

    fn plan<'a>(&self, endpoint: &'a Endpoint) -> OperationPlan<'a> {
        let request = endpoint
            .request_body
            .as_ref()
            .and_then(|ty| self.stripper.payload(Some(ty), true))
            .map(|mut payload| {
                let inner = match payload.ty.shape() {
                    TypeShape::Optional(Some(inner)) => Some(inner.clone()),
                    _ => None,
                };
                if let Some(inner) = inner {
                    payload.ty = inner;
                    payload.required = false;
                }
                payload
            });
        let response = self.stripper.payload(endpoint.response.as_ref(), true);
        let parameters = endpoint
            .parameters
            .iter()
            .filter(|param| !self.ignore.is_parameter_ignored(&param.name))
            .map(|param| (param, parameter_type(param)))
            .collect();
        OperationPlan {
            endpoint,
            parameters,
            request,
            response,
        }
    }

    fn operation(
        &self,
        plan: &OperationPlan,
        compiled: &HashMap<TypeIdentity, SchemaNode>,
    ) -> Operation {
        let schema_of = |ty: &TypeIdentity| compiled.get(ty).cloned().unwrap_or_default();

        let parameters = plan
            .parameters
            .iter()
            .map(|(param, ty)| Parameter {
                name: param.name.clone(),
                location: param.location.as_str().to_string(),
                required: param.required,
                schema: schema_of(ty),
                example: param.example.clone(),
            })
            .collect();

        let request_media = plan.endpoint.body_kind.media_type(&self.media_type);
        let request_body = plan.request.as_ref().map(|payload| RequestBody {
            required: payload.required,
            content: self.content(request_media, payload, schema_of(&payload.ty)),
        });

        let response = Response {
            description: "OK".to_string(),
            content: plan
                .response
                .as_ref()
                .map(|payload| self.content(&self.media_type, payload, schema_of(&payload.ty))),
        };

        Operation {
            operation_id: plan.endpoint.operation_id.clone(),
            summary: format!("{} {}", plan.endpoint.method, plan.endpoint.path),
            parameters,
            request_body,
            responses: BTreeMap::from([("200".to_string(), response)]),
        }
    }

    fn content(
        &self,
        media_type: &str,
        payload: &Payload,
        schema: SchemaNode,
    ) -> BTreeMap<String, MediaType> {
        let (schema, envelope) = match &payload.envelope {
            Some(meta) => (apply_template(meta, &schema), envelope_extension(meta)),
            None => (PayloadSchema::Node(schema), None),
        };
        let key = self.media_type_normalize.normalize(media_type);
        BTreeMap::from([(key, MediaType { schema, envelope })])
    }
}

/// Payload types of one endpoint, ready for compilation
struct OperationPlan<'a> {
    endpoint: &'a Endpoint,
    parameters: Vec<(&'a EndpointParam, TypeIdentity)>,
    request: Option<Payload>,
    response: Option<Payload>,
}

impl OperationPlan<'_> {
    fn types(&self) -> Vec<&TypeIdentity> {
        self.parameters
            .iter()
            .map(|(_, ty)| ty)
            .chain(self.request.iter().map(|p| &p.ty))
            .chain(self.response.iter().map(|p| &p.ty))
            .collect()
    }
}

/// Parameters carry optionality in `required`, so `Option` is looked through
fn parameter_type(param: &EndpointParam) -> TypeIdentity {
    match param.ty.shape() {
        TypeShape::Optional(Some(inner)) => inner.clone(),
        _ => param.ty.clone(),
    }
}

fn envelope_extension(meta: &EnvelopeMeta) -> Option<EnvelopeExtension> {
    meta.metadata.as_ref().map(|metadata| EnvelopeExtension {
        wrapper_type: meta.wrapper_type.clone(),
        metadata: metadata.clone(),
    })
}
