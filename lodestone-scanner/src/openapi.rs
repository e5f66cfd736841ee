//! OpenAPI / Swagger document strategy.
//!
//! Unlike the service-tree domain this source is a single static JSON
//! document: the whole hierarchy is materialized up front in `root()` and
//! `open()` never touches the transport. The shape exported is
//! info -> tag -> endpoint -> method -> parameter/response groups, with
//! response payload schemas flattened into dotted-ish `->` field names.

use crate::error::{Result, ScanError};
use crate::walker::{OpenNode, SchemaStrategy};
use lodestone_core::ident::IdentBuilder;
use lodestone_core::link::DedupPolicy;
use lodestone_core::record::TableSpec;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const INFO_CLASS: &str = "custom.openapi.Info";
pub const TAG_CLASS: &str = "custom.openapi.Tag";
pub const ENDPOINT_CLASS: &str = "custom.openapi.Endpoint";
pub const METHOD_CLASS: &str = "custom.openapi.Method";
pub const PARAMETER_GROUP_CLASS: &str = "custom.openapi.ParameterGroup";
pub const PARAMETER_CLASS: &str = "custom.openapi.Parameter";
pub const RESPONSE_GROUP_CLASS: &str = "custom.openapi.ResponseGroup";
pub const RESPONSE_CLASS: &str = "custom.openapi.Response";
pub const RESPONSE_FIELD_CLASS: &str = "custom.openapi.ResponseField";

pub const RESOURCE_LINK: &str = "core.ResourceParentChild";
pub const INFO_TAG_LINK: &str = "custom.openapi.InfoToTag";
pub const TAG_ENDPOINT_LINK: &str = "custom.openapi.TagToEndpoint";
pub const ENDPOINT_METHOD_LINK: &str = "custom.openapi.EndpointToMethod";
pub const METHOD_PARAMETER_GROUP_LINK: &str = "custom.openapi.MethodToParameterGroup";
pub const PARAMETER_GROUP_PARAMETER_LINK: &str = "custom.openapi.ParameterGroupToParameter";
pub const METHOD_RESPONSE_GROUP_LINK: &str = "custom.openapi.MethodToResponseGroup";
pub const RESPONSE_GROUP_RESPONSE_LINK: &str = "custom.openapi.ResponseGroupToResponse";
pub const RESPONSE_RESPONSE_FIELD_LINK: &str = "custom.openapi.ResponseToResponseField";

/// Title to fall back on when the document carries no `info.title`.
pub const UNTITLED: &str = "unknown_specification";

const HTTP_VERBS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Tag applied to operations that declare none, so every method still
/// hangs off the tag level of the hierarchy.
const DEFAULT_TAG: &str = "default";

/// Schema keys that are annotations rather than payload fields.
const SKIP_KEYS: [&str; 5] = ["example", "format", "enum", "xml", "description"];

// The hierarchy as plain owned data, fully built before the walk starts.

pub struct InfoNode {
    pub title: String,
    pub description: String,
    pub contact_email: String,
    pub contact_name: String,
    pub contact_url: String,
    pub license_name: String,
    pub license_url: String,
    pub terms_of_service: String,
    pub version: String,
    pub tags: Vec<TagNode>,
}

pub struct TagNode {
    pub name: String,
    pub description: String,
    pub endpoints: Vec<EndpointNode>,
}

pub struct EndpointNode {
    pub path: String,
    pub methods: Vec<MethodNode>,
}

pub struct MethodNode {
    pub verb: String,
    pub description: String,
    pub parameters: Vec<ParameterNode>,
    pub responses: Vec<ResponseNode>,
}

pub struct ParameterNode {
    pub name: String,
    pub description: String,
}

pub struct ResponseNode {
    pub code: String,
    pub description: String,
    pub fields: Vec<ResponseFieldNode>,
}

pub struct ResponseFieldNode {
    pub name: String,
    pub default: String,
    pub example: String,
    pub format: String,
    pub kind: String,
}

/// Traversal positions in the document hierarchy.
pub enum ApiNode {
    Info(InfoNode),
    Tag(TagNode),
    Endpoint(EndpointNode),
    Method(MethodNode),
    ParameterGroup(Vec<ParameterNode>),
    Parameter(ParameterNode),
    ResponseGroup(Vec<ResponseNode>),
    Response(ResponseNode),
    ResponseField(ResponseFieldNode),
}

enum Source {
    Document(Value),
    File(PathBuf),
}

pub struct OpenApiStrategy {
    source: Option<Source>,
}

impl OpenApiStrategy {
    pub fn new(document: Value) -> Self {
        Self {
            source: Some(Source::Document(document)),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(Source::File(path.into())),
        }
    }
}

impl SchemaStrategy for OpenApiStrategy {
    type Node = ApiNode;

    fn tables(&self) -> Vec<TableSpec> {
        vec![
            TableSpec::new(
                INFO_CLASS,
                &[
                    "custom.openapi.ContactEmail",
                    "custom.openapi.ContactName",
                    "custom.openapi.ContactURL",
                    "custom.openapi.LicenseName",
                    "custom.openapi.LicenseURL",
                    "custom.openapi.TermsOfService",
                    "custom.openapi.Version",
                ],
            ),
            TableSpec::new(TAG_CLASS, &[]),
            TableSpec::new(ENDPOINT_CLASS, &[]),
            TableSpec::new(METHOD_CLASS, &[]),
            TableSpec::new(PARAMETER_GROUP_CLASS, &[]),
            TableSpec::new(PARAMETER_CLASS, &[]),
            TableSpec::new(RESPONSE_GROUP_CLASS, &[]),
            TableSpec::new(RESPONSE_CLASS, &[]),
            TableSpec::new(
                RESPONSE_FIELD_CLASS,
                &[
                    "custom.openapi.Default",
                    "custom.openapi.Example",
                    "custom.openapi.Format",
                    "custom.openapi.Type",
                ],
            ),
        ]
    }

    fn link_policy(&self) -> DedupPolicy {
        // A tag shared by several operations would otherwise repeat its
        // info->tag edge for every occurrence.
        DedupPolicy::DedupExact
    }

    fn ident(&self) -> IdentBuilder {
        IdentBuilder::document()
    }

    fn root(&mut self) -> Result<ApiNode> {
        let document = match self.source.take() {
            Some(Source::Document(value)) => value,
            Some(Source::File(path)) => {
                let body = std::fs::read_to_string(&path)?;
                serde_json::from_str(&body).map_err(|source| ScanError::Parse {
                    context: format!("document {}", path.display()),
                    source,
                })?
            }
            None => {
                return Err(ScanError::InvalidUrl(
                    "document source already consumed".to_string(),
                ))
            }
        };
        Ok(ApiNode::Info(build_info(&document)))
    }

    fn scan_limited(&self, node: &ApiNode) -> bool {
        matches!(node, ApiNode::Endpoint(_))
    }

    fn open(&mut self, node: ApiNode) -> Result<OpenNode<ApiNode>> {
        Ok(match node {
            ApiNode::Info(info) => {
                debug!("specification {}: {} tags", info.title, info.tags.len());
                OpenNode {
                    kind: INFO_CLASS,
                    // Identifiers are lowercase; the name column keeps the
                    // title's original casing.
                    segment: info.title.to_lowercase(),
                    name: info.title,
                    description: info.description,
                    extras: vec![
                        info.contact_email,
                        info.contact_name,
                        info.contact_url,
                        info.license_name,
                        info.license_url,
                        info.terms_of_service,
                        info.version,
                    ],
                    association: RESOURCE_LINK.to_string(),
                    children: info.tags.into_iter().map(ApiNode::Tag).collect(),
                }
            }
            ApiNode::Tag(tag) => OpenNode {
                kind: TAG_CLASS,
                segment: tag.name.to_lowercase(),
                name: tag.name,
                description: tag.description,
                extras: vec![],
                association: INFO_TAG_LINK.to_string(),
                children: tag.endpoints.into_iter().map(ApiNode::Endpoint).collect(),
            },
            ApiNode::Endpoint(endpoint) => OpenNode {
                kind: ENDPOINT_CLASS,
                segment: endpoint.path.clone(),
                name: endpoint.path,
                description: String::new(),
                extras: vec![],
                association: TAG_ENDPOINT_LINK.to_string(),
                children: endpoint.methods.into_iter().map(ApiNode::Method).collect(),
            },
            ApiNode::Method(method) => {
                // Group nodes exist only when they would have children.
                let mut children = Vec::new();
                if !method.parameters.is_empty() {
                    children.push(ApiNode::ParameterGroup(method.parameters));
                }
                if !method.responses.is_empty() {
                    children.push(ApiNode::ResponseGroup(method.responses));
                }
                OpenNode {
                    kind: METHOD_CLASS,
                    segment: method.verb.clone(),
                    name: method.verb.to_uppercase(),
                    description: method.description,
                    extras: vec![],
                    association: ENDPOINT_METHOD_LINK.to_string(),
                    children,
                }
            }
            ApiNode::ParameterGroup(parameters) => OpenNode {
                kind: PARAMETER_GROUP_CLASS,
                segment: "(parameters)".to_string(),
                name: "(parameters)".to_string(),
                description: String::new(),
                extras: vec![],
                association: METHOD_PARAMETER_GROUP_LINK.to_string(),
                children: parameters.into_iter().map(ApiNode::Parameter).collect(),
            },
            ApiNode::Parameter(parameter) => OpenNode {
                kind: PARAMETER_CLASS,
                segment: parameter.name.clone(),
                name: parameter.name,
                description: parameter.description,
                extras: vec![],
                association: PARAMETER_GROUP_PARAMETER_LINK.to_string(),
                children: vec![],
            },
            ApiNode::ResponseGroup(responses) => OpenNode {
                kind: RESPONSE_GROUP_CLASS,
                segment: "(responses)".to_string(),
                name: "(responses)".to_string(),
                description: String::new(),
                extras: vec![],
                association: METHOD_RESPONSE_GROUP_LINK.to_string(),
                children: responses.into_iter().map(ApiNode::Response).collect(),
            },
            ApiNode::Response(response) => OpenNode {
                kind: RESPONSE_CLASS,
                segment: response.code.clone(),
                name: response.code,
                description: response.description,
                extras: vec![],
                association: RESPONSE_GROUP_RESPONSE_LINK.to_string(),
                children: response
                    .fields
                    .into_iter()
                    .map(ApiNode::ResponseField)
                    .collect(),
            },
            ApiNode::ResponseField(field) => OpenNode {
                kind: RESPONSE_FIELD_CLASS,
                segment: field.name.clone(),
                name: field.name,
                description: String::new(),
                extras: vec![field.default, field.example, field.format, field.kind],
                association: RESPONSE_RESPONSE_FIELD_LINK.to_string(),
                children: vec![],
            },
        })
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn build_info(document: &Value) -> InfoNode {
    let info = document.get("info");
    let field = |key: &str| text(info.and_then(|i| i.get(key)));
    let nested = |obj: &str, key: &str| text(info.and_then(|i| i.get(obj)).and_then(|o| o.get(key)));

    let title = match info.and_then(|i| i.get("title")).and_then(Value::as_str) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            warn!("document has no info.title, using {}", UNTITLED);
            UNTITLED.to_string()
        }
    };

    let tags = collect_tags(document);
    info!(
        "specification '{}' version {}: {} tags",
        title,
        field("version"),
        tags.len()
    );

    InfoNode {
        title,
        description: field("description"),
        contact_email: nested("contact", "email"),
        contact_name: nested("contact", "name"),
        contact_url: nested("contact", "url"),
        license_name: nested("license", "name"),
        license_url: nested("license", "url"),
        terms_of_service: field("termsOfService"),
        version: field("version"),
        tags,
    }
}

/// Union of the declared tag list and the first tag of every operation,
/// matched case-insensitively, in document order: declared tags first,
/// then undeclared ones as the paths section introduces them. The record
/// keeps the first-seen casing; only identifiers lowercase it. Each
/// operation files under its first tag only.
fn collect_tags(document: &Value) -> Vec<TagNode> {
    let mut tags: Vec<TagNode> = Vec::new();

    if let Some(declared) = document.get("tags").and_then(Value::as_array) {
        for tag in declared {
            let name = text(tag.get("name"));
            if name.is_empty() || tags.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
                continue;
            }
            tags.push(TagNode {
                name,
                description: text(tag.get("description")),
                endpoints: Vec::new(),
            });
        }
    }

    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        warn!("document has no paths section");
        return tags;
    };

    for (path, item) in paths {
        let Some(operations) = item.as_object() else {
            continue;
        };
        for (verb, operation) in operations {
            if !HTTP_VERBS.contains(&verb.as_str()) {
                continue;
            }
            let tag_name = operation
                .get("tags")
                .and_then(Value::as_array)
                .and_then(|t| t.first())
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_TAG.to_string());

            let tag = match tags
                .iter_mut()
                .find(|t| t.name.eq_ignore_ascii_case(&tag_name))
            {
                Some(tag) => tag,
                None => {
                    tags.push(TagNode {
                        name: tag_name,
                        description: String::new(),
                        endpoints: Vec::new(),
                    });
                    tags.last_mut().unwrap()
                }
            };

            let endpoint = match tag.endpoints.iter_mut().find(|e| e.path == *path) {
                Some(endpoint) => endpoint,
                None => {
                    tag.endpoints.push(EndpointNode {
                        path: path.clone(),
                        methods: Vec::new(),
                    });
                    tag.endpoints.last_mut().unwrap()
                }
            };
            endpoint.methods.push(build_method(verb, operation));
        }
    }

    tags
}

fn build_method(verb: &str, operation: &Value) -> MethodNode {
    let description = match operation.get("description") {
        Some(Value::String(d)) if !d.is_empty() => d.clone(),
        _ => text(operation.get("summary")),
    };

    let parameters = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .map(|p| ParameterNode {
                    name: text(p.get("name")),
                    description: text(p.get("description")),
                })
                .collect()
        })
        .unwrap_or_default();

    let responses = operation
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| {
            responses
                .iter()
                .map(|(code, response)| ResponseNode {
                    code: code.clone(),
                    description: text(response.get("description")),
                    fields: response_fields(response),
                })
                .collect()
        })
        .unwrap_or_default();

    MethodNode {
        verb: verb.to_string(),
        description,
        parameters,
        responses,
    }
}

/// Locate the payload schema of a response in either the inline (Swagger
/// 2.0 `schema`) or media-type (OpenAPI 3.x `content`) position and
/// flatten its properties.
fn response_fields(response: &Value) -> Vec<ResponseFieldNode> {
    let schema = response.get("schema").or_else(|| {
        response
            .get("content")
            .and_then(|c| c.get("application/json"))
            .and_then(|m| m.get("schema"))
    });
    let Some(schema) = schema else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    if let Some(properties) = schema_properties(schema) {
        flatten_properties(properties, "", &mut fields);
    }
    fields
}

/// Resolve a schema object to its property map, looking through array
/// items and `allOf` composition (first branch only).
fn schema_properties(schema: &Value) -> Option<&Map<String, Value>> {
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        return Some(properties);
    }
    if let Some(items) = schema.get("items") {
        return schema_properties(items);
    }
    if let Some(first) = schema
        .get("allOf")
        .and_then(Value::as_array)
        .and_then(|branches| branches.first())
    {
        return schema_properties(first);
    }
    None
}

/// Depth-first flatten of a property map. Nested object properties are
/// joined into the field name with `->`; only leaves become fields, and
/// leaves keep their scalar annotations as columns.
fn flatten_properties(
    properties: &Map<String, Value>,
    prefix: &str,
    out: &mut Vec<ResponseFieldNode>,
) {
    for (key, value) in properties {
        if SKIP_KEYS.contains(&key.as_str()) {
            continue;
        }
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}->{}", prefix, key)
        };

        let composite = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("properties") || obj.contains_key("items"));
        if composite {
            if let Some(nested) = schema_properties(value) {
                flatten_properties(nested, &name, out);
                continue;
            }
            // An array of scalars has items but no property map; it
            // stays a leaf typed as an array.
        }

        out.push(ResponseFieldNode {
            name,
            default: text(value.get("default")),
            example: text(value.get("example")),
            format: text(value.get("format")),
            kind: text(value.get("type")),
        });
    }
}
