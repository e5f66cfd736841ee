//! ArcGIS REST services directory strategy.
//!
//! Walks a remote directory: server root, optional folders, services
//! filtered by type, layers, fields. Every level past the service
//! references is fetched lazily with `?f=pjson`, one blocking GET at a
//! time, so the scan limit can stop before paying for skipped subtrees.

use crate::error::{Result, ScanError};
use crate::fetch::{Fetch, HttpFetcher};
use crate::walker::{OpenNode, SchemaStrategy};
use lodestone_core::ident::IdentBuilder;
use lodestone_core::link::DedupPolicy;
use lodestone_core::record::TableSpec;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

pub const SERVER_CLASS: &str = "arcgis.rest.customV4.Server";
pub const SERVICE_CLASS: &str = "arcgis.rest.customV4.Service";
pub const LAYER_CLASS: &str = "arcgis.rest.customV4.Layer";
pub const FIELD_CLASS: &str = "arcgis.rest.customV4.Field";
pub const FOLDER_CLASS: &str = "arcgis.rest.customV4.Folder";

pub const RESOURCE_LINK: &str = "core.ResourceParentChild";
pub const SERVER_SERVICE_LINK: &str = "arcgis.rest.customV4.ServerContainsService";
pub const SERVICE_LAYER_LINK: &str = "arcgis.rest.customV4.ServiceContainsLayer";
pub const LAYER_FIELD_LINK: &str = "arcgis.rest.customV4.LayerContainsField";
pub const SERVER_FOLDER_LINK: &str = "arcgis.rest.customV4.ServerToFolder";
pub const FOLDER_SERVICE_LINK: &str = "arcgis.rest.customV4.FolderToService";

pub const ARCHIVE_NAME: &str = "arcgis_custom_metadata_cdgc";

const PJSON: &[(&str, &str)] = &[("f", "pjson")];

// Directory documents, typed with every optional child collection
// explicit. Missing collections are schema gaps, not errors.

#[derive(Debug, Deserialize)]
pub struct DirectoryDoc {
    #[serde(rename = "currentVersion")]
    pub current_version: Option<f64>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceDoc {
    #[serde(rename = "copyrightText", default)]
    pub copyright: String,
    #[serde(rename = "hasVersionedData")]
    pub has_versioned_data: Option<bool>,
    #[serde(rename = "maxRecordCount")]
    pub max_record_count: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub layers: Vec<LayerRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LayerDoc {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "copyrightText", default)]
    pub copyright: String,
    #[serde(rename = "maxRecordCount")]
    pub max_record_count: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    #[serde(default)]
    pub layers: Vec<SubLayerDoc>,
}

#[derive(Debug, Deserialize)]
pub struct SubLayerDoc {
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Traversal positions in the service tree.
pub enum GisNode {
    Server,
    Folder {
        name: String,
    },
    Service {
        reference: ServiceRef,
        in_folder: Option<String>,
    },
    Layer {
        reference: LayerRef,
        service_url: String,
    },
    Field {
        field: FieldDoc,
        position: usize,
    },
}

pub struct ArcGisStrategy<F: Fetch> {
    fetcher: F,
    root_url: String,
    server_name: String,
    allowed_kinds: Vec<String>,
}

impl ArcGisStrategy<HttpFetcher> {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_fetcher(url, HttpFetcher::new())
    }
}

impl<F: Fetch> ArcGisStrategy<F> {
    pub fn with_fetcher(url: &str, fetcher: F) -> Result<Self> {
        let root_url = url.trim_end_matches('/').to_string();
        let server_name = server_name_from_url(&root_url)?;
        Ok(Self {
            fetcher,
            root_url,
            server_name,
            allowed_kinds: vec!["FeatureServer".to_string(), "MapServer".to_string()],
        })
    }

    pub fn with_allowed_kinds(mut self, kinds: Vec<String>) -> Self {
        if !kinds.is_empty() {
            self.allowed_kinds = kinds;
        }
        self
    }

    fn service_url(&self, reference: &ServiceRef) -> String {
        reference.url.clone().unwrap_or_else(|| {
            format!("{}/{}/{}", self.root_url, reference.name, reference.kind)
        })
    }

    fn open_server(&mut self) -> Result<OpenNode<GisNode>> {
        let value = self.fetcher.get_json(&self.root_url, PJSON)?;
        let doc = parse_doc::<DirectoryDoc>(value, &self.root_url)?;

        info!(
            "server version: {:?}, services: {}, folders: {}",
            doc.current_version,
            doc.services.len(),
            doc.folders.len()
        );

        let mut children: Vec<GisNode> = doc
            .services
            .into_iter()
            .map(|reference| GisNode::Service {
                reference,
                in_folder: None,
            })
            .collect();
        children.extend(doc.folders.into_iter().map(|name| GisNode::Folder { name }));

        Ok(OpenNode {
            kind: SERVER_CLASS,
            segment: self.server_name.clone(),
            name: self.server_name.clone(),
            description: self.root_url.clone(),
            extras: vec![],
            association: RESOURCE_LINK.to_string(),
            children,
        })
    }

    fn open_folder(&mut self, name: String) -> Result<OpenNode<GisNode>> {
        let url = format!("{}/{}", self.root_url, name);
        let value = self.fetcher.get_json(&url, PJSON)?;
        if value.get("services").is_none() {
            warn!("folder {} has no services collection", name);
        }
        let doc = parse_doc::<DirectoryDoc>(value, &url)?;

        info!("folder {}: {} services", name, doc.services.len());
        let children = doc
            .services
            .into_iter()
            .map(|reference| GisNode::Service {
                reference,
                in_folder: Some(name.clone()),
            })
            .collect();

        Ok(OpenNode {
            kind: FOLDER_CLASS,
            segment: name.clone(),
            name,
            description: String::new(),
            extras: vec![],
            association: SERVER_FOLDER_LINK.to_string(),
            children,
        })
    }

    fn open_service(
        &mut self,
        reference: ServiceRef,
        in_folder: Option<String>,
    ) -> Result<OpenNode<GisNode>> {
        let service_url = self.service_url(&reference);
        let value = self.fetcher.get_json(&service_url, PJSON)?;
        if value.get("layers").is_none() {
            warn!("service {} has no layers collection", reference.name);
        }
        let doc = parse_doc::<ServiceDoc>(value, &service_url)?;

        info!("service {}: {} layers", reference.name, doc.layers.len());

        let children = doc
            .layers
            .into_iter()
            .map(|layer| GisNode::Layer {
                reference: layer,
                service_url: service_url.clone(),
            })
            .collect();

        let association = if in_folder.is_some() {
            FOLDER_SERVICE_LINK
        } else {
            SERVER_SERVICE_LINK
        };

        // A folder-hosted service is usually named "<folder>/<name>"; the
        // folder is already a breadcrumb level, so the prefix comes off
        // before the segment is derived.
        let segment = match &in_folder {
            Some(folder) => reference
                .name
                .strip_prefix(&format!("{}/", folder))
                .unwrap_or(&reference.name)
                .to_string(),
            None => reference.name.clone(),
        };

        Ok(OpenNode {
            kind: SERVICE_CLASS,
            segment,
            name: reference.name,
            description: service_description(&service_url),
            extras: vec![
                doc.copyright,
                doc.has_versioned_data
                    .map(|b| b.to_string())
                    .unwrap_or_default(),
                doc.max_record_count
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                doc.description,
            ],
            association: association.to_string(),
            children,
        })
    }

    fn open_layer(
        &mut self,
        reference: LayerRef,
        service_url: String,
    ) -> Result<OpenNode<GisNode>> {
        let layer_url = format!("{}/{}", service_url, reference.id);
        let value = self.fetcher.get_json(&layer_url, PJSON)?;
        if value.get("fields").is_none() {
            warn!("layer {} has no field list", reference.id);
        }
        let doc = parse_doc::<LayerDoc>(value, &layer_url)?;
        let layer_id = doc.id.unwrap_or(reference.id);

        debug!(
            "layer {} ({}): {} fields, {} sublayers",
            layer_id,
            doc.name,
            doc.fields.len(),
            doc.layers.len()
        );

        // Fields of nested sublayers hang off the parent layer; their
        // positions restart per sublayer, matching the export format.
        let mut children: Vec<GisNode> = doc
            .fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| GisNode::Field {
                field,
                position: i + 1,
            })
            .collect();
        for sublayer in doc.layers {
            children.extend(sublayer.fields.into_iter().enumerate().map(|(i, field)| {
                GisNode::Field {
                    field,
                    position: i + 1,
                }
            }));
        }

        Ok(OpenNode {
            kind: LAYER_CLASS,
            segment: layer_id.to_string(),
            name: doc.name,
            description: layer_description(layer_id, &layer_url),
            extras: vec![
                doc.copyright,
                doc.max_record_count
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                doc.description,
            ],
            association: SERVICE_LAYER_LINK.to_string(),
            children,
        })
    }
}

impl<F: Fetch> SchemaStrategy for ArcGisStrategy<F> {
    type Node = GisNode;

    fn tables(&self) -> Vec<TableSpec> {
        vec![
            TableSpec::new(SERVER_CLASS, &[]),
            TableSpec::new(FOLDER_CLASS, &[]),
            TableSpec::new(
                SERVICE_CLASS,
                &[
                    "arcgis.rest.customV4.Copyright",
                    "arcgis.rest.customV4.HasVersionedData",
                    "arcgis.rest.customV4.MaxRecordCount",
                    "core.technicalDescription",
                ],
            ),
            TableSpec::new(
                LAYER_CLASS,
                &[
                    "arcgis.rest.customV4.Copyright",
                    "arcgis.rest.customV4.MaxRecordCount",
                    "core.technicalDescription",
                ],
            ),
            TableSpec::new(
                FIELD_CLASS,
                &["arcgis.rest.customV4.Type", "core.Position"],
            ),
        ]
    }

    fn link_policy(&self) -> DedupPolicy {
        // Strict tree: every (source, target) pair is visited once.
        DedupPolicy::AllowDuplicates
    }

    fn ident(&self) -> IdentBuilder {
        IdentBuilder::service_tree()
    }

    fn root(&mut self) -> Result<GisNode> {
        Ok(GisNode::Server)
    }

    fn included(&self, node: &GisNode) -> bool {
        match node {
            GisNode::Service { reference, .. } => {
                self.allowed_kinds.iter().any(|k| k == &reference.kind)
            }
            _ => true,
        }
    }

    fn scan_limited(&self, node: &GisNode) -> bool {
        matches!(node, GisNode::Service { .. })
    }

    fn open(&mut self, node: GisNode) -> Result<OpenNode<GisNode>> {
        match node {
            GisNode::Server => self.open_server(),
            GisNode::Folder { name } => self.open_folder(name),
            GisNode::Service {
                reference,
                in_folder,
            } => self.open_service(reference, in_folder),
            GisNode::Layer {
                reference,
                service_url,
            } => self.open_layer(reference, service_url),
            GisNode::Field { field, position } => Ok(OpenNode {
                kind: FIELD_CLASS,
                segment: field.name.clone(),
                name: field.name,
                description: field.alias,
                extras: vec![field.kind, position.to_string()],
                association: LAYER_FIELD_LINK.to_string(),
                children: vec![],
            }),
        }
    }
}

fn server_name_from_url(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ScanError::InvalidUrl(format!("cannot derive a server name from {}", url))
        })
}

fn parse_doc<T: serde::de::DeserializeOwned>(value: Value, url: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|source| ScanError::Parse {
        context: format!("document at {}", url),
        source,
    })
}

fn service_description(service_url: &str) -> String {
    let directory = format!(
        "<a href=\"{}\">ArcGIS REST Services Directory Link</a>",
        service_url
    );
    let map = format!(
        "<a href=\"http://www.arcgis.com/apps/mapviewer/index.html?url={}&source=sd\">ArcGIS Map Link</a>",
        service_url
    );
    let query = format!("<a href=\"{}/query\">ArcGIS Query Link</a>", service_url);
    format!("{}<br/>{}<br/>{}", directory, map, query)
}

fn layer_description(layer_id: i64, layer_url: &str) -> String {
    let directory = format!(
        "<a href=\"{}\">ArcGIS REST Services Directory Link</a>",
        layer_url
    );
    let map = format!(
        "<a href=\"http://www.arcgis.com/apps/mapviewer/index.html?url={}&source=sd\">ArcGIS Map Link</a>",
        layer_url
    );
    format!("Layer id: {}<br/>{}<br/>{}", layer_id, directory, map)
}
