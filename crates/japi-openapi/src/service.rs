//! Document generation entry points.

use std::sync::Arc;

use indexmap::IndexMap;
use japi_core::{ResourceGraph, ResourceTypeDescriptor};
use tracing::debug;

use crate::cache::{DocumentCache, DocumentKey};
use crate::config::{DocumentConfig, OpenApiConfig};
use crate::error::{Result, SynthesisError};
use crate::openapi::{Components, Info, OpenApiDocument, Server};
use crate::ordering::EndpointOrderingPass;
use crate::paths::PathGenerator;
use crate::schema::{DefaultStructuralGenerator, StructuralGenerator, SynthesisContext};

/// Builds one OpenAPI document from a resource graph.
///
/// Each call to [`generate`](Self::generate) runs a fresh synthesis; use
/// [`OpenApiService`] for cached access.
pub struct OpenApiGenerator<'a> {
    graph: &'a ResourceGraph,
    config: &'a OpenApiConfig,
    generator: &'a dyn StructuralGenerator,
}

impl<'a> OpenApiGenerator<'a> {
    #[must_use]
    pub fn new(graph: &'a ResourceGraph, config: &'a OpenApiConfig, generator: &'a dyn StructuralGenerator) -> Self {
        Self {
            graph,
            config,
            generator,
        }
    }

    /// Generates the document described by `document` for a server reachable
    /// at `{scheme}://{host}{base_path}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph describes an unreachable configuration
    /// or two components claim the same name.
    pub fn generate(
        &self,
        document: &DocumentConfig,
        scheme: &str,
        host: &str,
        base_path: &str,
    ) -> Result<OpenApiDocument> {
        debug!(document = %document.name, "Starting OpenAPI document build");

        let resource_types: Vec<&ResourceTypeDescriptor> = self
            .graph
            .list_resource_types()
            .iter()
            .filter(|rt| document.includes(&rt.public_name))
            .collect();

        let mut ctx = SynthesisContext::new(self.graph, self.generator, self.config.to_synthesis_options());
        let mut entries = PathGenerator::new(&mut ctx).generate(&resource_types)?;
        EndpointOrderingPass::apply(&mut entries);
        let schemas = ctx.into_components()?;

        let mut paths = IndexMap::with_capacity(entries.len());
        for entry in entries {
            paths.insert(entry.path, entry.item);
        }

        debug!(
            document = %document.name,
            resources = resource_types.len(),
            paths = paths.len(),
            schemas = schemas.len(),
            "OpenAPI document build complete"
        );

        Ok(OpenApiDocument {
            openapi: self.config.openapi_version.clone(),
            info: Info {
                title: document.title.clone().unwrap_or_else(|| self.config.title.clone()),
                version: self.config.api_version.clone(),
            },
            servers: vec![Server {
                url: format!("{scheme}://{host}{base_path}"),
            }],
            paths,
            components: Components { schemas },
        })
    }
}

/// Graph, configuration and cache behind the HTTP surface.
pub struct OpenApiService {
    graph: Arc<ResourceGraph>,
    config: OpenApiConfig,
    generator: Arc<dyn StructuralGenerator>,
    cache: DocumentCache,
}

impl OpenApiService {
    #[must_use]
    pub fn new(graph: Arc<ResourceGraph>, config: OpenApiConfig) -> Self {
        Self::with_generator(graph, config, Arc::new(DefaultStructuralGenerator))
    }

    #[must_use]
    pub fn with_generator(
        graph: Arc<ResourceGraph>,
        config: OpenApiConfig,
        generator: Arc<dyn StructuralGenerator>,
    ) -> Self {
        Self {
            graph,
            config,
            generator,
            cache: DocumentCache::new(),
        }
    }

    pub fn config(&self) -> &OpenApiConfig {
        &self.config
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Returns the named document, building it on first request.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::DocumentNotFound`] for an unknown name and
    /// the build error otherwise.
    pub fn document(
        &self,
        name: &str,
        scheme: &str,
        host: &str,
        base_path: &str,
    ) -> Result<Arc<OpenApiDocument>> {
        let document = self
            .config
            .find_document(name)
            .ok_or_else(|| SynthesisError::DocumentNotFound(name.to_string()))?;

        let key = DocumentKey::new(name, host, base_path);
        self.cache.get_or_build(&key, || {
            OpenApiGenerator::new(&self.graph, &self.config, self.generator.as_ref())
                .generate(document, scheme, host, base_path)
        })
    }
}
