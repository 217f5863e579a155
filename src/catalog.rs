//! A loaded Swagger document and the views derived from it.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::DocumentError;
use crate::generator::{CyclePolicy, ExampleGenerator};
use crate::schema::SchemaDocument;
use crate::swagger::{collect_tags, extract_operations, ApiOperation};

/// Owns one Swagger document. Read-only between explicit reloads.
#[derive(Debug, Clone)]
pub struct Catalog {
    source: Option<PathBuf>,
    schema: SchemaDocument,
    operations: Vec<ApiOperation>,
}

impl Catalog {
    /// Read and parse a Swagger JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let swagger = read_swagger(path)?;
        let mut catalog = Self::from_value(&swagger)?;
        catalog.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            definitions = catalog.schema.len(),
            operations = catalog.operations.len(),
            "loaded swagger document"
        );
        Ok(catalog)
    }

    /// Build from an in-memory document. Such a catalog cannot be reloaded.
    pub fn from_value(swagger: &Value) -> Result<Self, DocumentError> {
        Ok(Self {
            source: None,
            schema: SchemaDocument::from_swagger(swagger)?,
            operations: extract_operations(swagger),
        })
    }

    /// Re-read the source file. On failure the current contents are kept.
    pub fn reload(&mut self) -> Result<(), DocumentError> {
        let path = self.source.clone().ok_or(DocumentError::NotReloadable)?;
        match Self::load(&path) {
            Ok(fresh) => {
                *self = fresh;
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "reload failed, keeping previous document");
                Err(err)
            }
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn schema(&self) -> &SchemaDocument {
        &self.schema
    }

    pub fn operations(&self) -> &[ApiOperation] {
        &self.operations
    }

    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.schema.names()
    }

    /// Distinct operation tags in document order.
    pub fn tags(&self) -> Vec<&str> {
        collect_tags(&self.operations)
    }

    /// A generator over this catalog's definitions.
    pub fn generator(&self, policy: CyclePolicy) -> ExampleGenerator<'_> {
        ExampleGenerator::new(&self.schema).cycle_policy(policy)
    }
}

fn read_swagger(path: &Path) -> Result<Value, DocumentError> {
    let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(DocumentError::Parse)
}
