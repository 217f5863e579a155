//! Explore the AvaTax REST API from its Swagger 2.0 document.
//!
//! Loads the document into a [`Catalog`], lists its models and operations,
//! synthesizes example request bodies from model definitions, and sends
//! requests with AvaTax Basic auth.
//!
//! # Usage
//!
//! ```no_run
//! use avatax_explorer::{Catalog, CyclePolicy};
//!
//! let catalog = Catalog::load("swagger.json").unwrap();
//! let mut generator = catalog.generator(CyclePolicy::Error);
//! let body = generator
//!     .generate_example("CreateTransactionModel", false, false)
//!     .unwrap();
//! println!("{}", avatax_explorer::to_pretty_json(&body, 3));
//! ```

pub mod builder;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod generator;
pub mod random;
pub mod schema;
pub mod swagger;

pub use builder::{build_cli, find_operation, normalize_operation_id};
pub use catalog::Catalog;
pub use config::{Credentials, Environment, ExplorerConfig};
pub use dispatch::{
    build_client, dispatch, prepare_request, save_response, ApiResponse, BodySource,
    PreparedRequest, RequestValues,
};
pub use error::{DispatchError, DocumentError, GenerateError};
pub use format::to_pretty_json;
pub use generator::{generate_example, CyclePolicy, ExampleGenerator};
pub use random::{RandomSource, RngSource, SequenceRandom, ThreadRandom};
pub use schema::{
    ItemsSchema, Property, PropertyDefinition, PropertyType, SchemaDefinition, SchemaDocument,
};
pub use swagger::{extract_operations, ApiOperation, Param};

// Re-export dependencies for downstream crates
pub use clap;
pub use reqwest;
