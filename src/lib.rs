//! Compile Rust type declarations into OpenAPI 3.0 documents.
//!
//! The pipeline reads a project's sources once, indexes every named type declaration,
//! and lowers the request and response types of each route handler into schema
//! components. Named object types become `$ref`-able components exactly once, even when
//! several threads reach the same type concurrently or the type is recursive.
//!
//! 1. [`source`] - scans a directory and parses `.rs` files
//! 2. [`catalog`] - indexes declarations and answers type lookups ([`catalog::TypeCatalog`])
//! 3. [`extractor`] - finds route handlers and their extractors
//! 4. [`compiler`] - lowers types into [`schema::SchemaNode`] trees and components
//! 5. [`openapi_builder`] - assembles operations and components into a document
//! 6. [`serializer`] - writes the document as YAML or JSON
//!
//! # Example
//!
//! ```no_run
//! use openapi_schema_compiler::{
//!     catalog::SourceCatalog, config::CompilerConfig, extractor::RouteExtractor,
//!     openapi_builder::OpenApiBuilder, serializer::serialize_yaml, source::SourceSet,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let sources = SourceSet::load(Path::new("./my-project")).unwrap();
//! let catalog = Arc::new(SourceCatalog::new(&sources.files));
//! let endpoints = RouteExtractor.extract(&sources.files, &catalog);
//!
//! let config = CompilerConfig::default();
//! let mut builder = OpenApiBuilder::new(&config, catalog);
//! builder.add_endpoints(endpoints);
//! let document = builder.build().unwrap();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```

pub mod catalog;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod extractor;
pub mod openapi_builder;
pub mod schema;
pub mod serializer;
pub mod source;
pub mod types;
