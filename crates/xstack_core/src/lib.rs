//! # xstack_core
//!
//! Resource resolution and stack composition engine for xstack.
//!
//! Declared resources go through three stages:
//!
//! - **Resolver**: classifies each declaration as NEW, LOOKUP or USE
//! - **Lookup engine**: resolves LOOKUP resources against the provider into
//!   attribute mappings stored in the run-wide mapping table
//! - **Composer**: builds one sub-stack per family with NEW resources,
//!   registers their outputs and attaches everything under a root stack
//!
//! Families plug in through a [`FamilyDescriptor`] registered in a
//! [`FamilyRegistry`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xstack_core::{ComposeDocument, RunContext, RunSettings, StackComposer};
//! use xstack_provider::OfflineFactory;
//!
//! let composer = StackComposer::new(registry, Arc::new(OfflineFactory));
//! let document = ComposeDocument::from_file(Path::new("compose.yaml"))?;
//! let mut context = RunContext::new(RunSettings::new("shop"));
//!
//! let composition = composer.compose("shop", &document, &mut context).await?;
//! composition.root.write_all(Path::new("out"))?;
//! ```

pub mod composer;
pub mod context;
pub mod declaration;
pub mod diagnostics;
pub mod error;
pub mod family;
pub mod lookup;
pub mod mapper;
pub mod mappings;
pub mod naming;
pub mod outputs;
pub mod registry;
pub mod resolver;
pub mod resource;
pub mod settings;
pub mod stack;

// Re-export main types for convenience
pub use composer::{Composition, FamilyStack, StackComposer};
pub use context::RunContext;
pub use declaration::{ComposeDocument, LookupSpec, LookupTarget, ResourceDeclaration, TagEntry, UseSpec};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{CoreError, CoreResult};
pub use family::{Describer, FamilyDescriptor, LookupDescriptor, OutputsFn, TemplateBuilder};
pub use lookup::LookupEngine;
pub use mapper::{attributes_to_mapping, AttributeMapping, AttributePath, LookupMapping};
pub use mappings::MappingTable;
pub use naming::{logical_name, validate_resource_title};
pub use outputs::{OutputBinding, OutputRegistry, ReferenceKind};
pub use registry::FamilyRegistry;
pub use resolver::{resolve_resources, ClassifiedResources};
pub use resource::{CfnConstruct, Lifecycle, ResolvedResource, ResourceKind, StackRef};
pub use settings::RunSettings;
pub use stack::StackNode;
