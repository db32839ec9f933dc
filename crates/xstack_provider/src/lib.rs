//! # xstack_provider
//!
//! Provider access contracts for xstack.
//!
//! The resolution engine never talks to a cloud SDK directly. It opens
//! sessions through a [`ClientFactory`] and issues two kinds of calls on a
//! [`ProviderSession`]: family-specific describe calls and tag searches.
//!
//! # Features
//!
//! - **Session contracts**: `ProviderSession`, `ClientFactory`, `ProviderContext`
//! - **ARN patterns**: recognise directly supplied identifiers per family
//! - **Mock provider**: in-memory resources, call capture, failure simulation
//! - **Fixtures**: load mock resources from YAML for offline runs
//! - **Offline factory**: fails every call, for runs without provider access

pub mod arn;
pub mod error;
pub mod fixtures;
pub mod mock;
pub mod session;

pub use arn::{ArnParts, ArnPattern};
pub use error::{ProviderError, ProviderResult};
pub use fixtures::ProviderFixtures;
pub use mock::{CapturedCall, MockProvider, MockResource};
pub use session::{
    ClientFactory, OfflineFactory, ProviderContext, ProviderSession, TagFilter, DEFAULT_REGION,
};
