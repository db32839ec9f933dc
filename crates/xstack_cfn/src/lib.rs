//! # xstack_cfn
//!
//! CloudFormation template model for xstack.
//!
//! This crate holds the pieces every emitted stack is made of: the template
//! body itself, intrinsic function helpers, the parameters and conditions
//! shared by all stacks of a tree, and the parameter files handed to the
//! deployment of the root stack.
//!
//! ## Example
//!
//! ```rust
//! use xstack_cfn::{build_template, intrinsic, Resource};
//! use serde_json::json;
//!
//! let mut template = build_template(Some("DynamoDB tables"), vec![]);
//! template
//!     .add_resource(
//!         "orders",
//!         Resource::new("AWS::DynamoDB::Table")
//!             .with_properties(json!({ "BillingMode": "PAY_PER_REQUEST" })),
//!     )
//!     .unwrap();
//!
//! assert_eq!(intrinsic::reference("orders"), json!({ "Ref": "orders" }));
//! ```

pub mod defaults;
pub mod error;
pub mod intrinsic;
pub mod params_file;
pub mod template;

pub use defaults::{add_defaults, bool_flag, build_template, exported_output};
pub use error::{CfnError, CfnResult};
pub use params_file::{ParameterEntry, ParameterFile};
pub use template::{validate_title, Output, Parameter, Resource, Template};
