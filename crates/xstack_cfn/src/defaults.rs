//! Parameters and conditions shared by every template of the tree.
//!
//! Each stack receives the same export toggles and root-stack-name parameter,
//! so that any template can resolve cross-stack values the same way
//! regardless of its depth.

use serde_json::{json, Value};

use crate::intrinsic::{and, condition, equals, if_, not, reference, sub, AWS_NO_VALUE, AWS_STACK_NAME};
use crate::template::{Output, Parameter, Template};

pub const USE_SSM_EXPORTS: &str = "UseSsmExports";
pub const USE_CFN_EXPORTS: &str = "UseCfnExports";
pub const ROOT_STACK_NAME: &str = "RootStackName";

/// Default value of [`ROOT_STACK_NAME`] meaning "use this stack's own name".
pub const ROOT_STACK_NAME_UNSET: &str = "none";

pub const USE_SSM_EXPORTS_CONDITION: &str = "UseSsmExportsCondition";
pub const USE_CFN_EXPORTS_CONDITION: &str = "UseCfnExportsCondition";
pub const NOT_USE_CFN_EXPORTS_CONDITION: &str = "NotUseCfnExportsCondition";
pub const USE_CFN_AND_SSM_EXPORTS_CONDITION: &str = "UseCfnAndSsmExportsCondition";
pub const USE_STACK_NAME_CONDITION: &str = "UseStackNameCondition";
pub const USE_SSM_ONLY_CONDITION: &str = "UseSsmOnlyCondition";

const BOOL_VALUES: [&str; 2] = ["True", "False"];

/// Render a boolean the way the export toggles expect it.
pub fn bool_flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// The shared parameters, in declaration order.
pub fn shared_parameters() -> Vec<Parameter> {
    vec![
        Parameter::string(USE_SSM_EXPORTS)
            .with_default("False")
            .with_allowed_values(&BOOL_VALUES)
            .with_description("Whether outputs are also published as SSM parameters"),
        Parameter::string(USE_CFN_EXPORTS)
            .with_default("True")
            .with_allowed_values(&BOOL_VALUES)
            .with_description("Whether outputs are exported with CloudFormation exports"),
        Parameter::string(ROOT_STACK_NAME)
            .with_default(ROOT_STACK_NAME_UNSET)
            .with_description("Name of the root stack, used to prefix export names"),
    ]
}

/// The shared conditions, keyed by name.
pub fn shared_conditions() -> Vec<(&'static str, Value)> {
    vec![
        (
            USE_SSM_EXPORTS_CONDITION,
            equals(reference(USE_SSM_EXPORTS), json!("True")),
        ),
        (
            USE_CFN_EXPORTS_CONDITION,
            equals(reference(USE_CFN_EXPORTS), json!("True")),
        ),
        (
            NOT_USE_CFN_EXPORTS_CONDITION,
            not(condition(USE_CFN_EXPORTS_CONDITION)),
        ),
        (
            USE_CFN_AND_SSM_EXPORTS_CONDITION,
            and(vec![
                condition(USE_CFN_EXPORTS_CONDITION),
                condition(USE_SSM_EXPORTS_CONDITION),
            ]),
        ),
        (
            USE_STACK_NAME_CONDITION,
            equals(reference(ROOT_STACK_NAME), json!(ROOT_STACK_NAME_UNSET)),
        ),
        (
            USE_SSM_ONLY_CONDITION,
            and(vec![
                condition(USE_SSM_EXPORTS_CONDITION),
                condition(NOT_USE_CFN_EXPORTS_CONDITION),
            ]),
        ),
    ]
}

/// Add the shared parameters and conditions to `template`.
///
/// Calling this more than once leaves the template unchanged.
pub fn add_defaults(template: &mut Template) {
    for parameter in shared_parameters() {
        template.add_parameter(parameter);
    }
    for (name, body) in shared_conditions() {
        template.add_condition(name, body);
    }
}

/// Create a template with the given extra parameters and the shared defaults.
pub fn build_template(description: Option<&str>, parameters: Vec<Parameter>) -> Template {
    let mut template = Template::new(description);
    for parameter in parameters {
        template.add_parameter(parameter);
    }
    add_defaults(&mut template);
    template
}

/// Export name for an output, prefixed with the root stack name when set.
pub fn export_name(output_title: &str) -> Value {
    if_(
        USE_STACK_NAME_CONDITION,
        sub(format!("${{{}}}::{}", AWS_STACK_NAME, output_title)),
        sub(format!("${{{}}}::{}", ROOT_STACK_NAME, output_title)),
    )
}

/// Build an output whose export only exists when CloudFormation exports are on.
pub fn exported_output(output_title: &str, value: Value) -> Output {
    Output::new(value).with_export(if_(
        USE_CFN_EXPORTS_CONDITION,
        json!({ "Name": export_name(output_title) }),
        reference(AWS_NO_VALUE),
    ))
}
