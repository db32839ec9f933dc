//! CloudFormation intrinsic functions and pseudo parameters.
//!
//! Every helper returns a plain `serde_json::Value` so that the result can be
//! dropped anywhere inside resource properties, outputs or conditions.

use serde_json::{json, Value};

pub const AWS_ACCOUNT_ID: &str = "AWS::AccountId";
pub const AWS_NO_VALUE: &str = "AWS::NoValue";
pub const AWS_PARTITION: &str = "AWS::Partition";
pub const AWS_REGION: &str = "AWS::Region";
pub const AWS_STACK_NAME: &str = "AWS::StackName";

/// `{"Ref": name}`
pub fn reference(name: &str) -> Value {
    json!({ "Ref": name })
}

/// `{"Fn::GetAtt": [resource, attribute]}`
pub fn get_att(resource: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [resource, attribute] })
}

/// `{"Fn::Sub": template}`
pub fn sub(template: impl Into<String>) -> Value {
    json!({ "Fn::Sub": template.into() })
}

/// `{"Fn::If": [condition, when_true, when_false]}`
pub fn if_(condition: &str, when_true: Value, when_false: Value) -> Value {
    json!({ "Fn::If": [condition, when_true, when_false] })
}

pub fn equals(left: Value, right: Value) -> Value {
    json!({ "Fn::Equals": [left, right] })
}

pub fn not(value: Value) -> Value {
    json!({ "Fn::Not": [value] })
}

pub fn and(values: Vec<Value>) -> Value {
    json!({ "Fn::And": values })
}

/// `{"Condition": name}`, used to nest conditions inside other conditions.
pub fn condition(name: &str) -> Value {
    json!({ "Condition": name })
}

pub fn find_in_map(map: &str, top_key: &str, second_key: &str) -> Value {
    json!({ "Fn::FindInMap": [map, top_key, second_key] })
}

/// `${Name}` placeholder for use inside `Fn::Sub` strings.
pub fn placeholder(name: &str) -> String {
    format!("${{{}}}", name)
}
