//! DynamoDB tables (`x-dynamodb`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use xstack_cfn::{Resource, Template};
use xstack_core::{
    AttributeMapping, CfnConstruct, CoreResult, Describer, FamilyDescriptor, LookupDescriptor, OutputBinding,
    ResolvedResource, RunContext, StackRef, TemplateBuilder,
};
use xstack_provider::{ArnParts, ArnPattern, ProviderResult, ProviderSession};

pub const MOD_KEY: &str = "dynamodb";
pub const RES_KEY: &str = "x-dynamodb";
pub const TABLE_TYPE: &str = "AWS::DynamoDB::Table";
pub const TAGGING_API_ID: &str = "dynamodb:table";
pub const DESCRIBE_TABLE: &str = "dynamodb:DescribeTable";

pub const TABLE_ARN_RE: &str =
    r"^arn:(?P<partition>aws[\w-]*):dynamodb:(?P<region>[\w-]+):(?P<accountid>\d{12}):table/(?P<id>[\S]+)$";

pub const TABLE_NAME: &str = "TableName";
pub const TABLE_ARN: &str = "TableArn";

/// Reads `Table` out of a `DescribeTable` response.
pub struct TableDescriber;

#[async_trait]
impl Describer for TableDescriber {
    async fn describe(&self, session: &dyn ProviderSession, arn: &ArnParts) -> ProviderResult<Option<Value>> {
        let response = session.describe(DESCRIBE_TABLE, &arn.resource_id).await?;
        Ok(response.get("Table").cloned())
    }
}

/// One `AWS::DynamoDB::Table` per resource, properties taken as declared.
pub struct TableBuilder;

impl TemplateBuilder for TableBuilder {
    fn build(
        &self,
        template: &mut Template,
        resources: &mut [ResolvedResource],
        _context: &RunContext,
        stack: &StackRef,
    ) -> CoreResult<()> {
        for resource in resources.iter_mut() {
            let properties = resource
                .properties()
                .map(|p| Value::Object(p.clone()))
                .unwrap_or(Value::Null);
            let title = resource.logical_name().to_string();
            template.add_resource(title.clone(), Resource::new(TABLE_TYPE).with_properties(properties))?;
            debug!("{}.{} - Added table to {}", MOD_KEY, resource.name(), stack.title);
            resource.set_cfn_resource(CfnConstruct::new(title, TABLE_TYPE))?;
        }
        Ok(())
    }
}

fn table_outputs(resource: &ResolvedResource, table: &CfnConstruct) -> Vec<OutputBinding> {
    vec![
        OutputBinding::reference(TABLE_NAME, resource.logical_name(), &table.title),
        OutputBinding::attribute(
            TABLE_ARN,
            format!("{}{}", resource.logical_name(), TABLE_ARN),
            &table.title,
            "Arn",
        ),
    ]
}

pub fn family() -> CoreResult<FamilyDescriptor> {
    let lookup = LookupDescriptor::new(
        TAGGING_API_ID,
        ArnPattern::new(TABLE_ARN_RE)?,
        TABLE_ARN,
        AttributeMapping::new()
            .required(TABLE_NAME, "TableName")
            .field(TABLE_ARN, "TableArn"),
        Arc::new(TableDescriber),
    );

    Ok(
        FamilyDescriptor::new(MOD_KEY, TABLE_TYPE, Arc::new(TableBuilder), table_outputs)
            .with_section(RES_KEY)
            .with_description("Root template for DynamoDB tables")
            .with_lookup(lookup),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xstack_core::{ResourceDeclaration, ResourceKind, RunSettings};
    use xstack_provider::{MockProvider, MockResource};

    #[test]
    fn test_table_arn_pattern() {
        let pattern = ArnPattern::new(TABLE_ARN_RE).unwrap();
        let parts = pattern
            .matches("arn:aws-cn:dynamodb:cn-north-1:123456789012:table/orders")
            .unwrap();

        assert_eq!(parts.partition, "aws-cn");
        assert_eq!(parts.resource_id, "orders");
        assert!(!pattern.is_match("arn:aws:rds:us-east-1:123456789012:cluster:docs"));
    }

    #[tokio::test]
    async fn test_describer_reads_table() {
        let arn = "arn:aws:dynamodb:us-east-1:123456789012:table/orders";
        let provider = MockProvider::new().add_resource(MockResource::new(
            arn,
            TAGGING_API_ID,
            json!({ "Table": { "TableName": "orders", "TableArn": arn } }),
        ));
        let parts = ArnPattern::new(TABLE_ARN_RE).unwrap().matches(arn).unwrap();

        let record = TableDescriber.describe(&provider, &parts).await.unwrap().unwrap();

        assert_eq!(record["TableName"], "orders");
        assert_eq!(provider.get_method_calls(DESCRIBE_TABLE)[0].target, "orders");
    }

    #[test]
    fn test_builder_sets_construct_and_outputs() {
        let declaration = ResourceDeclaration::new(
            "orders",
            MOD_KEY,
            json!({ "Properties": { "BillingMode": "PAY_PER_REQUEST" } }),
        );
        let mut resources = vec![ResolvedResource::new(&declaration, ResourceKind::New { construct: None })];
        let mut template = Template::new(None);

        TableBuilder
            .build(
                &mut template,
                &mut resources,
                &RunContext::new(RunSettings::default()),
                &StackRef::new(MOD_KEY),
            )
            .unwrap();

        let table = template.resource("orders").unwrap();
        assert_eq!(table.properties["BillingMode"], "PAY_PER_REQUEST");
        let construct = resources[0].cfn_resource().unwrap();
        let outputs = table_outputs(&resources[0], construct);
        assert_eq!(outputs[0].output_name, "orders");
        assert_eq!(outputs[1].output_name, "ordersTableArn");
    }
}
