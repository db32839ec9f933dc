//! Integration tests for resolution and stack composition.
//!
//! Provider calls go to an in-memory `MockProvider`; template builders are
//! mocked so that invocation counts can be asserted.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::{json, Value};

use xstack_cfn::{Resource, Template};
use xstack_core::{
    AttributeMapping, CfnConstruct, ComposeDocument, CoreError, CoreResult, Describer, DiagnosticKind,
    FamilyDescriptor, FamilyRegistry, Lifecycle, LookupDescriptor, OutputBinding, ResolvedResource,
    ResourceDeclaration, RunContext, RunSettings, StackComposer, StackRef, TemplateBuilder,
};
use xstack_provider::{ArnParts, ArnPattern, MockProvider, MockResource, ProviderResult, ProviderSession};

const TABLE_ARN_RE: &str =
    r"^arn:(?P<partition>aws[\w-]*):dynamodb:(?P<region>[\w-]+):(?P<accountid>\d{12}):table/(?P<id>[\S]+)$";
const ORDERS_ARN: &str = "arn:aws:dynamodb:us-east-1:123456789012:table/orders";
const INVOICES_ARN: &str = "arn:aws:dynamodb:us-east-1:123456789012:table/invoices";

mock! {
    Builder {}

    impl TemplateBuilder for Builder {
        fn build(
            &self,
            template: &mut Template,
            resources: &mut [ResolvedResource],
            context: &RunContext,
            stack: &StackRef,
        ) -> CoreResult<()>;
    }
}

struct TableDescriber;

#[async_trait]
impl Describer for TableDescriber {
    async fn describe(&self, session: &dyn ProviderSession, arn: &ArnParts) -> ProviderResult<Option<Value>> {
        let response = session.describe("dynamodb:DescribeTable", &arn.arn).await?;
        Ok(response.get("Table").cloned())
    }
}

fn table_outputs(resource: &ResolvedResource, construct: &CfnConstruct) -> Vec<OutputBinding> {
    vec![
        OutputBinding::reference("name", resource.logical_name(), &construct.title),
        OutputBinding::attribute(
            "arn",
            format!("{}Arn", resource.logical_name()),
            &construct.title,
            "Arn",
        ),
    ]
}

/// Builder adding one table per NEW resource.
fn table_builder(times: usize) -> MockBuilder {
    let mut builder = MockBuilder::new();
    builder
        .expect_build()
        .times(times)
        .returning(|template: &mut Template, resources: &mut [ResolvedResource], _context: &RunContext, _stack: &StackRef| {
            for resource in resources.iter_mut() {
                let properties = resource
                    .properties()
                    .map(|p| Value::Object(p.clone()))
                    .unwrap_or(Value::Null);
                template.add_resource(
                    resource.logical_name().to_string(),
                    Resource::new("AWS::DynamoDB::Table").with_properties(properties),
                )?;
                let construct = CfnConstruct::new(resource.logical_name(), "AWS::DynamoDB::Table");
                resource.set_cfn_resource(construct)?;
            }
            Ok(())
        });
    builder
}

fn family(key: &str, builder: MockBuilder) -> FamilyDescriptor {
    FamilyDescriptor::new(key, "AWS::DynamoDB::Table", Arc::new(builder), table_outputs).with_lookup(
        LookupDescriptor::new(
            "dynamodb:table",
            ArnPattern::new(TABLE_ARN_RE).unwrap(),
            "TableArn",
            AttributeMapping::new().field("TableName", "TableName"),
            Arc::new(TableDescriber),
        ),
    )
}

fn composer(families: Vec<FamilyDescriptor>, provider: &MockProvider) -> StackComposer {
    let mut registry = FamilyRegistry::new();
    for family in families {
        registry.register(family);
    }
    StackComposer::new(registry, Arc::new(provider.clone()))
}

fn table(arn: &str, name: &str) -> MockResource {
    MockResource::new(arn, "dynamodb:table", json!({ "Table": { "TableName": name, "TableArn": arn } }))
        .tag("env", "prod")
}

fn context() -> RunContext {
    RunContext::new(RunSettings::new("shop"))
}

/// Scenario A: a plain declaration is NEW and exports its name.
#[tokio::test]
async fn test_new_resource_registers_name_output() {
    let provider = MockProvider::new();
    let composer = composer(vec![family("tables", table_builder(1))], &provider);
    let declarations = vec![ResourceDeclaration::new(
        "orders",
        "tables",
        json!({ "Properties": { "BillingMode": "PAY_PER_REQUEST" } }),
    )];
    let mut context = context();

    let stack = composer
        .compose_family("tables", &declarations, &mut context)
        .await
        .unwrap();

    let orders = &stack.resources.new[0];
    assert_eq!(orders.lifecycle(), Lifecycle::New);
    assert_eq!(orders.outputs().get("name").unwrap().output_name, orders.logical_name());
    assert_eq!(orders.stack(), Some(&StackRef::new("tables")));

    assert!(!stack.node.is_void());
    let template = stack.node.template().unwrap();
    assert!(!template.is_empty());
    assert_eq!(template.outputs["orders"].value, json!({ "Ref": "orders" }));
    assert_eq!(
        template.outputs["ordersArn"].value,
        json!({ "Fn::GetAtt": ["orders", "Arn"] })
    );
    assert_eq!(template.parameters.len(), 3);
    assert_eq!(provider.call_count(), 0);
}

/// Scenario B: a tag search with one match fills the mapping table.
#[tokio::test]
async fn test_lookup_by_tags_stores_mapping() {
    let provider = MockProvider::new().add_resource(table(ORDERS_ARN, "orders"));
    let composer = composer(vec![family("tables", table_builder(0))], &provider);
    let declarations = vec![ResourceDeclaration::new(
        "orders",
        "tables",
        json!({ "Lookup": { "Tags": [{ "Key": "env", "Value": "prod" }] } }),
    )];
    let mut context = context();

    let stack = composer
        .compose_family("tables", &declarations, &mut context)
        .await
        .unwrap();

    assert_eq!(context.mappings.len(), 1);
    let mapping = context.mappings.get("tables", "orders").unwrap();
    assert_eq!(mapping.get_str("TableArn"), Some(ORDERS_ARN));
    assert_eq!(mapping.get_str("TableName"), Some("orders"));

    assert!(stack.node.is_void());
    assert!(stack.node.template().is_none());
    assert_eq!(stack.resources.lookup[0].stack(), Some(&StackRef::new("tables")));
    assert_eq!(provider.get_method_calls("search_by_tag").len(), 1);
}

/// Scenario C: two matches abort the run and leave the table untouched.
#[tokio::test]
async fn test_ambiguous_lookup_aborts() {
    let provider = MockProvider::new()
        .add_resource(table(ORDERS_ARN, "orders"))
        .add_resource(table(INVOICES_ARN, "invoices"));
    let composer = composer(vec![family("tables", table_builder(0))], &provider);
    let declarations = vec![ResourceDeclaration::new(
        "orders",
        "tables",
        json!({ "Lookup": { "Tags": [{ "env": "prod" }] } }),
    )];
    let mut context = context();

    let err = composer
        .compose_family("tables", &declarations, &mut context)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::LookupAmbiguity { count: 2, .. }));
    assert!(context.mappings.is_empty());
}

/// Scenario D: USE on a family without USE support is dropped with a warning.
#[tokio::test]
async fn test_unsupported_use_is_dropped() {
    let provider = MockProvider::new();
    let composer = composer(vec![family("tables", table_builder(1))], &provider);
    let declarations = vec![
        ResourceDeclaration::new("orders", "tables", json!({})),
        ResourceDeclaration::new("shared", "tables", json!({ "Use": { "Identifier": ORDERS_ARN } })),
    ];
    let mut context = context();

    let stack = composer
        .compose_family("tables", &declarations, &mut context)
        .await
        .unwrap();

    assert!(stack.resources.find("shared").is_none());
    assert_eq!(stack.resources.new.len(), 1);
    assert!(stack.resources.lookup.is_empty());
    assert_eq!(context.diagnostics.of_kind(DiagnosticKind::UnsupportedLifecycle).count(), 1);
}

#[tokio::test]
async fn test_use_resource_is_stamped_on_void_stack() {
    let provider = MockProvider::new();
    let composer = composer(
        vec![family("tables", table_builder(0)).with_use_support(true)],
        &provider,
    );
    let declarations = vec![ResourceDeclaration::new("shared", "tables", json!({ "Use": ORDERS_ARN }))];
    let mut context = context();

    let stack = composer
        .compose_family("tables", &declarations, &mut context)
        .await
        .unwrap();

    assert!(stack.node.is_void());
    let shared = &stack.resources.use_[0];
    assert_eq!(shared.use_reference(), Some(ORDERS_ARN));
    assert_eq!(shared.stack(), Some(&StackRef::new("tables")));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_name_fails_before_provider_calls() {
    let provider = MockProvider::new().add_resource(table(ORDERS_ARN, "orders"));
    let composer = composer(vec![family("tables", table_builder(0))], &provider);
    let declarations = vec![
        ResourceDeclaration::new("orders", "tables", json!({ "Lookup": { "Tags": [{ "env": "prod" }] } })),
        ResourceDeclaration::new("old_orders", "tables", json!({})),
    ];
    let mut context = context();

    let err = composer
        .compose_family("tables", &declarations, &mut context)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation { name, .. } if name == "old_orders"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_lookup_resolution_is_idempotent() {
    let provider = MockProvider::new().add_resource(table(ORDERS_ARN, "orders"));
    let composer = composer(vec![family("tables", table_builder(0))], &provider);
    let document = ComposeDocument::from_yaml_str(
        r#"
x-tables:
  orders:
    Lookup:
      Arn: arn:aws:dynamodb:us-east-1:123456789012:table/orders
"#,
    )
    .unwrap();
    let mut context = context();
    let families = composer.classify(&document, &mut context).unwrap();
    let (family, classified) = &families[0];

    let first = composer
        .lookup_engine()
        .resolve(family, &classified.lookup[0], &context)
        .await
        .unwrap();
    let second = composer
        .lookup_engine()
        .resolve(family, &classified.lookup[0], &context)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(context.mappings.is_empty());
}

#[tokio::test]
async fn test_builder_must_set_construct() {
    let mut builder = MockBuilder::new();
    builder.expect_build().times(1).returning(|_, _, _, _| Ok(()));
    let provider = MockProvider::new();
    let composer = composer(vec![family("tables", builder)], &provider);
    let declarations = vec![ResourceDeclaration::new("orders", "tables", json!({}))];

    let err = composer
        .compose_family("tables", &declarations, &mut context())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::BuilderContract { .. }));
}

#[tokio::test]
async fn test_compose_document_builds_tree() {
    let provider = MockProvider::new().add_resource(table(INVOICES_ARN, "invoices"));
    let composer = composer(
        vec![
            family("tables", table_builder(1)),
            family("archives", table_builder(0)),
        ],
        &provider,
    );
    let document = ComposeDocument::from_yaml_str(
        r#"
x-tables:
  orders:
    Properties:
      BillingMode: PAY_PER_REQUEST
x-archives:
  invoices:
    Lookup:
      Tags:
        - env: prod
x-queues:
  jobs: {}
"#,
    )
    .unwrap();
    let mut context = context();

    let composition = composer.compose("shop", &document, &mut context).await.unwrap();

    let root = &composition.root;
    assert!(root.is_root());
    assert_eq!(root.children().len(), 2);
    assert!(!root.child("tables").unwrap().is_void());
    assert!(root.child("archives").unwrap().is_void());

    let root_template = root.template().unwrap();
    assert!(root_template.resource("tables").is_some());
    assert!(root_template.resource("archives").is_none());
    assert_eq!(root_template.mappings["archives"]["invoices"]["TableArn"], INVOICES_ARN);

    // NEW resources can read lookups of any family.
    let tables_template = root.child("tables").unwrap().template().unwrap();
    assert!(tables_template.mappings.contains_key("archives"));
    assert_eq!(
        context.mappings.find_in_map("archives", "invoices", "TableName").unwrap(),
        json!({ "Fn::FindInMap": ["archives", "invoices", "TableName"] })
    );

    assert_eq!(composition.family("archives").unwrap().lookup.len(), 1);
    assert_eq!(context.diagnostics.of_kind(DiagnosticKind::UnknownSection).count(), 1);
    assert!(root
        .output_ref("tables", "orders")
        .is_ok());
}

#[tokio::test]
async fn test_custom_stack_title() {
    let provider = MockProvider::new();
    let composer = composer(
        vec![family("tables", table_builder(1)).with_stack_title("Tables")],
        &provider,
    );
    let document = ComposeDocument::from_yaml_str("x-tables:\n  orders: {}\n").unwrap();
    let mut context = RunContext::new(RunSettings::new("shop").with_template_url_base("s3://bucket/shop/"));

    let composition = composer.compose("shop", &document, &mut context).await.unwrap();

    let nested = composition.root.template().unwrap().resource("Tables").unwrap();
    assert_eq!(nested.properties["TemplateURL"], "s3://bucket/shop/Tables.json");
    let orders = &composition.family("tables").unwrap().new[0];
    assert_eq!(orders.stack(), Some(&StackRef::new("Tables")));
}
