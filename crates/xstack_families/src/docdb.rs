//! DocumentDB clusters (`x-docdb`).
//!
//! Each NEW cluster comes with a generated admin secret, a security group, a
//! subnet group and one instance. LOOKUP clusters can also resolve their
//! secret through the `secret` block of the lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use xstack_cfn::intrinsic::{get_att, reference, sub, AWS_ACCOUNT_ID, AWS_PARTITION, AWS_REGION};
use xstack_cfn::{Parameter, Resource, Template};
use xstack_core::{
    AttributeMapping, CfnConstruct, CoreResult, Describer, FamilyDescriptor, LookupDescriptor, OutputBinding,
    ResolvedResource, RunContext, StackRef, TemplateBuilder,
};
use xstack_provider::{ArnParts, ArnPattern, ProviderError, ProviderResult, ProviderSession};

pub const MOD_KEY: &str = "docdb";
pub const RES_KEY: &str = "x-docdb";
pub const CLUSTER_TYPE: &str = "AWS::DocDB::DBCluster";
pub const INSTANCE_TYPE: &str = "AWS::DocDB::DBInstance";
pub const SUBNET_GROUP_TYPE: &str = "AWS::DocDB::DBSubnetGroup";
pub const SECRET_TYPE: &str = "AWS::SecretsManager::Secret";
pub const SECRET_ATTACHMENT_TYPE: &str = "AWS::SecretsManager::SecretTargetAttachment";
pub const SECURITY_GROUP_TYPE: &str = "AWS::EC2::SecurityGroup";

pub const TAGGING_API_ID: &str = "rds:cluster";
pub const SECRET_TAGGING_API_ID: &str = "secretsmanager:secret";
pub const DESCRIBE_CLUSTERS: &str = "docdb:DescribeDBClusters";
pub const DESCRIBE_SECRET: &str = "secretsmanager:DescribeSecret";

pub const CLUSTER_ARN_RE: &str =
    r"^arn:(?P<partition>aws[\w-]*):rds:(?P<region>[\w-]+):(?P<accountid>\d{12}):cluster:(?P<id>[\S]+)$";
pub const SECRET_ARN_RE: &str =
    r"^arn:(?P<partition>aws[\w-]*):secretsmanager:(?P<region>[\w-]+):(?P<accountid>\d{12}):secret:(?P<id>[\S]+)$";

pub const DOCDB_NAME: &str = "DocDbName";
pub const DOCDB_PORT: &str = "DocDbPort";
pub const DOCDB_SG: &str = "DocDbSecurityGroupId";
pub const DOCDB_SECRET_ARN: &str = "DocDbSecretArn";
pub const DOCDB_CLUSTER_ARN: &str = "DBClusterArn";
pub const DOCDB_ID: &str = "ClusterResourceId";

pub const VPC_ID: &str = "VpcId";
pub const STORAGE_SUBNETS: &str = "StorageSubnets";

pub const DEFAULT_INSTANCE_CLASS: &str = "db.t3.medium";
const ADMIN_USERNAME: &str = "docdbadmin";

const SECRET_ROLE: &str = "secret";
const SECURITY_GROUP_ROLE: &str = "security_group";
const SUBNET_GROUP_ROLE: &str = "subnet_group";
const INSTANCE_ROLE: &str = "instance";

/// Reads the first cluster of a `DescribeDBClusters` response, keeping only
/// its active security groups.
pub struct ClusterDescriber;

#[async_trait]
impl Describer for ClusterDescriber {
    async fn describe(&self, session: &dyn ProviderSession, arn: &ArnParts) -> ProviderResult<Option<Value>> {
        let response = session.describe(DESCRIBE_CLUSTERS, &arn.arn).await?;
        let clusters = response
            .get("DBClusters")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::unexpected(DESCRIBE_CLUSTERS, "response has no DBClusters list"))?;
        let mut cluster = match clusters.first() {
            Some(cluster) => cluster.clone(),
            None => return Ok(None),
        };

        if let Some(groups) = cluster.get_mut("VpcSecurityGroups").and_then(Value::as_array_mut) {
            groups.retain(|sg| sg.get("Status").and_then(Value::as_str) == Some("active"));
        }
        Ok(Some(cluster))
    }
}

pub struct SecretDescriber;

#[async_trait]
impl Describer for SecretDescriber {
    async fn describe(&self, session: &dyn ProviderSession, arn: &ArnParts) -> ProviderResult<Option<Value>> {
        let response = session.describe(DESCRIBE_SECRET, &arn.arn).await?;
        Ok(Some(response))
    }
}

pub struct ClusterBuilder;

impl ClusterBuilder {
    fn add_cluster(template: &mut Template, resource: &ResolvedResource) -> CoreResult<CfnConstruct> {
        let title = resource.logical_name().to_string();
        let secret = format!("{}Secret", title);
        let security_group = format!("{}Sg", title);
        let subnet_group = format!("{}SubnetGroup", title);
        let instance = format!("{}Instance", title);
        let settings = resource.settings();

        template.add_resource(
            secret.clone(),
            Resource::new(SECRET_TYPE).with_properties(json!({
                "Description": format!("Admin credentials of DocDB cluster {}", resource.name()),
                "GenerateSecretString": {
                    "SecretStringTemplate": json!({ "username": ADMIN_USERNAME }).to_string(),
                    "GenerateStringKey": "password",
                    "ExcludeCharacters": "\"@/\\",
                    "PasswordLength": 24,
                },
            })),
        )?;

        template.add_resource(
            security_group.clone(),
            Resource::new(SECURITY_GROUP_TYPE).with_properties(json!({
                "GroupDescription": format!("DocDB cluster {}", resource.name()),
                "VpcId": reference(VPC_ID),
            })),
        )?;

        template.add_resource(
            subnet_group.clone(),
            Resource::new(SUBNET_GROUP_TYPE).with_properties(json!({
                "DBSubnetGroupDescription": format!("Subnets of DocDB cluster {}", resource.name()),
                "SubnetIds": reference(STORAGE_SUBNETS),
            })),
        )?;

        let mut properties = resource.properties().cloned().unwrap_or_else(Map::new);
        properties.insert(
            "MasterUsername".to_string(),
            sub(format!("{{{{resolve:secretsmanager:${{{}}}:SecretString:username}}}}", secret)),
        );
        properties.insert(
            "MasterUserPassword".to_string(),
            sub(format!("{{{{resolve:secretsmanager:${{{}}}:SecretString:password}}}}", secret)),
        );
        properties.insert(
            "VpcSecurityGroupIds".to_string(),
            json!([get_att(&security_group, "GroupId")]),
        );
        properties.insert("DBSubnetGroupName".to_string(), reference(&subnet_group));
        template.add_resource(
            title.clone(),
            Resource::new(CLUSTER_TYPE).with_properties(Value::Object(properties)),
        )?;

        template.add_resource(
            format!("{}Attachment", secret),
            Resource::new(SECRET_ATTACHMENT_TYPE).with_properties(json!({
                "SecretId": reference(&secret),
                "TargetId": reference(&title),
                "TargetType": CLUSTER_TYPE,
            })),
        )?;

        let instance_class = settings
            .and_then(|s| s.get("InstanceClass"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INSTANCE_CLASS);
        template.add_resource(
            instance.clone(),
            Resource::new(INSTANCE_TYPE).with_properties(json!({
                "DBClusterIdentifier": reference(&title),
                "DBInstanceClass": instance_class,
            })),
        )?;

        Ok(CfnConstruct::new(title, CLUSTER_TYPE)
            .with_companion(SECRET_ROLE, secret)
            .with_companion(SECURITY_GROUP_ROLE, security_group)
            .with_companion(SUBNET_GROUP_ROLE, subnet_group)
            .with_companion(INSTANCE_ROLE, instance))
    }
}

impl TemplateBuilder for ClusterBuilder {
    fn build(
        &self,
        template: &mut Template,
        resources: &mut [ResolvedResource],
        _context: &RunContext,
        stack: &StackRef,
    ) -> CoreResult<()> {
        for resource in resources.iter_mut() {
            let construct = Self::add_cluster(template, resource)?;
            debug!("{}.{} - Added cluster to {}", MOD_KEY, resource.name(), stack.title);
            resource.set_cfn_resource(construct)?;
        }
        Ok(())
    }
}

fn cluster_outputs(resource: &ResolvedResource, cluster: &CfnConstruct) -> Vec<OutputBinding> {
    let name = resource.logical_name();
    let mut outputs = vec![
        OutputBinding::reference(DOCDB_NAME, name, &cluster.title),
        OutputBinding::attribute(DOCDB_PORT, format!("{}Port", name), &cluster.title, "Port"),
        OutputBinding::substitution(
            DOCDB_CLUSTER_ARN,
            format!("{}{}", name, DOCDB_CLUSTER_ARN),
            &cluster.title,
            format!(
                "arn:${{{}}}:rds:${{{}}}:${{{}}}:cluster:${{{}}}",
                AWS_PARTITION, AWS_REGION, AWS_ACCOUNT_ID, cluster.title
            ),
        ),
        OutputBinding::attribute(DOCDB_ID, format!("{}{}", name, DOCDB_ID), &cluster.title, DOCDB_ID),
    ];
    if let Some(secret) = cluster.companion(SECRET_ROLE) {
        outputs.push(OutputBinding::reference(DOCDB_SECRET_ARN, secret, secret));
    }
    if let Some(security_group) = cluster.companion(SECURITY_GROUP_ROLE) {
        outputs.push(OutputBinding::attribute(DOCDB_SG, security_group, security_group, "GroupId"));
    }
    outputs
}

pub fn family() -> CoreResult<FamilyDescriptor> {
    let lookup = LookupDescriptor::new(
        TAGGING_API_ID,
        ArnPattern::new(CLUSTER_ARN_RE)?,
        DOCDB_CLUSTER_ARN,
        AttributeMapping::new()
            .field(DOCDB_PORT, "Port")
            .field(DOCDB_SG, "VpcSecurityGroups::0::VpcSecurityGroupId")
            .field(DOCDB_CLUSTER_ARN, "DBClusterArn"),
        Arc::new(ClusterDescriber),
    );
    let secret = LookupDescriptor::new(
        SECRET_TAGGING_API_ID,
        ArnPattern::new(SECRET_ARN_RE)?,
        DOCDB_SECRET_ARN,
        AttributeMapping::new().field(DOCDB_SECRET_ARN, "ARN"),
        Arc::new(SecretDescriber),
    );

    Ok(
        FamilyDescriptor::new(MOD_KEY, CLUSTER_TYPE, Arc::new(ClusterBuilder), cluster_outputs)
            .with_section(RES_KEY)
            .with_description("Root stack for DocDB clusters")
            .with_lookup(lookup)
            .with_secondary(secret)
            .with_parameter(Parameter::new(VPC_ID, "AWS::EC2::VPC::Id"))
            .with_parameter(Parameter::new(STORAGE_SUBNETS, "List<AWS::EC2::Subnet::Id>")),
    )
}
