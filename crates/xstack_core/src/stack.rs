//! Nested stack tree.
//!
//! The root node owns one child per resource family. A child with NEW
//! resources carries a template and is wired into its parent as an
//! `AWS::CloudFormation::Stack` resource; a void child has no template and
//! only exists so that family, resource and mapping can be traversed the
//! same way for every family.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use xstack_cfn::defaults::ROOT_STACK_NAME;
use xstack_cfn::intrinsic::{get_att, reference, AWS_STACK_NAME};
use xstack_cfn::{build_template, Resource, Template};

use crate::error::{CoreError, CoreResult};
use crate::resource::StackRef;
use crate::settings::RunSettings;

pub const NESTED_STACK_TYPE: &str = "AWS::CloudFormation::Stack";

#[derive(Debug, Clone)]
pub struct StackNode {
    title: String,
    family: Option<String>,
    template: Option<Template>,
    is_root: bool,
    parent: Option<String>,
    children: Vec<StackNode>,
}

impl StackNode {
    /// Root of a tree, carrying the shared parameters and conditions.
    pub fn root(title: impl Into<String>, settings: &RunSettings) -> Self {
        let title = title.into();
        let description = format!("Root stack {} ({})", title, settings.region);
        Self {
            template: Some(build_template(Some(&description), Vec::new())),
            family: None,
            is_root: true,
            parent: None,
            children: Vec::new(),
            title,
        }
    }

    /// Family sub-stack rendering `template`.
    pub fn with_template(title: impl Into<String>, family: impl Into<String>, template: Template) -> Self {
        Self {
            title: title.into(),
            family: Some(family.into()),
            template: Some(template),
            is_root: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Family node without anything to render.
    pub fn void(title: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            family: Some(family.into()),
            template: None,
            is_root: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn template_mut(&mut self) -> Option<&mut Template> {
        self.template.as_mut()
    }

    pub fn is_void(&self) -> bool {
        self.template.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[StackNode] {
        &self.children
    }

    pub fn child(&self, title: &str) -> Option<&StackNode> {
        self.children.iter().find(|c| c.title == title)
    }

    pub fn stack_ref(&self) -> StackRef {
        StackRef::new(&self.title)
    }

    /// Attach `child` under this node.
    ///
    /// A non-void child is added as a nested stack resource whose
    /// parameters are passed down by `Ref`. The root passes its own stack
    /// name as the root stack name.
    pub fn attach(&mut self, mut child: StackNode, settings: &RunSettings) -> CoreResult<()> {
        if child.is_root {
            return Err(CoreError::InvalidStack(format!(
                "root stack {} cannot be attached to {}",
                child.title, self.title
            )));
        }
        if self.child(&child.title).is_some() {
            return Err(CoreError::InvalidStack(format!(
                "{} already has a child named {}",
                self.title, child.title
            )));
        }
        let is_root = self.is_root;
        let parent_template = self.template.as_mut().ok_or_else(|| {
            CoreError::InvalidStack(format!("cannot attach {} to void stack {}", child.title, self.title))
        })?;

        if let Some(child_template) = &child.template {
            let mut parameters = Map::new();
            for (name, parameter) in &child_template.parameters {
                let value = if is_root && name == ROOT_STACK_NAME {
                    reference(AWS_STACK_NAME)
                } else {
                    parent_template.add_parameter(parameter.clone());
                    reference(name)
                };
                parameters.insert(name.clone(), value);
            }
            parent_template.add_resource(
                child.title.clone(),
                Resource::new(NESTED_STACK_TYPE).with_properties(json!({
                    "TemplateURL": settings.template_url(&child.title),
                    "Parameters": parameters,
                })),
            )?;
            info!("Attached {} to {}", child.title, self.title);
        } else {
            debug!("Attached void stack {} to {}", child.title, self.title);
        }

        child.parent = Some(self.title.clone());
        self.children.push(child);
        Ok(())
    }

    /// `Fn::GetAtt` reading an output of a rendered child stack.
    pub fn output_ref(&self, child_title: &str, output: &str) -> CoreResult<Value> {
        let child = self
            .child(child_title)
            .ok_or_else(|| CoreError::InvalidStack(format!("{} has no child {}", self.title, child_title)))?;
        let template = child
            .template
            .as_ref()
            .ok_or_else(|| CoreError::InvalidStack(format!("{} is void and has no outputs", child_title)))?;
        if !template.outputs.contains_key(output) {
            return Err(CoreError::InvalidStack(format!(
                "{} does not define output {}",
                child_title, output
            )));
        }
        Ok(get_att(child_title, &format!("Outputs.{}", output)))
    }

    /// Every node of the tree, depth first, starting with this one.
    pub fn iter(&self) -> Vec<&StackNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.iter());
        }
        nodes
    }

    pub fn find(&self, title: &str) -> Option<&StackNode> {
        self.iter().into_iter().find(|n| n.title == title)
    }

    /// Write every rendered template of the tree to `dir` as `<title>.json`.
    pub fn write_all(&self, dir: &Path) -> CoreResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for node in self.iter() {
            if let Some(template) = &node.template {
                let path = dir.join(format!("{}.json", node.title));
                template.write_to(&path)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}
