//! Project operations for the Harbor v2.0 API
//!
//! Copies every project of a source registry onto a target registry:
//! - Project listing (GET /api/v2.0/projects?with_detail=true, paginated)
//! - Project creation (POST /api/v2.0/projects)

use crate::common::RunContext;
use crate::config::RegistryEndpoint;
use crate::error::Result;
use crate::error::handlers::describe_status;
use crate::registry::paginate::{PageFetcher, PageHandler, PageOutcome, decode_page};
use crate::registry::transport::RegistryTransport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const PROJECTS_PATH: &str = "/api/v2.0/projects";
const PROJECTS_LIST_PATH: &str = "/api/v2.0/projects?with_detail=true";

/// A project as listed by the source registry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub metadata: ProjectMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Harbor carries the visibility flag as the string "true" or "false".
    #[serde(default)]
    pub public: String,
}

/// Body of a project creation call.
#[derive(Debug, Serialize)]
pub struct CreateProjectRequest<'a> {
    pub project_name: &'a str,
    pub metadata: &'a ProjectMetadata,
    /// -1 means unlimited
    pub storage_limit: i64,
    /// Always null: projects are not bound to a proxy-cache registry
    pub registry_id: Option<i64>,
}

impl<'a> From<&'a Project> for CreateProjectRequest<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            project_name: &project.name,
            metadata: &project.metadata,
            storage_limit: -1,
            registry_id: None,
        }
    }
}

#[derive(Clone)]
pub struct ProjectOperations {
    transport: Arc<dyn RegistryTransport>,
    fetcher: PageFetcher,
}

impl ProjectOperations {
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        let fetcher = PageFetcher::new(transport.clone());
        Self { transport, fetcher }
    }

    /// Creates every project of `source` on `target`, in listing order.
    ///
    /// Returns the number of creation calls issued. The first transport or
    /// decode error stops the walk; no later project is created.
    pub async fn transfer_projects(
        &self,
        ctx: &RunContext,
        source: &RegistryEndpoint,
        target: &RegistryEndpoint,
    ) -> Result<usize> {
        let mut creator = ProjectCreator {
            transport: self.transport.as_ref(),
            target,
            created: 0,
        };

        self.fetcher
            .fetch_pages(ctx, source, PROJECTS_LIST_PATH, &mut creator)
            .await?;

        Ok(creator.created)
    }
}

/// Page handler that issues one creation call per listed project.
struct ProjectCreator<'a> {
    transport: &'a dyn RegistryTransport,
    target: &'a RegistryEndpoint,
    created: usize,
}

impl ProjectCreator<'_> {
    async fn create(&self, ctx: &RunContext, project: &Project) -> Result<()> {
        let body = serde_json::to_vec(&CreateProjectRequest::from(project))?;
        let url = self.target.resolve(PROJECTS_PATH)?;

        tracing::info!(
            project = %project.name,
            public = %project.metadata.public,
            "Creating project on target"
        );
        let response = ctx.run(self.transport.post(self.target, url, body)).await?;

        // Harbor answers 201 with an empty body; anything else is only reported.
        if response.is_success() {
            if !response.body.is_empty() {
                tracing::info!(project = %project.name, "{}", response.body_text());
            }
        } else {
            tracing::warn!(
                project = %project.name,
                "{}: {}",
                describe_status(response.status, "project creation"),
                response.body_text()
            );
        }

        Ok(())
    }
}

#[async_trait]
impl PageHandler for ProjectCreator<'_> {
    async fn handle_page(&mut self, ctx: &RunContext, body: &[u8]) -> Result<PageOutcome> {
        let projects: Vec<Project> = decode_page(body)?;
        if projects.is_empty() {
            return Ok(PageOutcome::Done);
        }

        for project in &projects {
            self.create(ctx, project).await?;
            self.created += 1;
        }

        Ok(PageOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_body_shape() {
        let project: Project =
            serde_json::from_str(r#"{"name":"a","project_id":3,"metadata":{"public":"true","auto_scan":"false"}}"#)
                .unwrap();
        let body = serde_json::to_string(&CreateProjectRequest::from(&project)).unwrap();
        assert_eq!(
            body,
            r#"{"project_name":"a","metadata":{"public":"true"},"storage_limit":-1,"registry_id":null}"#
        );
    }

    #[test]
    fn test_project_without_metadata() {
        let project: Project = serde_json::from_str(r#"{"name":"library"}"#).unwrap();
        assert_eq!(project.metadata.public, "");
    }

    #[test]
    fn test_project_name_is_escaped() {
        let project = Project {
            name: r#"we"ird"#.to_string(),
            metadata: ProjectMetadata {
                public: "false".to_string(),
            },
        };
        let body = serde_json::to_value(CreateProjectRequest::from(&project)).unwrap();
        assert_eq!(body["project_name"], r#"we"ird"#);
    }
}
