//! View models handed to the renderer, and the assembler that builds them.
//!
//! The live server and the static builder both go through
//! [`PageAssembler`], so the two rendering paths see identical data.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{table_for, Aggregator, Categories, Section};
use crate::error::StoreError;
use crate::models::{Collection, Project, Skill, TableRow, Tool};

/// Header and footer data shared by every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub title: String,
    pub css: String,
    /// Link suffix: `.html` for static output, empty when served live.
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Home {
    #[serde(flatten)]
    pub page: Page,
    pub categories: Categories,
    pub education: Vec<Skill>,
    pub prog_lang: Vec<Skill>,
    pub software: Vec<Tool>,
    pub other_skills: Vec<Skill>,
    pub languages: Vec<Skill>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Project,
    Tool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    #[serde(flatten)]
    pub page: Page,
    pub description: String,
    pub image: String,
    pub table: BTreeMap<String, Vec<TableRow>>,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub external: String,
    pub noproduct: bool,
}

impl ProductPage {
    fn not_found(kind: ProductKind, html: &str) -> Self {
        let title = match kind {
            ProductKind::Project => "Project Not Found",
            ProductKind::Tool => "Tool Not Found",
        };
        Self {
            page: Page {
                title: title.to_string(),
                css: String::new(),
                html: html.to_string(),
            },
            description: String::new(),
            image: String::new(),
            table: BTreeMap::new(),
            kind,
            external: String::new(),
            noproduct: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Found,
    NotFound,
}

impl PageStatus {
    pub fn is_found(self) -> bool {
        self == PageStatus::Found
    }
}

#[derive(Clone)]
pub struct PageAssembler {
    aggregator: Aggregator,
    html: String,
}

impl PageAssembler {
    pub fn new(aggregator: Aggregator, html: &str) -> Self {
        Self {
            aggregator,
            html: html.to_string(),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    fn page(&self, title: &str, css: &str) -> Page {
        Page {
            title: title.to_string(),
            css: css.to_string(),
            html: self.html.clone(),
        }
    }

    pub async fn home(&self) -> Result<Home, StoreError> {
        let bundle = self.aggregator.home_bundle().await?;
        Ok(Home {
            page: self.page("Portfolio", "home"),
            categories: bundle.categories,
            education: bundle.education,
            prog_lang: bundle.prog_lang,
            software: bundle.software,
            other_skills: bundle.other_skills,
            languages: bundle.languages,
        })
    }

    pub fn impressum(&self) -> Page {
        self.page("Impressum", "")
    }

    pub fn not_found(&self) -> Page {
        self.page("Page not found", "")
    }

    pub async fn project_page(&self, id: &str) -> Result<(ProductPage, PageStatus), StoreError> {
        let project: Option<Project> = self
            .aggregator
            .reader()
            .find_by_id(Collection::Projects, id)
            .await?;

        let Some(project) = project else {
            tracing::debug!(%id, "project not found");
            return Ok((
                ProductPage::not_found(ProductKind::Project, &self.html),
                PageStatus::NotFound,
            ));
        };

        let mut table = BTreeMap::new();
        table.insert("Software".to_string(), table_for(&project, Section::Software));
        table.insert("Skills".to_string(), table_for(&project, Section::Skills));

        Ok((
            ProductPage {
                page: self.page(&project.name, "productpage"),
                image: self.aggregator.assets().url(&project.img),
                description: project.long,
                table,
                kind: ProductKind::Project,
                external: String::new(),
                noproduct: false,
            },
            PageStatus::Found,
        ))
    }

    pub async fn tool_page(&self, id: &str) -> Result<(ProductPage, PageStatus), StoreError> {
        let tool: Option<Tool> = self
            .aggregator
            .reader()
            .find_by_id(Collection::Tools, id)
            .await?;

        let Some(tool) = tool else {
            tracing::debug!(%id, "tool not found");
            return Ok((
                ProductPage::not_found(ProductKind::Tool, &self.html),
                PageStatus::NotFound,
            ));
        };

        let mut table = BTreeMap::new();
        table.insert(
            "Company".to_string(),
            vec![TableRow::named(tool.company.clone())],
        );
        table.insert(
            "Projects".to_string(),
            self.aggregator.projects_using_tool(&tool.id).await?,
        );

        Ok((
            ProductPage {
                page: self.page(&tool.name, "productpage"),
                image: self.aggregator.assets().url(&tool.img),
                description: tool.description,
                table,
                kind: ProductKind::Tool,
                external: tool.externallink,
                noproduct: false,
            },
            PageStatus::Found,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetResolver;
    use crate::config::{DbConfig, ImagesConfig};
    use crate::db::Storage;
    use crate::loader;
    use crate::migrate;
    use crate::reader::EntityReader;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn assembler(tmp: &TempDir, html: &str) -> PageAssembler {
        let storage = Arc::new(Storage::new(&DbConfig {
            path: tmp.path().join("pages.sqlite"),
            ..DbConfig::default()
        }));
        migrate::ensure_collections(&storage).await.unwrap();

        let tools = tmp.path().join("software.json");
        std::fs::write(
            &tools,
            r#"[{"id": "acme", "name": "Acme CLI", "company": "Acme Inc", "description": "A CLI.",
                 "img": "acme.png", "externallink": "https://acme.example"},
                {"id": "lonely", "name": "Lonely", "company": "Nobody"}]"#,
        )
        .unwrap();
        loader::load(&storage, &tools, Collection::Tools).await.unwrap();

        let projects = tmp.path().join("projects.json");
        std::fs::write(
            &projects,
            r#"[{"id": "robot", "name": "Robot", "long": "Builds things.", "img": "robot.png",
                 "date": "2020-02-02", "categories": [{"name": "hardware"}],
                 "software": [{"id": "acme", "name": "Acme CLI"}],
                 "skills": [{"name": "Soldering"}]}]"#,
        )
        .unwrap();
        loader::load(&storage, &projects, Collection::Projects)
            .await
            .unwrap();

        let images = ImagesConfig {
            lores_dir: tmp.path().join("lores"),
            hires_dir: tmp.path().join("hires"),
            placeholder: tmp.path().join("coming-soon.png"),
        };
        let assets = AssetResolver::new(&images, tmp.path());
        let aggregator = Aggregator::new(EntityReader::new(storage), assets);
        PageAssembler::new(aggregator, html)
    }

    #[tokio::test]
    async fn test_tool_page_scenario() {
        let tmp = TempDir::new().unwrap();
        let pages = assembler(&tmp, "").await;

        let (page, status) = pages.tool_page("acme").await.unwrap();
        assert_eq!(status, PageStatus::Found);
        assert_eq!(page.page.title, "Acme CLI");
        assert_eq!(page.kind, ProductKind::Tool);
        assert_eq!(page.external, "https://acme.example");
        assert!(!page.noproduct);
        assert_eq!(page.table["Company"], vec![TableRow::named("Acme Inc")]);

        let projects = &page.table["Projects"];
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Robot");
        assert_eq!(projects[0].link.as_deref(), Some("project/robot"));
    }

    #[tokio::test]
    async fn test_tool_without_projects_has_empty_section() {
        let tmp = TempDir::new().unwrap();
        let pages = assembler(&tmp, "").await;
        let (page, status) = pages.tool_page("lonely").await.unwrap();
        assert!(status.is_found());
        assert!(page.table["Projects"].is_empty());
    }

    #[tokio::test]
    async fn test_project_page() {
        let tmp = TempDir::new().unwrap();
        let pages = assembler(&tmp, ".html").await;

        let (page, status) = pages.project_page("robot").await.unwrap();
        assert_eq!(status, PageStatus::Found);
        assert_eq!(page.page.css, "productpage");
        assert_eq!(page.page.html, ".html");
        assert_eq!(page.description, "Builds things.");
        assert_eq!(page.image, "/static/coming-soon.png");
        assert_eq!(page.table["Software"][0].link.as_deref(), Some("tool/acme"));
        assert_eq!(page.table["Skills"][0].name, "Soldering");
        assert_eq!(page.external, "");
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found_page() {
        let tmp = TempDir::new().unwrap();
        let pages = assembler(&tmp, "").await;

        let (page, status) = pages.project_page("does-not-exist").await.unwrap();
        assert_eq!(status, PageStatus::NotFound);
        assert!(page.noproduct);
        assert_eq!(page.page.title, "Project Not Found");
        assert!(page.table.is_empty());
        assert_eq!(page.description, "");

        let (page, status) = pages.tool_page("does-not-exist").await.unwrap();
        assert_eq!(status, PageStatus::NotFound);
        assert_eq!(page.page.title, "Tool Not Found");
        assert_eq!(page.kind, ProductKind::Tool);
    }

    #[tokio::test]
    async fn test_reverse_reference_symmetry() {
        let tmp = TempDir::new().unwrap();
        let pages = assembler(&tmp, "").await;

        let (project, _) = pages.project_page("robot").await.unwrap();
        for row in &project.table["Software"] {
            let tool_id = row.link.as_deref().unwrap().trim_start_matches("tool/");
            let (tool, status) = pages.tool_page(tool_id).await.unwrap();
            assert!(status.is_found());
            assert!(tool.table["Projects"]
                .iter()
                .any(|r| r.link.as_deref() == Some("project/robot")));
        }
    }

    #[tokio::test]
    async fn test_home_bundle() {
        let tmp = TempDir::new().unwrap();
        let pages = assembler(&tmp, "").await;

        let home = pages.home().await.unwrap();
        assert_eq!(home.page.title, "Portfolio");
        assert_eq!(home.page.css, "home");
        assert_eq!(home.categories["hardware"][0].date, "2020");
        assert_eq!(home.software.len(), 2);
        assert!(home.education.is_empty());
    }

    #[test]
    fn test_product_page_serializes_flat() {
        let page = ProductPage::not_found(ProductKind::Project, ".html");
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["title"], "Project Not Found");
        assert_eq!(value["html"], ".html");
        assert_eq!(value["type"], "project");
        assert_eq!(value["noproduct"], true);
    }
}
