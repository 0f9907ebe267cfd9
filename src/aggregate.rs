//! Derived views over the collections: category grouping, product tables
//! and the home page bundle.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::assets::AssetResolver;
use crate::error::StoreError;
use crate::models::{Collection, Project, Reference, Skill, TableRow, Tool};
use crate::reader::EntityReader;

/// Bucket for projects without a category list.
pub const OTHER_CATEGORY: &str = "other";

/// Link prefixes for cross-references between product pages.
pub const TOOL_LINK_PREFIX: &str = "tool/";
pub const PROJECT_LINK_PREFIX: &str = "project/";

/// Sub-lists of a project that become product page tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Software,
    Skills,
}

pub type Categories = BTreeMap<String, Vec<Project>>;

#[derive(Debug, Clone, Serialize)]
pub struct HomeBundle {
    pub categories: Categories,
    pub education: Vec<Skill>,
    pub prog_lang: Vec<Skill>,
    pub software: Vec<Tool>,
    pub other_skills: Vec<Skill>,
    pub languages: Vec<Skill>,
}

#[derive(Clone)]
pub struct Aggregator {
    reader: EntityReader,
    assets: AssetResolver,
}

impl Aggregator {
    pub fn new(reader: EntityReader, assets: AssetResolver) -> Self {
        Self { reader, assets }
    }

    pub fn reader(&self) -> &EntityReader {
        &self.reader
    }

    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    /// All projects keyed by category, with display year and resolved image.
    pub async fn projects_by_category(&self) -> Result<Categories, StoreError> {
        let projects: Vec<Project> = self.reader.find_all(Collection::Projects).await?;
        Ok(group_by_category(projects, &self.assets))
    }

    /// Rows of a project's reverse references for a tool page.
    pub async fn projects_using_tool(&self, tool_id: &str) -> Result<Vec<TableRow>, StoreError> {
        let projects: Vec<Project> = self
            .reader
            .find_referencing(Collection::Projects, "software.id", tool_id)
            .await?;
        Ok(projects.into_iter().map(project_row).collect())
    }

    pub async fn home_bundle(&self) -> Result<HomeBundle, StoreError> {
        Ok(HomeBundle {
            categories: self.projects_by_category().await?,
            education: self.reader.find_all(Collection::Education).await?,
            prog_lang: self.reader.find_all(Collection::ProgLanguage).await?,
            software: self.reader.find_all(Collection::Tools).await?,
            other_skills: self.reader.find_all(Collection::OtherSkills).await?,
            languages: self.reader.find_all(Collection::Language).await?,
        })
    }
}

/// Groups projects by every category they name. A project with no
/// categories lands in [`OTHER_CATEGORY`] only.
pub fn group_by_category(projects: Vec<Project>, assets: &AssetResolver) -> Categories {
    let mut categories = Categories::new();
    for mut project in projects {
        project.date = project.year().to_string();
        project.img = assets.url(&project.img);

        if project.categories.is_empty() {
            categories
                .entry(OTHER_CATEGORY.to_string())
                .or_default()
                .push(project);
            continue;
        }

        for category in &project.categories {
            categories
                .entry(category.name.clone())
                .or_default()
                .push(project.clone());
        }
    }
    categories
}

/// Table rows for one section of a project page. Software rows link to the
/// tool page.
pub fn table_for(project: &Project, section: Section) -> Vec<TableRow> {
    match section {
        Section::Software => project.software.iter().map(software_row).collect(),
        Section::Skills => project.skills.iter().map(reference_row).collect(),
    }
}

fn reference_row(reference: &Reference) -> TableRow {
    let mut row = TableRow::named(reference.name.clone());
    row.extra = reference.extra.clone();
    if let Some(id) = &reference.id {
        row.extra.insert("id".to_string(), id.clone().into());
    }
    row
}

fn software_row(reference: &Reference) -> TableRow {
    let mut row = reference_row(reference);
    row.link = reference
        .id
        .as_ref()
        .map(|id| format!("{}{}", TOOL_LINK_PREFIX, id));
    row
}

pub fn project_row(project: Project) -> TableRow {
    let mut row = TableRow::named(project.name);
    row.link = Some(format!("{}{}", PROJECT_LINK_PREFIX, project.id));
    row.extra.insert("id".to_string(), project.id.into());
    row.extra.insert("short".to_string(), project.short.into());
    row
}
