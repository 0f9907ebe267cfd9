//! HTML rendering of the view models with Maud.
//!
//! Links carry the page's `html` suffix so the same markup works for the live
//! server (`/project/robot`) and the static build (`/project/robot.html`).

use maud::{html, Markup, DOCTYPE};

use crate::models::{Project, Skill, TableRow, Tool};
use crate::pages::{Home, Page, ProductKind, ProductPage};

/// Root-relative form of an asset URL (`static/css/main.css` or
/// `/static/images/...`).
pub fn asset_url(path: &str) -> String {
    let trimmed = path.trim_start_matches("./").trim_start_matches('/');
    format!("/{}", trimmed)
}

/// Root-relative URL of a page route plus the link suffix.
pub fn page_url(route: &str, html: &str) -> String {
    let route = route.trim_start_matches('/');
    if route.is_empty() {
        return if html.is_empty() {
            "/".to_string()
        } else {
            format!("/index{}", html)
        };
    }
    format!("/{}{}", route, html)
}

fn layout(page: &Page, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page.title) }
                link rel="stylesheet" href=(asset_url("static/css/main.css"));
                @if !page.css.is_empty() {
                    link rel="stylesheet" href=(asset_url(&format!("static/css/{}.css", page.css)));
                }
                script src=(asset_url("static/js/menuControl.js")) defer {}
            }
            body class=(page.css) {
                header {
                    nav {
                        a href=(page_url("", &page.html)) { "Portfolio" }
                        " "
                        a href=(page_url("impressum", &page.html)) { "Impressum" }
                    }
                }
                main { (body) }
                footer {
                    a href=(page_url("impressum", &page.html)) { "Impressum" }
                }
            }
        }
    }
}

fn skill_list(heading: &str, skills: &[Skill]) -> Markup {
    html! {
        @if !skills.is_empty() {
            section class="skills" {
                h2 { (heading) }
                ul {
                    @for skill in skills {
                        li {
                            (skill.name)
                            @for (key, value) in &skill.fields {
                                @if let Some(text) = value.as_str() {
                                    " " span class=(key) { (text) }
                                } @else if value.is_number() {
                                    " " span class=(key) { (value.to_string()) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn project_card(project: &Project, html_suffix: &str) -> Markup {
    html! {
        a.card href=(page_url(&format!("project/{}", project.id), html_suffix)) {
            img src=(asset_url(&project.img)) alt=(project.name);
            h3 { (project.name) }
            span.year { (project.date) }
            @if !project.short.is_empty() {
                p { (project.short) }
            }
        }
    }
}

fn tool_list(tools: &[Tool], html_suffix: &str) -> Markup {
    html! {
        @if !tools.is_empty() {
            section class="software" {
                h2 { "Software" }
                ul {
                    @for tool in tools {
                        li {
                            a href=(page_url(&format!("tool/{}", tool.id), html_suffix)) { (tool.name) }
                        }
                    }
                }
            }
        }
    }
}

pub fn home(home: &Home) -> String {
    let body = html! {
        @for (category, projects) in &home.categories {
            section class="category" id=(category) {
                h2 { (category) }
                div.cards {
                    @for project in projects {
                        (project_card(project, &home.page.html))
                    }
                }
            }
        }
        (skill_list("Education", &home.education))
        (skill_list("Programming Languages", &home.prog_lang))
        (tool_list(&home.software, &home.page.html))
        (skill_list("Other Skills", &home.other_skills))
        (skill_list("Languages", &home.languages))
    };
    layout(&home.page, body).into_string()
}

fn table_cell(row: &TableRow, html_suffix: &str) -> Markup {
    html! {
        @match &row.link {
            Some(link) => {
                a href=(page_url(link, html_suffix)) { (row.name) }
            }
            None => {
                (row.name)
            }
        }
    }
}

pub fn product(product: &ProductPage) -> String {
    let body = html! {
        @if product.noproduct {
            h1 { (product.page.title) }
            p { "There is nothing here." }
            a href=(page_url("", &product.page.html)) { "Back to the overview" }
        } @else {
            article class=(kind_class(product)) {
                h1 { (product.page.title) }
                img src=(asset_url(&product.image)) alt=(product.page.title);
                p { (product.description) }
                @if !product.external.is_empty() {
                    a.external href=(product.external) rel="noopener" { "Website" }
                }
                @for (section, rows) in &product.table {
                    @if !rows.is_empty() {
                        table {
                            thead { tr { th { (section) } } }
                            tbody {
                                @for row in rows {
                                    tr { td { (table_cell(row, &product.page.html)) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    };
    layout(&product.page, body).into_string()
}

fn kind_class(product: &ProductPage) -> &'static str {
    match product.kind {
        ProductKind::Project => "project",
        ProductKind::Tool => "tool",
    }
}

pub fn impressum(page: &Page) -> String {
    let body = html! {
        h1 { (page.title) }
        p { "Responsible for the content of this site is its author." }
    };
    layout(page, body).into_string()
}

pub fn error(page: &Page) -> String {
    let body = html! {
        h1 { (page.title) }
        a href=(page_url("", &page.html)) { "Back to the overview" }
    };
    layout(page, body).into_string()
}
