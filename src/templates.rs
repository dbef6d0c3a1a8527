//! HTML page templates using Tera.
//!
//! Pages are embedded in the binary. A templates directory may override any
//! of them by providing a file with the same relative name.

use crate::error::{Error, Result};
use crate::tasks::Task;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};
use tracing::{debug, warn};

/// File extension of page templates.
const TEMPLATE_EXTENSION: &str = "html";

/// Embedded default templates.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("base.html", include_str!("../templates/base.html"));
    m.insert("index.html", include_str!("../templates/index.html"));
    m.insert("list.html", include_str!("../templates/list.html"));
    m.insert("insert.html", include_str!("../templates/insert.html"));
    m.insert("update.html", include_str!("../templates/update.html"));
    m.insert("error.html", include_str!("../templates/error.html"));

    m
});

/// The loaded page templates.
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Load only the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded template fails to parse.
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    /// Load the embedded templates, overridden by any `*.html` files under `templates_dir`.
    ///
    /// A directory that does not exist is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a template fails to parse.
    pub fn load(templates_dir: Option<&Path>) -> Result<Self> {
        let mut sources: HashMap<String, String> = EMBEDDED_TEMPLATES
            .iter()
            .map(|(name, content)| ((*name).to_string(), (*content).to_string()))
            .collect();

        if let Some(dir) = templates_dir {
            if dir.is_dir() {
                collect_template_files(dir, dir, &mut sources)?;
            } else {
                warn!(dir = %dir.display(), "templates directory not found, using embedded templates");
            }
        }

        // Added together so `extends` can resolve regardless of source
        let mut tera = Tera::default();
        tera.add_raw_templates(sources).map_err(|e| {
            Error::Template(format!("Failed to load templates: {}", Error::from(e)))
        })?;

        Ok(Self { tera })
    }

    /// Render a template with the given context.
    ///
    /// # Errors
    ///
    /// Returns an error if the template doesn't exist or rendering fails.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        self.tera.render(name, context).map_err(|e| {
            Error::Template(format!("Failed to render template {name}: {}", Error::from(e)))
        })
    }

    /// Names of all loaded templates.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Verify every embedded page renders with sample data.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first template that fails.
    pub fn verify(&self) -> Result<()> {
        for name in embedded_template_names() {
            if name == "base.html" {
                continue;
            }
            self.render(name, &sample_context())
                .map_err(|e| Error::Template(format!("Template {name} failed to render: {e}")))?;
        }
        Ok(())
    }
}

/// Get the list of all embedded template names.
#[must_use]
pub fn embedded_template_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = EMBEDDED_TEMPLATES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Read every template file under `dir`, keyed by its path relative to `root`.
fn collect_template_files(
    root: &Path,
    dir: &Path,
    sources: &mut HashMap<String, String>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_template_files(root, &path, sources)?;
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(TEMPLATE_EXTENSION) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!(template = %name, "loading template override");
        sources.insert(name, std::fs::read_to_string(&path)?);
    }
    Ok(())
}

/// A context holding every variable any page reads.
fn sample_context() -> Context {
    let mut ctx = Context::new();
    let task = Task::new(1, "Sample task", false);
    ctx.insert("tasks", &vec![task.clone(), Task::new(2, "Finished task", true)]);
    ctx.insert("task", &task);
    ctx.insert("message", "Sample validation message");
    ctx.insert("description", "Sample task");
    ctx.insert("status", &false);
    ctx.insert("status_code", &404_u16);
    ctx.insert("reason", "Not Found");
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn list_context(tasks: &[Task]) -> Context {
        let mut ctx = Context::new();
        ctx.insert("tasks", tasks);
        ctx
    }

    #[test]
    fn test_all_embedded_templates_render() {
        Templates::embedded().unwrap().verify().unwrap();
    }

    #[test]
    fn test_embedded_template_names() {
        let names = embedded_template_names();
        assert_eq!(
            names,
            vec!["base.html", "error.html", "index.html", "insert.html", "list.html", "update.html"]
        );
    }

    #[test]
    fn test_page_titles() {
        let templates = Templates::embedded().unwrap();
        let index = templates.render("index.html", &Context::new()).unwrap();
        assert!(index.contains("<title>Home</title>"));

        let list = templates.render("list.html", &list_context(&[])).unwrap();
        assert!(list.contains("<title>Task List</title>"));
    }

    #[test]
    fn test_list_escapes_descriptions() {
        let templates = Templates::embedded().unwrap();
        let html = templates
            .render("list.html", &list_context(&[Task::new(1, "<script>alert(1)</script>", false)]))
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_insert_form_shows_message() {
        let templates = Templates::embedded().unwrap();
        let mut ctx = Context::new();
        ctx.insert("message", "Fill in the Description field.");
        let html = templates.render("insert.html", &ctx).unwrap();
        assert!(html.contains("Fill in the Description field."));
    }

    #[test]
    fn test_filesystem_templates_override_embedded() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("index.html"),
            "{% extends \"base.html\" %}{% block title %}Custom{% endblock %}",
        )
        .unwrap();

        let templates = Templates::load(Some(dir.path())).unwrap();
        let html = templates.render("index.html", &Context::new()).unwrap();
        assert!(html.contains("<title>Custom</title>"));
        // untouched pages still come from the embedded set
        assert!(templates.names().contains(&"list.html"));
    }

    #[test]
    fn test_nested_override_names_use_forward_slashes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("partials").join("footer.html"), "footer").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a template").unwrap();

        let templates = Templates::load(Some(dir.path())).unwrap();
        assert!(templates.names().contains(&"partials/footer.html"));
        assert!(!templates.names().iter().any(|n| n.ends_with(".txt")));
    }

    #[test]
    fn test_missing_directory_falls_back_to_embedded() {
        let templates = Templates::load(Some(Path::new("/nonexistent/templates"))).unwrap();
        assert_eq!(templates.names().len(), embedded_template_names().len());
    }

    #[test]
    fn test_invalid_override_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "{% if foo %}unclosed if tag without endif")
            .unwrap();

        let err = Templates::load(Some(dir.path())).unwrap_err().to_string();
        assert!(err.contains("Failed to load templates"), "Error was: {err}");
    }

    #[test]
    fn test_render_missing_template_fails() {
        let templates = Templates::embedded().unwrap();
        assert!(templates.render("nonexistent.html", &Context::new()).is_err());
    }
}
