//! Template and component engine.
//!
//! Two independent pure-text substitution passes:
//!
//! - **Component invocation**: `{{ name "arg1" "arg2" }}` in any HTML
//!   source, resolved against a component body using `{{ $1 }}`,
//!   `{{ $2 }}`, ... positional placeholders.
//! - **Template context**: `{{ .Key }}` in a page template, resolved
//!   against the fixed context keys (`Title`, `Date`, `Author`, `Content`,
//!   `Lang`, `MetaTags`, `Reload`).
//!
//! Both passes are total string transforms: a failure aborts the build
//! rather than emitting partially-expanded output.

use anyhow::{Result, anyhow};
use std::{collections::HashMap, fs, path::Path};

// ============================================================================
// Caches
// ============================================================================

/// Build-scoped template and component caches.
///
/// Loaded once per build from two flat directories, keyed by file name,
/// read-only afterwards. Files added after loading are picked up by the
/// next build, never by this one.
#[derive(Debug, Default)]
pub struct SiteCaches {
    pub templates: HashMap<String, String>,
    pub components: HashMap<String, String>,
}

impl SiteCaches {
    /// Load both caches. Missing directories yield empty caches.
    ///
    /// Templates are keyed by file name (`default.html`); components by
    /// file stem, which is the name used in invocations (`{{ button }}`
    /// for `components/button.html`).
    pub fn load(templates_dir: &Path, components_dir: &Path) -> Result<Self> {
        Ok(Self {
            templates: load_dir(templates_dir, false)?,
            components: load_dir(components_dir, true)?,
        })
    }
}

/// Read every non-hidden file of a flat directory into a name → contents map.
fn load_dir(dir: &Path, strip_ext: bool) -> Result<HashMap<String, String>> {
    let mut cache = HashMap::new();
    if !dir.is_dir() {
        return Ok(cache);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || !path.is_file() {
            continue;
        }

        let key = if strip_ext {
            path.file_stem().and_then(|s| s.to_str()).unwrap_or(name)
        } else {
            name
        };
        cache.insert(key.to_owned(), fs::read_to_string(&path)?);
    }

    Ok(cache)
}

// ============================================================================
// Component Expansion
// ============================================================================

/// Expand every known component invocation in `content`.
///
/// For each cached component, the content is scanned for
/// `{{ <name> ... }}` markers; the quoted argument list is split on `"`
/// with whitespace-only fragments discarded, `{{ $n }}` placeholders in
/// the component body are substituted, and the whole invocation is
/// replaced by the result. Scanning resumes after the spliced-in text, so
/// a component cannot expand itself endlessly; a cycle through *two*
/// components whose bodies embed each other is not guarded and will be
/// left partially unexpanded or loop at authoring time.
///
/// An invocation with no matching ` }}` closer is a fatal error.
pub fn expand_components(content: &str, components: &HashMap<String, String>) -> Result<String> {
    let mut names: Vec<&String> = components.keys().collect();
    // Fixed order so cross-component nesting behaves the same on every build
    names.sort();

    let mut out = content.to_owned();
    for name in names {
        out = expand_one(&out, name, &components[name])?;
    }
    Ok(out)
}

/// Expand all invocations of a single component.
fn expand_one(content: &str, name: &str, body: &str) -> Result<String> {
    let marker = format!("{{{{ {name}");
    let mut out = content.to_owned();
    let mut cursor = 0;

    while let Some(rel) = out[cursor..].find(&marker) {
        let start = cursor + rel;
        let after = start + marker.len();

        // `{{ button` must not match `{{ buttonBig ... }}`
        if !out[after..].starts_with(' ') {
            cursor = after;
            continue;
        }

        let close = out[after..]
            .find(" }}")
            .map(|i| after + i)
            .ok_or_else(|| {
                anyhow!("component `{name}` invocation has no matching ` }}}}` closer")
            })?;

        let args: Vec<&str> = out[after..close]
            .split('"')
            .filter(|frag| !frag.trim().is_empty())
            .collect();

        let mut expansion = body.to_owned();
        for (i, arg) in args.iter().enumerate() {
            expansion = expansion.replace(&format!("{{{{ ${} }}}}", i + 1), arg);
        }

        out.replace_range(start..close + 3, &expansion);
        cursor = start + expansion.len();
    }

    Ok(out)
}

// ============================================================================
// Template Context
// ============================================================================

/// Values substituted into a page template.
///
/// Exactly these keys exist, case-sensitive; unknown `{{ .Key }}` markers
/// in a template are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub title: String,
    pub date: String,
    pub author: String,
    pub content: String,
    pub lang: String,
    pub meta_tags: String,
    pub reload: String,
}

/// Render a page template against the context.
pub fn render_template(template: &str, ctx: &TemplateContext) -> String {
    template
        .replace("{{ .Title }}", &ctx.title)
        .replace("{{ .Date }}", &ctx.date)
        .replace("{{ .Author }}", &ctx.author)
        .replace("{{ .Content }}", &ctx.content)
        .replace("{{ .Lang }}", &ctx.lang)
        .replace("{{ .MetaTags }}", &ctx.meta_tags)
        .replace("{{ .Reload }}", &ctx.reload)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn components(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_button_expansion() {
        let comps = components(&[("button", "<a>{{ $1 }}</a>")]);
        let page = r#"<p>{{ button "Click" }}</p>"#;
        let out = expand_components(page, &comps).unwrap();
        assert_eq!(out, "<p><a>Click</a></p>");
    }

    #[test]
    fn test_multiple_args() {
        let comps = components(&[("link", r#"<a href="{{ $2 }}">{{ $1 }}</a>"#)]);
        let page = r#"{{ link "Home" "/index" }}"#;
        let out = expand_components(page, &comps).unwrap();
        assert_eq!(out, r#"<a href="/index">Home</a>"#);
    }

    #[test]
    fn test_no_args() {
        let comps = components(&[("hr", "<hr>")]);
        let out = expand_components("a {{ hr }} b", &comps).unwrap();
        assert_eq!(out, "a <hr> b");
    }

    #[test]
    fn test_repeated_invocations() {
        let comps = components(&[("b", "<b>{{ $1 }}</b>")]);
        let out = expand_components(r#"{{ b "x" }} and {{ b "y" }}"#, &comps).unwrap();
        assert_eq!(out, "<b>x</b> and <b>y</b>");
    }

    #[test]
    fn test_unknown_component_untouched() {
        let comps = components(&[("known", "k")]);
        let page = r#"{{ mystery "arg" }}"#;
        let out = expand_components(page, &comps).unwrap();
        assert_eq!(out, page);
    }

    #[test]
    fn test_prefix_name_collision() {
        let comps = components(&[("button", "<a>{{ $1 }}</a>"), ("buttonBig", "<big>{{ $1 }}</big>")]);
        let page = r#"{{ buttonBig "X" }}"#;
        let out = expand_components(page, &comps).unwrap();
        assert_eq!(out, "<big>X</big>");
    }

    #[test]
    fn test_missing_closer_is_fatal() {
        let comps = components(&[("b", "<b></b>")]);
        let err = expand_components("{{ b \"oops\"", &comps).unwrap_err();
        assert!(format!("{err}").contains("no matching"));
    }

    #[test]
    fn test_self_reference_terminates() {
        // The spliced body is not re-scanned for the same component, so a
        // self-referencing body terminates with the inner invocation kept.
        let comps = components(&[("loop", "X {{ loop }} Y")]);
        let out = expand_components("{{ loop }}", &comps).unwrap();
        assert_eq!(out, "X {{ loop }} Y");
    }

    #[test]
    fn test_expansion_idempotent_without_placeholders() {
        let comps = components(&[("hr", "<hr>")]);
        let once = expand_components("a {{ hr }} b", &comps).unwrap();
        let twice = expand_components(&once, &comps).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_template_context_substitution() {
        let ctx = TemplateContext {
            title: "T".into(),
            date: "D".into(),
            author: "A".into(),
            content: "<p>C</p>".into(),
            lang: "en-US".into(),
            meta_tags: "<meta>".into(),
            reload: String::new(),
        };
        let tpl = "<html lang=\"{{ .Lang }}\">{{ .MetaTags }}<h1>{{ .Title }}</h1>{{ .Content }}{{ .Reload }}</html>";
        let out = render_template(tpl, &ctx);
        assert_eq!(
            out,
            "<html lang=\"en-US\"><meta><h1>T</h1><p>C</p></html>"
        );
    }

    #[test]
    fn test_unknown_context_key_untouched() {
        let ctx = TemplateContext::default();
        let out = render_template("{{ .Nope }}{{ .Title }}", &ctx);
        assert_eq!(out, "{{ .Nope }}");
    }

    #[test]
    fn test_case_sensitive_keys() {
        let ctx = TemplateContext {
            title: "T".into(),
            ..Default::default()
        };
        assert_eq!(render_template("{{ .title }}", &ctx), "{{ .title }}");
    }

    #[test]
    fn test_cache_load_skips_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("button.html"), "<a></a>").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "junk").unwrap();

        let cache = load_dir(dir.path(), false).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("button.html"));
    }

    #[test]
    fn test_cache_load_component_keys_are_stems() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("button.html"), "<a>{{ $1 }}</a>").unwrap();

        let cache = load_dir(dir.path(), true).unwrap();
        assert!(cache.contains_key("button"));
        assert!(!cache.contains_key("button.html"));
    }

    #[test]
    fn test_cache_load_missing_dir() {
        let cache = load_dir(Path::new("/nonexistent/vela-components"), true).unwrap();
        assert!(cache.is_empty());
    }
}
