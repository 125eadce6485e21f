use feedline_core::ports::{RenderError, Renderer};
use feedline_core::view::View;

/// Renders a view as `{"template": ..., "context": ...}` for an external
/// templating layer or API clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, view: &View) -> Result<String, RenderError> {
        serde_json::to_string(view).map_err(|e| RenderError::Template {
            template: view.template,
            reason: e.to_string(),
        })
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_renders_template_and_context() {
        let view = View::new("posts/index.html", json!({ "page_obj": { "number": 1 } }));
        let body = JsonRenderer.render(&view).unwrap();

        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["template"], "posts/index.html");
        assert_eq!(parsed["context"]["page_obj"]["number"], 1);
    }

    #[test]
    fn test_same_view_renders_identically() {
        let view = View::new("posts/follow.html", json!({ "b": 2, "a": 1 }));
        assert_eq!(JsonRenderer.render(&view).unwrap(), JsonRenderer.render(&view).unwrap());
    }
}
