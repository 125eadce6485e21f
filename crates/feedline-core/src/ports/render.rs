//! Templating port - turns a view (template name + context) into a response body.

use crate::view::View;

pub trait Renderer: Send + Sync {
    fn render(&self, view: &View) -> Result<String, RenderError>;

    /// MIME type of the produced body.
    fn content_type(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template {template} failed: {reason}")]
    Template {
        template: &'static str,
        reason: String,
    },
}
