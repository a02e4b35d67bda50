pub mod template;

pub use template::{CompiledTemplate, RenderedTemplate, Template, TemplateOrigin};
