//! Shader Template Library
//!
//! Every WGSL program of the frame graph is a minijinja template embedded
//! into the binary with rust-embed. Templates live in `shaders/`, shared
//! snippets in `shaders/chunks/` and are pulled in with
//! `{$ include "name" $}`.
//!
//! Templates are specialized by [`ShaderDefines`]: the color encoding of
//! the pass's first input and of its output, and whether the display
//! applies the sRGB transfer function itself.

use std::borrow::Cow;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};
use rust_embed::RustEmbed;
use serde::Serialize;

use crate::errors::Result;

#[derive(RustEmbed)]
#[folder = "src/renderer/shaders"]
struct ShaderAssets;

/// Template switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ShaderDefines {
    /// Decode the first input (and every HDR input) from RGBM.
    pub input_rgbm: bool,
    /// Encode the output to RGBM.
    pub output_rgbm: bool,
    /// The render target applies the sRGB curve on store.
    pub srgb_output: bool,
}

pub struct ShaderLibrary {
    env: Environment<'static>,
}

impl ShaderLibrary {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()?;

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_loader(shader_loader);
        env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());

        Ok(Self { env })
    }

    /// Renders template `name` (without the `.wgsl` extension).
    pub fn render(&self, name: &str, defines: &ShaderDefines) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(defines)?)
    }

    /// Names of all top-level templates.
    pub fn template_names() -> impl Iterator<Item = String> {
        ShaderAssets::iter().filter_map(|path| {
            let path: &str = path.as_ref();
            if path.starts_with("chunks/") {
                return None;
            }
            path.strip_suffix(".wgsl").map(str::to_string)
        })
    }
}

fn shader_loader(name: &str) -> std::result::Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    let Some(file) = ShaderAssets::get(&filename) else {
        return Ok(None);
    };
    match std::str::from_utf8(file.data.as_ref()) {
        Ok(source) => Ok(Some(source.to_string())),
        Err(e) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("{filename} is not valid UTF-8: {e}"),
        )),
    }
}

