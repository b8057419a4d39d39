use std::io::{self, Write};

use k2tf::TranslationEngine;
use k2tf_hcl::Renderer;
use k2tf_yaml::{Catalog, Config, decode_str_with_config};
use tracing::{error, info, warn};

use crate::input::Source;

/// Decodes, translates and renders sources one after another, keeping count
/// of what succeeded.
pub struct Converter<'a> {
    catalog: &'a Catalog,
    decode: Config,
    engine: TranslationEngine<'a>,
    renderer: Renderer,
    written: usize,
    failed: usize,
}

impl<'a> Converter<'a> {
    pub fn new(catalog: &'a Catalog, decode: Config, engine: TranslationEngine<'a>) -> Self {
        Self {
            catalog,
            decode,
            engine,
            renderer: Renderer::default(),
            written: 0,
            failed: 0,
        }
    }

    /// Write every object of `source` that translates. Resources are separated
    /// by a blank line. Objects that fail are logged and counted.
    pub fn convert(&mut self, source: &Source, out: &mut dyn Write) -> io::Result<()> {
        let decoded = decode_str_with_config(&source.contents, self.catalog, &self.decode);
        for err in &decoded.errors {
            error!(source = %source.name, "{err}");
            self.failed += 1;
        }

        for object in &decoded.objects {
            let translation = match self.engine.translate(object) {
                Ok(translation) => translation,
                Err(err) => {
                    error!(
                        source = %source.name,
                        kind = object.kind().unwrap_or_default(),
                        name = object.name().unwrap_or_default(),
                        "{err}"
                    );
                    self.failed += 1;
                    continue;
                }
            };

            let warnings = translation.warning_count();
            if warnings > 0 {
                warn!(
                    source = %source.name,
                    name = object.name().unwrap_or_default(),
                    warnings,
                    "converted with warnings"
                );
            }
            if self.written > 0 {
                out.write_all(b"\n")?;
            }
            out.write_all(self.renderer.render(&translation.tree).as_bytes())?;
            self.written += 1;
        }
        Ok(())
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn summarize(&self) {
        info!(written = self.written, failed = self.failed, "conversion finished");
    }
}
