use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Open the HCL destination. `None` and `-` write to stdout. An existing file
/// is only replaced with `overwrite`.
pub fn open(output: Option<&str>, overwrite: bool) -> Result<Box<dyn Write>> {
    match output {
        None | Some("-") => {
            debug!("writing HCL to stdout");
            Ok(Box::new(BufWriter::new(io::stdout())))
        }
        Some(path) => {
            if Path::new(path).exists() && !overwrite {
                bail!("output file {path} already exists, pass --overwrite-existing to replace it");
            }
            let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
            debug!(file = path, "opened output file");
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_existing_file_is_not_clobbered() {
        let path = std::env::temp_dir().join(format!("k2tf-output-{}.tf", std::process::id()));
        fs::write(&path, "keep me\n").unwrap();
        let path_str = path.to_str().unwrap();

        let err = open(Some(path_str), false).err().unwrap();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");

        let mut out = open(Some(path_str), true).unwrap();
        out.write_all(b"replaced\n").unwrap();
        out.flush().unwrap();
        drop(out);
        assert_eq!(fs::read_to_string(&path).unwrap(), "replaced\n");

        fs::remove_file(&path).unwrap();
    }
}
