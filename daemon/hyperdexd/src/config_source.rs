//! Loading a coordinator-published configuration (spec §4.E, §6). The
//! coordinator's own publish protocol is explicitly out of scope for
//! `hyperdex-config` (its module doc: "does not speak to a coordinator
//! itself — only the receiving half"), so a daemon needs some concrete
//! way to obtain the line-based text that crate parses. This reads it
//! from a file path named by `--connect`, the simplest thing that lets
//! the daemon run end to end; a real coordinator client would replace
//! this function without touching anything downstream of
//! `Configuration`.

use hyperdex_config::{ConfigVersion, Configuration};
use std::path::Path;

pub fn load(path: &Path, version: ConfigVersion, prev: Option<&Configuration>) -> anyhow::Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading configuration at {}: {e}", path.display()))?;
    Ok(Configuration::parse(version, &text, prev)?)
}
