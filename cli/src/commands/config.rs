use std::io::Write;

use unistate_core::api::StateConfig;

use crate::error::CliError;

pub fn print_config(cfg: &StateConfig, out: &mut impl Write) -> Result<i32, CliError> {
    let rendered = cfg
        .to_toml()
        .map_err(|e| CliError::Config(e.to_string()))?;
    out.write_all(rendered.as_bytes())?;
    Ok(0)
}
