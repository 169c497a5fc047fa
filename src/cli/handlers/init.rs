use std::path::Path;

use tracing::info;

use crate::cli::commands::InitArgs;
use crate::io::config_io;

pub fn cmd_init(args: InitArgs, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dir = config_io::init_workspace(root, args.force)?;
    info!(workspace = %dir.display(), force = args.force, "initialized workspace");
    println!("initialized {}", dir.display());
    Ok(())
}
