use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use inline_require::ast::file::File;
use inline_require::ast::js_ast::JsAst;
use inline_require::cli::Cli;
use inline_require::config::Config;
use inline_require::context::Context;
use inline_require::inliner::{FileReport, InlineRequire, InlineRequireOptions};
use inline_require::logger::init_logger;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // cli
    let cli = Cli::parse();
    let root = if cli.root.is_absolute() {
        cli.root.clone()
    } else {
        std::env::current_dir()?.join(&cli.root)
    };

    // config
    let config = Config::new(&root, cli.config_overlay().as_deref())?;
    let options = InlineRequireOptions::new(&config)?;

    // logger
    init_logger(config.verbose);
    debug!("root: {}", root.display());
    debug!("config: {:?}", config);

    let context = Arc::new(Context::new(root));
    let mut inline_require = InlineRequire::new(options);
    let mut failed = 0;
    for path in &cli.files {
        match transform_file(path, &context, &mut inline_require, cli.out_dir.as_deref()) {
            Ok(report) => debug!("report: {}", serde_json::to_string(&report)?),
            Err(e) => {
                error!("{}: {:?}", path.display(), e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(anyhow!("{} of {} files failed", failed, cli.files.len()));
    }
    info!("transformed {} files", cli.files.len());
    Ok(())
}

fn transform_file(
    path: &Path,
    context: &Arc<Context>,
    inline_require: &mut InlineRequire,
    out_dir: Option<&Path>,
) -> Result<FileReport> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read file '{}': {}", path.display(), e))?;
    let mut file = File::new(path.to_string_lossy().to_string(), context.clone());
    file.set_content(content);

    let mut ast = JsAst::new(&file, context.clone())?;
    let report = inline_require.transform(&mut ast)?;
    let code = ast.generate()?;

    match out_dir {
        Some(out_dir) => {
            let target = out_path(out_dir, &file.relative_path)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, code)?;
            debug!("{} -> {}", path.display(), target.display());
        }
        None => println!("{}", code),
    }
    Ok(report)
}

fn out_path(out_dir: &Path, relative_path: &Path) -> Result<PathBuf> {
    if relative_path.is_absolute() {
        return Err(anyhow!(
            "{} is outside of root, cannot mirror it into {}",
            relative_path.display(),
            out_dir.display()
        ));
    }
    Ok(out_dir.join(relative_path))
}
