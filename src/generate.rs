//! Static site generation.
//!
//! Renders every enumerated URL of a scanned [`Site`] to disk.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                     # /
//! ├── err-404.html                   # Not-found page ([build] not_found_page)
//! ├── assets/...                     # content/assets copied verbatim
//! ├── about/index.html               # /about/
//! └── blog/
//!     ├── index.html                 # /blog/
//!     ├── page/2/index.html          # /blog/page/2/
//!     ├── tag/python/index.html      # /blog/tag/python/
//!     ├── 2022/index.html            # /blog/2022/
//!     ├── 2022/03/index.html         # /blog/2022/03/
//!     └── 2022/03/hello/index.html   # /blog/2022/03/hello/
//! ```
//!
//! Each path is resolved through the [`Router`], exactly as a request would
//! be, and rendered in parallel with rayon. A path that does not resolve to a
//! 200 is logged and reported rather than written.
//!
//! Only one build may write to an output directory at a time; see
//! [`BuildLock`].

use crate::enumerate::{SkippedBucket, enumerate};
use crate::render::{RenderContext, render_listing, render_not_found, render_page};
use crate::routing::{MatchedPage, Resolution, Router, Status};
use crate::scan::Site;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const LOCK_FILE: &str = ".ninepints-build.lock";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("another build is writing to this directory (remove {} if it is stale)", .0.display())]
    Locked(PathBuf),
    #[error("Copying assets: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Exclusive claim on an output directory, released on drop.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    pub fn acquire(output_dir: &Path) -> Result<Self, GenerateError> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(LOCK_FILE);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(GenerateError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not release build lock");
        }
    }
}

/// A path that was enumerated but did not resolve to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnexpectedStatus {
    pub path: String,
    pub status: u16,
}

#[derive(Debug, Default, Serialize)]
pub struct BuildReport {
    /// URL paths written, sorted.
    pub written: Vec<String>,
    pub unexpected: Vec<UnexpectedStatus>,
    pub skipped: Vec<SkippedBucket>,
    pub not_found_page: PathBuf,
    pub assets_copied: usize,
}

enum Outcome {
    Written(String),
    Unexpected(UnexpectedStatus),
}

/// Render the whole site into `output_dir`.
pub fn build(site: &Site, output_dir: &Path) -> Result<BuildReport, GenerateError> {
    let _lock = BuildLock::acquire(output_dir)?;

    let enumeration = enumerate(&site.tree);
    let ctx = RenderContext::new(&site.tree, &site.config);
    let router = Router::new(&site.tree);
    tracing::info!(paths = enumeration.paths.len(), "rendering");

    let outcomes = enumeration
        .paths
        .par_iter()
        .map(|path| render_path(&ctx, router, path, output_dir))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = BuildReport {
        skipped: enumeration.skipped,
        ..BuildReport::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Written(path) => report.written.push(path),
            Outcome::Unexpected(unexpected) => {
                tracing::warn!(
                    path = %unexpected.path,
                    status = unexpected.status,
                    "enumerated path did not render"
                );
                report.unexpected.push(unexpected);
            }
        }
    }

    report.not_found_page = output_dir.join(&site.config.build.not_found_page);
    fs::write(&report.not_found_page, render_not_found(&ctx).into_string())?;

    if let Some(assets) = site.assets_dir() {
        report.assets_copied = copy_assets(&assets, &output_dir.join("assets"))?;
    }

    tracing::info!(
        written = report.written.len(),
        assets = report.assets_copied,
        "build finished"
    );
    Ok(report)
}

fn render_path(
    ctx: &RenderContext,
    router: Router,
    path: &str,
    output_dir: &Path,
) -> Result<Outcome, GenerateError> {
    let resolution = router.resolve(path);
    let markup = match &resolution {
        Resolution::Page(MatchedPage::Real(page)) => render_page(ctx, page),
        Resolution::Listing(listing) => render_listing(ctx, listing),
        other => {
            let status: Status = other.status();
            return Ok(Outcome::Unexpected(UnexpectedStatus {
                path: path.to_string(),
                status: status.code(),
            }));
        }
    };

    let file = output_file(output_dir, path);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file, markup.into_string())?;
    tracing::debug!(path, file = %file.display(), "wrote page");
    Ok(Outcome::Written(path.to_string()))
}

/// `<output>/<url path>/index.html`.
pub fn output_file(output_dir: &Path, url_path: &str) -> PathBuf {
    url_path
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(output_dir.to_path_buf(), |dir, segment| dir.join(segment))
        .join("index.html")
}

fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
