//! Per-source extraction pipeline
//!
//! Stages run strictly in order and each one is gated on the previous:
//!
//! 1. stamp: create the scratch dir and write a fresh `buildstamp`
//! 2. generate: render and write the Dancefile
//! 3. build: `buildx build` into `dance:extract`
//! 4. reset container: `rm -f cache-container`, failures tolerated
//! 5. materialize: `create` the container without starting it
//! 6. extract: `cp -L cache-container:/var/dance-cache - | tar -x`
//! 7. relocate: replace `<workdir>/<source>` with the staged tree

use crate::cache::{CacheOptions, CacheSource, ResolvedOptions};
use crate::error::{DanceError, DanceResult};
use crate::extract::progress::{ProgressSink, Stage};
use crate::extract::template::{self, BUILDSTAMP_NAME, DANCEFILE_NAME};
use crate::orchestration::engine::{archive_extract, privileged_remove};
use crate::orchestration::{ContainerEngine, ProcessRunner, RemovalOutcome};
use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Directory under the scratch dir where `tar` unpacks the cache root
pub const STAGING_DIR_NAME: &str = "dance-cache";

/// Settings shared by every source in a batch
#[derive(Debug, Clone)]
pub struct ExtractSettings {
    pub scratch_dir: PathBuf,
    pub workdir: PathBuf,
    pub utility_image: String,
    pub builder: Option<String>,
    /// Prefix destination removal with sudo
    pub sudo: bool,
}

impl From<&ResolvedOptions> for ExtractSettings {
    fn from(resolved: &ResolvedOptions) -> Self {
        Self {
            scratch_dir: resolved.scratch_dir.clone(),
            workdir: resolved.workdir.clone(),
            utility_image: resolved.utility_image.clone(),
            builder: resolved.builder.clone(),
            sudo: resolved.sudo.use_sudo(),
        }
    }
}

/// Runs the extraction pipeline against a process runner
pub struct Extractor<'a> {
    runner: &'a dyn ProcessRunner,
    progress: &'a dyn ProgressSink,
    engine: ContainerEngine,
    settings: ExtractSettings,
}

impl<'a> Extractor<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        progress: &'a dyn ProgressSink,
        engine: ContainerEngine,
        settings: ExtractSettings,
    ) -> Self {
        Self {
            runner,
            progress,
            engine,
            settings,
        }
    }

    /// Where `tar` leaves this source's tree before relocation
    pub fn staged_path(&self, source: &CacheSource) -> PathBuf {
        self.settings
            .scratch_dir
            .join(STAGING_DIR_NAME)
            .join(source.as_str())
    }

    /// Final location of the extracted cache
    pub fn destination(&self, source: &CacheSource) -> PathBuf {
        self.settings.workdir.join(source.as_str())
    }

    /// Extract one cache source into the working directory
    pub async fn extract(&self, source: &CacheSource, options: &CacheOptions) -> DanceResult<()> {
        self.stamp(source).await?;
        let dancefile = self.generate(source, options).await?;
        self.build(source, &dancefile).await?;
        self.reset_container(source).await;
        self.materialize(source).await?;
        let staged = self.extract_archive(source).await?;
        self.relocate(source, &staged).await?;

        self.progress.event(
            Stage::Done,
            source,
            &format!("extracted to {}", self.destination(source).display()),
        );
        Ok(())
    }

    async fn stamp(&self, source: &CacheSource) -> DanceResult<()> {
        let scratch = &self.settings.scratch_dir;
        fs::create_dir_all(scratch).await.map_err(|e| {
            DanceError::io(format!("creating scratch directory {}", scratch.display()), e)
        })?;

        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let path = scratch.join(BUILDSTAMP_NAME);
        fs::write(&path, &stamp)
            .await
            .map_err(|e| DanceError::io(format!("writing {}", path.display()), e))?;

        self.progress
            .event(Stage::Stamp, source, &format!("buildstamp {}", stamp));
        Ok(())
    }

    async fn generate(&self, source: &CacheSource, options: &CacheOptions) -> DanceResult<PathBuf> {
        let content = template::render(
            source,
            options.target_path(),
            options.mount_args(),
            &self.settings.utility_image,
        );

        let path = self.settings.scratch_dir.join(DANCEFILE_NAME);
        fs::write(&path, &content)
            .await
            .map_err(|e| DanceError::io(format!("writing {}", path.display()), e))?;

        self.progress
            .event(Stage::Generate, source, &format!("target: {}", options.target_path()));
        self.progress
            .event(Stage::Generate, source, &format!("mount args: {}", options.mount_args()));
        self.progress
            .event(Stage::Generate, source, &format!("Dancefile:\n{}", content));
        Ok(path)
    }

    async fn build(&self, source: &CacheSource, dancefile: &Path) -> DanceResult<()> {
        let cmd = self.engine.build(
            dancefile,
            &self.settings.scratch_dir,
            self.settings.builder.as_deref(),
        );
        self.progress.event(Stage::Build, source, &cmd.to_string());
        self.runner.run(&cmd).await
    }

    /// Never fails: the slot is usually empty and other failures surface at create
    async fn reset_container(&self, source: &CacheSource) {
        match self.engine.remove_container(self.runner).await {
            RemovalOutcome::Removed => {
                self.progress
                    .event(Stage::ResetContainer, source, "removed previous container");
            }
            RemovalOutcome::Absent => {
                debug!("No previous extraction container");
            }
            RemovalOutcome::Failed(err) => {
                // TODO: abort on non-absent failures once an opt-in strict mode exists
                warn!("Ignoring container removal failure: {}", err);
            }
        }
    }

    async fn materialize(&self, source: &CacheSource) -> DanceResult<()> {
        let cmd = self.engine.create_container();
        self.progress.event(Stage::Materialize, source, &cmd.to_string());
        self.runner.run(&cmd).await
    }

    async fn extract_archive(&self, source: &CacheSource) -> DanceResult<PathBuf> {
        let staged = self.staged_path(source);
        let stale = fs::try_exists(&staged)
            .await
            .map_err(|e| DanceError::io(format!("checking {}", staged.display()), e))?;
        if stale {
            debug!("Clearing stale staging dir {}", staged.display());
            fs::remove_dir_all(&staged).await.map_err(|e| {
                DanceError::io(format!("clearing stale {}", staged.display()), e)
            })?;
        }

        let producer = self.engine.copy_out();
        let consumer = archive_extract(&self.settings.scratch_dir);
        self.progress.event(
            Stage::Extract,
            source,
            &format!("{} | {}", producer, consumer),
        );
        self.runner.run_piped(&producer, &consumer).await?;

        let files = list_dir(&staged).await?;
        self.progress.event(
            Stage::Extract,
            source,
            &format!("extracted files: [{}]", files.join(", ")),
        );
        Ok(staged)
    }

    async fn relocate(&self, source: &CacheSource, staged: &Path) -> DanceResult<()> {
        let dest = self.destination(source);

        let remove = privileged_remove(&dest, self.settings.sudo);
        self.progress.event(Stage::Relocate, source, &remove.to_string());
        self.runner.run(&remove).await?;

        fs::rename(staged, &dest).await.map_err(|e| {
            DanceError::io(
                format!("moving {} to {}", staged.display(), dest.display()),
                e,
            )
        })?;

        self.progress.event(
            Stage::Relocate,
            source,
            &format!("{} -> {}", staged.display(), dest.display()),
        );
        Ok(())
    }
}

/// Sorted entry names of a directory
async fn list_dir(dir: &Path) -> DanceResult<Vec<String>> {
    let context = || format!("reading extracted cache {}", dir.display());

    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DanceError::io(context(), e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DanceError::io(context(), e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
