use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use crawlctl::exec::CommandSpec;

/// A shell script standing in for the crawler.
///
/// Keep the `TempDir` alive for as long as the script may run.
pub struct FakeCrawler {
    pub dir: TempDir,
    pub script: PathBuf,
}

impl FakeCrawler {
    /// `sh <script>` running in the script's directory.
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new("sh")
            .with_script(&self.script)
            .with_working_dir(self.dir.path())
    }
}

/// Write `body` as `crawler.sh` into a fresh temp dir.
pub fn fake_crawler_script(body: &str) -> Result<FakeCrawler> {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("crawler.sh");
    fs::write(&script, format!("#!/bin/sh\n{body}\n"))?;
    Ok(FakeCrawler { dir, script })
}
