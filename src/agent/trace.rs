//! Per-step debug artifacts: the exact image, listing and raw text of each
//! inference call.

use crate::error::Result;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `step_<n>_*` files under `<base>/task_<unix-seconds>/`
#[derive(Debug, Clone)]
pub struct TraceWriter {
    dir: PathBuf,
}

impl TraceWriter {
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let dir = base.as_ref().join(format!("task_{}", chrono::Utc::now().timestamp()));
        fs::create_dir_all(&dir)?;
        log::info!("Writing debug trace to {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_view(&self, step: u32, image: &DynamicImage) -> Result<()> {
        image.save(self.step_path(step, "view.png"))?;
        Ok(())
    }

    pub fn write_dom(&self, step: u32, listing: &str) -> Result<()> {
        fs::write(self.step_path(step, "dom.txt"), listing)?;
        Ok(())
    }

    pub fn write_output(&self, step: u32, raw: &str) -> Result<()> {
        fs::write(self.step_path(step, "output.txt"), raw)?;
        Ok(())
    }

    fn step_path(&self, step: u32, suffix: &str) -> PathBuf {
        self.dir.join(format!("step_{}_{}", step, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_step_files() {
        let base = tempfile::tempdir().unwrap();
        let trace = TraceWriter::create(base.path()).unwrap();

        trace.write_view(1, &DynamicImage::new_rgb8(8, 4)).unwrap();
        trace.write_dom(1, "[0] <option> Target element is not in this list").unwrap();
        trace.write_output(1, "{\"action\": \"scroll\"}").unwrap();

        let dir = trace.dir();
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with("task_"));
        assert!(dir.join("step_1_view.png").exists());
        assert_eq!(
            fs::read_to_string(dir.join("step_1_dom.txt")).unwrap(),
            "[0] <option> Target element is not in this list"
        );
        assert_eq!(fs::read_to_string(dir.join("step_1_output.txt")).unwrap(), "{\"action\": \"scroll\"}");

        let view = image::open(dir.join("step_1_view.png")).unwrap();
        assert_eq!((view.width(), view.height()), (8, 4));
    }
}
