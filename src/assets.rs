//! Image path resolution with a low-res → high-res → placeholder fallback,
//! and the mapping from resolved files to URLs below `/static`.

use std::path::{Component, Path, PathBuf};

use crate::config::ImagesConfig;

/// Mount point of `site.static_dir` in both the server and the static build.
pub const STATIC_URL_PREFIX: &str = "/static";

#[derive(Debug, Clone)]
pub struct AssetResolver {
    lores_dir: PathBuf,
    hires_dir: PathBuf,
    placeholder: PathBuf,
    static_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(config: &ImagesConfig, static_dir: &Path) -> Self {
        Self {
            lores_dir: config.lores_dir.clone(),
            hires_dir: config.hires_dir.clone(),
            placeholder: config.placeholder.clone(),
            static_dir: static_dir.to_path_buf(),
        }
    }

    pub fn placeholder(&self) -> &Path {
        &self.placeholder
    }

    /// Resolves a logical image name to the first existing candidate. Checks
    /// the filesystem on every call. Names that are not a plain file name
    /// resolve to the placeholder.
    pub fn resolve(&self, name: &str) -> String {
        let name = name.trim();
        if !is_plain_file_name(name) {
            return self.placeholder.to_string_lossy().into_owned();
        }

        [&self.lores_dir, &self.hires_dir]
            .into_iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| self.placeholder.clone())
            .to_string_lossy()
            .into_owned()
    }

    /// Resolves `name` and returns its URL below [`STATIC_URL_PREFIX`].
    pub fn url(&self, name: &str) -> String {
        let resolved = self.resolve(name);
        if let Some(url) = self.static_url(Path::new(&resolved)) {
            return url;
        }
        tracing::warn!(path = %resolved, "image is outside the static dir, using placeholder");
        self.placeholder_url()
    }

    fn placeholder_url(&self) -> String {
        self.static_url(&self.placeholder).unwrap_or_else(|| {
            let file = self
                .placeholder
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{}/{}", STATIC_URL_PREFIX, file)
        })
    }

    fn static_url(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.static_dir).ok()?;
        let mut url = String::from(STATIC_URL_PREFIX);
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    url.push('/');
                    url.push_str(&part.to_string_lossy());
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(url)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(tmp: &TempDir) -> AssetResolver {
        let lores = tmp.path().join("lores");
        let hires = tmp.path().join("hires");
        std::fs::create_dir_all(&lores).unwrap();
        std::fs::create_dir_all(&hires).unwrap();
        AssetResolver::new(
            &ImagesConfig {
                lores_dir: lores.clone(),
                hires_dir: hires,
                placeholder: lores.join("coming-soon.png"),
            },
            tmp.path(),
        )
    }

    #[test]
    fn test_lores_wins() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp);
        std::fs::write(tmp.path().join("lores/a.png"), "x").unwrap();
        std::fs::write(tmp.path().join("hires/a.png"), "x").unwrap();
        assert!(r.resolve("a.png").ends_with("lores/a.png"));
    }

    #[test]
    fn test_hires_only_returns_hires() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp);
        std::fs::write(tmp.path().join("hires/b.png"), "x").unwrap();
        let resolved = r.resolve("b.png");
        assert_eq!(
            resolved,
            tmp.path().join("hires/b.png").to_string_lossy().into_owned()
        );
    }

    #[test]
    fn test_missing_returns_placeholder() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp);
        let placeholder = r.placeholder().to_string_lossy().into_owned();
        assert_eq!(r.resolve("missing.png"), placeholder);
        assert_eq!(r.resolve("missing.png"), placeholder);
        assert_eq!(r.resolve(""), placeholder);
    }

    #[test]
    fn test_not_cached() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp);
        assert!(r.resolve("late.png").ends_with("coming-soon.png"));
        std::fs::write(tmp.path().join("lores/late.png"), "x").unwrap();
        assert!(r.resolve("late.png").ends_with("lores/late.png"));
    }

    #[test]
    fn test_names_outside_image_dirs_get_placeholder() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp);
        std::fs::write(tmp.path().join("secret.txt"), "x").unwrap();
        let placeholder = r.placeholder().to_string_lossy().into_owned();

        assert_eq!(r.resolve("../secret.txt"), placeholder);
        assert_eq!(
            r.resolve(&tmp.path().join("secret.txt").to_string_lossy()),
            placeholder
        );
        assert_eq!(r.resolve("lores/../../secret.txt"), placeholder);
    }

    #[test]
    fn test_url_is_relative_to_static_dir() {
        let tmp = TempDir::new().unwrap();
        let assets = tmp.path().join("assets");
        let lores = assets.join("images/lores");
        std::fs::create_dir_all(&lores).unwrap();
        std::fs::write(lores.join("robot.png"), "x").unwrap();
        let r = AssetResolver::new(
            &ImagesConfig {
                lores_dir: lores.clone(),
                hires_dir: assets.join("images/hires"),
                placeholder: lores.join("coming-soon.png"),
            },
            &assets,
        );

        assert_eq!(r.url("robot.png"), "/static/images/lores/robot.png");
        assert_eq!(r.url("missing.png"), "/static/images/lores/coming-soon.png");
    }

    #[test]
    fn test_url_outside_static_dir_falls_back_to_placeholder() {
        let tmp = TempDir::new().unwrap();
        let static_dir = tmp.path().join("static");
        let elsewhere = tmp.path().join("elsewhere");
        std::fs::create_dir_all(&elsewhere).unwrap();
        std::fs::write(elsewhere.join("robot.png"), "x").unwrap();
        let r = AssetResolver::new(
            &ImagesConfig {
                lores_dir: elsewhere,
                hires_dir: static_dir.join("images/hires"),
                placeholder: static_dir.join("images/lores/coming-soon.png"),
            },
            &static_dir,
        );

        assert_eq!(r.url("robot.png"), "/static/images/lores/coming-soon.png");
    }
}
